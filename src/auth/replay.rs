// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Replay rejection for signed requests.
//!
//! A signed message is accepted once. Entries are kept only while their
//! timestamp is inside the clock-skew window; anything older is refused as
//! stale before it reaches the cache.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use alloy::primitives::{Address, B256};
use tracing::warn;

use super::{AuthError, CLOCK_SKEW_LEEWAY};

/// Signed messages seen within the skew window.
#[derive(Debug)]
pub struct ReplayGuard {
    seen: Mutex<HashMap<(Address, B256), i64>>,
    window_secs: i64,
}

impl ReplayGuard {
    pub fn new(window_secs: i64) -> Self {
        Self {
            seen: Mutex::new(HashMap::new()),
            window_secs,
        }
    }

    /// Record a verified message. Fails if the same wallet already used it.
    pub fn check_and_record(
        &self,
        address: Address,
        message_hash: B256,
        timestamp: i64,
        now: i64,
    ) -> Result<(), AuthError> {
        let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        seen.retain(|_, ts| now - *ts <= self.window_secs);

        if seen.contains_key(&(address, message_hash)) {
            warn!(%address, timestamp, "Replayed request signature");
            return Err(AuthError::ReplayedRequest);
        }
        seen.insert((address, message_hash), timestamp);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ReplayGuard {
    fn default() -> Self {
        Self::new(CLOCK_SKEW_LEEWAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WALLET: Address = Address::repeat_byte(0xa1);

    #[test]
    fn second_use_of_a_message_is_refused() {
        let guard = ReplayGuard::new(60);
        let hash = B256::repeat_byte(1);
        assert!(guard.check_and_record(WALLET, hash, 100, 100).is_ok());
        assert_eq!(
            guard.check_and_record(WALLET, hash, 100, 110),
            Err(AuthError::ReplayedRequest)
        );

        // Same message from another wallet is a different request.
        assert!(guard
            .check_and_record(Address::repeat_byte(0xb0), hash, 100, 110)
            .is_ok());
        // Same second, different message.
        assert!(guard
            .check_and_record(WALLET, B256::repeat_byte(2), 100, 110)
            .is_ok());
    }

    #[test]
    fn entries_outside_the_window_are_pruned() {
        let guard = ReplayGuard::new(60);
        guard
            .check_and_record(WALLET, B256::repeat_byte(1), 100, 100)
            .unwrap();
        guard
            .check_and_record(WALLET, B256::repeat_byte(2), 150, 150)
            .unwrap();
        assert_eq!(guard.len(), 2);

        guard
            .check_and_record(WALLET, B256::repeat_byte(3), 200, 200)
            .unwrap();
        assert_eq!(guard.len(), 2);
    }
}
