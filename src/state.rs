// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{AuthConfig, ReplayGuard};
use crate::ledger::LocalLedger;

#[derive(Clone)]
pub struct AppState {
    pub ledger: LocalLedger,
    pub auth: AuthConfig,
    /// Signed messages already accepted.
    pub replay: Arc<ReplayGuard>,
    /// Whether the in-process oracle worker answers decryption requests.
    pub oracle_worker: bool,
}

impl AppState {
    pub fn new(ledger: LocalLedger, auth: AuthConfig) -> Self {
        Self {
            ledger,
            auth,
            replay: Arc::new(ReplayGuard::default()),
            oracle_worker: false,
        }
    }

    pub fn with_oracle_worker(mut self, enabled: bool) -> Self {
        self.oracle_worker = enabled;
        self
    }
}
