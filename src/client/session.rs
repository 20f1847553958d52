// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet session state for a client.

use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::ClientError;
use crate::fhe::InputEncryptor;

/// Whether the session can encrypt inputs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EncryptionStatus {
    #[default]
    Uninitialized,
    Ready,
    Failed(String),
}

/// One wallet connection.
///
/// Created disconnected. `connect` binds a wallet and resets encryption
/// readiness, which [`ClientSession::initialize_encryption`] then
/// establishes for that wallet. `disconnect` clears both.
#[derive(Debug, Clone)]
pub struct ClientSession {
    id: Uuid,
    wallet: Option<Address>,
    connected_at: Option<DateTime<Utc>>,
    encryption: EncryptionStatus,
}

impl Default for ClientSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            wallet: None,
            connected_at: None,
            encryption: EncryptionStatus::Uninitialized,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn connect(&mut self, wallet: Address) {
        if self.wallet != Some(wallet) {
            self.encryption = EncryptionStatus::Uninitialized;
        }
        self.wallet = Some(wallet);
        self.connected_at = Some(Utc::now());
        tracing::debug!(session = %self.id, wallet = %wallet, "Wallet connected");
    }

    pub fn disconnect(&mut self) {
        if let Some(wallet) = self.wallet.take() {
            tracing::debug!(session = %self.id, wallet = %wallet, "Wallet disconnected");
        }
        self.connected_at = None;
        self.encryption = EncryptionStatus::Uninitialized;
    }

    pub fn is_connected(&self) -> bool {
        self.wallet.is_some()
    }

    pub fn wallet(&self) -> Option<Address> {
        self.wallet
    }

    pub fn connected_at(&self) -> Option<DateTime<Utc>> {
        self.connected_at
    }

    pub fn encryption(&self) -> &EncryptionStatus {
        &self.encryption
    }

    pub fn is_encryption_ready(&self) -> bool {
        self.encryption == EncryptionStatus::Ready
    }

    /// Mark encryption ready if `encryptor` is usable. Requires a wallet.
    pub fn initialize_encryption<E: InputEncryptor>(
        &mut self,
        encryptor: &E,
    ) -> Result<(), ClientError> {
        self.require_wallet()?;
        if encryptor.is_ready() {
            self.encryption = EncryptionStatus::Ready;
            Ok(())
        } else {
            let reason = "encryption backend unavailable".to_string();
            self.encryption = EncryptionStatus::Failed(reason);
            Err(ClientError::EncryptionNotReady)
        }
    }

    pub(crate) fn require_wallet(&self) -> Result<Address, ClientError> {
        self.wallet.ok_or(ClientError::NotConnected)
    }

    /// The wallet, provided encryption is ready for it.
    pub(crate) fn require_encryption(&self) -> Result<Address, ClientError> {
        let wallet = self.require_wallet()?;
        if !self.is_encryption_ready() {
            return Err(ClientError::EncryptionNotReady);
        }
        Ok(wallet)
    }
}
