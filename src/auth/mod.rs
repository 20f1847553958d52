// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Caller Authentication
//!
//! Registry writes act on behalf of a wallet address, the way a chain
//! transaction does. Over HTTP the caller proves control of the address
//! with an EIP-191 signature.
//!
//! ## Auth Flow
//!
//! 1. Client picks the current unix time `ts`
//! 2. Client signs `"{METHOD} {PATH} {ts} {keccak256(body)}"` with its wallet key
//! 3. Client sends `x-wallet-address`, `x-wallet-timestamp`, `x-wallet-signature`
//! 4. Server recovers the signer and compares it with the address
//!
//! ## Security
//!
//! - Clock skew tolerance is 60 seconds
//! - A signed message is accepted once per wallet
//! - Unsigned mode exists only in `dev` builds

pub mod error;
pub mod extractor;
pub mod replay;

pub use error::AuthError;
pub use extractor::{
    digest_body, sign_request, signing_message, verify_wallet_signature, BodyDigest, WalletAuth,
    MAX_SIGNED_BODY_BYTES, WALLET_ADDRESS_HEADER, WALLET_SIGNATURE_HEADER,
    WALLET_TIMESTAMP_HEADER,
};
pub use replay::ReplayGuard;

/// Clock skew tolerance (60 seconds).
pub const CLOCK_SKEW_LEEWAY: i64 = 60;

/// Authentication settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthConfig {
    /// Require EIP-191 request signatures.
    pub require_signatures: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            require_signatures: true,
        }
    }
}

impl AuthConfig {
    /// Address-header-only mode for local development.
    pub fn unsigned() -> Self {
        Self {
            require_signatures: false,
        }
    }
}
