// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Compliance Oracle Gateway
//!
//! Approving a proposal produces an encrypted boolean
//! (`payroll + salary <= cap`). The registry records a [`DecryptionRequest`]
//! for it and the trusted oracle later answers with a signed callback.
//!
//! ## Callback Authentication
//!
//! The oracle signs `keccak256(DOMAIN || contract || request_id || result)`
//! with EIP-191 personal-sign. The registry recovers the signer and compares
//! it with the configured oracle address.

use alloy::{
    primitives::{keccak256, Address, Bytes, Signature, B256},
    signers::{local::PrivateKeySigner, SignerSync},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::fhe::CiphertextHandle;

pub mod worker;

pub use worker::OracleWorker;

/// Domain separator for compliance callbacks.
const CALLBACK_DOMAIN: &[u8] = b"confidential-sports/compliance";

/// How a decryption request was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Oracle answered `true`; the proposal was approved.
    Compliant,
    /// Oracle answered `false`; the proposal was rejected.
    NonCompliant,
    /// The proposal expired before the answer was applied.
    Expired,
}

/// A pending or resolved request to decrypt a compliance result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DecryptionRequest {
    pub request_id: u64,
    pub proposal_id: u64,
    pub team_id: u64,
    pub athlete_id: u64,
    /// Encrypted compliance boolean to decrypt.
    #[schema(value_type = String)]
    pub handle: CiphertextHandle,
    /// Team payroll to install if the answer is `true`.
    #[schema(value_type = String)]
    pub candidate_payroll: CiphertextHandle,
    pub requested_at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
}

impl DecryptionRequest {
    pub fn is_pending(&self) -> bool {
        self.resolution.is_none()
    }
}

/// Digest the oracle signs for a callback.
pub fn callback_digest(contract: Address, request_id: u64, result: bool) -> B256 {
    let mut preimage = Vec::with_capacity(CALLBACK_DOMAIN.len() + 20 + 8 + 1);
    preimage.extend_from_slice(CALLBACK_DOMAIN);
    preimage.extend_from_slice(contract.as_slice());
    preimage.extend_from_slice(&request_id.to_be_bytes());
    preimage.push(u8::from(result));
    keccak256(&preimage)
}

/// Recover the address that signed a callback.
pub fn recover_callback_signer(
    contract: Address,
    request_id: u64,
    result: bool,
    signature: &[u8],
) -> Result<Address, GatewayError> {
    let signature = Signature::from_raw(signature)
        .map_err(|e| GatewayError::MalformedSignature(e.to_string()))?;
    let digest = callback_digest(contract, request_id, result);
    signature
        .recover_address_from_msg(digest.as_slice())
        .map_err(|e| GatewayError::Recovery(e.to_string()))
}

/// Key material of the trusted oracle.
#[derive(Clone)]
pub struct OracleSigner {
    signer: PrivateKeySigner,
}

impl OracleSigner {
    /// Parse a hex private key (with or without `0x`).
    pub fn from_hex(private_key_hex: &str) -> Result<Self, GatewayError> {
        let key_bytes = alloy::hex::decode(private_key_hex.trim())
            .map_err(|e| GatewayError::InvalidKey(e.to_string()))?;
        let signer = PrivateKeySigner::from_slice(&key_bytes)
            .map_err(|e| GatewayError::InvalidKey(e.to_string()))?;
        Ok(Self { signer })
    }

    pub fn random() -> Self {
        Self {
            signer: PrivateKeySigner::random(),
        }
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Sign a compliance callback.
    pub fn sign_callback(
        &self,
        contract: Address,
        request_id: u64,
        result: bool,
    ) -> Result<Bytes, GatewayError> {
        let digest = callback_digest(contract, request_id, result);
        let signature = self
            .signer
            .sign_message_sync(digest.as_slice())
            .map_err(|e| GatewayError::Signing(e.to_string()))?;
        Ok(Bytes::copy_from_slice(&signature.as_bytes()))
    }
}

/// Body of an oracle callback (`POST /v1/gateway/callbacks`).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CallbackRequest {
    pub request_id: u64,
    pub is_compliant: bool,
    /// 65-byte EIP-191 signature (0x-prefixed hex).
    #[schema(value_type = String)]
    pub signature: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("Invalid oracle key: {0}")]
    InvalidKey(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Malformed signature: {0}")]
    MalformedSignature(String),

    #[error("Signer recovery failed: {0}")]
    Recovery(String),
}
