// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # FHE Boundary
//!
//! The registry never sees plaintext salaries. It only holds opaque 32-byte
//! ciphertext handles and asks a [`Coprocessor`] to verify input proofs and
//! to compute on handles.
//!
//! ## Components
//!
//! - [`Coprocessor`] - contract-side executor (proof checks, `add`, `sub`, `le`)
//!   and the trusted decryption entry points used by the oracle.
//! - [`MockCoprocessor`] - in-process executor backed by a handle table.
//! - [`InputEncryptor`] - client-side strategy that turns a `u64` into a
//!   handle + proof, with [`SimulatedEncryptor`] and [`RelayerEncryptor`].

use std::fmt;

use alloy::primitives::{Address, Bytes, B256};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod encryptor;
pub mod mock;

pub use encryptor::{EncryptionStrategy, InputEncryptor, RelayerEncryptor, SimulatedEncryptor};
pub use mock::{MockCoprocessor, Plaintext};

/// Opaque reference to a ciphertext held by the coprocessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CiphertextHandle(pub B256);

impl CiphertextHandle {
    pub const ZERO: CiphertextHandle = CiphertextHandle(B256::ZERO);

    pub fn as_slice(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl fmt::Display for CiphertextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<B256> for CiphertextHandle {
    fn from(value: B256) -> Self {
        CiphertextHandle(value)
    }
}

/// A client-encrypted value: ciphertext handle plus the proof binding it to
/// `(contract, submitter)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EncryptedInput {
    /// 32-byte ciphertext handle (0x-prefixed hex).
    #[schema(value_type = String, example = "0x6d0f...")]
    pub handle: CiphertextHandle,
    /// Input proof (0x-prefixed hex).
    #[schema(value_type = String)]
    pub proof: Bytes,
}

/// Body of an input registration request (`POST /v1/fhe/inputs`).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InputRegistrationRequest {
    /// Plaintext value in base units.
    pub value: u64,
    /// Contract the input is bound to. Defaults to the served registry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub contract_address: Option<Address>,
    /// Address that will submit the input.
    #[schema(value_type = String)]
    pub submitter: Address,
}

/// Executor for homomorphic operations on ciphertext handles.
///
/// `decrypt_*` are reserved for the trusted decryption service; the
/// registry itself never calls them on the transaction path.
pub trait Coprocessor: Send + Sync {
    /// Check that `input.proof` binds `input.handle` to `contract` and `submitter`.
    fn verify_input(
        &self,
        input: &EncryptedInput,
        contract: Address,
        submitter: Address,
    ) -> Result<(), FheError>;

    /// Encrypt a public constant.
    fn trivial_encrypt(&self, value: u64) -> Result<CiphertextHandle, FheError>;

    fn add(&self, lhs: CiphertextHandle, rhs: CiphertextHandle)
        -> Result<CiphertextHandle, FheError>;

    fn sub(&self, lhs: CiphertextHandle, rhs: CiphertextHandle)
        -> Result<CiphertextHandle, FheError>;

    /// Encrypted `lhs <= rhs`, yielding an encrypted boolean.
    fn le(&self, lhs: CiphertextHandle, rhs: CiphertextHandle)
        -> Result<CiphertextHandle, FheError>;

    fn decrypt_u64(&self, handle: CiphertextHandle) -> Result<u64, FheError>;

    fn decrypt_bool(&self, handle: CiphertextHandle) -> Result<bool, FheError>;
}

/// Errors raised at the encryption boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FheError {
    #[error("Malformed input proof")]
    MalformedProof,

    #[error("Input proof does not match handle, contract and submitter")]
    ProofMismatch,

    #[error("Unknown ciphertext handle: {0}")]
    UnknownHandle(CiphertextHandle),

    #[error("Ciphertext {handle} is not an encrypted {expected}")]
    TypeMismatch {
        handle: CiphertextHandle,
        expected: &'static str,
    },

    #[error("Coprocessor secret must be 32 bytes of hex")]
    InvalidSecret,

    #[error("Invalid relayer URL: {0}")]
    InvalidRelayerUrl(String),

    #[error("Relayer error: {0}")]
    Relayer(String),

    #[error("Encryption backend is not initialized")]
    NotInitialized,
}
