// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process coprocessor used by the local ledger and the simulated client.
//!
//! Handles are keccak256 digests, plaintexts live in a handle table, and
//! input proofs are `0x01 || HMAC-SHA256(secret, handle || contract || submitter)`.
//! Arithmetic saturates so an overflowing payroll never compares as compliant.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use alloy::primitives::{keccak256, Address, Bytes};
use hmac::digest::{Key, KeyInit};
use hmac::{Hmac, Mac};
use k256::elliptic_curve::rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::error;

use super::{CiphertextHandle, Coprocessor, EncryptedInput, FheError};

type HmacSha256 = Hmac<Sha256>;

/// Proof format version byte.
const PROOF_VERSION: u8 = 0x01;

/// Proof length: version byte + 32-byte MAC.
const PROOF_LEN: usize = 33;

/// A decrypted ciphertext value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Plaintext {
    U64(u64),
    Bool(bool),
}

/// Handle-table coprocessor.
pub struct MockCoprocessor {
    /// MAC keyed with the proof secret; cloned per proof.
    mac: HmacSha256,
    table: RwLock<HashMap<CiphertextHandle, Plaintext>>,
    /// Entries created since the last `take_unpersisted` call.
    unpersisted: Mutex<Vec<(CiphertextHandle, Plaintext)>>,
    nonce: AtomicU64,
}

impl MockCoprocessor {
    pub fn new(secret: [u8; 32]) -> Self {
        // HMAC zero-pads keys shorter than the SHA-256 block.
        let mut block = [0u8; 64];
        block[..32].copy_from_slice(&secret);
        Self {
            mac: <HmacSha256 as KeyInit>::new(&Key::<HmacSha256>::clone_from_slice(&block)),
            table: RwLock::new(HashMap::new()),
            unpersisted: Mutex::new(Vec::new()),
            nonce: AtomicU64::new(0),
        }
    }

    /// Create a coprocessor with a random proof secret.
    pub fn random() -> Self {
        let mut secret = [0u8; 32];
        OsRng.fill_bytes(&mut secret);
        Self::new(secret)
    }

    /// Parse a hex secret (with or without `0x`).
    pub fn from_hex_secret(secret_hex: &str) -> Result<Self, FheError> {
        let bytes = alloy::hex::decode(secret_hex.trim()).map_err(|_| FheError::InvalidSecret)?;
        let secret: [u8; 32] = bytes.try_into().map_err(|_| FheError::InvalidSecret)?;
        Ok(Self::new(secret))
    }

    /// Encrypt `value` for `(contract, submitter)` and return handle + proof.
    ///
    /// This is the relayer role: in a real deployment the client SDK does
    /// this against the network public key.
    pub fn encrypt_input(&self, value: u64, contract: Address, submitter: Address) -> EncryptedInput {
        let nonce = self.next_nonce();
        let mut preimage = Vec::with_capacity(6 + 20 + 20 + 8 + 8);
        preimage.extend_from_slice(b"input:");
        preimage.extend_from_slice(contract.as_slice());
        preimage.extend_from_slice(submitter.as_slice());
        preimage.extend_from_slice(&value.to_be_bytes());
        preimage.extend_from_slice(&nonce.to_be_bytes());
        let handle = CiphertextHandle(keccak256(&preimage));

        self.store(handle, Plaintext::U64(value));

        let mut proof = Vec::with_capacity(PROOF_LEN);
        proof.push(PROOF_VERSION);
        proof.extend_from_slice(&self.input_mac(handle, contract, submitter));

        EncryptedInput {
            handle,
            proof: Bytes::from(proof),
        }
    }

    /// Number of ciphertexts in the table.
    pub fn len(&self) -> usize {
        self.read_table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load previously persisted entries.
    pub fn import(&self, entries: Vec<(CiphertextHandle, Plaintext)>) {
        self.write_table().extend(entries);
    }

    /// Take the entries created since the last call, for persistence.
    pub fn take_unpersisted(&self) -> Vec<(CiphertextHandle, Plaintext)> {
        std::mem::take(&mut *self.lock_unpersisted())
    }

    /// Put entries back after a failed persistence attempt.
    pub fn restore_unpersisted(&self, mut entries: Vec<(CiphertextHandle, Plaintext)>) {
        let mut pending = self.lock_unpersisted();
        entries.append(&mut pending);
        *pending = entries;
    }

    fn next_nonce(&self) -> u64 {
        self.nonce.fetch_add(1, Ordering::Relaxed)
    }

    fn input_mac(&self, handle: CiphertextHandle, contract: Address, submitter: Address) -> [u8; 32] {
        let mut mac = self.mac.clone();
        mac.update(handle.as_slice());
        mac.update(contract.as_slice());
        mac.update(submitter.as_slice());
        mac.finalize().into_bytes().into()
    }

    // A panic while holding a lock cannot leave the maps half-updated
    // (single insert/extend), so poisoned guards are recovered.

    fn read_table(&self) -> RwLockReadGuard<'_, HashMap<CiphertextHandle, Plaintext>> {
        self.table.read().unwrap_or_else(|poisoned| {
            error!("Ciphertext table lock poisoned; recovering");
            PoisonError::into_inner(poisoned)
        })
    }

    fn write_table(&self) -> RwLockWriteGuard<'_, HashMap<CiphertextHandle, Plaintext>> {
        self.table.write().unwrap_or_else(|poisoned| {
            error!("Ciphertext table lock poisoned; recovering");
            PoisonError::into_inner(poisoned)
        })
    }

    fn lock_unpersisted(&self) -> MutexGuard<'_, Vec<(CiphertextHandle, Plaintext)>> {
        self.unpersisted.lock().unwrap_or_else(|poisoned| {
            error!("Unpersisted ciphertext lock poisoned; recovering");
            PoisonError::into_inner(poisoned)
        })
    }

    fn store(&self, handle: CiphertextHandle, value: Plaintext) {
        self.write_table().insert(handle, value);
        self.lock_unpersisted().push((handle, value));
    }

    fn lookup(&self, handle: CiphertextHandle) -> Result<Plaintext, FheError> {
        self.read_table()
            .get(&handle)
            .copied()
            .ok_or(FheError::UnknownHandle(handle))
    }

    fn lookup_u64(&self, handle: CiphertextHandle) -> Result<u64, FheError> {
        match self.lookup(handle)? {
            Plaintext::U64(value) => Ok(value),
            Plaintext::Bool(_) => Err(FheError::TypeMismatch {
                handle,
                expected: "u64",
            }),
        }
    }

    /// Derive a fresh handle for the result of `op` and store it.
    fn derive(&self, op: &[u8], operands: &[CiphertextHandle], value: Plaintext) -> CiphertextHandle {
        let mut preimage = Vec::with_capacity(op.len() + operands.len() * 32 + 8);
        preimage.extend_from_slice(op);
        for operand in operands {
            preimage.extend_from_slice(operand.as_slice());
        }
        preimage.extend_from_slice(&self.next_nonce().to_be_bytes());
        let handle = CiphertextHandle(keccak256(&preimage));
        self.store(handle, value);
        handle
    }
}

impl Coprocessor for MockCoprocessor {
    fn verify_input(
        &self,
        input: &EncryptedInput,
        contract: Address,
        submitter: Address,
    ) -> Result<(), FheError> {
        let proof = input.proof.as_ref();
        if proof.len() != PROOF_LEN || proof[0] != PROOF_VERSION {
            return Err(FheError::MalformedProof);
        }

        let mut mac = self.mac.clone();
        mac.update(input.handle.as_slice());
        mac.update(contract.as_slice());
        mac.update(submitter.as_slice());
        mac.verify_slice(&proof[1..])
            .map_err(|_| FheError::ProofMismatch)?;

        // The proof is only meaningful if the ciphertext exists.
        self.lookup_u64(input.handle).map(|_| ())
    }

    fn trivial_encrypt(&self, value: u64) -> Result<CiphertextHandle, FheError> {
        Ok(self.derive(b"trivial:", &[], Plaintext::U64(value)))
    }

    fn add(
        &self,
        lhs: CiphertextHandle,
        rhs: CiphertextHandle,
    ) -> Result<CiphertextHandle, FheError> {
        let value = self.lookup_u64(lhs)?.saturating_add(self.lookup_u64(rhs)?);
        Ok(self.derive(b"add:", &[lhs, rhs], Plaintext::U64(value)))
    }

    fn sub(
        &self,
        lhs: CiphertextHandle,
        rhs: CiphertextHandle,
    ) -> Result<CiphertextHandle, FheError> {
        let value = self.lookup_u64(lhs)?.saturating_sub(self.lookup_u64(rhs)?);
        Ok(self.derive(b"sub:", &[lhs, rhs], Plaintext::U64(value)))
    }

    fn le(
        &self,
        lhs: CiphertextHandle,
        rhs: CiphertextHandle,
    ) -> Result<CiphertextHandle, FheError> {
        let value = self.lookup_u64(lhs)? <= self.lookup_u64(rhs)?;
        Ok(self.derive(b"le:", &[lhs, rhs], Plaintext::Bool(value)))
    }

    fn decrypt_u64(&self, handle: CiphertextHandle) -> Result<u64, FheError> {
        self.lookup_u64(handle)
    }

    fn decrypt_bool(&self, handle: CiphertextHandle) -> Result<bool, FheError> {
        match self.lookup(handle)? {
            Plaintext::Bool(value) => Ok(value),
            Plaintext::U64(_) => Err(FheError::TypeMismatch {
                handle,
                expected: "bool",
            }),
        }
    }
}
