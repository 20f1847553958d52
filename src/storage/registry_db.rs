// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded registry database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `registry_state`: "snapshot" → serialized RegistryState
//! - `events`: sequence → serialized EventRecord
//! - `ciphertexts`: 32-byte handle → serialized Plaintext (mock coprocessor)

use std::path::Path;

use alloy::primitives::B256;
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};

use crate::fhe::{CiphertextHandle, Plaintext};
use crate::registry::{EventRecord, RegistryState};

// =============================================================================
// Table Definitions
// =============================================================================

const REGISTRY_STATE: TableDefinition<&str, &[u8]> = TableDefinition::new("registry_state");

const EVENTS: TableDefinition<u64, &[u8]> = TableDefinition::new("events");

const CIPHERTEXTS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("ciphertexts");

const SNAPSHOT_KEY: &str = "snapshot";

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// One committed ledger transaction.
pub struct CommitBatch<'a> {
    pub state: &'a RegistryState,
    pub events: &'a [EventRecord],
    pub ciphertexts: &'a [(CiphertextHandle, Plaintext)],
}

// =============================================================================
// RegistryDatabase
// =============================================================================

pub struct RegistryDatabase {
    db: Database,
}

impl RegistryDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(REGISTRY_STATE)?;
            let _ = write_txn.open_table(EVENTS)?;
            let _ = write_txn.open_table(CIPHERTEXTS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Write a snapshot, its events and new ciphertexts atomically.
    pub fn commit(&self, batch: CommitBatch<'_>) -> StorageResult<()> {
        let snapshot = serde_json::to_vec(batch.state)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut state_table = write_txn.open_table(REGISTRY_STATE)?;
            state_table.insert(SNAPSHOT_KEY, snapshot.as_slice())?;

            let mut events_table = write_txn.open_table(EVENTS)?;
            for record in batch.events {
                let json = serde_json::to_vec(record)?;
                events_table.insert(record.sequence, json.as_slice())?;
            }

            let mut ct_table = write_txn.open_table(CIPHERTEXTS)?;
            for (handle, value) in batch.ciphertexts {
                let json = serde_json::to_vec(value)?;
                ct_table.insert(handle.as_slice(), json.as_slice())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Store ciphertexts that are not tied to a registry transaction
    /// (input registrations).
    pub fn put_ciphertexts(&self, entries: &[(CiphertextHandle, Plaintext)]) -> StorageResult<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(CIPHERTEXTS)?;
            for (handle, value) in entries {
                let json = serde_json::to_vec(value)?;
                table.insert(handle.as_slice(), json.as_slice())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn load_state(&self) -> StorageResult<Option<RegistryState>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(REGISTRY_STATE)?;
        match table.get(SNAPSHOT_KEY)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// All events in sequence order.
    pub fn load_events(&self) -> StorageResult<Vec<EventRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(EVENTS)?;
        let mut events = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            events.push(serde_json::from_slice(value.value())?);
        }
        Ok(events)
    }

    pub fn load_ciphertexts(&self) -> StorageResult<Vec<(CiphertextHandle, Plaintext)>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CIPHERTEXTS)?;
        let mut entries = Vec::new();
        for entry in table.iter()? {
            let (key, value) = entry?;
            let handle = B256::try_from(key.value())
                .map_err(|_| StorageError::Corrupt(format!("handle of {} bytes", key.value().len())))?;
            let plaintext: Plaintext = serde_json::from_slice(value.value())?;
            entries.push((CiphertextHandle(handle), plaintext));
        }
        Ok(entries)
    }

    pub fn event_count(&self) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(EVENTS)?;
        Ok(table.len()?)
    }
}

// =============================================================================
// Tests
// =============================================================================
