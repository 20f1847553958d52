// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Registry Storage
//!
//! Durable state for the in-process ledger, kept in a single redb file
//! under `DATA_DIR`.
//!
//! ## Storage Layout
//!
//! ```text
//! $DATA_DIR/
//!   registry.redb   # state snapshot, event log, ciphertext table
//! ```
//!
//! Without `DATA_DIR` the ledger runs in memory and nothing is written.

use std::path::{Path, PathBuf};

pub mod registry_db;

pub use registry_db::{CommitBatch, RegistryDatabase, StorageError, StorageResult};

/// File name of the registry database inside the data directory.
pub const DATABASE_FILE: &str = "registry.redb";

pub fn database_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DATABASE_FILE)
}

/// Open the registry database in `data_dir`, creating the directory if needed.
pub fn open_in(data_dir: &Path) -> StorageResult<RegistryDatabase> {
    RegistryDatabase::open(&database_path(data_dir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_inside_nested_data_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let data_dir = tmp.path().join("nested").join("data");

        let db = open_in(&data_dir).unwrap();
        assert_eq!(db.event_count().unwrap(), 0);
        assert!(database_path(&data_dir).exists());
    }
}
