// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! fhEVM chain integration.
//!
//! This module provides:
//! - Network presets (Zama devnet, Sepolia)
//! - Contract bindings for the registry and a [`ChainLedger`] backend

pub mod contract;
pub mod types;

pub use contract::{ChainError, ChainLedger, IConfidentialSports};
pub use types::*;
