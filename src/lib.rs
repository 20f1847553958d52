// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Confidential Sports - Encrypted Salary Negotiation Registry
//!
//! Teams, athletes and contract proposals whose salary cap, salary and
//! bonus are FHE ciphertext handles. Approving a proposal computes an
//! encrypted cap check; a trusted oracle decrypts the result and calls back
//! to finalize it.
//!
//! ## Modules
//!
//! - `registry` - Team / athlete / proposal state machine and ACL
//! - `fhe` - Ciphertext handles, coprocessor and client-side encryption
//! - `gateway` - Decryption requests, oracle signatures and worker
//! - `ledger` - In-process registry host with atomic persistence
//! - `storage` - redb database
//! - `client` - Typed client over a local ledger or a deployed contract
//! - `blockchain` - fhEVM networks and contract bindings
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Wallet-signature request authentication

pub mod api;
pub mod auth;
pub mod blockchain;
pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod fhe;
pub mod gateway;
pub mod ledger;
pub mod models;
pub mod registry;
pub mod state;
pub mod storage;
