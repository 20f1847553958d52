// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the REST API. Registry views
//! ([`crate::registry::TeamInfo`] and friends) are returned as-is; this
//! module holds the wrappers around them.
//!
//! Addresses, handles and proofs travel as 0x-prefixed hex strings.
//!
//! ## Model Categories
//!
//! - **Writes**: team creation, athlete registration, proposals, access grants
//! - **Lookups**: counters and address → id maps
//! - **Registry**: deployment parameters

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::fhe::EncryptedInput;
use crate::registry::ProposalStatus;

// =============================================================================
// Write Requests
// =============================================================================

/// Create a team managed by the caller.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateTeamRequest {
    pub name: String,
    /// Encrypted salary cap bound to the caller.
    pub salary_cap: EncryptedInput,
}

/// Register the caller's wallet as an athlete.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterAthleteRequest {
    pub name: String,
}

/// Offer a contract to an athlete. Caller must manage `team_id`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateProposalRequest {
    pub athlete_id: u64,
    pub team_id: u64,
    pub salary: EncryptedInput,
    pub bonus: EncryptedInput,
    /// Contract length in 30-day months.
    pub duration_months: u64,
}

/// Let another address decrypt the caller's compensation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GrantAccessRequest {
    #[schema(value_type = String)]
    pub grantee: Address,
}

// =============================================================================
// Responses
// =============================================================================

/// Id assigned by a create operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CreatedResponse {
    pub id: u64,
}

/// Result of `approveProposal`: the decision is pending until the oracle answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ApprovalResponse {
    pub proposal_id: u64,
    /// Decryption request the oracle will answer.
    pub request_id: u64,
}

/// Outcome of an oracle callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CallbackResponse {
    pub request_id: u64,
    pub status: ProposalStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CountResponse {
    pub count: u64,
}

/// Address → id lookup; `id` is 0 when nothing is registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LookupResponse {
    #[schema(value_type = String)]
    pub address: Address,
    pub id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TeamAthletesResponse {
    pub team_id: u64,
    pub athlete_ids: Vec<u64>,
}

/// Whether `viewer` may decrypt an athlete's compensation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AccessResponse {
    pub athlete_id: u64,
    #[schema(value_type = String)]
    pub viewer: Address,
    pub allowed: bool,
}

/// Deployment parameters and counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RegistryInfoResponse {
    #[schema(value_type = String)]
    pub contract_address: Address,
    #[schema(value_type = String)]
    pub owner: Address,
    #[schema(value_type = String)]
    pub oracle_signer: Address,
    pub proposal_expiry_secs: u64,
    pub team_count: u64,
    pub athlete_count: u64,
    pub proposal_count: u64,
    pub event_count: u64,
    /// Whether state is persisted to disk.
    pub persistent: bool,
}
