// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Registry records, read views and transaction context.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::fhe::CiphertextHandle;

/// Seconds in the 30-day month used for contract end dates.
pub const SECONDS_PER_MONTH: u64 = 30 * 24 * 60 * 60;

/// Default proposal lifetime (7 days).
pub const DEFAULT_PROPOSAL_EXPIRY_SECS: u64 = 7 * 24 * 60 * 60;

/// Longest contract a proposal may offer (50 years).
pub const MAX_CONTRACT_MONTHS: u64 = 600;

/// Longest accepted team or athlete name, in bytes.
pub const MAX_NAME_LEN: usize = 64;

/// Sender and block time of the transaction being applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxContext {
    pub caller: Address,
    pub timestamp: u64,
}

impl TxContext {
    pub fn new(caller: Address, timestamp: u64) -> Self {
        Self { caller, timestamp }
    }
}

/// Deployment parameters of a registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Address encrypted inputs must be bound to.
    pub contract_address: Address,
    pub owner: Address,
    /// Only callbacks signed by this address are accepted.
    pub oracle_signer: Address,
    pub proposal_expiry_secs: u64,
}

impl RegistryConfig {
    pub fn new(contract_address: Address, owner: Address, oracle_signer: Address) -> Self {
        Self {
            contract_address,
            owner,
            oracle_signer,
            proposal_expiry_secs: DEFAULT_PROPOSAL_EXPIRY_SECS,
        }
    }

    pub fn with_proposal_expiry(mut self, secs: u64) -> Self {
        self.proposal_expiry_secs = secs;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: u64,
    pub name: String,
    pub manager: Address,
    pub encrypted_salary_cap: CiphertextHandle,
    /// Sum of member salaries.
    pub encrypted_payroll: CiphertextHandle,
    pub member_athlete_ids: Vec<u64>,
    pub is_active: bool,
    pub created_at: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Athlete {
    pub id: u64,
    pub name: String,
    pub wallet: Address,
    /// 0 when unaffiliated.
    pub current_team_id: u64,
    pub is_active: bool,
    pub contract_end_date: u64,
    pub encrypted_salary: CiphertextHandle,
    pub encrypted_bonus: CiphertextHandle,
    pub registered_at: u64,
}

/// Stored proposal status. `Expired` is also derived at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
    Expired,
}

impl ProposalStatus {
    /// ABI encoding (`uint8`).
    pub fn as_u8(self) -> u8 {
        match self {
            ProposalStatus::Pending => 0,
            ProposalStatus::Approved => 1,
            ProposalStatus::Rejected => 2,
            ProposalStatus::Cancelled => 3,
            ProposalStatus::Expired => 4,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(ProposalStatus::Pending),
            1 => Some(ProposalStatus::Approved),
            2 => Some(ProposalStatus::Rejected),
            3 => Some(ProposalStatus::Cancelled),
            4 => Some(ProposalStatus::Expired),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self != ProposalStatus::Pending
    }

    /// Status as observed at `now` for a proposal created at `created_at`:
    /// Pending past `created_at + expiry_secs` reads as Expired.
    pub fn observed_at(self, created_at: u64, expiry_secs: u64, now: u64) -> Self {
        if self == ProposalStatus::Pending && now > created_at.saturating_add(expiry_secs) {
            ProposalStatus::Expired
        } else {
            self
        }
    }
}

impl std::fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProposalStatus::Pending => write!(f, "pending"),
            ProposalStatus::Approved => write!(f, "approved"),
            ProposalStatus::Rejected => write!(f, "rejected"),
            ProposalStatus::Cancelled => write!(f, "cancelled"),
            ProposalStatus::Expired => write!(f, "expired"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: u64,
    pub athlete_id: u64,
    pub team_id: u64,
    pub proposer: Address,
    pub encrypted_salary: CiphertextHandle,
    pub encrypted_bonus: CiphertextHandle,
    pub contract_duration_months: u64,
    pub created_at: u64,
    pub status: ProposalStatus,
    /// Compliance request awaiting its oracle callback.
    #[serde(default)]
    pub pending_request: Option<u64>,
}

impl Proposal {
    pub fn expires_at(&self, expiry_secs: u64) -> u64 {
        self.created_at.saturating_add(expiry_secs)
    }

    pub fn is_expired(&self, now: u64, expiry_secs: u64) -> bool {
        now > self.expires_at(expiry_secs)
    }

    /// Status as observed at `now`: a stale Pending proposal reads as Expired.
    pub fn effective_status(&self, now: u64, expiry_secs: u64) -> ProposalStatus {
        self.status.observed_at(self.created_at, expiry_secs, now)
    }

    pub fn awaiting_decision(&self) -> bool {
        self.pending_request.is_some()
    }
}

/// Arguments of `createProposal`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProposal {
    pub athlete_id: u64,
    pub team_id: u64,
    pub salary: crate::fhe::EncryptedInput,
    pub bonus: crate::fhe::EncryptedInput,
    pub duration_months: u64,
}

// =============================================================================
// Read Views
// =============================================================================

/// Public view of a team. Handle fields are `None` when the backend does not
/// expose them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TeamInfo {
    pub id: u64,
    pub name: String,
    #[schema(value_type = String)]
    pub manager: Address,
    pub athlete_count: u64,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub salary_cap_handle: Option<CiphertextHandle>,
}

/// Public view of an athlete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AthleteInfo {
    pub id: u64,
    pub name: String,
    /// Registering wallet; not exposed by the on-chain getter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub wallet: Option<Address>,
    pub team_id: u64,
    pub is_active: bool,
    pub contract_end_date: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub salary_handle: Option<CiphertextHandle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub bonus_handle: Option<CiphertextHandle>,
}

/// Public view of a proposal with its effective status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProposalInfo {
    pub id: u64,
    pub athlete_id: u64,
    pub team_id: u64,
    pub contract_duration_months: u64,
    pub created_at: u64,
    pub expires_at: u64,
    pub status: ProposalStatus,
    /// Whether a compliance callback is outstanding. Always `false` from
    /// backends that cannot observe it.
    pub awaiting_decision: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub salary_handle: Option<CiphertextHandle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub bonus_handle: Option<CiphertextHandle>,
}

/// Decrypted compensation, returned only to authorized viewers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Compensation {
    pub athlete_id: u64,
    pub salary: u64,
    pub bonus: u64,
}

/// Proposal listing filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProposalFilter {
    pub team_id: Option<u64>,
    pub athlete_id: Option<u64>,
}

impl ProposalFilter {
    pub fn matches(&self, proposal: &Proposal) -> bool {
        self.team_id.is_none_or(|id| proposal.team_id == id)
            && self.athlete_id.is_none_or(|id| proposal.athlete_id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proposal(created_at: u64, status: ProposalStatus) -> Proposal {
        Proposal {
            id: 1,
            athlete_id: 1,
            team_id: 1,
            proposer: Address::ZERO,
            encrypted_salary: CiphertextHandle::ZERO,
            encrypted_bonus: CiphertextHandle::ZERO,
            contract_duration_months: 12,
            created_at,
            status,
            pending_request: None,
        }
    }

    #[test]
    fn expiry_is_strictly_after_deadline() {
        let p = proposal(1_000, ProposalStatus::Pending);
        assert!(!p.is_expired(1_100, 100));
        assert!(p.is_expired(1_101, 100));
        assert_eq!(p.effective_status(1_100, 100), ProposalStatus::Pending);
        assert_eq!(p.effective_status(1_101, 100), ProposalStatus::Expired);
    }

    #[test]
    fn terminal_status_is_not_reinterpreted() {
        let p = proposal(0, ProposalStatus::Approved);
        assert_eq!(p.effective_status(u64::MAX, 1), ProposalStatus::Approved);
    }

    #[test]
    fn status_abi_encoding_round_trips() {
        for status in [
            ProposalStatus::Pending,
            ProposalStatus::Approved,
            ProposalStatus::Rejected,
            ProposalStatus::Cancelled,
            ProposalStatus::Expired,
        ] {
            assert_eq!(ProposalStatus::from_u8(status.as_u8()), Some(status));
        }
        assert_eq!(ProposalStatus::from_u8(9), None);
    }

    #[test]
    fn filter_matches_team_and_athlete() {
        let p = proposal(0, ProposalStatus::Pending);
        assert!(ProposalFilter::default().matches(&p));
        assert!(ProposalFilter { team_id: Some(1), athlete_id: None }.matches(&p));
        assert!(!ProposalFilter { team_id: Some(2), athlete_id: None }.matches(&p));
        assert!(!ProposalFilter { team_id: Some(1), athlete_id: Some(3) }.matches(&p));
    }
}
