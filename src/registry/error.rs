// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Registry errors.
//!
//! Every rejected operation leaves the registry untouched, so all variants
//! are safe to retry once the caller fixes its input or the state changes.

use alloy::primitives::Address;

use crate::fhe::FheError;

/// Error class used for HTTP mapping and retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input or unknown id.
    Validation,
    /// Wrong caller role.
    Authorization,
    /// Transition not allowed in the current state.
    StateConflict,
    /// Coprocessor failure on ciphertexts the registry already holds.
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Input proof rejected: {0}")]
    InvalidProof(FheError),

    #[error("Name must be 1 to {max} bytes")]
    InvalidName { max: usize },

    #[error("Contract duration must be between 1 and {max} months")]
    InvalidDuration { max: u64 },

    #[error("Unknown team: {0}")]
    UnknownTeam(u64),

    #[error("Unknown athlete: {0}")]
    UnknownAthlete(u64),

    #[error("Unknown proposal: {0}")]
    UnknownProposal(u64),

    #[error("Unknown decryption request: {0}")]
    UnknownRequest(u64),

    #[error("Address {0} already manages a team")]
    DuplicateManager(Address),

    #[error("Wallet {0} already registered an athlete")]
    DuplicateWallet(Address),

    #[error("Caller is not the manager of team {0}")]
    NotManager(u64),

    #[error("Caller is not the wallet of athlete {0}")]
    NotAthleteOwner(u64),

    #[error("Caller may not view compensation of athlete {0}")]
    NotAuthorizedToView(u64),

    #[error("Callback is not signed by the oracle")]
    UnauthorizedCallback,

    #[error("Proposal {0} has expired")]
    ProposalExpired(u64),

    #[error("Proposal {0} has not expired yet")]
    ProposalNotExpired(u64),

    #[error("Proposal {0} is no longer pending")]
    InvalidState(u64),

    #[error("A compliance decision is already pending for proposal {0}")]
    AlreadyPendingDecision(u64),

    #[error("Decryption request {0} is already resolved")]
    AlreadyResolved(u64),

    #[error("Coprocessor error: {0}")]
    Coprocessor(FheError),
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::InvalidProof(_)
            | RegistryError::InvalidName { .. }
            | RegistryError::InvalidDuration { .. }
            | RegistryError::UnknownTeam(_)
            | RegistryError::UnknownAthlete(_)
            | RegistryError::UnknownProposal(_)
            | RegistryError::UnknownRequest(_) => ErrorKind::Validation,

            RegistryError::NotManager(_)
            | RegistryError::NotAthleteOwner(_)
            | RegistryError::NotAuthorizedToView(_)
            | RegistryError::UnauthorizedCallback => ErrorKind::Authorization,

            RegistryError::DuplicateManager(_)
            | RegistryError::DuplicateWallet(_)
            | RegistryError::ProposalExpired(_)
            | RegistryError::ProposalNotExpired(_)
            | RegistryError::InvalidState(_)
            | RegistryError::AlreadyPendingDecision(_)
            | RegistryError::AlreadyResolved(_) => ErrorKind::StateConflict,

            RegistryError::Coprocessor(_) => ErrorKind::Internal,
        }
    }

    /// Stable machine-readable code.
    pub fn error_code(&self) -> &'static str {
        match self {
            RegistryError::InvalidProof(_) => "invalid_proof",
            RegistryError::InvalidName { .. } => "invalid_name",
            RegistryError::InvalidDuration { .. } => "invalid_duration",
            RegistryError::UnknownTeam(_) => "unknown_team",
            RegistryError::UnknownAthlete(_) => "unknown_athlete",
            RegistryError::UnknownProposal(_) => "unknown_proposal",
            RegistryError::UnknownRequest(_) => "unknown_request",
            RegistryError::DuplicateManager(_) => "duplicate_manager",
            RegistryError::DuplicateWallet(_) => "duplicate_wallet",
            RegistryError::NotManager(_) => "not_manager",
            RegistryError::NotAthleteOwner(_) => "not_athlete_owner",
            RegistryError::NotAuthorizedToView(_) => "not_authorized_to_view",
            RegistryError::UnauthorizedCallback => "unauthorized_callback",
            RegistryError::ProposalExpired(_) => "proposal_expired",
            RegistryError::ProposalNotExpired(_) => "proposal_not_expired",
            RegistryError::InvalidState(_) => "invalid_state",
            RegistryError::AlreadyPendingDecision(_) => "already_pending_decision",
            RegistryError::AlreadyResolved(_) => "already_resolved",
            RegistryError::Coprocessor(_) => "coprocessor_error",
        }
    }

    /// Unknown-id errors, which the HTTP layer reports as 404.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RegistryError::UnknownTeam(_)
                | RegistryError::UnknownAthlete(_)
                | RegistryError::UnknownProposal(_)
                | RegistryError::UnknownRequest(_)
        )
    }
}

impl From<FheError> for RegistryError {
    fn from(e: FheError) -> Self {
        RegistryError::Coprocessor(e)
    }
}
