// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Registry Client
//!
//! [`SportsClient`] is the typed front door to a registry: one method per
//! operation, amounts given as decimal strings, encryption handled for the
//! caller. It is generic over where the registry lives ([`LedgerBackend`])
//! and how inputs are encrypted ([`InputEncryptor`]).
//!
//! Every call takes the [`ClientSession`] explicitly. Writes need a
//! connected wallet; writes with encrypted amounts also need the session's
//! encryption to be initialized.

use alloy::primitives::Address;

use crate::fhe::{EncryptedInput, FheError, InputEncryptor};
use crate::ledger::LedgerError;
use crate::registry::{AthleteInfo, NewProposal, ProposalInfo, TeamInfo};

pub mod backend;
pub mod session;
pub mod units;

pub use backend::LedgerBackend;
pub use session::{ClientSession, EncryptionStatus};
pub use units::{format_units, parse_units, UnitsError, DEFAULT_DECIMALS};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("No wallet connected")]
    NotConnected,

    #[error("Encryption is not initialized for this session")]
    EncryptionNotReady,

    #[error(transparent)]
    Units(#[from] UnitsError),

    #[error("Encryption failed: {0}")]
    Encryption(#[from] FheError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl ClientError {
    /// The ledger error, if the backend rejected the call.
    pub fn as_ledger(&self) -> Option<&LedgerError> {
        match self {
            ClientError::Ledger(e) => Some(e),
            _ => None,
        }
    }
}

/// Offer terms as the user enters them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalTerms<'a> {
    pub athlete_id: u64,
    pub team_id: u64,
    pub salary: &'a str,
    pub bonus: &'a str,
    pub duration_months: u64,
}

pub struct SportsClient<B, E> {
    backend: B,
    encryptor: E,
    decimals: u8,
}

impl<B: LedgerBackend, E: InputEncryptor> SportsClient<B, E> {
    pub fn new(backend: B, encryptor: E) -> Self {
        Self {
            backend,
            encryptor,
            decimals: DEFAULT_DECIMALS,
        }
    }

    pub fn with_decimals(mut self, decimals: u8) -> Self {
        self.decimals = decimals;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn encryptor(&self) -> &E {
        &self.encryptor
    }

    /// Connect `wallet` and initialize encryption for it.
    pub fn open_session(&self, wallet: Address) -> Result<ClientSession, ClientError> {
        let mut session = ClientSession::new();
        session.connect(wallet);
        session.initialize_encryption(&self.encryptor)?;
        Ok(session)
    }

    async fn encrypt_amount(&self, amount: &str, submitter: Address) -> Result<EncryptedInput, ClientError> {
        let value = parse_units(amount, self.decimals)?;
        Ok(self
            .encryptor
            .encrypt_u64(value, self.backend.contract_address(), submitter)
            .await?)
    }

    pub fn format_amount(&self, units: u64) -> String {
        format_units(units, self.decimals)
    }

    // Writes

    pub async fn create_team(
        &self,
        session: &ClientSession,
        name: &str,
        salary_cap: &str,
    ) -> Result<u64, ClientError> {
        let wallet = session.require_encryption()?;
        let cap = self.encrypt_amount(salary_cap, wallet).await?;
        Ok(self.backend.create_team(wallet, name.to_string(), cap).await?)
    }

    pub async fn register_athlete(&self, session: &ClientSession, name: &str) -> Result<u64, ClientError> {
        let wallet = session.require_wallet()?;
        Ok(self.backend.register_athlete(wallet, name.to_string()).await?)
    }

    pub async fn create_proposal(
        &self,
        session: &ClientSession,
        terms: ProposalTerms<'_>,
    ) -> Result<u64, ClientError> {
        let wallet = session.require_encryption()?;
        let salary = self.encrypt_amount(terms.salary, wallet).await?;
        let bonus = self.encrypt_amount(terms.bonus, wallet).await?;
        let proposal = NewProposal {
            athlete_id: terms.athlete_id,
            team_id: terms.team_id,
            salary,
            bonus,
            duration_months: terms.duration_months,
        };
        Ok(self.backend.create_proposal(wallet, proposal).await?)
    }

    pub async fn approve_proposal(&self, session: &ClientSession, proposal_id: u64) -> Result<(), ClientError> {
        let wallet = session.require_wallet()?;
        Ok(self.backend.approve_proposal(wallet, proposal_id).await?)
    }

    pub async fn reject_proposal(&self, session: &ClientSession, proposal_id: u64) -> Result<(), ClientError> {
        let wallet = session.require_wallet()?;
        Ok(self.backend.reject_proposal(wallet, proposal_id).await?)
    }

    pub async fn cancel_proposal(&self, session: &ClientSession, proposal_id: u64) -> Result<(), ClientError> {
        let wallet = session.require_wallet()?;
        Ok(self.backend.cancel_proposal(wallet, proposal_id).await?)
    }

    pub async fn expire_proposal(&self, session: &ClientSession, proposal_id: u64) -> Result<(), ClientError> {
        let wallet = session.require_wallet()?;
        Ok(self.backend.expire_proposal(wallet, proposal_id).await?)
    }

    pub async fn grant_salary_access(
        &self,
        session: &ClientSession,
        athlete_id: u64,
        grantee: Address,
    ) -> Result<(), ClientError> {
        let wallet = session.require_wallet()?;
        Ok(self
            .backend
            .grant_salary_access(wallet, athlete_id, grantee)
            .await?)
    }

    // Reads

    pub async fn team(&self, team_id: u64) -> Result<TeamInfo, ClientError> {
        Ok(self.backend.get_team_info(team_id).await?)
    }

    pub async fn team_athletes(&self, team_id: u64) -> Result<Vec<u64>, ClientError> {
        Ok(self.backend.get_team_athletes(team_id).await?)
    }

    pub async fn athlete(&self, athlete_id: u64) -> Result<AthleteInfo, ClientError> {
        Ok(self.backend.get_athlete_info(athlete_id).await?)
    }

    pub async fn proposal(&self, proposal_id: u64) -> Result<ProposalInfo, ClientError> {
        Ok(self.backend.get_proposal_info(proposal_id).await?)
    }

    pub async fn team_count(&self) -> Result<u64, ClientError> {
        Ok(self.backend.team_count().await?)
    }

    pub async fn athlete_count(&self) -> Result<u64, ClientError> {
        Ok(self.backend.athlete_count().await?)
    }

    pub async fn proposal_count(&self) -> Result<u64, ClientError> {
        Ok(self.backend.proposal_count().await?)
    }

    /// Athlete id of the session's wallet, if it registered one.
    pub async fn my_athlete_id(&self, session: &ClientSession) -> Result<Option<u64>, ClientError> {
        let wallet = session.require_wallet()?;
        let id = self.backend.athlete_by_wallet(wallet).await?;
        Ok((id != 0).then_some(id))
    }

    /// Team id managed by the session's wallet, if any.
    pub async fn my_team_id(&self, session: &ClientSession) -> Result<Option<u64>, ClientError> {
        let wallet = session.require_wallet()?;
        let id = self.backend.team_by_manager(wallet).await?;
        Ok((id != 0).then_some(id))
    }
}
