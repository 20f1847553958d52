// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Typed ledger interface: one method per registry operation and query.

use std::future::Future;

use alloy::primitives::Address;

use crate::fhe::EncryptedInput;
use crate::ledger::LedgerError;
use crate::registry::{AthleteInfo, NewProposal, ProposalInfo, TeamInfo};

/// A place the registry lives: the in-process [`crate::ledger::LocalLedger`]
/// or a deployed contract ([`crate::blockchain::ChainLedger`]).
///
/// Write methods take the sending address explicitly. Backends that sign
/// with a fixed key reject any other sender.
pub trait LedgerBackend: Send + Sync {
    /// Address encrypted inputs must be bound to.
    fn contract_address(&self) -> Address;

    // Writes

    fn create_team(
        &self,
        caller: Address,
        name: String,
        salary_cap: EncryptedInput,
    ) -> impl Future<Output = Result<u64, LedgerError>> + Send;

    fn register_athlete(
        &self,
        caller: Address,
        name: String,
    ) -> impl Future<Output = Result<u64, LedgerError>> + Send;

    fn create_proposal(
        &self,
        caller: Address,
        proposal: NewProposal,
    ) -> impl Future<Output = Result<u64, LedgerError>> + Send;

    fn approve_proposal(
        &self,
        caller: Address,
        proposal_id: u64,
    ) -> impl Future<Output = Result<(), LedgerError>> + Send;

    fn reject_proposal(
        &self,
        caller: Address,
        proposal_id: u64,
    ) -> impl Future<Output = Result<(), LedgerError>> + Send;

    fn cancel_proposal(
        &self,
        caller: Address,
        proposal_id: u64,
    ) -> impl Future<Output = Result<(), LedgerError>> + Send;

    fn expire_proposal(
        &self,
        caller: Address,
        proposal_id: u64,
    ) -> impl Future<Output = Result<(), LedgerError>> + Send;

    fn grant_salary_access(
        &self,
        caller: Address,
        athlete_id: u64,
        grantee: Address,
    ) -> impl Future<Output = Result<(), LedgerError>> + Send;

    // Reads

    fn get_team_info(&self, team_id: u64)
        -> impl Future<Output = Result<TeamInfo, LedgerError>> + Send;

    fn get_athlete_info(
        &self,
        athlete_id: u64,
    ) -> impl Future<Output = Result<AthleteInfo, LedgerError>> + Send;

    fn get_proposal_info(
        &self,
        proposal_id: u64,
    ) -> impl Future<Output = Result<ProposalInfo, LedgerError>> + Send;

    fn get_team_athletes(
        &self,
        team_id: u64,
    ) -> impl Future<Output = Result<Vec<u64>, LedgerError>> + Send;

    fn team_count(&self) -> impl Future<Output = Result<u64, LedgerError>> + Send;

    fn athlete_count(&self) -> impl Future<Output = Result<u64, LedgerError>> + Send;

    fn proposal_count(&self) -> impl Future<Output = Result<u64, LedgerError>> + Send;

    /// Athlete id registered by `wallet`, 0 if none.
    fn athlete_by_wallet(
        &self,
        wallet: Address,
    ) -> impl Future<Output = Result<u64, LedgerError>> + Send;

    /// Team id managed by `manager`, 0 if none.
    fn team_by_manager(
        &self,
        manager: Address,
    ) -> impl Future<Output = Result<u64, LedgerError>> + Send;

    fn owner(&self) -> impl Future<Output = Result<Address, LedgerError>> + Send;

    /// Proposal lifetime in seconds.
    fn proposal_expiry(&self) -> impl Future<Output = Result<u64, LedgerError>> + Send;
}
