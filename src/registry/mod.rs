// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Sports Registry
//!
//! Teams, athletes and contract proposals whose money fields are ciphertext
//! handles. The registry is a deterministic state machine: every mutating
//! operation takes a [`TxContext`] (caller + block time), validates fully,
//! and only then writes. A rejected operation leaves no trace.
//!
//! ## Proposal lifecycle
//!
//! ```text
//!             cancel (manager)
//!   Pending ─────────────────────────▶ Cancelled
//!      │      reject (athlete)
//!      ├─────────────────────────────▶ Rejected
//!      │      approve (athlete)
//!      └──▶ awaiting oracle ──true──▶ Approved
//!                  │        ──false─▶ Rejected
//!                  └──late callback──▶ Expired
//! ```
//!
//! A Pending proposal past `created_at + proposal_expiry_secs` reads as
//! Expired and can be finalized with [`Registry::expire_proposal`].
//!
//! ## Compliance check
//!
//! Approval computes `payroll' = payroll - old_salary? + salary` and the
//! encrypted predicate `payroll' <= cap`, then records a
//! [`DecryptionRequest`]. Only one decision may be in flight per team and
//! per athlete so the candidate payroll cannot go stale.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::fhe::{Coprocessor, EncryptedInput};
use crate::gateway::{recover_callback_signer, DecryptionRequest, Resolution};

pub mod error;
pub mod events;
pub mod types;

pub use error::{ErrorKind, RegistryError};
pub use events::{EventRecord, RegistryEvent};
pub use types::{
    Athlete, AthleteInfo, Compensation, NewProposal, Proposal, ProposalFilter, ProposalInfo,
    ProposalStatus, RegistryConfig, Team, TeamInfo, TxContext, DEFAULT_PROPOSAL_EXPIRY_SECS,
    MAX_CONTRACT_MONTHS, MAX_NAME_LEN, SECONDS_PER_MONTH,
};

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Everything the registry persists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryState {
    pub teams: BTreeMap<u64, Team>,
    pub athletes: BTreeMap<u64, Athlete>,
    pub proposals: BTreeMap<u64, Proposal>,
    pub team_by_manager: BTreeMap<Address, u64>,
    pub athlete_by_wallet: BTreeMap<Address, u64>,
    /// `(athlete_id, grantee)` pairs.
    pub salary_access: BTreeSet<(u64, Address)>,
    pub decryption_requests: BTreeMap<u64, DecryptionRequest>,
    pub team_count: u64,
    pub athlete_count: u64,
    pub proposal_count: u64,
    pub request_count: u64,
}

pub struct Registry {
    config: RegistryConfig,
    state: RegistryState,
    coprocessor: Arc<dyn Coprocessor>,
    pending_events: Vec<RegistryEvent>,
}

impl Registry {
    pub fn new(config: RegistryConfig, coprocessor: Arc<dyn Coprocessor>) -> Self {
        Self::from_state(config, RegistryState::default(), coprocessor)
    }

    pub fn from_state(
        config: RegistryConfig,
        state: RegistryState,
        coprocessor: Arc<dyn Coprocessor>,
    ) -> Self {
        Self {
            config,
            state,
            coprocessor,
            pending_events: Vec::new(),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn state(&self) -> &RegistryState {
        &self.state
    }

    /// Replace the state wholesale (rollback after a failed commit).
    pub fn restore(&mut self, state: RegistryState) {
        self.state = state;
        self.pending_events.clear();
    }

    /// Take the events emitted since the last call.
    pub fn take_events(&mut self) -> Vec<RegistryEvent> {
        std::mem::take(&mut self.pending_events)
    }

    fn emit(&mut self, event: RegistryEvent) {
        self.pending_events.push(event);
    }

    // =========================================================================
    // Teams and athletes
    // =========================================================================

    pub fn create_team(
        &mut self,
        ctx: TxContext,
        name: &str,
        salary_cap: &EncryptedInput,
    ) -> RegistryResult<u64> {
        let name = validate_name(name)?;
        if self.state.team_by_manager.contains_key(&ctx.caller) {
            return Err(RegistryError::DuplicateManager(ctx.caller));
        }
        self.verify_input(salary_cap, ctx.caller)?;
        let payroll = self.coprocessor.trivial_encrypt(0)?;

        let team_id = self.state.team_count + 1;
        self.state.team_count = team_id;
        self.state.teams.insert(
            team_id,
            Team {
                id: team_id,
                name: name.clone(),
                manager: ctx.caller,
                encrypted_salary_cap: salary_cap.handle,
                encrypted_payroll: payroll,
                member_athlete_ids: Vec::new(),
                is_active: true,
                created_at: ctx.timestamp,
            },
        );
        self.state.team_by_manager.insert(ctx.caller, team_id);

        self.emit(RegistryEvent::TeamCreated {
            team_id,
            name,
            manager: ctx.caller,
        });
        Ok(team_id)
    }

    pub fn register_athlete(&mut self, ctx: TxContext, name: &str) -> RegistryResult<u64> {
        let name = validate_name(name)?;
        if self.state.athlete_by_wallet.contains_key(&ctx.caller) {
            return Err(RegistryError::DuplicateWallet(ctx.caller));
        }
        let zero_salary = self.coprocessor.trivial_encrypt(0)?;
        let zero_bonus = self.coprocessor.trivial_encrypt(0)?;

        let athlete_id = self.state.athlete_count + 1;
        self.state.athlete_count = athlete_id;
        self.state.athletes.insert(
            athlete_id,
            Athlete {
                id: athlete_id,
                name: name.clone(),
                wallet: ctx.caller,
                current_team_id: 0,
                is_active: false,
                contract_end_date: 0,
                encrypted_salary: zero_salary,
                encrypted_bonus: zero_bonus,
                registered_at: ctx.timestamp,
            },
        );
        self.state.athlete_by_wallet.insert(ctx.caller, athlete_id);

        self.emit(RegistryEvent::AthleteRegistered {
            athlete_id,
            name,
            wallet: ctx.caller,
        });
        Ok(athlete_id)
    }

    /// Allow `grantee` to decrypt the athlete's salary and bonus. Idempotent.
    pub fn grant_salary_access(
        &mut self,
        ctx: TxContext,
        athlete_id: u64,
        grantee: Address,
    ) -> RegistryResult<()> {
        let athlete = self.athlete(athlete_id)?;
        if athlete.wallet != ctx.caller {
            return Err(RegistryError::NotAthleteOwner(athlete_id));
        }
        if self.state.salary_access.insert((athlete_id, grantee)) {
            self.emit(RegistryEvent::SalaryAccessGranted { athlete_id, grantee });
        }
        Ok(())
    }

    // =========================================================================
    // Proposals
    // =========================================================================

    pub fn create_proposal(&mut self, ctx: TxContext, new: &NewProposal) -> RegistryResult<u64> {
        if new.duration_months == 0 || new.duration_months > MAX_CONTRACT_MONTHS {
            return Err(RegistryError::InvalidDuration {
                max: MAX_CONTRACT_MONTHS,
            });
        }
        let team = self.team(new.team_id)?;
        if team.manager != ctx.caller {
            return Err(RegistryError::NotManager(new.team_id));
        }
        self.athlete(new.athlete_id)?;
        self.verify_input(&new.salary, ctx.caller)?;
        self.verify_input(&new.bonus, ctx.caller)?;

        let proposal_id = self.state.proposal_count + 1;
        self.state.proposal_count = proposal_id;
        self.state.proposals.insert(
            proposal_id,
            Proposal {
                id: proposal_id,
                athlete_id: new.athlete_id,
                team_id: new.team_id,
                proposer: ctx.caller,
                encrypted_salary: new.salary.handle,
                encrypted_bonus: new.bonus.handle,
                contract_duration_months: new.duration_months,
                created_at: ctx.timestamp,
                status: ProposalStatus::Pending,
                pending_request: None,
            },
        );

        self.emit(RegistryEvent::ProposalCreated {
            proposal_id,
            athlete_id: new.athlete_id,
            team_id: new.team_id,
        });
        Ok(proposal_id)
    }

    /// Withdraw a proposal. Team manager only.
    pub fn cancel_proposal(&mut self, ctx: TxContext, proposal_id: u64) -> RegistryResult<()> {
        let proposal = self.proposal(proposal_id)?;
        let manager = self.team(proposal.team_id)?.manager;
        if manager != ctx.caller {
            return Err(RegistryError::NotManager(proposal.team_id));
        }
        self.ensure_open(proposal, ctx.timestamp)?;

        self.set_status(proposal_id, ProposalStatus::Cancelled);
        self.emit(RegistryEvent::ProposalCancelled { proposal_id });
        Ok(())
    }

    /// Decline a proposal. Target athlete only.
    pub fn reject_proposal(&mut self, ctx: TxContext, proposal_id: u64) -> RegistryResult<()> {
        let proposal = self.proposal(proposal_id)?;
        self.ensure_athlete_wallet(proposal.athlete_id, ctx.caller)?;
        self.ensure_open(proposal, ctx.timestamp)?;
        let (athlete_id, team_id) = (proposal.athlete_id, proposal.team_id);

        self.set_status(proposal_id, ProposalStatus::Rejected);
        self.emit(RegistryEvent::ProposalRejected {
            proposal_id,
            athlete_id,
            team_id,
        });
        Ok(())
    }

    /// Accept a proposal, starting the compliance check. Target athlete only.
    ///
    /// The proposal stays Pending until the oracle answers; the returned
    /// value is the decryption request id.
    pub fn approve_proposal(&mut self, ctx: TxContext, proposal_id: u64) -> RegistryResult<u64> {
        let proposal = self.proposal(proposal_id)?;
        self.ensure_athlete_wallet(proposal.athlete_id, ctx.caller)?;
        self.ensure_open(proposal, ctx.timestamp)?;
        if let Some(blocking) = self.in_flight_decision(proposal.team_id, proposal.athlete_id) {
            return Err(RegistryError::AlreadyPendingDecision(blocking));
        }

        let team = self.team(proposal.team_id)?;
        let athlete = self.athlete(proposal.athlete_id)?;

        let base_payroll = if athlete.current_team_id == team.id {
            self.coprocessor
                .sub(team.encrypted_payroll, athlete.encrypted_salary)?
        } else {
            team.encrypted_payroll
        };
        let candidate = self
            .coprocessor
            .add(base_payroll, proposal.encrypted_salary)?;
        let is_compliant = self
            .coprocessor
            .le(candidate, team.encrypted_salary_cap)?;

        let request = DecryptionRequest {
            request_id: self.state.request_count + 1,
            proposal_id,
            team_id: proposal.team_id,
            athlete_id: proposal.athlete_id,
            handle: is_compliant,
            candidate_payroll: candidate,
            requested_at: ctx.timestamp,
            resolution: None,
        };
        let request_id = request.request_id;

        self.state.request_count = request_id;
        self.state.decryption_requests.insert(request_id, request);
        if let Some(p) = self.state.proposals.get_mut(&proposal_id) {
            p.pending_request = Some(request_id);
        }

        self.emit(RegistryEvent::DecryptionRequested {
            request_id,
            proposal_id,
        });
        Ok(request_id)
    }

    /// Finalize a stale Pending proposal as Expired. Anyone may call.
    pub fn expire_proposal(&mut self, ctx: TxContext, proposal_id: u64) -> RegistryResult<()> {
        let proposal = self.proposal(proposal_id)?;
        if proposal.status != ProposalStatus::Pending {
            return Err(RegistryError::InvalidState(proposal_id));
        }
        if !proposal.is_expired(ctx.timestamp, self.config.proposal_expiry_secs) {
            return Err(RegistryError::ProposalNotExpired(proposal_id));
        }
        let pending_request = proposal.pending_request;

        if let Some(request_id) = pending_request {
            self.resolve_request(request_id, Resolution::Expired);
        }
        self.set_status(proposal_id, ProposalStatus::Expired);
        self.emit(RegistryEvent::ProposalExpired { proposal_id });
        Ok(())
    }

    /// Apply the oracle's answer to a decryption request.
    ///
    /// The signature must recover to the configured oracle signer. Returns
    /// the proposal's new status.
    pub fn fulfill_compliance(
        &mut self,
        ctx: TxContext,
        request_id: u64,
        is_compliant: bool,
        signature: &[u8],
    ) -> RegistryResult<ProposalStatus> {
        let request = self
            .state
            .decryption_requests
            .get(&request_id)
            .ok_or(RegistryError::UnknownRequest(request_id))?;

        let signer = recover_callback_signer(
            self.config.contract_address,
            request_id,
            is_compliant,
            signature,
        )
        .map_err(|_| RegistryError::UnauthorizedCallback)?;
        if signer != self.config.oracle_signer {
            return Err(RegistryError::UnauthorizedCallback);
        }
        if !request.is_pending() {
            return Err(RegistryError::AlreadyResolved(request_id));
        }

        let request = request.clone();
        let proposal = self.proposal(request.proposal_id)?;

        if proposal.is_expired(ctx.timestamp, self.config.proposal_expiry_secs) {
            self.resolve_request(request_id, Resolution::Expired);
            self.set_status(request.proposal_id, ProposalStatus::Expired);
            self.emit(RegistryEvent::ProposalExpired {
                proposal_id: request.proposal_id,
            });
            return Ok(ProposalStatus::Expired);
        }

        if !is_compliant {
            self.resolve_request(request_id, Resolution::NonCompliant);
            self.set_status(request.proposal_id, ProposalStatus::Rejected);
            self.emit(RegistryEvent::ProposalRejected {
                proposal_id: request.proposal_id,
                athlete_id: request.athlete_id,
                team_id: request.team_id,
            });
            return Ok(ProposalStatus::Rejected);
        }

        self.apply_approval(ctx, &request)?;
        Ok(ProposalStatus::Approved)
    }

    fn apply_approval(&mut self, ctx: TxContext, request: &DecryptionRequest) -> RegistryResult<()> {
        let proposal = self.proposal(request.proposal_id)?.clone();
        let athlete = self.athlete(request.athlete_id)?.clone();
        let previous_team_id = athlete.current_team_id;

        // Compute everything fallible before touching state.
        let previous_team_payroll = if previous_team_id != 0 && previous_team_id != request.team_id {
            let previous = self.team(previous_team_id)?;
            Some(
                self.coprocessor
                    .sub(previous.encrypted_payroll, athlete.encrypted_salary)?,
            )
        } else {
            None
        };
        self.team(request.team_id)?;

        if let Some(payroll) = previous_team_payroll {
            if let Some(previous) = self.state.teams.get_mut(&previous_team_id) {
                previous.encrypted_payroll = payroll;
                previous.member_athlete_ids.retain(|id| *id != athlete.id);
            }
        }

        if let Some(team) = self.state.teams.get_mut(&request.team_id) {
            team.encrypted_payroll = request.candidate_payroll;
            if !team.member_athlete_ids.contains(&athlete.id) {
                team.member_athlete_ids.push(athlete.id);
            }
        }

        if let Some(a) = self.state.athletes.get_mut(&athlete.id) {
            a.current_team_id = request.team_id;
            a.encrypted_salary = proposal.encrypted_salary;
            a.encrypted_bonus = proposal.encrypted_bonus;
            a.contract_end_date = ctx.timestamp.saturating_add(
                proposal
                    .contract_duration_months
                    .saturating_mul(SECONDS_PER_MONTH),
            );
            a.is_active = true;
        }

        self.resolve_request(request.request_id, Resolution::Compliant);
        self.set_status(proposal.id, ProposalStatus::Approved);

        self.emit(RegistryEvent::ProposalApproved {
            proposal_id: proposal.id,
            athlete_id: athlete.id,
            team_id: request.team_id,
        });
        self.emit(RegistryEvent::SalaryUpdated {
            athlete_id: athlete.id,
            team_id: request.team_id,
        });
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn get_team_info(&self, team_id: u64) -> RegistryResult<TeamInfo> {
        let team = self.team(team_id)?;
        Ok(TeamInfo {
            id: team.id,
            name: team.name.clone(),
            manager: team.manager,
            athlete_count: team.member_athlete_ids.len() as u64,
            is_active: team.is_active,
            salary_cap_handle: Some(team.encrypted_salary_cap),
        })
    }

    pub fn get_team_athletes(&self, team_id: u64) -> RegistryResult<Vec<u64>> {
        Ok(self.team(team_id)?.member_athlete_ids.clone())
    }

    pub fn get_athlete_info(&self, athlete_id: u64) -> RegistryResult<AthleteInfo> {
        let athlete = self.athlete(athlete_id)?;
        Ok(AthleteInfo {
            id: athlete.id,
            name: athlete.name.clone(),
            wallet: Some(athlete.wallet),
            team_id: athlete.current_team_id,
            is_active: athlete.is_active,
            contract_end_date: athlete.contract_end_date,
            salary_handle: Some(athlete.encrypted_salary),
            bonus_handle: Some(athlete.encrypted_bonus),
        })
    }

    /// Proposal view with the status as observed at `now`.
    pub fn get_proposal_info(&self, proposal_id: u64, now: u64) -> RegistryResult<ProposalInfo> {
        Ok(self.proposal_view(self.proposal(proposal_id)?, now))
    }

    pub fn list_proposals(&self, filter: ProposalFilter, now: u64) -> Vec<ProposalInfo> {
        self.state
            .proposals
            .values()
            .filter(|p| filter.matches(p))
            .map(|p| self.proposal_view(p, now))
            .collect()
    }

    pub fn team_count(&self) -> u64 {
        self.state.team_count
    }

    pub fn athlete_count(&self) -> u64 {
        self.state.athlete_count
    }

    pub fn proposal_count(&self) -> u64 {
        self.state.proposal_count
    }

    pub fn owner(&self) -> Address {
        self.config.owner
    }

    pub fn proposal_expiry(&self) -> u64 {
        self.config.proposal_expiry_secs
    }

    /// Athlete id registered by `wallet`, or 0.
    pub fn athlete_by_wallet(&self, wallet: Address) -> u64 {
        self.state.athlete_by_wallet.get(&wallet).copied().unwrap_or(0)
    }

    /// Team id managed by `manager`, or 0.
    pub fn team_by_manager(&self, manager: Address) -> u64 {
        self.state.team_by_manager.get(&manager).copied().unwrap_or(0)
    }

    pub fn decryption_request(&self, request_id: u64) -> RegistryResult<&DecryptionRequest> {
        self.state
            .decryption_requests
            .get(&request_id)
            .ok_or(RegistryError::UnknownRequest(request_id))
    }

    pub fn pending_requests(&self) -> Vec<DecryptionRequest> {
        self.state
            .decryption_requests
            .values()
            .filter(|r| r.is_pending())
            .cloned()
            .collect()
    }

    pub fn can_view_compensation(&self, athlete_id: u64, viewer: Address) -> RegistryResult<bool> {
        let athlete = self.athlete(athlete_id)?;
        Ok(athlete.wallet == viewer || self.state.salary_access.contains(&(athlete_id, viewer)))
    }

    /// Decrypt salary and bonus for an authorized viewer.
    pub fn reveal_compensation(
        &self,
        athlete_id: u64,
        requester: Address,
    ) -> RegistryResult<Compensation> {
        if !self.can_view_compensation(athlete_id, requester)? {
            return Err(RegistryError::NotAuthorizedToView(athlete_id));
        }
        let athlete = self.athlete(athlete_id)?;
        Ok(Compensation {
            athlete_id,
            salary: self.coprocessor.decrypt_u64(athlete.encrypted_salary)?,
            bonus: self.coprocessor.decrypt_u64(athlete.encrypted_bonus)?,
        })
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn team(&self, team_id: u64) -> RegistryResult<&Team> {
        self.state
            .teams
            .get(&team_id)
            .ok_or(RegistryError::UnknownTeam(team_id))
    }

    fn athlete(&self, athlete_id: u64) -> RegistryResult<&Athlete> {
        self.state
            .athletes
            .get(&athlete_id)
            .ok_or(RegistryError::UnknownAthlete(athlete_id))
    }

    fn proposal(&self, proposal_id: u64) -> RegistryResult<&Proposal> {
        self.state
            .proposals
            .get(&proposal_id)
            .ok_or(RegistryError::UnknownProposal(proposal_id))
    }

    fn verify_input(&self, input: &EncryptedInput, submitter: Address) -> RegistryResult<()> {
        self.coprocessor
            .verify_input(input, self.config.contract_address, submitter)
            .map_err(RegistryError::InvalidProof)
    }

    fn ensure_athlete_wallet(&self, athlete_id: u64, caller: Address) -> RegistryResult<()> {
        if self.athlete(athlete_id)?.wallet != caller {
            return Err(RegistryError::NotAthleteOwner(athlete_id));
        }
        Ok(())
    }

    /// Pending, not expired and not awaiting the oracle.
    fn ensure_open(&self, proposal: &Proposal, now: u64) -> RegistryResult<()> {
        if proposal.status != ProposalStatus::Pending {
            return Err(RegistryError::InvalidState(proposal.id));
        }
        if proposal.is_expired(now, self.config.proposal_expiry_secs) {
            return Err(RegistryError::ProposalExpired(proposal.id));
        }
        if proposal.awaiting_decision() {
            return Err(RegistryError::AlreadyPendingDecision(proposal.id));
        }
        Ok(())
    }

    /// Teams whose payroll an approval for `athlete_id` into `team_id`
    /// rewrites: the target team and the team the athlete would leave.
    fn payroll_teams(&self, team_id: u64, athlete_id: u64) -> [u64; 2] {
        let current = self
            .state
            .athletes
            .get(&athlete_id)
            .map_or(0, |a| a.current_team_id);
        [team_id, current]
    }

    /// Proposal id whose decision blocks a new one for this team or athlete.
    ///
    /// Requests store an absolute candidate payroll, so no two pending
    /// requests may touch the same athlete or the same team's payroll.
    fn in_flight_decision(&self, team_id: u64, athlete_id: u64) -> Option<u64> {
        let touched = self.payroll_teams(team_id, athlete_id);
        self.state
            .decryption_requests
            .values()
            .filter(|r| r.is_pending())
            .find(|r| {
                r.athlete_id == athlete_id
                    || self
                        .payroll_teams(r.team_id, r.athlete_id)
                        .iter()
                        .any(|t| *t != 0 && touched.contains(t))
            })
            .map(|r| r.proposal_id)
    }

    fn set_status(&mut self, proposal_id: u64, status: ProposalStatus) {
        if let Some(p) = self.state.proposals.get_mut(&proposal_id) {
            p.status = status;
            p.pending_request = None;
        }
    }

    fn resolve_request(&mut self, request_id: u64, resolution: Resolution) {
        if let Some(r) = self.state.decryption_requests.get_mut(&request_id) {
            r.resolution = Some(resolution);
        }
    }

    fn proposal_view(&self, p: &Proposal, now: u64) -> ProposalInfo {
        let expiry = self.config.proposal_expiry_secs;
        ProposalInfo {
            id: p.id,
            athlete_id: p.athlete_id,
            team_id: p.team_id,
            contract_duration_months: p.contract_duration_months,
            created_at: p.created_at,
            expires_at: p.expires_at(expiry),
            status: p.effective_status(now, expiry),
            awaiting_decision: p.awaiting_decision(),
            salary_handle: Some(p.encrypted_salary),
            bonus_handle: Some(p.encrypted_bonus),
        }
    }
}

fn validate_name(name: &str) -> RegistryResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_NAME_LEN {
        return Err(RegistryError::InvalidName { max: MAX_NAME_LEN });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fhe::MockCoprocessor;
    use crate::gateway::OracleSigner;

    const CONTRACT: Address = Address::repeat_byte(0xc0);
    const OWNER: Address = Address::repeat_byte(0x01);
    const MANAGER: Address = Address::repeat_byte(0x11);
    const OTHER_MANAGER: Address = Address::repeat_byte(0x22);
    const ALICE: Address = Address::repeat_byte(0xa1);
    const BOB: Address = Address::repeat_byte(0xb0);
    const EXPIRY: u64 = 1_000;
    const T0: u64 = 10_000;

    struct Fixture {
        registry: Registry,
        fhe: Arc<MockCoprocessor>,
        oracle: OracleSigner,
    }

    impl Fixture {
        fn new() -> Self {
            let fhe = Arc::new(MockCoprocessor::random());
            let oracle = OracleSigner::random();
            let config =
                RegistryConfig::new(CONTRACT, OWNER, oracle.address()).with_proposal_expiry(EXPIRY);
            Self {
                registry: Registry::new(config, fhe.clone()),
                fhe,
                oracle,
            }
        }

        fn input(&self, value: u64, submitter: Address) -> EncryptedInput {
            self.fhe.encrypt_input(value, CONTRACT, submitter)
        }

        fn team(&mut self, manager: Address, name: &str, cap: u64) -> u64 {
            let cap = self.input(cap, manager);
            self.registry
                .create_team(TxContext::new(manager, T0), name, &cap)
                .unwrap()
        }

        fn athlete(&mut self, wallet: Address, name: &str) -> u64 {
            self.registry
                .register_athlete(TxContext::new(wallet, T0), name)
                .unwrap()
        }

        fn proposal(&mut self, manager: Address, team_id: u64, athlete_id: u64, salary: u64) -> u64 {
            let new = NewProposal {
                athlete_id,
                team_id,
                salary: self.input(salary, manager),
                bonus: self.input(10, manager),
                duration_months: 12,
            };
            self.registry
                .create_proposal(TxContext::new(manager, T0), &new)
                .unwrap()
        }

        fn callback(&mut self, request_id: u64, result: bool, at: u64) -> RegistryResult<ProposalStatus> {
            let signature = self.oracle.sign_callback(CONTRACT, request_id, result).unwrap();
            self.registry.fulfill_compliance(
                TxContext::new(self.oracle.address(), at),
                request_id,
                result,
                &signature,
            )
        }

        /// Falcons (cap 1000) + Alice + proposal 1 (salary 100), approved.
        fn falcons_awaiting_decision() -> (Self, u64) {
            let mut f = Self::new();
            f.team(MANAGER, "Falcons", 1_000);
            f.athlete(ALICE, "Alice");
            f.proposal(MANAGER, 1, 1, 100);
            let request_id = f
                .registry
                .approve_proposal(TxContext::new(ALICE, T0 + 1), 1)
                .unwrap();
            (f, request_id)
        }

        fn payroll(&self, team_id: u64) -> u64 {
            let team = &self.registry.state().teams[&team_id];
            self.fhe.decrypt_u64(team.encrypted_payroll).unwrap()
        }
    }

    #[test]
    fn team_ids_are_sequential_and_stable() {
        let mut f = Fixture::new();
        assert_eq!(f.team(MANAGER, "Falcons", 1_000), 1);
        assert_eq!(f.team(OTHER_MANAGER, "Hawks", 500), 2);
        assert_eq!(f.registry.team_count(), 2);

        let info = f.registry.get_team_info(1).unwrap();
        assert_eq!(info.name, "Falcons");
        assert_eq!(info.manager, MANAGER);
        assert_eq!(info.athlete_count, 0);
        assert_eq!(f.registry.team_by_manager(MANAGER), 1);
        assert_eq!(f.registry.team_by_manager(BOB), 0);
    }

    #[test]
    fn manager_may_run_only_one_team() {
        let mut f = Fixture::new();
        f.team(MANAGER, "Falcons", 1_000);
        let cap = f.input(1, MANAGER);
        let err = f
            .registry
            .create_team(TxContext::new(MANAGER, T0), "Falcons II", &cap)
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateManager(MANAGER));
        assert_eq!(f.registry.team_count(), 1);
    }

    #[test]
    fn create_team_rejects_proof_for_other_submitter() {
        let mut f = Fixture::new();
        let cap = f.input(1_000, BOB);
        let err = f
            .registry
            .create_team(TxContext::new(MANAGER, T0), "Falcons", &cap)
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidProof(_)));
        assert_eq!(f.registry.team_count(), 0);
        assert!(f.registry.take_events().is_empty());
    }

    #[test]
    fn names_are_validated() {
        let mut f = Fixture::new();
        let err = f
            .registry
            .register_athlete(TxContext::new(ALICE, T0), "   ")
            .unwrap_err();
        assert_eq!(err, RegistryError::InvalidName { max: MAX_NAME_LEN });

        let long = "x".repeat(MAX_NAME_LEN + 1);
        assert!(f
            .registry
            .register_athlete(TxContext::new(ALICE, T0), &long)
            .is_err());

        f.athlete(ALICE, "  Alice ");
        assert_eq!(f.registry.get_athlete_info(1).unwrap().name, "Alice");
    }

    #[test]
    fn wallet_may_register_only_one_athlete() {
        let mut f = Fixture::new();
        assert_eq!(f.athlete(ALICE, "Alice"), 1);
        for _ in 0..2 {
            let err = f
                .registry
                .register_athlete(TxContext::new(ALICE, T0), "Alice again")
                .unwrap_err();
            assert_eq!(err, RegistryError::DuplicateWallet(ALICE));
        }
        assert_eq!(f.registry.athlete_count(), 1);
        assert_eq!(f.registry.athlete_by_wallet(ALICE), 1);
    }

    #[test]
    fn create_proposal_checks_caller_ids_and_duration() {
        let mut f = Fixture::new();
        f.team(MANAGER, "Falcons", 1_000);
        f.athlete(ALICE, "Alice");

        let mut new = NewProposal {
            athlete_id: 1,
            team_id: 1,
            salary: f.input(100, BOB),
            bonus: f.input(10, BOB),
            duration_months: 12,
        };
        assert_eq!(
            f.registry.create_proposal(TxContext::new(BOB, T0), &new),
            Err(RegistryError::NotManager(1))
        );

        new.salary = f.input(100, MANAGER);
        new.bonus = f.input(10, MANAGER);
        new.athlete_id = 9;
        assert_eq!(
            f.registry.create_proposal(TxContext::new(MANAGER, T0), &new),
            Err(RegistryError::UnknownAthlete(9))
        );

        new.athlete_id = 1;
        new.team_id = 4;
        assert_eq!(
            f.registry.create_proposal(TxContext::new(MANAGER, T0), &new),
            Err(RegistryError::UnknownTeam(4))
        );

        new.team_id = 1;
        new.duration_months = 0;
        assert!(matches!(
            f.registry.create_proposal(TxContext::new(MANAGER, T0), &new),
            Err(RegistryError::InvalidDuration { .. })
        ));

        new.duration_months = 12;
        new.bonus = f.input(10, BOB);
        assert!(matches!(
            f.registry.create_proposal(TxContext::new(MANAGER, T0), &new),
            Err(RegistryError::InvalidProof(_))
        ));
        assert_eq!(f.registry.proposal_count(), 0);
    }

    #[test]
    fn compliant_callback_approves_and_updates_athlete() {
        let (mut f, request_id) = Fixture::falcons_awaiting_decision();
        assert_eq!(request_id, 1);

        let info = f.registry.get_proposal_info(1, T0 + 1).unwrap();
        assert_eq!(info.status, ProposalStatus::Pending);
        assert!(info.awaiting_decision);

        assert_eq!(f.callback(1, true, T0 + 2), Ok(ProposalStatus::Approved));

        let info = f.registry.get_proposal_info(1, T0 + 2).unwrap();
        assert_eq!(info.status, ProposalStatus::Approved);
        assert!(!info.awaiting_decision);

        let alice = f.registry.get_athlete_info(1).unwrap();
        assert_eq!(alice.team_id, 1);
        assert!(alice.is_active);
        assert_eq!(alice.contract_end_date, T0 + 2 + 12 * SECONDS_PER_MONTH);
        assert_eq!(f.registry.get_team_athletes(1).unwrap(), vec![1]);
        assert_eq!(f.payroll(1), 100);

        let comp = f.registry.reveal_compensation(1, ALICE).unwrap();
        assert_eq!((comp.salary, comp.bonus), (100, 10));
    }

    #[test]
    fn non_compliant_callback_rejects() {
        let (mut f, request_id) = Fixture::falcons_awaiting_decision();
        assert_eq!(f.callback(request_id, false, T0 + 2), Ok(ProposalStatus::Rejected));

        assert_eq!(
            f.registry.get_proposal_info(1, T0 + 2).unwrap().status,
            ProposalStatus::Rejected
        );
        assert_eq!(f.registry.get_athlete_info(1).unwrap().team_id, 0);
        assert_eq!(f.payroll(1), 0);
        assert_eq!(
            f.registry.decryption_request(1).unwrap().resolution,
            Some(Resolution::NonCompliant)
        );
    }

    #[test]
    fn over_cap_salary_decrypts_to_false() {
        let mut f = Fixture::new();
        f.team(MANAGER, "Falcons", 50);
        f.athlete(ALICE, "Alice");
        f.proposal(MANAGER, 1, 1, 100);
        let request_id = f
            .registry
            .approve_proposal(TxContext::new(ALICE, T0), 1)
            .unwrap();
        let handle = f.registry.decryption_request(request_id).unwrap().handle;
        assert!(!f.fhe.decrypt_bool(handle).unwrap());
    }

    #[test]
    fn replayed_callback_is_already_resolved() {
        let (mut f, request_id) = Fixture::falcons_awaiting_decision();
        f.callback(request_id, true, T0 + 2).unwrap();
        let events_before = f.registry.take_events().len();
        assert!(events_before > 0);

        assert_eq!(
            f.callback(request_id, true, T0 + 3),
            Err(RegistryError::AlreadyResolved(request_id))
        );
        assert!(f.registry.take_events().is_empty());
        assert_eq!(f.payroll(1), 100);
    }

    #[test]
    fn callback_requires_oracle_signature() {
        let (mut f, request_id) = Fixture::falcons_awaiting_decision();
        let impostor = OracleSigner::random();
        let signature = impostor.sign_callback(CONTRACT, request_id, true).unwrap();
        assert_eq!(
            f.registry.fulfill_compliance(
                TxContext::new(impostor.address(), T0 + 2),
                request_id,
                true,
                &signature
            ),
            Err(RegistryError::UnauthorizedCallback)
        );

        // A genuine signature over `false` cannot be replayed as `true`.
        let signature = f.oracle.sign_callback(CONTRACT, request_id, false).unwrap();
        assert_eq!(
            f.registry.fulfill_compliance(
                TxContext::new(BOB, T0 + 2),
                request_id,
                true,
                &signature
            ),
            Err(RegistryError::UnauthorizedCallback)
        );

        assert_eq!(
            f.registry
                .fulfill_compliance(TxContext::new(BOB, T0 + 2), request_id, true, &[1, 2, 3]),
            Err(RegistryError::UnauthorizedCallback)
        );
        assert_eq!(
            f.callback(99, true, T0 + 2),
            Err(RegistryError::UnknownRequest(99))
        );
    }

    #[test]
    fn second_approve_is_already_pending() {
        let (mut f, _) = Fixture::falcons_awaiting_decision();
        assert_eq!(
            f.registry.approve_proposal(TxContext::new(ALICE, T0 + 2), 1),
            Err(RegistryError::AlreadyPendingDecision(1))
        );
        assert_eq!(
            f.registry.reject_proposal(TxContext::new(ALICE, T0 + 2), 1),
            Err(RegistryError::AlreadyPendingDecision(1))
        );
        assert_eq!(
            f.registry.cancel_proposal(TxContext::new(MANAGER, T0 + 2), 1),
            Err(RegistryError::AlreadyPendingDecision(1))
        );
    }

    #[test]
    fn one_decision_in_flight_per_team() {
        let (mut f, _) = Fixture::falcons_awaiting_decision();
        f.athlete(BOB, "Bob");
        let second = f.proposal(MANAGER, 1, 2, 100);
        assert_eq!(
            f.registry.approve_proposal(TxContext::new(BOB, T0 + 2), second),
            Err(RegistryError::AlreadyPendingDecision(1))
        );

        f.callback(1, true, T0 + 3).unwrap();
        assert!(f
            .registry
            .approve_proposal(TxContext::new(BOB, T0 + 4), second)
            .is_ok());
    }

    #[test]
    fn expired_proposal_cannot_be_approved_or_rejected() {
        let mut f = Fixture::new();
        f.team(MANAGER, "Falcons", 1_000);
        f.athlete(ALICE, "Alice");
        f.proposal(MANAGER, 1, 1, 100);
        let late = T0 + EXPIRY + 1;

        assert_eq!(
            f.registry.get_proposal_info(1, late).unwrap().status,
            ProposalStatus::Expired
        );
        assert_eq!(
            f.registry.approve_proposal(TxContext::new(ALICE, late), 1),
            Err(RegistryError::ProposalExpired(1))
        );
        assert_eq!(
            f.registry.reject_proposal(TxContext::new(ALICE, late), 1),
            Err(RegistryError::ProposalExpired(1))
        );
        assert_eq!(
            f.registry.cancel_proposal(TxContext::new(MANAGER, late), 1),
            Err(RegistryError::ProposalExpired(1))
        );
        // Stored status is untouched until finalized.
        assert_eq!(
            f.registry.state().proposals[&1].status,
            ProposalStatus::Pending
        );
    }

    #[test]
    fn expire_proposal_finalizes_and_closes_request() {
        let (mut f, request_id) = Fixture::falcons_awaiting_decision();
        assert_eq!(
            f.registry.expire_proposal(TxContext::new(BOB, T0 + EXPIRY), 1),
            Err(RegistryError::ProposalNotExpired(1))
        );

        f.registry
            .expire_proposal(TxContext::new(BOB, T0 + EXPIRY + 1), 1)
            .unwrap();
        assert_eq!(f.registry.state().proposals[&1].status, ProposalStatus::Expired);
        assert!(f.registry.pending_requests().is_empty());

        assert_eq!(
            f.callback(request_id, true, T0 + EXPIRY + 2),
            Err(RegistryError::AlreadyResolved(request_id))
        );
        assert_eq!(
            f.registry.expire_proposal(TxContext::new(BOB, T0 + EXPIRY + 3), 1),
            Err(RegistryError::InvalidState(1))
        );
    }

    #[test]
    fn late_callback_expires_proposal() {
        let (mut f, request_id) = Fixture::falcons_awaiting_decision();
        assert_eq!(
            f.callback(request_id, true, T0 + EXPIRY + 5),
            Ok(ProposalStatus::Expired)
        );
        assert_eq!(f.registry.get_athlete_info(1).unwrap().team_id, 0);
        assert_eq!(f.payroll(1), 0);
    }

    #[test]
    fn cancel_and_reject_require_role() {
        let mut f = Fixture::new();
        f.team(MANAGER, "Falcons", 1_000);
        f.athlete(ALICE, "Alice");
        f.proposal(MANAGER, 1, 1, 100);
        f.proposal(MANAGER, 1, 1, 200);

        assert_eq!(
            f.registry.cancel_proposal(TxContext::new(ALICE, T0), 1),
            Err(RegistryError::NotManager(1))
        );
        assert_eq!(
            f.registry.reject_proposal(TxContext::new(MANAGER, T0), 1),
            Err(RegistryError::NotAthleteOwner(1))
        );
        assert_eq!(
            f.registry.approve_proposal(TxContext::new(BOB, T0), 1),
            Err(RegistryError::NotAthleteOwner(1))
        );

        f.registry.cancel_proposal(TxContext::new(MANAGER, T0), 1).unwrap();
        f.registry.reject_proposal(TxContext::new(ALICE, T0), 2).unwrap();
        assert_eq!(
            f.registry.cancel_proposal(TxContext::new(MANAGER, T0), 1),
            Err(RegistryError::InvalidState(1))
        );
        assert_eq!(
            f.registry.approve_proposal(TxContext::new(ALICE, T0), 2),
            Err(RegistryError::InvalidState(2))
        );

        let statuses: Vec<_> = f
            .registry
            .list_proposals(ProposalFilter::default(), T0)
            .into_iter()
            .map(|p| p.status)
            .collect();
        assert_eq!(statuses, vec![ProposalStatus::Cancelled, ProposalStatus::Rejected]);
    }

    #[test]
    fn renegotiation_replaces_old_salary_in_payroll() {
        let (mut f, _) = Fixture::falcons_awaiting_decision();
        f.callback(1, true, T0 + 2).unwrap();
        assert_eq!(f.payroll(1), 100);

        let raise = f.proposal(MANAGER, 1, 1, 950);
        let request_id = f
            .registry
            .approve_proposal(TxContext::new(ALICE, T0 + 3), raise)
            .unwrap();
        assert_eq!(f.callback(request_id, true, T0 + 4), Ok(ProposalStatus::Approved));
        assert_eq!(f.payroll(1), 950);
        assert_eq!(f.registry.get_team_athletes(1).unwrap(), vec![1]);
    }

    #[test]
    fn transfer_moves_athlete_between_teams() {
        let (mut f, _) = Fixture::falcons_awaiting_decision();
        f.callback(1, true, T0 + 2).unwrap();
        f.team(OTHER_MANAGER, "Hawks", 500);

        let offer = f.proposal(OTHER_MANAGER, 2, 1, 300);
        let request_id = f
            .registry
            .approve_proposal(TxContext::new(ALICE, T0 + 3), offer)
            .unwrap();
        f.callback(request_id, true, T0 + 4).unwrap();

        assert_eq!(f.registry.get_athlete_info(1).unwrap().team_id, 2);
        assert!(f.registry.get_team_athletes(1).unwrap().is_empty());
        assert_eq!(f.registry.get_team_athletes(2).unwrap(), vec![1]);
        assert_eq!(f.payroll(1), 0);
        assert_eq!(f.payroll(2), 300);
    }

    #[test]
    fn pending_transfer_blocks_approvals_into_the_departing_team() {
        let (mut f, _) = Fixture::falcons_awaiting_decision();
        f.callback(1, true, T0 + 2).unwrap();
        f.team(OTHER_MANAGER, "Hawks", 1_000);
        f.athlete(BOB, "Bob");

        let transfer = f.proposal(OTHER_MANAGER, 2, 1, 300);
        let transfer_request = f
            .registry
            .approve_proposal(TxContext::new(ALICE, T0 + 3), transfer)
            .unwrap();

        let signing = f.proposal(MANAGER, 1, 2, 200);
        assert_eq!(
            f.registry.approve_proposal(TxContext::new(BOB, T0 + 4), signing),
            Err(RegistryError::AlreadyPendingDecision(transfer))
        );

        f.callback(transfer_request, true, T0 + 5).unwrap();
        assert_eq!(f.payroll(1), 0);

        let signing_request = f
            .registry
            .approve_proposal(TxContext::new(BOB, T0 + 6), signing)
            .unwrap();
        assert_eq!(f.callback(signing_request, true, T0 + 7), Ok(ProposalStatus::Approved));
        assert_eq!(f.registry.get_team_athletes(1).unwrap(), vec![2]);
        assert_eq!(f.payroll(1), 200);
        assert_eq!(f.payroll(2), 300);
    }

    #[test]
    fn pending_signing_blocks_transfers_out_of_the_same_team() {
        let (mut f, _) = Fixture::falcons_awaiting_decision();
        f.callback(1, true, T0 + 2).unwrap();
        f.team(OTHER_MANAGER, "Hawks", 1_000);
        f.athlete(BOB, "Bob");

        let signing = f.proposal(MANAGER, 1, 2, 200);
        f.registry
            .approve_proposal(TxContext::new(BOB, T0 + 3), signing)
            .unwrap();

        let transfer = f.proposal(OTHER_MANAGER, 2, 1, 300);
        assert_eq!(
            f.registry.approve_proposal(TxContext::new(ALICE, T0 + 4), transfer),
            Err(RegistryError::AlreadyPendingDecision(signing))
        );
    }

    #[test]
    fn salary_access_grants() {
        let (mut f, _) = Fixture::falcons_awaiting_decision();
        f.callback(1, true, T0 + 2).unwrap();
        f.registry.take_events();

        assert!(f.registry.can_view_compensation(1, ALICE).unwrap());
        assert!(!f.registry.can_view_compensation(1, BOB).unwrap());
        assert_eq!(
            f.registry.reveal_compensation(1, BOB),
            Err(RegistryError::NotAuthorizedToView(1))
        );
        assert_eq!(
            f.registry.grant_salary_access(TxContext::new(BOB, T0), 1, BOB),
            Err(RegistryError::NotAthleteOwner(1))
        );

        f.registry.grant_salary_access(TxContext::new(ALICE, T0), 1, BOB).unwrap();
        f.registry.grant_salary_access(TxContext::new(ALICE, T0), 1, BOB).unwrap();
        assert_eq!(f.registry.take_events().len(), 1);
        assert_eq!(f.registry.reveal_compensation(1, BOB).unwrap().salary, 100);
    }

    #[test]
    fn events_follow_the_happy_path() {
        let (mut f, _) = Fixture::falcons_awaiting_decision();
        f.callback(1, true, T0 + 2).unwrap();

        let names: Vec<_> = f.registry.take_events().iter().map(|e| e.name()).collect();
        assert_eq!(
            names,
            vec![
                "TeamCreated",
                "AthleteRegistered",
                "ProposalCreated",
                "DecryptionRequested",
                "ProposalApproved",
                "SalaryUpdated",
            ]
        );
    }

    #[test]
    fn state_round_trips_through_json() {
        let (mut f, _) = Fixture::falcons_awaiting_decision();
        f.registry.grant_salary_access(TxContext::new(ALICE, T0), 1, BOB).unwrap();

        let json = serde_json::to_string(f.registry.state()).unwrap();
        let state: RegistryState = serde_json::from_str(&json).unwrap();
        assert_eq!(&state, f.registry.state());

        let restored = Registry::from_state(f.registry.config().clone(), state, f.fhe.clone());
        assert_eq!(restored.pending_requests().len(), 1);
        assert!(restored.can_view_compensation(1, BOB).unwrap());
    }
}
