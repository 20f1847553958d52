// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Local Ledger
//!
//! Hosts a [`Registry`] in-process with the settlement guarantees a chain
//! would give it:
//!
//! - **Serialized writes**: one transaction at a time behind a write lock.
//! - **Block time**: every transaction is stamped from the [`Clock`].
//! - **Atomic commit**: state snapshot, emitted events and new ciphertexts
//!   are written in one redb transaction. On failure the registry is rolled
//!   back to its checkpoint.
//! - **Event log**: sequence-numbered, append-only.

use std::sync::Arc;

use alloy::primitives::{Address, Bytes};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::client::LedgerBackend;
use crate::clock::Clock;
use crate::fhe::{EncryptedInput, FheError, MockCoprocessor};
use crate::gateway::DecryptionRequest;
use crate::registry::{
    AthleteInfo, Compensation, ErrorKind, EventRecord, NewProposal, ProposalFilter, ProposalInfo,
    ProposalStatus, Registry, RegistryConfig, RegistryError, RegistryResult, TeamInfo, TxContext,
};
use crate::storage::{CommitBatch, RegistryDatabase, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Encryption error: {0}")]
    Fhe(#[from] FheError),

    #[error("Chain error: {0}")]
    Chain(String),

    #[error("Backend signs as {expected}, not {actual}")]
    SenderMismatch { expected: Address, actual: Address },
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::Registry(e) => e.kind(),
            LedgerError::SenderMismatch { .. } => ErrorKind::Authorization,
            LedgerError::Fhe(FheError::MalformedProof | FheError::ProofMismatch) => {
                ErrorKind::Validation
            }
            LedgerError::Storage(_) | LedgerError::Fhe(_) | LedgerError::Chain(_) => {
                ErrorKind::Internal
            }
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            LedgerError::Registry(e) => e.error_code(),
            LedgerError::Storage(_) => "storage_error",
            LedgerError::Fhe(_) => "encryption_error",
            LedgerError::Chain(_) => "chain_error",
            LedgerError::SenderMismatch { .. } => "sender_mismatch",
        }
    }

    /// The registry error, if this is one.
    pub fn as_registry(&self) -> Option<&RegistryError> {
        match self {
            LedgerError::Registry(e) => Some(e),
            _ => None,
        }
    }
}

struct ChainState {
    registry: Registry,
    events: Vec<EventRecord>,
}

struct Inner {
    chain: RwLock<ChainState>,
    clock: Arc<dyn Clock>,
    coprocessor: Arc<MockCoprocessor>,
    db: Option<RegistryDatabase>,
    contract_address: Address,
}

/// In-process registry host. Cheap to clone.
#[derive(Clone)]
pub struct LocalLedger {
    inner: Arc<Inner>,
}

impl LocalLedger {
    /// In-memory ledger.
    pub fn new(config: RegistryConfig, coprocessor: Arc<MockCoprocessor>, clock: Arc<dyn Clock>) -> Self {
        Self::build(config, coprocessor, clock, None, None, Vec::new())
    }

    /// Ledger persisted in `db`, resuming from its snapshot if one exists.
    pub fn open(
        config: RegistryConfig,
        coprocessor: Arc<MockCoprocessor>,
        clock: Arc<dyn Clock>,
        db: RegistryDatabase,
    ) -> Result<Self, LedgerError> {
        coprocessor.import(db.load_ciphertexts()?);
        let state = db.load_state()?;
        let events = db.load_events()?;

        info!(
            resumed = state.is_some(),
            events = events.len(),
            ciphertexts = coprocessor.len(),
            "Registry database loaded"
        );

        Ok(Self::build(config, coprocessor, clock, Some(db), state, events))
    }

    fn build(
        config: RegistryConfig,
        coprocessor: Arc<MockCoprocessor>,
        clock: Arc<dyn Clock>,
        db: Option<RegistryDatabase>,
        state: Option<crate::registry::RegistryState>,
        events: Vec<EventRecord>,
    ) -> Self {
        let contract_address = config.contract_address;
        let registry = Registry::from_state(config, state.unwrap_or_default(), coprocessor.clone());
        Self {
            inner: Arc::new(Inner {
                chain: RwLock::new(ChainState { registry, events }),
                clock,
                coprocessor,
                db,
                contract_address,
            }),
        }
    }

    pub fn contract_address(&self) -> Address {
        self.inner.contract_address
    }

    pub fn now(&self) -> u64 {
        self.inner.clock.now()
    }

    pub fn coprocessor(&self) -> &Arc<MockCoprocessor> {
        &self.inner.coprocessor
    }

    pub fn is_persistent(&self) -> bool {
        self.inner.db.is_some()
    }

    /// Check the database with a read transaction. `None` when in-memory.
    pub fn check_storage(&self) -> Option<Result<(), StorageError>> {
        self.inner.db.as_ref().map(|db| db.event_count().map(|_| ()))
    }

    /// Apply one transaction from `caller`.
    async fn submit<T>(
        &self,
        caller: Address,
        op: &'static str,
        apply: impl FnOnce(&mut Registry, TxContext) -> RegistryResult<T>,
    ) -> Result<T, LedgerError> {
        let mut chain = self.inner.chain.write().await;
        let ctx = TxContext::new(caller, self.inner.clock.now());
        let checkpoint = chain.registry.state().clone();

        let value = match apply(&mut chain.registry, ctx) {
            Ok(value) => value,
            Err(e) => {
                chain.registry.restore(checkpoint);
                debug!(op, caller = %caller, error_code = e.error_code(), error = %e, "Transaction rejected");
                return Err(e.into());
            }
        };

        let base = chain.events.len() as u64;
        let records: Vec<EventRecord> = chain
            .registry
            .take_events()
            .into_iter()
            .enumerate()
            .map(|(i, event)| EventRecord {
                sequence: base + i as u64 + 1,
                timestamp: ctx.timestamp,
                event,
            })
            .collect();

        let ciphertexts = self.inner.coprocessor.take_unpersisted();
        if let Some(db) = &self.inner.db {
            let batch = CommitBatch {
                state: chain.registry.state(),
                events: &records,
                ciphertexts: &ciphertexts,
            };
            if let Err(e) = db.commit(batch) {
                self.inner.coprocessor.restore_unpersisted(ciphertexts);
                chain.registry.restore(checkpoint);
                error!(op, error = %e, "Failed to persist transaction, rolled back");
                return Err(e.into());
            }
        }

        for record in &records {
            info!(
                op,
                sequence = record.sequence,
                event = record.event.name(),
                caller = %caller,
                "Registry event"
            );
        }
        chain.events.extend(records);
        Ok(value)
    }

    /// Encrypt `value` for `(contract, submitter)` on the local coprocessor
    /// and persist the ciphertext.
    pub fn register_input(
        &self,
        value: u64,
        contract: Address,
        submitter: Address,
    ) -> Result<EncryptedInput, LedgerError> {
        let input = self.inner.coprocessor.encrypt_input(value, contract, submitter);
        let entries = self.inner.coprocessor.take_unpersisted();
        if let Some(db) = &self.inner.db {
            if let Err(e) = db.put_ciphertexts(&entries) {
                self.inner.coprocessor.restore_unpersisted(entries);
                return Err(e.into());
            }
        }
        Ok(input)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    pub async fn create_team(
        &self,
        caller: Address,
        name: String,
        salary_cap: EncryptedInput,
    ) -> Result<u64, LedgerError> {
        self.submit(caller, "createTeam", |r, ctx| r.create_team(ctx, &name, &salary_cap))
            .await
    }

    pub async fn register_athlete(&self, caller: Address, name: String) -> Result<u64, LedgerError> {
        self.submit(caller, "registerAthlete", |r, ctx| r.register_athlete(ctx, &name))
            .await
    }

    pub async fn create_proposal(
        &self,
        caller: Address,
        proposal: NewProposal,
    ) -> Result<u64, LedgerError> {
        self.submit(caller, "createProposal", |r, ctx| r.create_proposal(ctx, &proposal))
            .await
    }

    /// Returns the decryption request id.
    pub async fn approve_proposal(&self, caller: Address, proposal_id: u64) -> Result<u64, LedgerError> {
        self.submit(caller, "approveProposal", |r, ctx| r.approve_proposal(ctx, proposal_id))
            .await
    }

    pub async fn reject_proposal(&self, caller: Address, proposal_id: u64) -> Result<(), LedgerError> {
        self.submit(caller, "rejectProposal", |r, ctx| r.reject_proposal(ctx, proposal_id))
            .await
    }

    pub async fn cancel_proposal(&self, caller: Address, proposal_id: u64) -> Result<(), LedgerError> {
        self.submit(caller, "cancelProposal", |r, ctx| r.cancel_proposal(ctx, proposal_id))
            .await
    }

    pub async fn expire_proposal(&self, caller: Address, proposal_id: u64) -> Result<(), LedgerError> {
        self.submit(caller, "expireProposal", |r, ctx| r.expire_proposal(ctx, proposal_id))
            .await
    }

    pub async fn grant_salary_access(
        &self,
        caller: Address,
        athlete_id: u64,
        grantee: Address,
    ) -> Result<(), LedgerError> {
        self.submit(caller, "grantSalaryAccess", |r, ctx| {
            r.grant_salary_access(ctx, athlete_id, grantee)
        })
        .await
    }

    /// Oracle callback entry point.
    pub async fn fulfill_compliance(
        &self,
        caller: Address,
        request_id: u64,
        is_compliant: bool,
        signature: Bytes,
    ) -> Result<ProposalStatus, LedgerError> {
        self.submit(caller, "fulfillCompliance", |r, ctx| {
            r.fulfill_compliance(ctx, request_id, is_compliant, &signature)
        })
        .await
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn get_team_info(&self, team_id: u64) -> Result<TeamInfo, LedgerError> {
        Ok(self.inner.chain.read().await.registry.get_team_info(team_id)?)
    }

    pub async fn get_team_athletes(&self, team_id: u64) -> Result<Vec<u64>, LedgerError> {
        Ok(self.inner.chain.read().await.registry.get_team_athletes(team_id)?)
    }

    pub async fn get_athlete_info(&self, athlete_id: u64) -> Result<AthleteInfo, LedgerError> {
        Ok(self.inner.chain.read().await.registry.get_athlete_info(athlete_id)?)
    }

    pub async fn get_proposal_info(&self, proposal_id: u64) -> Result<ProposalInfo, LedgerError> {
        let now = self.now();
        Ok(self
            .inner
            .chain
            .read()
            .await
            .registry
            .get_proposal_info(proposal_id, now)?)
    }

    pub async fn list_proposals(&self, filter: ProposalFilter) -> Vec<ProposalInfo> {
        let now = self.now();
        self.inner.chain.read().await.registry.list_proposals(filter, now)
    }

    pub async fn team_count(&self) -> u64 {
        self.inner.chain.read().await.registry.team_count()
    }

    pub async fn athlete_count(&self) -> u64 {
        self.inner.chain.read().await.registry.athlete_count()
    }

    pub async fn proposal_count(&self) -> u64 {
        self.inner.chain.read().await.registry.proposal_count()
    }

    pub async fn athlete_by_wallet(&self, wallet: Address) -> u64 {
        self.inner.chain.read().await.registry.athlete_by_wallet(wallet)
    }

    pub async fn team_by_manager(&self, manager: Address) -> u64 {
        self.inner.chain.read().await.registry.team_by_manager(manager)
    }

    pub async fn config(&self) -> RegistryConfig {
        self.inner.chain.read().await.registry.config().clone()
    }

    pub async fn pending_requests(&self) -> Vec<DecryptionRequest> {
        self.inner.chain.read().await.registry.pending_requests()
    }

    pub async fn decryption_request(&self, request_id: u64) -> Result<DecryptionRequest, LedgerError> {
        Ok(self
            .inner
            .chain
            .read()
            .await
            .registry
            .decryption_request(request_id)?
            .clone())
    }

    pub async fn can_view_compensation(
        &self,
        athlete_id: u64,
        viewer: Address,
    ) -> Result<bool, LedgerError> {
        Ok(self
            .inner
            .chain
            .read()
            .await
            .registry
            .can_view_compensation(athlete_id, viewer)?)
    }

    pub async fn reveal_compensation(
        &self,
        athlete_id: u64,
        requester: Address,
    ) -> Result<Compensation, LedgerError> {
        Ok(self
            .inner
            .chain
            .read()
            .await
            .registry
            .reveal_compensation(athlete_id, requester)?)
    }

    /// Events with `sequence > after`, oldest first, at most `limit`.
    pub async fn events(&self, after: u64, limit: usize) -> Vec<EventRecord> {
        let chain = self.inner.chain.read().await;
        let start = usize::try_from(after).unwrap_or(usize::MAX).min(chain.events.len());
        chain.events[start..].iter().take(limit).cloned().collect()
    }

    pub async fn event_count(&self) -> u64 {
        self.inner.chain.read().await.events.len() as u64
    }
}

impl LedgerBackend for LocalLedger {
    fn contract_address(&self) -> Address {
        self.inner.contract_address
    }

    async fn create_team(
        &self,
        caller: Address,
        name: String,
        salary_cap: EncryptedInput,
    ) -> Result<u64, LedgerError> {
        LocalLedger::create_team(self, caller, name, salary_cap).await
    }

    async fn register_athlete(&self, caller: Address, name: String) -> Result<u64, LedgerError> {
        LocalLedger::register_athlete(self, caller, name).await
    }

    async fn create_proposal(&self, caller: Address, proposal: NewProposal) -> Result<u64, LedgerError> {
        LocalLedger::create_proposal(self, caller, proposal).await
    }

    async fn approve_proposal(&self, caller: Address, proposal_id: u64) -> Result<(), LedgerError> {
        LocalLedger::approve_proposal(self, caller, proposal_id)
            .await
            .map(|_| ())
    }

    async fn reject_proposal(&self, caller: Address, proposal_id: u64) -> Result<(), LedgerError> {
        LocalLedger::reject_proposal(self, caller, proposal_id).await
    }

    async fn cancel_proposal(&self, caller: Address, proposal_id: u64) -> Result<(), LedgerError> {
        LocalLedger::cancel_proposal(self, caller, proposal_id).await
    }

    async fn expire_proposal(&self, caller: Address, proposal_id: u64) -> Result<(), LedgerError> {
        LocalLedger::expire_proposal(self, caller, proposal_id).await
    }

    async fn grant_salary_access(
        &self,
        caller: Address,
        athlete_id: u64,
        grantee: Address,
    ) -> Result<(), LedgerError> {
        LocalLedger::grant_salary_access(self, caller, athlete_id, grantee).await
    }

    async fn get_team_info(&self, team_id: u64) -> Result<TeamInfo, LedgerError> {
        LocalLedger::get_team_info(self, team_id).await
    }

    async fn get_athlete_info(&self, athlete_id: u64) -> Result<AthleteInfo, LedgerError> {
        LocalLedger::get_athlete_info(self, athlete_id).await
    }

    async fn get_proposal_info(&self, proposal_id: u64) -> Result<ProposalInfo, LedgerError> {
        LocalLedger::get_proposal_info(self, proposal_id).await
    }

    async fn get_team_athletes(&self, team_id: u64) -> Result<Vec<u64>, LedgerError> {
        LocalLedger::get_team_athletes(self, team_id).await
    }

    async fn team_count(&self) -> Result<u64, LedgerError> {
        Ok(LocalLedger::team_count(self).await)
    }

    async fn athlete_count(&self) -> Result<u64, LedgerError> {
        Ok(LocalLedger::athlete_count(self).await)
    }

    async fn proposal_count(&self) -> Result<u64, LedgerError> {
        Ok(LocalLedger::proposal_count(self).await)
    }

    async fn athlete_by_wallet(&self, wallet: Address) -> Result<u64, LedgerError> {
        Ok(LocalLedger::athlete_by_wallet(self, wallet).await)
    }

    async fn team_by_manager(&self, manager: Address) -> Result<u64, LedgerError> {
        Ok(LocalLedger::team_by_manager(self, manager).await)
    }

    async fn owner(&self) -> Result<Address, LedgerError> {
        Ok(self.config().await.owner)
    }

    async fn proposal_expiry(&self) -> Result<u64, LedgerError> {
        Ok(self.config().await.proposal_expiry_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::gateway::OracleSigner;
    use crate::registry::RegistryEvent;

    const CONTRACT: Address = Address::repeat_byte(0xc0);
    const MANAGER: Address = Address::repeat_byte(0x11);
    const ALICE: Address = Address::repeat_byte(0xa1);

    fn config(oracle: &OracleSigner) -> RegistryConfig {
        RegistryConfig::new(CONTRACT, MANAGER, oracle.address()).with_proposal_expiry(600)
    }

    #[tokio::test]
    async fn transactions_are_stamped_with_block_time() {
        let oracle = OracleSigner::random();
        let fhe = Arc::new(MockCoprocessor::random());
        let clock = Arc::new(ManualClock::new(5_000));
        let ledger = LocalLedger::new(config(&oracle), fhe.clone(), clock.clone());

        let cap = ledger.register_input(1_000, CONTRACT, MANAGER).unwrap();
        ledger.create_team(MANAGER, "Falcons".into(), cap).await.unwrap();
        ledger.register_athlete(ALICE, "Alice".into()).await.unwrap();

        let proposal = NewProposal {
            athlete_id: 1,
            team_id: 1,
            salary: ledger.register_input(100, CONTRACT, MANAGER).unwrap(),
            bonus: ledger.register_input(10, CONTRACT, MANAGER).unwrap(),
            duration_months: 12,
        };
        ledger.create_proposal(MANAGER, proposal).await.unwrap();

        let info = ledger.get_proposal_info(1).await.unwrap();
        assert_eq!(info.created_at, 5_000);
        assert_eq!(info.expires_at, 5_600);

        clock.advance(601);
        assert_eq!(
            ledger.get_proposal_info(1).await.unwrap().status,
            ProposalStatus::Expired
        );
        let err = ledger.approve_proposal(ALICE, 1).await.unwrap_err();
        assert_eq!(err.as_registry(), Some(&RegistryError::ProposalExpired(1)));
        assert_eq!(err.error_code(), "proposal_expired");
    }

    #[tokio::test]
    async fn events_are_sequenced_and_paged() {
        let oracle = OracleSigner::random();
        let ledger = LocalLedger::new(
            config(&oracle),
            Arc::new(MockCoprocessor::random()),
            Arc::new(ManualClock::new(1)),
        );
        ledger.register_athlete(ALICE, "Alice".into()).await.unwrap();
        ledger.register_athlete(MANAGER, "Bob".into()).await.unwrap();
        assert!(ledger.register_athlete(ALICE, "Again".into()).await.is_err());

        let events = ledger.events(0, 10).await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].sequence, 1);
        assert_eq!(events[1].sequence, 2);
        assert!(matches!(
            events[1].event,
            RegistryEvent::AthleteRegistered { athlete_id: 2, .. }
        ));

        assert_eq!(ledger.events(1, 10).await.len(), 1);
        assert_eq!(ledger.events(0, 1).await.len(), 1);
        assert!(ledger.events(99, 10).await.is_empty());
    }

    #[tokio::test]
    async fn state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.redb");
        let oracle = OracleSigner::random();
        let secret = [9u8; 32];

        {
            let db = RegistryDatabase::open(&path).unwrap();
            let ledger = LocalLedger::open(
                config(&oracle),
                Arc::new(MockCoprocessor::new(secret)),
                Arc::new(ManualClock::new(100)),
                db,
            )
            .unwrap();
            assert!(ledger.is_persistent());

            let cap = ledger.register_input(1_000, CONTRACT, MANAGER).unwrap();
            ledger.create_team(MANAGER, "Falcons".into(), cap).await.unwrap();
            ledger.register_athlete(ALICE, "Alice".into()).await.unwrap();
        }

        let db = RegistryDatabase::open(&path).unwrap();
        let fhe = Arc::new(MockCoprocessor::new(secret));
        let ledger = LocalLedger::open(
            config(&oracle),
            fhe.clone(),
            Arc::new(ManualClock::new(200)),
            db,
        )
        .unwrap();

        assert_eq!(ledger.team_count().await, 1);
        assert_eq!(ledger.athlete_by_wallet(ALICE).await, 1);
        assert_eq!(ledger.event_count().await, 2);

        // Ciphertexts came back too: the cap and payroll are decryptable.
        let team = ledger.get_team_info(1).await.unwrap();
        let cap = team.salary_cap_handle.unwrap();
        assert_eq!(crate::fhe::Coprocessor::decrypt_u64(fhe.as_ref(), cap).unwrap(), 1_000);

        // New ids continue from the snapshot.
        assert_eq!(
            ledger.register_athlete(MANAGER, "Bob".into()).await.unwrap(),
            2
        );
        assert_eq!(ledger.events(0, 10).await[2].sequence, 3);
    }

    #[tokio::test]
    async fn trait_dispatch_matches_inherent_methods() {
        async fn count_via_backend<B: LedgerBackend>(backend: &B) -> u64 {
            backend.athlete_count().await.unwrap()
        }

        let oracle = OracleSigner::random();
        let ledger = LocalLedger::new(
            config(&oracle),
            Arc::new(MockCoprocessor::random()),
            Arc::new(ManualClock::new(1)),
        );
        LedgerBackend::register_athlete(&ledger, ALICE, "Alice".into())
            .await
            .unwrap();
        assert_eq!(count_via_backend(&ledger).await, 1);
        assert_eq!(LedgerBackend::owner(&ledger).await.unwrap(), MANAGER);
        assert_eq!(LedgerBackend::proposal_expiry(&ledger).await.unwrap(), 600);
    }
}
