// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Oracle Worker
//!
//! Background task playing the trusted decryption service for a local
//! ledger. Every `poll_interval` it:
//! 1. Lists the pending decryption requests.
//! 2. Decrypts each compliance boolean through the coprocessor.
//! 3. Signs the callback and submits it back through the ledger.
//!
//! A request that fails is logged and retried on the next sweep.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken`, like the HTTP server.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::OracleSigner;
use crate::fhe::Coprocessor;
use crate::ledger::LocalLedger;

/// Default interval between sweeps.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

pub struct OracleWorker {
    ledger: LocalLedger,
    signer: OracleSigner,
    coprocessor: Arc<dyn Coprocessor>,
    poll_interval: Duration,
}

impl OracleWorker {
    pub fn new(ledger: LocalLedger, signer: OracleSigner, coprocessor: Arc<dyn Coprocessor>) -> Self {
        Self {
            ledger,
            signer,
            coprocessor,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Run until the cancellation token fires.
    ///
    /// ```rust,ignore
    /// tokio::spawn(worker.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_ms = self.poll_interval.as_millis() as u64,
            oracle = %self.signer.address(),
            "Oracle worker starting"
        );

        loop {
            if shutdown.is_cancelled() {
                info!("Oracle worker shutting down");
                return;
            }

            self.sweep().await;

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Oracle worker shutting down");
                    return;
                }
            }
        }
    }

    /// Answer every pending request once. Returns how many were resolved.
    pub async fn sweep(&self) -> usize {
        let pending = self.ledger.pending_requests().await;
        if pending.is_empty() {
            return 0;
        }

        debug!(count = pending.len(), "Oracle worker: answering pending requests");

        let contract = self.ledger.contract_address();
        let mut resolved = 0;

        for request in pending {
            let is_compliant = match self.coprocessor.decrypt_bool(request.handle) {
                Ok(value) => value,
                Err(e) => {
                    warn!(
                        request_id = request.request_id,
                        error = %e,
                        "Oracle worker: failed to decrypt compliance result"
                    );
                    continue;
                }
            };

            let signature = match self.signer.sign_callback(contract, request.request_id, is_compliant) {
                Ok(signature) => signature,
                Err(e) => {
                    warn!(request_id = request.request_id, error = %e, "Oracle worker: signing failed");
                    continue;
                }
            };

            match self
                .ledger
                .fulfill_compliance(self.signer.address(), request.request_id, is_compliant, signature)
                .await
            {
                Ok(status) => {
                    info!(
                        request_id = request.request_id,
                        proposal_id = request.proposal_id,
                        is_compliant,
                        status = %status,
                        "Oracle worker: callback applied"
                    );
                    resolved += 1;
                }
                Err(e) => {
                    warn!(
                        request_id = request.request_id,
                        error = %e,
                        "Oracle worker: callback rejected"
                    );
                }
            }
        }

        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::fhe::MockCoprocessor;
    use crate::ledger::LocalLedger;
    use crate::registry::{NewProposal, ProposalStatus, RegistryConfig};
    use alloy::primitives::Address;

    const CONTRACT: Address = Address::repeat_byte(0xc0);
    const MANAGER: Address = Address::repeat_byte(0x11);
    const ALICE: Address = Address::repeat_byte(0xa1);

    async fn ledger_with_pending_approval(
        cap: u64,
        salary: u64,
    ) -> (LocalLedger, Arc<MockCoprocessor>, OracleSigner) {
        let oracle = OracleSigner::random();
        let fhe = Arc::new(MockCoprocessor::random());
        let config = RegistryConfig::new(CONTRACT, MANAGER, oracle.address());
        let ledger = LocalLedger::new(config, fhe.clone(), Arc::new(ManualClock::new(1_000)));

        let cap = fhe.encrypt_input(cap, CONTRACT, MANAGER);
        ledger.create_team(MANAGER, "Falcons".into(), cap).await.unwrap();
        ledger.register_athlete(ALICE, "Alice".into()).await.unwrap();
        let proposal = NewProposal {
            athlete_id: 1,
            team_id: 1,
            salary: fhe.encrypt_input(salary, CONTRACT, MANAGER),
            bonus: fhe.encrypt_input(10, CONTRACT, MANAGER),
            duration_months: 12,
        };
        ledger.create_proposal(MANAGER, proposal).await.unwrap();
        ledger.approve_proposal(ALICE, 1).await.unwrap();

        (ledger, fhe, oracle)
    }

    #[tokio::test]
    async fn sweep_approves_compliant_proposal() {
        let (ledger, fhe, oracle) = ledger_with_pending_approval(1_000, 100).await;
        let worker = OracleWorker::new(ledger.clone(), oracle, fhe);

        assert_eq!(worker.sweep().await, 1);
        let info = ledger.get_proposal_info(1).await.unwrap();
        assert_eq!(info.status, ProposalStatus::Approved);
        assert!(ledger.pending_requests().await.is_empty());

        // Nothing left to do.
        assert_eq!(worker.sweep().await, 0);
    }

    #[tokio::test]
    async fn sweep_rejects_over_cap_proposal() {
        let (ledger, fhe, oracle) = ledger_with_pending_approval(50, 100).await;
        let worker = OracleWorker::new(ledger.clone(), oracle, fhe);

        assert_eq!(worker.sweep().await, 1);
        let info = ledger.get_proposal_info(1).await.unwrap();
        assert_eq!(info.status, ProposalStatus::Rejected);
        assert_eq!(ledger.get_athlete_info(1).await.unwrap().team_id, 0);
    }

    #[tokio::test]
    async fn foreign_oracle_key_is_not_accepted() {
        let (ledger, fhe, _oracle) = ledger_with_pending_approval(1_000, 100).await;
        let worker = OracleWorker::new(ledger.clone(), OracleSigner::random(), fhe);

        assert_eq!(worker.sweep().await, 0);
        assert_eq!(ledger.pending_requests().await.len(), 1);
    }

    #[tokio::test]
    async fn run_stops_on_cancellation() {
        let (ledger, fhe, oracle) = ledger_with_pending_approval(1_000, 100).await;
        let worker = OracleWorker::new(ledger.clone(), oracle, fhe)
            .with_poll_interval(Duration::from_millis(10));

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(worker.run(shutdown.clone()));

        tokio::time::timeout(Duration::from_secs(5), async {
            while !ledger.pending_requests().await.is_empty() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
