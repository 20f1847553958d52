// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Deployed registry contract as a [`LedgerBackend`].
//!
//! The deployed ABI has no `expireProposal`; stale proposals are reported as
//! Expired at read time using the latest block timestamp.

use alloy::{
    network::{Ethereum, EthereumWallet, ReceiptResponse},
    primitives::{Address, U256},
    providers::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder},
    rpc::types::{BlockNumberOrTag, TransactionReceipt},
    signers::local::PrivateKeySigner,
    sol,
};
use tracing::info;

use super::types::NetworkConfig;
use crate::client::LedgerBackend;
use crate::fhe::EncryptedInput;
use crate::ledger::LedgerError;
use crate::registry::{AthleteInfo, NewProposal, ProposalInfo, ProposalStatus, TeamInfo};

sol! {
    #[sol(rpc)]
    interface IConfidentialSports {
        event TeamCreated(uint256 indexed teamId, string name, address indexed manager);
        event AthleteRegistered(uint256 indexed athleteId, address indexed wallet, string name);
        event ProposalCreated(uint256 indexed proposalId, uint256 indexed athleteId, uint256 indexed teamId);
        event ProposalApproved(uint256 indexed proposalId);
        event ProposalRejected(uint256 indexed proposalId);
        event SalaryUpdated(uint256 indexed athleteId);

        function owner() external view returns (address);
        function teamCount() external view returns (uint256);
        function athleteCount() external view returns (uint256);
        function proposalCount() external view returns (uint256);
        function PROPOSAL_EXPIRY() external view returns (uint256);
        function athleteByWallet(address wallet) external view returns (uint256);
        function teamByManager(address manager) external view returns (uint256);

        function getTeamInfo(uint256 teamId) external view returns (
            string name,
            address manager,
            uint256 athleteCountInTeam,
            bool isActive
        );
        function getAthleteInfo(uint256 athleteId) external view returns (
            string name,
            uint256 teamId,
            bool isActive,
            uint256 contractEndDate
        );
        function getProposalInfo(uint256 proposalId) external view returns (
            uint256 athleteId,
            uint256 teamId,
            uint256 contractDuration,
            uint256 createdAt,
            uint8 status
        );
        function getTeamAthletes(uint256 teamId) external view returns (uint256[]);

        function createTeam(string name, bytes32 encryptedSalaryCap, bytes inputProof) external returns (uint256);
        function registerAthlete(string name) external returns (uint256);
        function createProposal(
            uint256 athleteId,
            uint256 teamId,
            bytes32 encryptedSalary,
            bytes32 encryptedBonus,
            bytes salaryProof,
            bytes bonusProof,
            uint256 durationMonths
        ) external returns (uint256);
        function approveProposal(uint256 proposalId) external;
        function rejectProposal(uint256 proposalId) external;
        function cancelProposal(uint256 proposalId) external;
        function grantSalaryAccess(uint256 athleteId, address to) external;
    }
}

/// Errors that can occur during contract interactions.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("Unknown network: {0}")]
    UnknownNetwork(String),

    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("Contract error: {0}")]
    ContractError(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Transaction {tx_hash} reverted")]
    Reverted { tx_hash: String },

    #[error("Transaction {tx_hash} did not emit {event}")]
    MissingEvent { tx_hash: String, event: &'static str },

    #[error("{field} does not fit in 64 bits")]
    OutOfRange { field: &'static str },

    #[error("Unknown proposal status {0}")]
    UnknownStatus(u8),

    #[error("Latest block is unavailable")]
    NoLatestBlock,

    #[error("{0} is not supported by the deployed contract")]
    Unsupported(&'static str),
}

impl From<ChainError> for LedgerError {
    fn from(e: ChainError) -> Self {
        LedgerError::Chain(e.to_string())
    }
}

fn to_u64(value: U256, field: &'static str) -> Result<u64, ChainError> {
    u64::try_from(value).map_err(|_| ChainError::OutOfRange { field })
}

fn contract_err(e: impl std::fmt::Display) -> ChainError {
    ChainError::ContractError(e.to_string())
}

/// Registry contract reached over RPC, sending from one fixed key.
pub struct ChainLedger<P> {
    contract: IConfidentialSports::IConfidentialSportsInstance<P>,
    sender: Address,
}

impl ChainLedger<DynProvider> {
    /// Connect to `contract_address` on `network`, signing with `signer`.
    pub fn connect(
        network: &NetworkConfig,
        contract_address: Address,
        signer: PrivateKeySigner,
    ) -> Result<Self, ChainError> {
        let url: url::Url = network
            .rpc_url
            .parse()
            .map_err(|e: url::ParseError| ChainError::InvalidRpcUrl(e.to_string()))?;
        let sender = signer.address();
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(url)
            .erased();

        info!(
            network = network.name,
            chain_id = network.chain_id,
            contract = %contract_address,
            sender = %sender,
            "Connected to registry contract"
        );
        Ok(Self::new(provider, contract_address, sender))
    }
}

impl<P: Provider + Clone> ChainLedger<P> {
    /// `sender` must be the account `provider` signs with.
    pub fn new(provider: P, contract_address: Address, sender: Address) -> Self {
        Self {
            contract: IConfidentialSports::new(contract_address, provider),
            sender,
        }
    }

    pub fn sender(&self) -> Address {
        self.sender
    }

    fn check_sender(&self, caller: Address) -> Result<(), LedgerError> {
        if caller != self.sender {
            return Err(LedgerError::SenderMismatch {
                expected: self.sender,
                actual: caller,
            });
        }
        Ok(())
    }

    async fn confirm(
        &self,
        pending: PendingTransactionBuilder<Ethereum>,
        op: &'static str,
    ) -> Result<TransactionReceipt, ChainError> {
        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| ChainError::TransactionFailed(e.to_string()))?;
        let tx_hash = receipt.transaction_hash.to_string();
        if !receipt.status() {
            return Err(ChainError::Reverted { tx_hash });
        }
        info!(op, tx_hash = %tx_hash, block = ?receipt.block_number, "Transaction confirmed");
        Ok(receipt)
    }

    async fn latest_block_timestamp(&self) -> Result<u64, ChainError> {
        let block = self
            .contract
            .provider()
            .get_block_by_number(BlockNumberOrTag::Latest)
            .await
            .map_err(contract_err)?
            .ok_or(ChainError::NoLatestBlock)?;
        Ok(block.header.timestamp)
    }
}

fn proposal_status(raw: u8) -> Result<ProposalStatus, ChainError> {
    ProposalStatus::from_u8(raw).ok_or(ChainError::UnknownStatus(raw))
}

/// Proposal view with the status as observed at block time `now`.
fn proposal_view(
    proposal_id: u64,
    raw: IConfidentialSports::getProposalInfoReturn,
    expiry: u64,
    now: u64,
) -> Result<ProposalInfo, ChainError> {
    let created_at = to_u64(raw.createdAt, "createdAt")?;
    Ok(ProposalInfo {
        id: proposal_id,
        athlete_id: to_u64(raw.athleteId, "athleteId")?,
        team_id: to_u64(raw.teamId, "teamId")?,
        contract_duration_months: to_u64(raw.contractDuration, "contractDuration")?,
        created_at,
        expires_at: created_at.saturating_add(expiry),
        status: proposal_status(raw.status)?.observed_at(created_at, expiry, now),
        awaiting_decision: false,
        salary_handle: None,
        bonus_handle: None,
    })
}

impl<P: Provider + Clone> LedgerBackend for ChainLedger<P> {
    fn contract_address(&self) -> Address {
        *self.contract.address()
    }

    async fn create_team(
        &self,
        caller: Address,
        name: String,
        salary_cap: EncryptedInput,
    ) -> Result<u64, LedgerError> {
        self.check_sender(caller)?;
        let pending = self
            .contract
            .createTeam(name, salary_cap.handle.0, salary_cap.proof)
            .send()
            .await
            .map_err(contract_err)?;
        let receipt = self.confirm(pending, "createTeam").await?;
        let event = receipt
            .decoded_log::<IConfidentialSports::TeamCreated>()
            .ok_or_else(|| ChainError::MissingEvent {
                tx_hash: receipt.transaction_hash.to_string(),
                event: "TeamCreated",
            })?;
        Ok(to_u64(event.data.teamId, "teamId")?)
    }

    async fn register_athlete(&self, caller: Address, name: String) -> Result<u64, LedgerError> {
        self.check_sender(caller)?;
        let pending = self
            .contract
            .registerAthlete(name)
            .send()
            .await
            .map_err(contract_err)?;
        let receipt = self.confirm(pending, "registerAthlete").await?;
        let event = receipt
            .decoded_log::<IConfidentialSports::AthleteRegistered>()
            .ok_or_else(|| ChainError::MissingEvent {
                tx_hash: receipt.transaction_hash.to_string(),
                event: "AthleteRegistered",
            })?;
        Ok(to_u64(event.data.athleteId, "athleteId")?)
    }

    async fn create_proposal(
        &self,
        caller: Address,
        proposal: NewProposal,
    ) -> Result<u64, LedgerError> {
        self.check_sender(caller)?;
        let pending = self
            .contract
            .createProposal(
                U256::from(proposal.athlete_id),
                U256::from(proposal.team_id),
                proposal.salary.handle.0,
                proposal.bonus.handle.0,
                proposal.salary.proof,
                proposal.bonus.proof,
                U256::from(proposal.duration_months),
            )
            .send()
            .await
            .map_err(contract_err)?;
        let receipt = self.confirm(pending, "createProposal").await?;
        let event = receipt
            .decoded_log::<IConfidentialSports::ProposalCreated>()
            .ok_or_else(|| ChainError::MissingEvent {
                tx_hash: receipt.transaction_hash.to_string(),
                event: "ProposalCreated",
            })?;
        Ok(to_u64(event.data.proposalId, "proposalId")?)
    }

    async fn approve_proposal(&self, caller: Address, proposal_id: u64) -> Result<(), LedgerError> {
        self.check_sender(caller)?;
        let pending = self
            .contract
            .approveProposal(U256::from(proposal_id))
            .send()
            .await
            .map_err(contract_err)?;
        self.confirm(pending, "approveProposal").await?;
        Ok(())
    }

    async fn reject_proposal(&self, caller: Address, proposal_id: u64) -> Result<(), LedgerError> {
        self.check_sender(caller)?;
        let pending = self
            .contract
            .rejectProposal(U256::from(proposal_id))
            .send()
            .await
            .map_err(contract_err)?;
        self.confirm(pending, "rejectProposal").await?;
        Ok(())
    }

    async fn cancel_proposal(&self, caller: Address, proposal_id: u64) -> Result<(), LedgerError> {
        self.check_sender(caller)?;
        let pending = self
            .contract
            .cancelProposal(U256::from(proposal_id))
            .send()
            .await
            .map_err(contract_err)?;
        self.confirm(pending, "cancelProposal").await?;
        Ok(())
    }

    async fn expire_proposal(&self, caller: Address, _proposal_id: u64) -> Result<(), LedgerError> {
        self.check_sender(caller)?;
        Err(ChainError::Unsupported("expireProposal").into())
    }

    async fn grant_salary_access(
        &self,
        caller: Address,
        athlete_id: u64,
        grantee: Address,
    ) -> Result<(), LedgerError> {
        self.check_sender(caller)?;
        let pending = self
            .contract
            .grantSalaryAccess(U256::from(athlete_id), grantee)
            .send()
            .await
            .map_err(contract_err)?;
        self.confirm(pending, "grantSalaryAccess").await?;
        Ok(())
    }

    async fn get_team_info(&self, team_id: u64) -> Result<TeamInfo, LedgerError> {
        let team = self
            .contract
            .getTeamInfo(U256::from(team_id))
            .call()
            .await
            .map_err(contract_err)?;
        Ok(TeamInfo {
            id: team_id,
            name: team.name,
            manager: team.manager,
            athlete_count: to_u64(team.athleteCountInTeam, "athleteCountInTeam")?,
            is_active: team.isActive,
            salary_cap_handle: None,
        })
    }

    async fn get_athlete_info(&self, athlete_id: u64) -> Result<AthleteInfo, LedgerError> {
        let athlete = self
            .contract
            .getAthleteInfo(U256::from(athlete_id))
            .call()
            .await
            .map_err(contract_err)?;
        Ok(AthleteInfo {
            id: athlete_id,
            name: athlete.name,
            wallet: None,
            team_id: to_u64(athlete.teamId, "teamId")?,
            is_active: athlete.isActive,
            contract_end_date: to_u64(athlete.contractEndDate, "contractEndDate")?,
            salary_handle: None,
            bonus_handle: None,
        })
    }

    async fn get_proposal_info(&self, proposal_id: u64) -> Result<ProposalInfo, LedgerError> {
        let proposal = self
            .contract
            .getProposalInfo(U256::from(proposal_id))
            .call()
            .await
            .map_err(contract_err)?;
        let expiry = self.proposal_expiry().await?;
        let now = self.latest_block_timestamp().await?;
        Ok(proposal_view(proposal_id, proposal, expiry, now)?)
    }

    async fn get_team_athletes(&self, team_id: u64) -> Result<Vec<u64>, LedgerError> {
        let ids = self
            .contract
            .getTeamAthletes(U256::from(team_id))
            .call()
            .await
            .map_err(contract_err)?;
        let ids = ids
            .into_iter()
            .map(|id| to_u64(id, "athleteId"))
            .collect::<Result<Vec<u64>, ChainError>>()?;
        Ok(ids)
    }

    async fn team_count(&self) -> Result<u64, LedgerError> {
        let count = self.contract.teamCount().call().await.map_err(contract_err)?;
        Ok(to_u64(count, "teamCount")?)
    }

    async fn athlete_count(&self) -> Result<u64, LedgerError> {
        let count = self.contract.athleteCount().call().await.map_err(contract_err)?;
        Ok(to_u64(count, "athleteCount")?)
    }

    async fn proposal_count(&self) -> Result<u64, LedgerError> {
        let count = self.contract.proposalCount().call().await.map_err(contract_err)?;
        Ok(to_u64(count, "proposalCount")?)
    }

    async fn athlete_by_wallet(&self, wallet: Address) -> Result<u64, LedgerError> {
        let id = self
            .contract
            .athleteByWallet(wallet)
            .call()
            .await
            .map_err(contract_err)?;
        Ok(to_u64(id, "athleteId")?)
    }

    async fn team_by_manager(&self, manager: Address) -> Result<u64, LedgerError> {
        let id = self
            .contract
            .teamByManager(manager)
            .call()
            .await
            .map_err(contract_err)?;
        Ok(to_u64(id, "teamId")?)
    }

    async fn owner(&self) -> Result<Address, LedgerError> {
        Ok(self.contract.owner().call().await.map_err(contract_err)?)
    }

    async fn proposal_expiry(&self) -> Result<u64, LedgerError> {
        let expiry = self.contract.PROPOSAL_EXPIRY().call().await.map_err(contract_err)?;
        Ok(to_u64(expiry, "PROPOSAL_EXPIRY")?)
    }
}
