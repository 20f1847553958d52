// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Registry events. Payloads carry ids, addresses and names only.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "PascalCase")]
pub enum RegistryEvent {
    TeamCreated {
        team_id: u64,
        name: String,
        #[schema(value_type = String)]
        manager: Address,
    },
    AthleteRegistered {
        athlete_id: u64,
        name: String,
        #[schema(value_type = String)]
        wallet: Address,
    },
    ProposalCreated {
        proposal_id: u64,
        athlete_id: u64,
        team_id: u64,
    },
    ProposalCancelled {
        proposal_id: u64,
    },
    ProposalApproved {
        proposal_id: u64,
        athlete_id: u64,
        team_id: u64,
    },
    ProposalRejected {
        proposal_id: u64,
        athlete_id: u64,
        team_id: u64,
    },
    ProposalExpired {
        proposal_id: u64,
    },
    SalaryUpdated {
        athlete_id: u64,
        team_id: u64,
    },
    SalaryAccessGranted {
        athlete_id: u64,
        #[schema(value_type = String)]
        grantee: Address,
    },
    DecryptionRequested {
        request_id: u64,
        proposal_id: u64,
    },
}

impl RegistryEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RegistryEvent::TeamCreated { .. } => "TeamCreated",
            RegistryEvent::AthleteRegistered { .. } => "AthleteRegistered",
            RegistryEvent::ProposalCreated { .. } => "ProposalCreated",
            RegistryEvent::ProposalCancelled { .. } => "ProposalCancelled",
            RegistryEvent::ProposalApproved { .. } => "ProposalApproved",
            RegistryEvent::ProposalRejected { .. } => "ProposalRejected",
            RegistryEvent::ProposalExpired { .. } => "ProposalExpired",
            RegistryEvent::SalaryUpdated { .. } => "SalaryUpdated",
            RegistryEvent::SalaryAccessGranted { .. } => "SalaryAccessGranted",
            RegistryEvent::DecryptionRequested { .. } => "DecryptionRequested",
        }
    }
}

/// An event as stored in the append-only log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EventRecord {
    /// Position in the log, starting at 1.
    pub sequence: u64,
    /// Block time of the emitting transaction.
    pub timestamp: u64,
    pub event: RegistryEvent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let record = EventRecord {
            sequence: 4,
            timestamp: 1_000,
            event: RegistryEvent::ProposalApproved {
                proposal_id: 1,
                athlete_id: 2,
                team_id: 3,
            },
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["event"]["type"], "ProposalApproved");
        assert_eq!(json["event"]["athlete_id"], 2);

        let back: EventRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
        assert_eq!(back.event.name(), "ProposalApproved");
    }
}
