// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{models::RegistryInfoResponse, registry::EventRecord, state::AppState};

const DEFAULT_EVENT_PAGE: usize = 100;
const MAX_EVENT_PAGE: usize = 1_000;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct EventQuery {
    /// Return events with a sequence number greater than this.
    pub after: Option<u64>,
    /// Page size (default 100, max 1000).
    pub limit: Option<usize>,
}

#[utoipa::path(
    get,
    path = "/v1/events",
    params(EventQuery),
    tag = "Registry",
    responses((status = 200, body = [EventRecord]))
)]
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventQuery>,
) -> Json<Vec<EventRecord>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_EVENT_PAGE)
        .clamp(1, MAX_EVENT_PAGE);
    Json(state.ledger.events(query.after.unwrap_or(0), limit).await)
}

#[utoipa::path(
    get,
    path = "/v1/registry",
    tag = "Registry",
    responses((status = 200, body = RegistryInfoResponse))
)]
pub async fn registry_info(State(state): State<AppState>) -> Json<RegistryInfoResponse> {
    let ledger = &state.ledger;
    let config = ledger.config().await;
    Json(RegistryInfoResponse {
        contract_address: config.contract_address,
        owner: config.owner,
        oracle_signer: config.oracle_signer,
        proposal_expiry_secs: config.proposal_expiry_secs,
        team_count: ledger.team_count().await,
        athlete_count: ledger.athlete_count().await,
        proposal_count: ledger.proposal_count().await,
        event_count: ledger.event_count().await,
        persistent: ledger.is_persistent(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistryEvent;
    use crate::state::test_support::{TestApp, CONTRACT, EXPIRY, OWNER};

    #[tokio::test]
    async fn events_page_in_sequence_order() {
        let app = TestApp::new();
        app.seed_falcons().await;

        let Json(all) = list_events(State(app.state.clone()), Query(EventQuery::default())).await;
        assert_eq!(all.len(), 3);
        assert!(matches!(all[0].event, RegistryEvent::TeamCreated { team_id: 1, .. }));
        assert!(matches!(all[2].event, RegistryEvent::ProposalCreated { proposal_id: 1, .. }));

        let Json(tail) = list_events(
            State(app.state.clone()),
            Query(EventQuery {
                after: Some(1),
                limit: Some(1),
            }),
        )
        .await;
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].sequence, 2);
    }

    #[tokio::test]
    async fn registry_info_reports_counters() {
        let app = TestApp::new();
        app.seed_falcons().await;

        let Json(info) = registry_info(State(app.state.clone())).await;
        assert_eq!(info.contract_address, CONTRACT);
        assert_eq!(info.owner, OWNER);
        assert_eq!(info.oracle_signer, app.oracle.address());
        assert_eq!(info.proposal_expiry_secs, EXPIRY);
        assert_eq!((info.team_count, info.athlete_count, info.proposal_count), (1, 1, 1));
        assert_eq!(info.event_count, 3);
        assert!(!info.persistent);
    }
}
