// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    auth::WalletAuth,
    error::ApiError,
    models::{ApprovalResponse, CountResponse, CreateProposalRequest, CreatedResponse},
    registry::{NewProposal, ProposalFilter, ProposalInfo},
    state::AppState,
};

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ProposalQuery {
    /// Only proposals from this team.
    pub team_id: Option<u64>,
    /// Only proposals to this athlete.
    pub athlete_id: Option<u64>,
}

#[utoipa::path(
    post,
    path = "/v1/proposals",
    request_body = CreateProposalRequest,
    tag = "Proposals",
    responses(
        (status = 201, body = CreatedResponse),
        (status = 400, description = "Invalid duration or proof"),
        (status = 403, description = "Caller does not manage the team"),
        (status = 404, description = "Unknown team or athlete")
    )
)]
pub async fn create_proposal(
    WalletAuth(caller): WalletAuth,
    State(state): State<AppState>,
    Json(request): Json<CreateProposalRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let proposal = NewProposal {
        athlete_id: request.athlete_id,
        team_id: request.team_id,
        salary: request.salary,
        bonus: request.bonus,
        duration_months: request.duration_months,
    };
    let id = state.ledger.create_proposal(caller, proposal).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

#[utoipa::path(
    get,
    path = "/v1/proposals",
    params(ProposalQuery),
    tag = "Proposals",
    responses((status = 200, body = [ProposalInfo]))
)]
pub async fn list_proposals(
    State(state): State<AppState>,
    Query(query): Query<ProposalQuery>,
) -> Json<Vec<ProposalInfo>> {
    let filter = ProposalFilter {
        team_id: query.team_id,
        athlete_id: query.athlete_id,
    };
    Json(state.ledger.list_proposals(filter).await)
}

#[utoipa::path(
    get,
    path = "/v1/proposals/{proposal_id}",
    params(("proposal_id" = u64, Path, description = "Proposal id")),
    tag = "Proposals",
    responses((status = 200, body = ProposalInfo), (status = 404))
)]
pub async fn get_proposal(
    Path(proposal_id): Path<u64>,
    State(state): State<AppState>,
) -> Result<Json<ProposalInfo>, ApiError> {
    Ok(Json(state.ledger.get_proposal_info(proposal_id).await?))
}

#[utoipa::path(
    get,
    path = "/v1/proposals/count",
    tag = "Proposals",
    responses((status = 200, body = CountResponse))
)]
pub async fn proposal_count(State(state): State<AppState>) -> Json<CountResponse> {
    Json(CountResponse {
        count: state.ledger.proposal_count().await,
    })
}

/// Accept a proposal. The outcome arrives later through the oracle callback.
#[utoipa::path(
    post,
    path = "/v1/proposals/{proposal_id}/approve",
    params(("proposal_id" = u64, Path, description = "Proposal id")),
    tag = "Proposals",
    responses(
        (status = 202, body = ApprovalResponse),
        (status = 403, description = "Caller is not the athlete"),
        (status = 409, description = "Expired, not pending, or a decision is already pending")
    )
)]
pub async fn approve_proposal(
    WalletAuth(caller): WalletAuth,
    Path(proposal_id): Path<u64>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApprovalResponse>), ApiError> {
    let request_id = state.ledger.approve_proposal(caller, proposal_id).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(ApprovalResponse {
            proposal_id,
            request_id,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/v1/proposals/{proposal_id}/reject",
    params(("proposal_id" = u64, Path, description = "Proposal id")),
    tag = "Proposals",
    responses((status = 200, body = ProposalInfo), (status = 403), (status = 409))
)]
pub async fn reject_proposal(
    WalletAuth(caller): WalletAuth,
    Path(proposal_id): Path<u64>,
    State(state): State<AppState>,
) -> Result<Json<ProposalInfo>, ApiError> {
    state.ledger.reject_proposal(caller, proposal_id).await?;
    Ok(Json(state.ledger.get_proposal_info(proposal_id).await?))
}

#[utoipa::path(
    post,
    path = "/v1/proposals/{proposal_id}/cancel",
    params(("proposal_id" = u64, Path, description = "Proposal id")),
    tag = "Proposals",
    responses((status = 200, body = ProposalInfo), (status = 403), (status = 409))
)]
pub async fn cancel_proposal(
    WalletAuth(caller): WalletAuth,
    Path(proposal_id): Path<u64>,
    State(state): State<AppState>,
) -> Result<Json<ProposalInfo>, ApiError> {
    state.ledger.cancel_proposal(caller, proposal_id).await?;
    Ok(Json(state.ledger.get_proposal_info(proposal_id).await?))
}

/// Finalize an expired proposal. Any caller.
#[utoipa::path(
    post,
    path = "/v1/proposals/{proposal_id}/expire",
    params(("proposal_id" = u64, Path, description = "Proposal id")),
    tag = "Proposals",
    responses((status = 200, body = ProposalInfo), (status = 409))
)]
pub async fn expire_proposal(
    WalletAuth(caller): WalletAuth,
    Path(proposal_id): Path<u64>,
    State(state): State<AppState>,
) -> Result<Json<ProposalInfo>, ApiError> {
    state.ledger.expire_proposal(caller, proposal_id).await?;
    Ok(Json(state.ledger.get_proposal_info(proposal_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ProposalStatus;
    use crate::state::test_support::{TestApp, ALICE, BOB, EXPIRY, MANAGER};

    #[tokio::test]
    async fn create_proposal_via_handler() {
        let app = TestApp::new();
        let cap = app.input(1_000, MANAGER);
        app.ledger()
            .create_team(MANAGER, "Falcons".into(), cap)
            .await
            .unwrap();
        app.ledger()
            .register_athlete(ALICE, "Alice".into())
            .await
            .unwrap();

        let request = CreateProposalRequest {
            athlete_id: 1,
            team_id: 1,
            salary: app.input(100, MANAGER),
            bonus: app.input(10, MANAGER),
            duration_months: 12,
        };
        let (status, Json(created)) =
            create_proposal(WalletAuth(MANAGER), State(app.state.clone()), Json(request))
                .await
                .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.id, 1);

        let Json(info) = get_proposal(Path(1), State(app.state.clone())).await.unwrap();
        assert_eq!(info.status, ProposalStatus::Pending);
        assert_eq!(info.contract_duration_months, 12);
    }

    #[tokio::test]
    async fn approve_returns_request_and_blocks_second_approve() {
        let app = TestApp::new();
        app.seed_falcons().await;

        let (status, Json(approval)) =
            approve_proposal(WalletAuth(ALICE), Path(1), State(app.state.clone()))
                .await
                .unwrap();
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(approval.request_id, 1);

        let err = approve_proposal(WalletAuth(ALICE), Path(1), State(app.state.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.code, "already_pending_decision");
    }

    #[tokio::test]
    async fn wrong_role_is_forbidden() {
        let app = TestApp::new();
        app.seed_falcons().await;

        let err = approve_proposal(WalletAuth(BOB), Path(1), State(app.state.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);

        let err = cancel_proposal(WalletAuth(ALICE), Path(1), State(app.state.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.code, "not_manager");
    }

    #[tokio::test]
    async fn reject_and_cancel_are_terminal() {
        let app = TestApp::new();
        app.seed_falcons().await;

        let Json(info) = reject_proposal(WalletAuth(ALICE), Path(1), State(app.state.clone()))
            .await
            .unwrap();
        assert_eq!(info.status, ProposalStatus::Rejected);

        let err = cancel_proposal(WalletAuth(MANAGER), Path(1), State(app.state.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.code, "invalid_state");
    }

    #[tokio::test]
    async fn expiry_flow() {
        let app = TestApp::new();
        app.seed_falcons().await;

        let err = expire_proposal(WalletAuth(BOB), Path(1), State(app.state.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.code, "proposal_not_expired");

        app.clock.advance(EXPIRY + 1);
        let Json(info) = get_proposal(Path(1), State(app.state.clone())).await.unwrap();
        assert_eq!(info.status, ProposalStatus::Expired);

        let err = approve_proposal(WalletAuth(ALICE), Path(1), State(app.state.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.code, "proposal_expired");

        let Json(info) = expire_proposal(WalletAuth(BOB), Path(1), State(app.state.clone()))
            .await
            .unwrap();
        assert_eq!(info.status, ProposalStatus::Expired);
    }

    #[tokio::test]
    async fn list_filters_by_team_and_athlete() {
        let app = TestApp::new();
        app.seed_falcons().await;

        let Json(all) = list_proposals(State(app.state.clone()), Query(ProposalQuery::default())).await;
        assert_eq!(all.len(), 1);

        let Json(none) = list_proposals(
            State(app.state.clone()),
            Query(ProposalQuery {
                team_id: Some(2),
                athlete_id: None,
            }),
        )
        .await;
        assert!(none.is_empty());

        let Json(count) = proposal_count(State(app.state.clone())).await;
        assert_eq!(count.count, 1);
    }
}
