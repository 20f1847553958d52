// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use alloy::primitives::Address;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    auth::WalletAuth,
    error::ApiError,
    models::{CountResponse, CreateTeamRequest, CreatedResponse, LookupResponse, TeamAthletesResponse},
    registry::TeamInfo,
    state::AppState,
};

pub(crate) fn parse_address(raw: &str) -> Result<Address, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid address: {raw}")))
}

#[utoipa::path(
    post,
    path = "/v1/teams",
    request_body = CreateTeamRequest,
    tag = "Teams",
    responses(
        (status = 201, body = CreatedResponse),
        (status = 400, description = "Invalid name or salary cap proof"),
        (status = 409, description = "Caller already manages a team")
    )
)]
pub async fn create_team(
    WalletAuth(caller): WalletAuth,
    State(state): State<AppState>,
    Json(request): Json<CreateTeamRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let id = state
        .ledger
        .create_team(caller, request.name, request.salary_cap)
        .await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

#[utoipa::path(
    get,
    path = "/v1/teams/{team_id}",
    params(("team_id" = u64, Path, description = "Team id")),
    tag = "Teams",
    responses((status = 200, body = TeamInfo), (status = 404))
)]
pub async fn get_team(
    Path(team_id): Path<u64>,
    State(state): State<AppState>,
) -> Result<Json<TeamInfo>, ApiError> {
    Ok(Json(state.ledger.get_team_info(team_id).await?))
}

#[utoipa::path(
    get,
    path = "/v1/teams/{team_id}/athletes",
    params(("team_id" = u64, Path, description = "Team id")),
    tag = "Teams",
    responses((status = 200, body = TeamAthletesResponse), (status = 404))
)]
pub async fn get_team_athletes(
    Path(team_id): Path<u64>,
    State(state): State<AppState>,
) -> Result<Json<TeamAthletesResponse>, ApiError> {
    let athlete_ids = state.ledger.get_team_athletes(team_id).await?;
    Ok(Json(TeamAthletesResponse {
        team_id,
        athlete_ids,
    }))
}

#[utoipa::path(
    get,
    path = "/v1/teams/count",
    tag = "Teams",
    responses((status = 200, body = CountResponse))
)]
pub async fn team_count(State(state): State<AppState>) -> Json<CountResponse> {
    Json(CountResponse {
        count: state.ledger.team_count().await,
    })
}

#[utoipa::path(
    get,
    path = "/v1/managers/{address}/team",
    params(("address" = String, Path, description = "Manager address")),
    tag = "Teams",
    responses((status = 200, body = LookupResponse), (status = 400))
)]
pub async fn team_by_manager(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<LookupResponse>, ApiError> {
    let address = parse_address(&address)?;
    Ok(Json(LookupResponse {
        address,
        id: state.ledger.team_by_manager(address).await,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::{TestApp, BOB, MANAGER};

    #[tokio::test]
    async fn create_and_read_team() {
        let app = TestApp::new();
        let request = CreateTeamRequest {
            name: "Falcons".into(),
            salary_cap: app.input(1_000, MANAGER),
        };

        let (status, Json(created)) =
            create_team(WalletAuth(MANAGER), State(app.state.clone()), Json(request))
                .await
                .expect("team creation succeeds");
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.id, 1);

        let Json(team) = get_team(Path(1), State(app.state.clone())).await.unwrap();
        assert_eq!(team.name, "Falcons");
        assert_eq!(team.manager, MANAGER);

        let Json(count) = team_count(State(app.state.clone())).await;
        assert_eq!(count.count, 1);

        let Json(lookup) = team_by_manager(Path(MANAGER.to_string()), State(app.state.clone()))
            .await
            .unwrap();
        assert_eq!(lookup.id, 1);
    }

    #[tokio::test]
    async fn cap_proof_must_belong_to_caller() {
        let app = TestApp::new();
        let request = CreateTeamRequest {
            name: "Falcons".into(),
            salary_cap: app.input(1_000, BOB),
        };
        let err = create_team(WalletAuth(MANAGER), State(app.state.clone()), Json(request))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "invalid_proof");
    }

    #[tokio::test]
    async fn unknown_team_is_404() {
        let app = TestApp::new();
        let err = get_team(Path(7), State(app.state.clone())).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let err = get_team_athletes(Path(7), State(app.state.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.code, "unknown_team");
    }

    #[tokio::test]
    async fn bad_manager_address_is_400() {
        let app = TestApp::new();
        let err = team_by_manager(Path("0xnope".into()), State(app.state.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
