// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::teams::parse_address;
use crate::{
    auth::WalletAuth,
    error::ApiError,
    models::{AccessResponse, CountResponse, CreatedResponse, GrantAccessRequest, LookupResponse, RegisterAthleteRequest},
    registry::{AthleteInfo, Compensation},
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/v1/athletes",
    request_body = RegisterAthleteRequest,
    tag = "Athletes",
    responses(
        (status = 201, body = CreatedResponse),
        (status = 409, description = "Wallet already registered")
    )
)]
pub async fn register_athlete(
    WalletAuth(caller): WalletAuth,
    State(state): State<AppState>,
    Json(request): Json<RegisterAthleteRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let id = state.ledger.register_athlete(caller, request.name).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

#[utoipa::path(
    get,
    path = "/v1/athletes/{athlete_id}",
    params(("athlete_id" = u64, Path, description = "Athlete id")),
    tag = "Athletes",
    responses((status = 200, body = AthleteInfo), (status = 404))
)]
pub async fn get_athlete(
    Path(athlete_id): Path<u64>,
    State(state): State<AppState>,
) -> Result<Json<AthleteInfo>, ApiError> {
    Ok(Json(state.ledger.get_athlete_info(athlete_id).await?))
}

#[utoipa::path(
    get,
    path = "/v1/athletes/count",
    tag = "Athletes",
    responses((status = 200, body = CountResponse))
)]
pub async fn athlete_count(State(state): State<AppState>) -> Json<CountResponse> {
    Json(CountResponse {
        count: state.ledger.athlete_count().await,
    })
}

#[utoipa::path(
    get,
    path = "/v1/wallets/{address}/athlete",
    params(("address" = String, Path, description = "Athlete wallet")),
    tag = "Athletes",
    responses((status = 200, body = LookupResponse), (status = 400))
)]
pub async fn athlete_by_wallet(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<LookupResponse>, ApiError> {
    let address = parse_address(&address)?;
    Ok(Json(LookupResponse {
        address,
        id: state.ledger.athlete_by_wallet(address).await,
    }))
}

/// Grant another address permission to decrypt salary and bonus.
#[utoipa::path(
    post,
    path = "/v1/athletes/{athlete_id}/access",
    params(("athlete_id" = u64, Path, description = "Athlete id")),
    request_body = GrantAccessRequest,
    tag = "Athletes",
    responses(
        (status = 204),
        (status = 403, description = "Caller is not the athlete")
    )
)]
pub async fn grant_salary_access(
    WalletAuth(caller): WalletAuth,
    Path(athlete_id): Path<u64>,
    State(state): State<AppState>,
    Json(request): Json<GrantAccessRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .ledger
        .grant_salary_access(caller, athlete_id, request.grantee)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/v1/athletes/{athlete_id}/access/{viewer}",
    params(
        ("athlete_id" = u64, Path, description = "Athlete id"),
        ("viewer" = String, Path, description = "Address to check")
    ),
    tag = "Athletes",
    responses((status = 200, body = AccessResponse), (status = 404))
)]
pub async fn can_view_compensation(
    Path((athlete_id, viewer)): Path<(u64, String)>,
    State(state): State<AppState>,
) -> Result<Json<AccessResponse>, ApiError> {
    let viewer = parse_address(&viewer)?;
    let allowed = state.ledger.can_view_compensation(athlete_id, viewer).await?;
    Ok(Json(AccessResponse {
        athlete_id,
        viewer,
        allowed,
    }))
}

/// Decrypted compensation for the athlete or a grantee.
#[utoipa::path(
    get,
    path = "/v1/athletes/{athlete_id}/compensation",
    params(("athlete_id" = u64, Path, description = "Athlete id")),
    tag = "Athletes",
    responses(
        (status = 200, body = Compensation),
        (status = 403, description = "Caller may not view this athlete's compensation")
    )
)]
pub async fn reveal_compensation(
    WalletAuth(caller): WalletAuth,
    Path(athlete_id): Path<u64>,
    State(state): State<AppState>,
) -> Result<Json<Compensation>, ApiError> {
    Ok(Json(
        state.ledger.reveal_compensation(athlete_id, caller).await?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::{TestApp, ALICE, BOB};

    #[tokio::test]
    async fn register_and_lookup() {
        let app = TestApp::new();
        let (status, Json(created)) = register_athlete(
            WalletAuth(ALICE),
            State(app.state.clone()),
            Json(RegisterAthleteRequest {
                name: "Alice".into(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.id, 1);

        let Json(lookup) = athlete_by_wallet(Path(ALICE.to_string()), State(app.state.clone()))
            .await
            .unwrap();
        assert_eq!(lookup.id, 1);

        let Json(athlete) = get_athlete(Path(1), State(app.state.clone())).await.unwrap();
        assert_eq!(athlete.name, "Alice");
        assert_eq!(athlete.team_id, 0);
        assert_eq!(athlete.wallet, Some(ALICE));

        let Json(count) = athlete_count(State(app.state.clone())).await;
        assert_eq!(count.count, 1);
    }

    #[tokio::test]
    async fn duplicate_wallet_is_conflict() {
        let app = TestApp::new();
        let body = || {
            Json(RegisterAthleteRequest {
                name: "Alice".into(),
            })
        };
        register_athlete(WalletAuth(ALICE), State(app.state.clone()), body())
            .await
            .unwrap();
        let err = register_athlete(WalletAuth(ALICE), State(app.state.clone()), body())
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.code, "duplicate_wallet");
    }

    #[tokio::test]
    async fn compensation_requires_grant() {
        let app = TestApp::new();
        app.ledger()
            .register_athlete(ALICE, "Alice".into())
            .await
            .unwrap();

        let Json(own) = reveal_compensation(WalletAuth(ALICE), Path(1), State(app.state.clone()))
            .await
            .unwrap();
        assert_eq!((own.salary, own.bonus), (0, 0));

        let err = reveal_compensation(WalletAuth(BOB), Path(1), State(app.state.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);

        let status = grant_salary_access(
            WalletAuth(ALICE),
            Path(1),
            State(app.state.clone()),
            Json(GrantAccessRequest { grantee: BOB }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let Json(access) =
            can_view_compensation(Path((1, BOB.to_string())), State(app.state.clone()))
                .await
                .unwrap();
        assert!(access.allowed);
        assert!(
            reveal_compensation(WalletAuth(BOB), Path(1), State(app.state.clone()))
                .await
                .is_ok()
        );
    }
}
