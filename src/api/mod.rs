// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth,
    fhe::{EncryptedInput, InputRegistrationRequest},
    gateway::{CallbackRequest, DecryptionRequest, Resolution},
    models::{
        AccessResponse, ApprovalResponse, CallbackResponse, CountResponse, CreateProposalRequest,
        CreateTeamRequest, CreatedResponse, GrantAccessRequest, LookupResponse,
        RegisterAthleteRequest, RegistryInfoResponse, TeamAthletesResponse,
    },
    registry::{AthleteInfo, Compensation, EventRecord, ProposalInfo, ProposalStatus, RegistryEvent, TeamInfo},
    state::AppState,
};

pub mod athletes;
pub mod events;
pub mod gateway;
pub mod health;
pub mod proposals;
pub mod teams;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/registry", get(events::registry_info))
        .route("/events", get(events::list_events))
        .route("/teams", post(teams::create_team))
        .route("/teams/count", get(teams::team_count))
        .route("/teams/{team_id}", get(teams::get_team))
        .route("/teams/{team_id}/athletes", get(teams::get_team_athletes))
        .route("/managers/{address}/team", get(teams::team_by_manager))
        .route("/athletes", post(athletes::register_athlete))
        .route("/athletes/count", get(athletes::athlete_count))
        .route("/athletes/{athlete_id}", get(athletes::get_athlete))
        .route(
            "/athletes/{athlete_id}/access",
            post(athletes::grant_salary_access),
        )
        .route(
            "/athletes/{athlete_id}/access/{viewer}",
            get(athletes::can_view_compensation),
        )
        .route(
            "/athletes/{athlete_id}/compensation",
            get(athletes::reveal_compensation),
        )
        .route("/wallets/{address}/athlete", get(athletes::athlete_by_wallet))
        .route(
            "/proposals",
            get(proposals::list_proposals).post(proposals::create_proposal),
        )
        .route("/proposals/count", get(proposals::proposal_count))
        .route("/proposals/{proposal_id}", get(proposals::get_proposal))
        .route(
            "/proposals/{proposal_id}/approve",
            post(proposals::approve_proposal),
        )
        .route(
            "/proposals/{proposal_id}/reject",
            post(proposals::reject_proposal),
        )
        .route(
            "/proposals/{proposal_id}/cancel",
            post(proposals::cancel_proposal),
        )
        .route(
            "/proposals/{proposal_id}/expire",
            post(proposals::expire_proposal),
        )
        .route("/gateway/requests", get(gateway::pending_requests))
        .route("/gateway/requests/{request_id}", get(gateway::get_request))
        .route("/gateway/callbacks", post(gateway::submit_callback))
        .route("/fhe/inputs", post(gateway::register_input))
        .layer(middleware::from_fn(auth::digest_body))
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    Router::new()
        .nest("/v1", v1_routes)
        .merge(health_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        events::registry_info,
        events::list_events,
        teams::create_team,
        teams::get_team,
        teams::get_team_athletes,
        teams::team_count,
        teams::team_by_manager,
        athletes::register_athlete,
        athletes::get_athlete,
        athletes::athlete_count,
        athletes::athlete_by_wallet,
        athletes::grant_salary_access,
        athletes::can_view_compensation,
        athletes::reveal_compensation,
        proposals::create_proposal,
        proposals::list_proposals,
        proposals::get_proposal,
        proposals::proposal_count,
        proposals::approve_proposal,
        proposals::reject_proposal,
        proposals::cancel_proposal,
        proposals::expire_proposal,
        gateway::pending_requests,
        gateway::get_request,
        gateway::submit_callback,
        gateway::register_input
    ),
    components(
        schemas(
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse,
            TeamInfo,
            AthleteInfo,
            ProposalInfo,
            ProposalStatus,
            Compensation,
            EventRecord,
            RegistryEvent,
            DecryptionRequest,
            Resolution,
            EncryptedInput,
            InputRegistrationRequest,
            CallbackRequest,
            CreateTeamRequest,
            RegisterAthleteRequest,
            CreateProposalRequest,
            GrantAccessRequest,
            CreatedResponse,
            ApprovalResponse,
            CallbackResponse,
            CountResponse,
            LookupResponse,
            TeamAthletesResponse,
            AccessResponse,
            RegistryInfoResponse
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness checks"),
        (name = "Registry", description = "Deployment parameters and the event log"),
        (name = "Teams", description = "Team creation and lookups"),
        (name = "Athletes", description = "Athlete registration and compensation access"),
        (name = "Proposals", description = "Contract proposal lifecycle"),
        (name = "Gateway", description = "Decryption requests, oracle callbacks and input encryption")
    )
)]
struct ApiDoc;
