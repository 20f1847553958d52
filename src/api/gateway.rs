// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Decryption gateway and input relayer endpoints.
//!
//! Callbacks are authenticated by the oracle signature in the body, not by
//! wallet headers, so any relayer may post them.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::ApiError,
    fhe::{EncryptedInput, InputRegistrationRequest},
    gateway::{CallbackRequest, DecryptionRequest},
    models::CallbackResponse,
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/v1/gateway/requests",
    tag = "Gateway",
    responses((status = 200, body = [DecryptionRequest]))
)]
pub async fn pending_requests(State(state): State<AppState>) -> Json<Vec<DecryptionRequest>> {
    Json(state.ledger.pending_requests().await)
}

#[utoipa::path(
    get,
    path = "/v1/gateway/requests/{request_id}",
    params(("request_id" = u64, Path, description = "Decryption request id")),
    tag = "Gateway",
    responses((status = 200, body = DecryptionRequest), (status = 404))
)]
pub async fn get_request(
    Path(request_id): Path<u64>,
    State(state): State<AppState>,
) -> Result<Json<DecryptionRequest>, ApiError> {
    Ok(Json(state.ledger.decryption_request(request_id).await?))
}

/// Deliver the oracle's answer for a decryption request.
#[utoipa::path(
    post,
    path = "/v1/gateway/callbacks",
    request_body = CallbackRequest,
    tag = "Gateway",
    responses(
        (status = 200, body = CallbackResponse),
        (status = 403, description = "Signature does not recover to the oracle"),
        (status = 404, description = "Unknown request"),
        (status = 409, description = "Request already resolved")
    )
)]
pub async fn submit_callback(
    State(state): State<AppState>,
    Json(request): Json<CallbackRequest>,
) -> Result<Json<CallbackResponse>, ApiError> {
    let relayer = state.ledger.config().await.oracle_signer;
    let status = state
        .ledger
        .fulfill_compliance(
            relayer,
            request.request_id,
            request.is_compliant,
            request.signature,
        )
        .await?;
    Ok(Json(CallbackResponse {
        request_id: request.request_id,
        status,
    }))
}

/// Encrypt a value on the local coprocessor and return its handle and proof.
#[utoipa::path(
    post,
    path = "/v1/fhe/inputs",
    request_body = InputRegistrationRequest,
    tag = "Gateway",
    responses((status = 201, body = EncryptedInput), (status = 500))
)]
pub async fn register_input(
    State(state): State<AppState>,
    Json(request): Json<InputRegistrationRequest>,
) -> Result<(StatusCode, Json<EncryptedInput>), ApiError> {
    let contract = request
        .contract_address
        .unwrap_or_else(|| state.ledger.contract_address());
    let input = state
        .ledger
        .register_input(request.value, contract, request.submitter)?;
    Ok((StatusCode::CREATED, Json(input)))
}
