// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::ledger::LedgerError;
use crate::registry::ErrorKind;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub code: &'static str,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    error_code: &'static str,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        let not_found = e.as_registry().is_some_and(|r| r.is_not_found());
        let status = match e.kind() {
            ErrorKind::Validation if not_found => StatusCode::NOT_FOUND,
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Authorization => StatusCode::FORBIDDEN,
            ErrorKind::StateConflict => StatusCode::CONFLICT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %e, "Ledger failure");
        }
        Self::new(status, e.error_code(), e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
            error_code: self.code,
        });
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistryError;
    use axum::body::to_bytes;

    #[test]
    fn registry_errors_map_to_status() {
        let cases = [
            (RegistryError::UnknownTeam(1), StatusCode::NOT_FOUND),
            (RegistryError::InvalidDuration { max: 600 }, StatusCode::BAD_REQUEST),
            (RegistryError::NotManager(1), StatusCode::FORBIDDEN),
            (RegistryError::AlreadyPendingDecision(1), StatusCode::CONFLICT),
            (RegistryError::ProposalExpired(1), StatusCode::CONFLICT),
        ];
        for (err, status) in cases {
            let api: ApiError = LedgerError::from(err).into();
            assert_eq!(api.status, status);
        }
    }

    #[test]
    fn chain_errors_are_internal() {
        let api: ApiError = LedgerError::Chain("rpc down".into()).into();
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.code, "chain_error");
    }

    #[tokio::test]
    async fn into_response_returns_json_body() {
        let response = ApiError::from(LedgerError::from(RegistryError::AlreadyResolved(3)))
            .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error_code"], "already_resolved");
        assert_eq!(body["error"], "Decryption request 3 is already resolved");
    }

    #[test]
    fn constructors_set_status_and_code() {
        let nf = ApiError::not_found("missing");
        assert_eq!(nf.status, StatusCode::NOT_FOUND);
        assert_eq!(nf.message, "missing");

        let bad = ApiError::bad_request("bad");
        assert_eq!(bad.code, "bad_request");
    }
}
