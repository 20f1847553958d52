// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Caller authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No `x-wallet-address` header
    MissingAddress,
    /// Address header is not a 20-byte hex address
    InvalidAddress,
    /// Signature or timestamp header missing while signatures are required
    MissingSignature,
    /// Signature header is not a 65-byte hex signature
    MalformedSignature,
    /// Timestamp header is not a unix timestamp
    InvalidTimestamp,
    /// Timestamp outside the allowed clock skew
    StaleTimestamp,
    /// Signature does not recover to the claimed address
    SignatureMismatch,
    /// Signed message was already accepted once
    ReplayedRequest,
    /// Request body could not be buffered for the signature digest
    BodyTooLarge,
    /// Internal error
    InternalError(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAddress => "missing_wallet_address",
            AuthError::InvalidAddress => "invalid_wallet_address",
            AuthError::MissingSignature => "missing_signature",
            AuthError::MalformedSignature => "malformed_signature",
            AuthError::InvalidTimestamp => "invalid_timestamp",
            AuthError::StaleTimestamp => "stale_timestamp",
            AuthError::SignatureMismatch => "signature_mismatch",
            AuthError::ReplayedRequest => "replayed_request",
            AuthError::BodyTooLarge => "body_too_large",
            AuthError::InternalError(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::BodyTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingAddress => write!(f, "x-wallet-address header is required"),
            AuthError::InvalidAddress => write!(f, "x-wallet-address is not a valid address"),
            AuthError::MissingSignature => write!(
                f,
                "x-wallet-signature and x-wallet-timestamp headers are required"
            ),
            AuthError::MalformedSignature => write!(f, "x-wallet-signature is malformed"),
            AuthError::InvalidTimestamp => write!(f, "x-wallet-timestamp is not a unix timestamp"),
            AuthError::StaleTimestamp => write!(f, "x-wallet-timestamp is outside the allowed skew"),
            AuthError::SignatureMismatch => {
                write!(f, "Request signature does not match the wallet address")
            }
            AuthError::ReplayedRequest => write!(f, "Request signature was already used"),
            AuthError::BodyTooLarge => write!(f, "Request body is too large or unreadable"),
            AuthError::InternalError(msg) => write!(f, "Internal authentication error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
