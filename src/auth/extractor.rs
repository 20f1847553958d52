// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for the calling wallet.
//!
//! ```rust,ignore
//! async fn create_team(
//!     WalletAuth(caller): WalletAuth,
//!     State(state): State<AppState>,
//!     Json(body): Json<CreateTeamRequest>,
//! ) -> Result<Json<CreatedResponse>, ApiError> {
//!     // caller is the verified sender address
//! }
//! ```
//!
//! The signature covers the body through [`BodyDigest`], which the
//! [`digest_body`] layer attaches before any extractor runs.

use alloy::{
    primitives::{keccak256, Address, Signature, B256},
    signers::{local::PrivateKeySigner, SignerSync},
};
use axum::{
    body::{to_bytes, Body},
    extract::{FromRequestParts, OriginalUri, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use super::{AuthError, CLOCK_SKEW_LEEWAY};
use crate::state::AppState;

pub const WALLET_ADDRESS_HEADER: &str = "x-wallet-address";
pub const WALLET_TIMESTAMP_HEADER: &str = "x-wallet-timestamp";
pub const WALLET_SIGNATURE_HEADER: &str = "x-wallet-signature";

/// Largest body the digest layer buffers (matches axum's `Json` default).
pub const MAX_SIGNED_BODY_BYTES: usize = 2 * 1024 * 1024;

/// `keccak256` of the raw request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyDigest(pub B256);

impl BodyDigest {
    pub fn of(body: &[u8]) -> Self {
        Self(keccak256(body))
    }
}

/// Buffer the body, record its digest in the request extensions and pass
/// the same bytes on to the handler.
pub async fn digest_body(request: Request, next: Next) -> Result<Response, AuthError> {
    let (mut parts, body) = request.into_parts();
    let bytes = to_bytes(body, MAX_SIGNED_BODY_BYTES)
        .await
        .map_err(|_| AuthError::BodyTooLarge)?;
    parts.extensions.insert(BodyDigest::of(&bytes));
    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}

/// The message a wallet signs for one request.
pub fn signing_message(method: &str, path: &str, timestamp: i64, body: BodyDigest) -> String {
    format!(
        "{} {} {} {}",
        method.to_uppercase(),
        path,
        timestamp,
        alloy::hex::encode_prefixed(body.0)
    )
}

/// Sign a request the way [`WalletAuth`] expects. Returns the hex signature.
pub fn sign_request(
    signer: &PrivateKeySigner,
    method: &str,
    path: &str,
    timestamp: i64,
    body: &[u8],
) -> Result<String, AuthError> {
    let message = signing_message(method, path, timestamp, BodyDigest::of(body));
    let signature = signer
        .sign_message_sync(message.as_bytes())
        .map_err(|e| AuthError::InternalError(e.to_string()))?;
    Ok(alloy::hex::encode_prefixed(signature.as_bytes()))
}

/// Check an EIP-191 signature over `message` against `address`.
pub fn verify_wallet_signature(
    address: Address,
    message: &str,
    signature_hex: &str,
) -> Result<(), AuthError> {
    let bytes = alloy::hex::decode(signature_hex.trim()).map_err(|_| AuthError::MalformedSignature)?;
    let signature = Signature::from_raw(&bytes).map_err(|_| AuthError::MalformedSignature)?;
    let recovered = signature
        .recover_address_from_msg(message.as_bytes())
        .map_err(|_| AuthError::SignatureMismatch)?;
    if recovered != address {
        return Err(AuthError::SignatureMismatch);
    }
    Ok(())
}

/// Extractor for the transaction sender.
///
/// ## Modes
///
/// - **Signed** (default): `x-wallet-address`, `x-wallet-timestamp` and
///   `x-wallet-signature` are required; the signature must cover
///   `"{METHOD} {PATH} {timestamp} {keccak256(body)}"`, the timestamp must
///   be within 60 s and the same signed message is accepted only once.
/// - **Unsigned** (`dev` builds with `AUTH_REQUIRE_SIGNATURES=false`): only
///   the address header is read.
pub struct WalletAuth(pub Address);

impl FromRequestParts<AppState> for WalletAuth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let address: Address = header(parts, WALLET_ADDRESS_HEADER)
            .ok_or(AuthError::MissingAddress)?
            .parse()
            .map_err(|_| AuthError::InvalidAddress)?;

        if !state.auth.require_signatures {
            return Ok(WalletAuth(address));
        }

        let (timestamp, signature) = match (
            header(parts, WALLET_TIMESTAMP_HEADER),
            header(parts, WALLET_SIGNATURE_HEADER),
        ) {
            (Some(t), Some(s)) => (t, s),
            _ => return Err(AuthError::MissingSignature),
        };

        let timestamp: i64 = timestamp.trim().parse().map_err(|_| AuthError::InvalidTimestamp)?;
        let now = Utc::now().timestamp();
        if (now - timestamp).abs() > CLOCK_SKEW_LEEWAY {
            return Err(AuthError::StaleTimestamp);
        }

        // Nested routers strip their prefix from `parts.uri`.
        let path = parts
            .extensions
            .get::<OriginalUri>()
            .map(|uri| uri.0.path().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());

        // Without the digest layer only an empty body can verify.
        let body = parts
            .extensions
            .get::<BodyDigest>()
            .copied()
            .unwrap_or_else(|| BodyDigest::of(&[]));

        let message = signing_message(parts.method.as_str(), &path, timestamp, body);
        verify_wallet_signature(address, &message, signature)?;
        state
            .replay
            .check_and_record(address, keccak256(message.as_bytes()), timestamp, now)?;

        Ok(WalletAuth(address))
    }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok())
}
