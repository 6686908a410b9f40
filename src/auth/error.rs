// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.
//!
//! Every client-side failure maps to the same 401 body so callers cannot tell
//! which verification step rejected them. Operator faults (missing
//! configuration, unreachable key set) are 500s.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Generic message returned for every 401.
pub const UNAUTHORIZED_MESSAGE: &str = "Invalid token";

/// Generic message returned when authentication cannot run at all.
const UNAVAILABLE_MESSAGE: &str = "Authentication is temporarily unavailable";

/// Why a token was rejected.
///
/// Internal only: used for logging and tests, never serialized to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Header segment could not be decoded.
    MalformedToken,
    /// No key in the key set matches the token's `kid`.
    UnknownKey,
    /// Signature does not verify with the matched key and configured algorithm.
    BadSignature,
    /// Expired, wrong audience, or missing required claims.
    ClaimRejected,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::MalformedToken => "malformed_token",
            Rejection::UnknownKey => "unknown_key",
            Rejection::BadSignature => "bad_signature",
            Rejection::ClaimRejected => "claim_rejected",
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authentication error type.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No authorization header present
    #[error("Authorization header is required")]
    MissingAuthHeader,
    /// Header present but not `Bearer <token>`
    #[error("Invalid authorization header format (expected 'Bearer <token>')")]
    InvalidAuthHeader,
    /// Token failed verification
    #[error("Token rejected: {0}")]
    Rejected(Rejection),
    /// Required auth configuration is missing
    #[error("Authentication is not configured: {0}")]
    Configuration(String),
    /// JWKS could not be fetched or parsed
    #[error("Failed to fetch JWKS: {0}")]
    KeySetFetch(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: &'static str,
}

impl AuthError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeader
            | AuthError::Rejected(_) => StatusCode::UNAUTHORIZED,
            AuthError::Configuration(_) | AuthError::KeySetFetch(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The rejection reason, if this is a verification failure.
    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            AuthError::Rejected(reason) => Some(*reason),
            _ => None,
        }
    }

    fn public_message(&self) -> &'static str {
        if self.status_code() == StatusCode::UNAUTHORIZED {
            UNAUTHORIZED_MESSAGE
        } else {
            UNAVAILABLE_MESSAGE
        }
    }
}

impl From<Rejection> for AuthError {
    fn from(reason: Rejection) -> Self {
        AuthError::Rejected(reason)
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Authentication could not be performed");
        } else {
            tracing::debug!(error = %self, "Request rejected as unauthorized");
        }
        let body = Json(AuthErrorBody {
            error: self.public_message(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(err: AuthError) -> (StatusCode, String) {
        let response = err.into_response();
        let status = response.status();
        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body_bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn every_client_failure_has_the_same_body() {
        let cases = [
            AuthError::MissingAuthHeader,
            AuthError::InvalidAuthHeader,
            Rejection::MalformedToken.into(),
            Rejection::UnknownKey.into(),
            Rejection::BadSignature.into(),
            Rejection::ClaimRejected.into(),
        ];

        for err in cases {
            let (status, body) = body_of(err).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body, r#"{"error":"Invalid token"}"#);
        }
    }

    #[tokio::test]
    async fn operator_faults_are_500_without_detail() {
        let (status, body) = body_of(AuthError::KeySetFetch("connect refused 10.0.0.1".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.contains("10.0.0.1"));

        let (status, _) = body_of(AuthError::Configuration("JWKS URL".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn rejection_is_exposed_for_logging() {
        let err = AuthError::from(Rejection::UnknownKey);
        assert_eq!(err.rejection(), Some(Rejection::UnknownKey));
        assert_eq!(err.to_string(), "Token rejected: unknown_key");
        assert_eq!(AuthError::MissingAuthHeader.rejection(), None);
    }
}
