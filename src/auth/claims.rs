// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and authenticated user representation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Claims decoded from a verified token.
///
/// `sub` is required. Everything the identity provider puts in the payload
/// besides the named fields is preserved in `extra`, so serializing a
/// `Claims` reproduces the original payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID); empty when absent, which verification rejects
    #[serde(default)]
    pub sub: String,

    /// Email address, when the provider includes it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Expiration timestamp
    #[serde(default)]
    pub exp: i64,

    /// Remaining payload members (`aud`, `iat`, `role`, ...)
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Authenticated user information extracted from a verified token.
///
/// Proof of authentication only; it carries no permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    /// Canonical user ID (`sub` claim)
    pub user_id: String,

    /// Email address (if available)
    pub email: Option<String>,

    /// Token expiration (Unix timestamp, not serialized)
    #[serde(skip)]
    pub expires_at: i64,
}

impl AuthenticatedUser {
    /// Create from verified claims.
    pub fn from_claims(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            expires_at: claims.exp,
        }
    }
}
