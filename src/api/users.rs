// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity endpoint.

use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::{Auth, AuthenticatedUser};

/// Response for GET /auth/me
#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    /// Token subject
    pub user_id: String,
    /// Email claim, `null` when the token carries none
    pub email: Option<String>,
}

impl From<AuthenticatedUser> for MeResponse {
    fn from(user: AuthenticatedUser) -> Self {
        Self {
            user_id: user.user_id,
            email: user.email,
        }
    }
}

/// Get the identity behind the presented token.
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "Auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Authenticated identity", body = MeResponse),
        (status = 401, description = "Invalid or missing token"),
    )
)]
pub async fn me(Auth(user): Auth) -> Json<MeResponse> {
    Json(user.into())
}
