// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for authenticated users.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is AuthenticatedUser
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};

use super::{AuthError, AuthenticatedUser, TokenVerifier};
use crate::state::AppState;

/// Extractor for authenticated users.
///
/// Rejects with a uniform 401 when the `Authorization` header is missing,
/// malformed, or carries a token that fails verification.
///
/// # Example
///
/// ```rust,ignore
/// async fn get_pushups(
///     Auth(user): Auth,
///     State(state): State<AppState>,
/// ) -> Result<Json<ExerciseRecord>, ApiError> {
///     // user.user_id is the token subject
/// }
/// ```
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = authenticate(&parts.headers, &state.verifier).await?;
        Ok(Auth(user))
    }
}

/// Authenticate a request from its headers.
///
/// The verifier is not consulted unless a well-formed bearer token is present.
pub async fn authenticate(
    headers: &HeaderMap,
    verifier: &TokenVerifier,
) -> Result<AuthenticatedUser, AuthError> {
    let token = bearer_token(headers)?;
    let claims = verifier.verify(token).await?;
    Ok(AuthenticatedUser::from_claims(claims))
}

/// Extract the token from `Authorization: Bearer <token>`.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let (scheme, token) = auth_header
        .split_once(' ')
        .ok_or(AuthError::InvalidAuthHeader)?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidAuthHeader);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::InvalidAuthHeader);
    }

    Ok(token)
}
