// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Liveness response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub ok: bool,
}

/// Readiness response with individual component status.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Overall status ("ok" or "degraded").
    pub status: String,
    pub checks: HealthChecks,
}

/// Individual readiness check results.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    /// Whether the service process is running.
    pub service: String,
    /// Signing key set status ("ok" or "unavailable").
    pub jwks: String,
    /// Data store backend in use.
    pub database: String,
}

/// Check that verification keys are cached or can be fetched.
async fn check_jwks(state: &AppState) -> String {
    let keys = state.verifier.key_set();
    if keys.is_cached().await {
        return "ok".to_string();
    }
    match keys.refresh().await {
        Ok(()) => "ok".to_string(),
        Err(err) => {
            tracing::warn!(error = %err, url = %keys.jwks_url(), "Readiness: key set unavailable");
            "unavailable".to_string()
        }
    }
}

/// Liveness probe.
///
/// Always returns 200 while the process is running.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}

/// Readiness probe.
///
/// Returns 200 only when the signing key set is reachable.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Service is ready", body = ReadyResponse),
        (status = 503, description = "Service is not ready", body = ReadyResponse)
    )
)]
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let jwks = check_jwks(&state).await;
    let ready = jwks == "ok";

    let response = ReadyResponse {
        status: if ready { "ok" } else { "degraded" }.to_string(),
        checks: HealthChecks {
            service: "ok".to_string(),
            jwks,
            database: state.db.backend_name().to_string(),
        },
    };

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::auth::{testing, KeySetCache, TokenVerifier};
    use crate::config::AuthSettings;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn state_for(jwks_url: &str) -> AppState {
        let settings = AuthSettings::new(jwks_url, testing::AUDIENCE);
        let keys = Arc::new(KeySetCache::new(&settings).unwrap());
        AppState::for_tests(TokenVerifier::new(keys, &settings))
    }

    #[tokio::test]
    async fn liveness_is_ok() {
        assert!(liveness().await.0.ok);
    }

    #[tokio::test]
    async fn ready_when_keys_fetchable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(testing::jwks_json()))
            .mount(&server)
            .await;

        let (status, Json(body)) = readiness(State(state_for(&server.uri()))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.checks.jwks, "ok");
        assert_eq!(body.checks.database, "memory");
    }

    #[tokio::test]
    async fn degraded_when_keys_unreachable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let (status, Json(body)) = readiness(State(state_for(&server.uri()))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.status, "degraded");
        assert_eq!(body.checks.jwks, "unavailable");
    }
}
