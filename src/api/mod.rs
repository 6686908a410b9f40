// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    body::Body,
    http::{HeaderName, Request},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    models::{
        AnalyzeRequest, AnalyzeResponse, Athlete, CreateExerciseRequest, Exercise, ExerciseRecord,
        RecordSessionRequest,
    },
    state::AppState,
};

pub mod athletes;
pub mod deep;
pub mod exercises;
pub mod health;
pub mod users;

const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn router(state: AppState) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let routes = Router::new()
        .route("/health", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/auth/me", get(users::me))
        .route(
            "/pushups",
            get(exercises::get_pushups)
                .post(exercises::create_pushups)
                .patch(exercises::record_pushups),
        )
        .route(
            "/situps",
            get(exercises::get_situps)
                .post(exercises::create_situps)
                .patch(exercises::record_situps),
        )
        .route("/athletes", get(athletes::list_athletes))
        .route("/athletes/{athlete_id}", get(athletes::get_athlete))
        .route(
            "/coaches/{coach_id}/athletes",
            get(athletes::list_coach_athletes),
        )
        .route("/deep/analyze", post(deep::analyze))
        .with_state(state);

    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default();
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id,
                )
            }),
        )
        .layer(PropagateRequestIdLayer::new(request_id));

    Router::new()
        .merge(routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(middleware)
        .layer(CorsLayer::permissive())
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::liveness,
        health::readiness,
        users::me,
        exercises::get_pushups,
        exercises::create_pushups,
        exercises::record_pushups,
        exercises::get_situps,
        exercises::create_situps,
        exercises::record_situps,
        athletes::list_athletes,
        athletes::get_athlete,
        athletes::list_coach_athletes,
        deep::analyze
    ),
    components(
        schemas(
            health::HealthResponse,
            health::ReadyResponse,
            health::HealthChecks,
            users::MeResponse,
            Exercise,
            ExerciseRecord,
            CreateExerciseRequest,
            RecordSessionRequest,
            Athlete,
            AnalyzeRequest,
            AnalyzeResponse
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Auth", description = "Identity of the presented token"),
        (name = "Exercises", description = "Per-user exercise records"),
        (name = "Athletes", description = "Athlete profiles"),
        (name = "Deep Analysis", description = "Vision coaching feedback")
    )
)]
struct ApiDoc;
