// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Vision coaching feedback.

use std::collections::HashMap;

use axum::{extract::State, Json};
use serde_json::Value;

use crate::{
    auth::Auth,
    db::{select_one, Row, Select},
    error::{ApiError, JsonBody},
    models::{AnalyzeRequest, AnalyzeResponse},
    state::AppState,
    vision::{prompt, VisionRequest},
};

const USER_CONTEXT_COLUMNS: &[&str] = &[
    "id",
    "username",
    "full_name",
    "age",
    "gender",
    "height_cm",
    "weight_kg",
    "coach_id",
    "updated_at",
    "created_at",
];

/// Analyze a short set from its frames.
///
/// The prompt is personalized with the athlete's profile and their latest
/// record for the exercise, when one exists.
#[utoipa::path(
    post,
    path = "/deep/analyze",
    tag = "Deep Analysis",
    security(("bearer" = [])),
    request_body = AnalyzeRequest,
    responses(
        (status = 200, body = AnalyzeResponse),
        (status = 404, description = "user not found"),
        (status = 422, description = "Invalid frames or generation options"),
        (status = 502, description = "Vision model failed")
    )
)]
pub async fn analyze(
    Auth(caller): Auth,
    State(state): State<AppState>,
    JsonBody(request): JsonBody<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    request.validate()?;

    let user_query = Select::from("users")
        .columns(USER_CONTEXT_COLUMNS)
        .eq("id", request.user_id.as_str());
    let user = select_one(state.db.as_ref(), user_query)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;

    let record_query = Select::from(request.exercise.table())
        .eq("user_id", request.user_id.as_str())
        .order_by("updated_at", true);
    let record = select_one(state.db.as_ref(), record_query).await?;

    let settings = &state.vision_settings;
    let model = request
        .model
        .clone()
        .unwrap_or_else(|| settings.default_model.clone());
    let frames_used = request.frames.len().min(settings.max_frames.get());

    tracing::info!(
        caller = %caller.user_id,
        user_id = %request.user_id,
        exercise = %request.exercise,
        frames = request.frames.len(),
        frames_used,
        %model,
        "Deep analysis requested"
    );

    let vision_request = VisionRequest {
        prompt: prompt::compose(
            request.prompt.as_deref(),
            &user,
            record.as_ref(),
            request.exercise,
        ),
        frames: request.frames,
        model: model.clone(),
        max_output_tokens: request
            .max_output_tokens
            .unwrap_or(AnalyzeRequest::DEFAULT_MAX_OUTPUT_TOKENS),
        temperature: request
            .temperature
            .unwrap_or(AnalyzeRequest::DEFAULT_TEMPERATURE),
    };
    let result = state.vision.analyze(vision_request).await?;

    let context_used = HashMap::from([
        ("user".to_string(), Value::Object(user)),
        ("exercise".to_string(), Value::Object(record.unwrap_or_else(Row::new))),
    ]);

    Ok(Json(AnalyzeResponse {
        result,
        frames_used,
        model,
        context_used,
    }))
}
