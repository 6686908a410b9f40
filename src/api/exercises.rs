// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-user exercise records.
//!
//! Each exercise has its own table holding at most one record per user. The
//! record keeps the full session history and aggregates recomputed on every
//! write.

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    auth::Auth,
    db::{from_row, select_one, to_row, Filter, Select},
    error::{ApiError, JsonBody},
    models::{
        validate_session, CreateExerciseRequest, Exercise, ExerciseRecord, NewExerciseRecord,
        RecordSessionRequest, SessionUpdate,
    },
    state::AppState,
};

// =============================================================================
// Shared operations
// =============================================================================

async fn find_record(
    state: &AppState,
    exercise: Exercise,
    user_id: &str,
) -> Result<Option<ExerciseRecord>, ApiError> {
    let query = Select::from(exercise.table()).eq("user_id", user_id);
    match select_one(state.db.as_ref(), query).await? {
        Some(row) => Ok(Some(from_row(row)?)),
        None => Ok(None),
    }
}

async fn insert_record(
    state: &AppState,
    exercise: Exercise,
    record: NewExerciseRecord<'_>,
) -> Result<ExerciseRecord, ApiError> {
    let rows = state.db.insert(exercise.table(), to_row(&record)?).await?;
    let row = rows
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::internal(format!("failed to create {exercise} record")))?;

    tracing::info!(user_id = %record.user_id, %exercise, "Created exercise record");
    Ok(from_row(row)?)
}

async fn get_record(
    state: &AppState,
    exercise: Exercise,
    user_id: &str,
) -> Result<Json<ExerciseRecord>, ApiError> {
    find_record(state, exercise, user_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("no {exercise} record")))
}

/// Create the caller's record, or return the existing one unchanged.
async fn create_record(
    state: &AppState,
    exercise: Exercise,
    user_id: &str,
    request: CreateExerciseRequest,
) -> Result<(StatusCode, Json<ExerciseRecord>), ApiError> {
    validate_session(exercise, request.session_reps, request.session_score)?;

    if let Some(existing) = find_record(state, exercise, user_id).await? {
        return Ok((StatusCode::OK, Json(existing)));
    }

    // A score only makes sense alongside the session it was earned in.
    let (history, score) = match request.session_reps {
        Some(reps) => (vec![reps], request.session_score),
        None => (Vec::new(), None),
    };

    let created = insert_record(state, exercise, NewExerciseRecord::new(user_id, history, score)).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Append a session, creating the record when the caller has none yet.
///
/// Read then update, not atomic: two concurrent appends for the same user can
/// both read the same history and one session is lost.
async fn record_session(
    state: &AppState,
    exercise: Exercise,
    user_id: &str,
    request: RecordSessionRequest,
) -> Result<Json<ExerciseRecord>, ApiError> {
    validate_session(exercise, Some(request.session_reps), request.session_score)?;

    let Some(record) = find_record(state, exercise, user_id).await? else {
        let record = NewExerciseRecord::new(user_id, vec![request.session_reps], request.session_score);
        return insert_record(state, exercise, record).await.map(Json);
    };

    let update = SessionUpdate::append(&record, request.session_reps, request.session_score);
    let rows = state
        .db
        .update(exercise.table(), &[Filter::eq("id", record.id.as_str())], to_row(&update)?)
        .await?;
    let row = rows
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::not_found(format!("{exercise} record not found")))?;

    tracing::debug!(user_id, %exercise, reps = request.session_reps, "Recorded session");
    Ok(Json(from_row(row)?))
}

// =============================================================================
// Push-ups
// =============================================================================

/// Get the caller's push-ups record.
#[utoipa::path(
    get,
    path = "/pushups",
    tag = "Exercises",
    security(("bearer" = [])),
    responses(
        (status = 200, body = ExerciseRecord),
        (status = 401, description = "Invalid or missing token"),
        (status = 404, description = "No record yet")
    )
)]
pub async fn get_pushups(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<ExerciseRecord>, ApiError> {
    get_record(&state, Exercise::Pushups, &user.user_id).await
}

/// Create the caller's push-ups record (idempotent).
#[utoipa::path(
    post,
    path = "/pushups",
    tag = "Exercises",
    security(("bearer" = [])),
    request_body = CreateExerciseRequest,
    responses(
        (status = 201, description = "Record created", body = ExerciseRecord),
        (status = 200, description = "Record already existed", body = ExerciseRecord),
        (status = 422, description = "Session out of range")
    )
)]
pub async fn create_pushups(
    Auth(user): Auth,
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CreateExerciseRequest>,
) -> Result<(StatusCode, Json<ExerciseRecord>), ApiError> {
    create_record(&state, Exercise::Pushups, &user.user_id, request).await
}

/// Append a push-ups session.
#[utoipa::path(
    patch,
    path = "/pushups",
    tag = "Exercises",
    security(("bearer" = [])),
    request_body = RecordSessionRequest,
    responses(
        (status = 200, body = ExerciseRecord),
        (status = 422, description = "Session out of range")
    )
)]
pub async fn record_pushups(
    Auth(user): Auth,
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RecordSessionRequest>,
) -> Result<Json<ExerciseRecord>, ApiError> {
    record_session(&state, Exercise::Pushups, &user.user_id, request).await
}

// =============================================================================
// Sit-ups
// =============================================================================

/// Get the caller's sit-ups record.
#[utoipa::path(
    get,
    path = "/situps",
    tag = "Exercises",
    security(("bearer" = [])),
    responses(
        (status = 200, body = ExerciseRecord),
        (status = 401, description = "Invalid or missing token"),
        (status = 404, description = "No record yet")
    )
)]
pub async fn get_situps(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<ExerciseRecord>, ApiError> {
    get_record(&state, Exercise::Situps, &user.user_id).await
}

/// Create the caller's sit-ups record (idempotent).
#[utoipa::path(
    post,
    path = "/situps",
    tag = "Exercises",
    security(("bearer" = [])),
    request_body = CreateExerciseRequest,
    responses(
        (status = 201, description = "Record created", body = ExerciseRecord),
        (status = 200, description = "Record already existed", body = ExerciseRecord),
        (status = 422, description = "Session out of range")
    )
)]
pub async fn create_situps(
    Auth(user): Auth,
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CreateExerciseRequest>,
) -> Result<(StatusCode, Json<ExerciseRecord>), ApiError> {
    create_record(&state, Exercise::Situps, &user.user_id, request).await
}

/// Append a sit-ups session.
#[utoipa::path(
    patch,
    path = "/situps",
    tag = "Exercises",
    security(("bearer" = [])),
    request_body = RecordSessionRequest,
    responses(
        (status = 200, body = ExerciseRecord),
        (status = 422, description = "Session out of range")
    )
)]
pub async fn record_situps(
    Auth(user): Auth,
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RecordSessionRequest>,
) -> Result<Json<ExerciseRecord>, ApiError> {
    record_session(&state, Exercise::Situps, &user.user_id, request).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::auth::{testing, KeySetCache, TokenVerifier};
    use crate::config::AuthSettings;

    fn state() -> AppState {
        let keys = Arc::new(KeySetCache::from_keys(testing::jwks()));
        AppState::for_tests(TokenVerifier::new(keys, &AuthSettings::new("", testing::AUDIENCE)))
    }

    fn session(reps: u32, score: Option<f64>) -> RecordSessionRequest {
        RecordSessionRequest {
            session_reps: reps,
            session_score: score,
        }
    }

    #[tokio::test]
    async fn missing_record_is_not_found() {
        let err = get_record(&state(), Exercise::Pushups, "u1").await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "no pushups record");
    }

    #[tokio::test]
    async fn create_is_idempotent() {
        let state = state();
        let first = CreateExerciseRequest {
            session_reps: Some(12),
            session_score: Some(75.0),
        };
        let (status, Json(created)) = create_record(&state, Exercise::Situps, "u1", first).await.unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.history, vec![12]);
        assert_eq!(created.max_reps, Some(12));
        assert!(created.last_tracked.is_some());

        let again = CreateExerciseRequest {
            session_reps: Some(40),
            session_score: None,
        };
        let (status, Json(existing)) = create_record(&state, Exercise::Situps, "u1", again).await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(existing, created);
    }

    #[tokio::test]
    async fn empty_create_has_no_aggregates() {
        let request = CreateExerciseRequest {
            session_reps: None,
            session_score: Some(90.0),
        };
        let (_, Json(created)) = create_record(&state(), Exercise::Pushups, "u1", request).await.unwrap();
        assert!(created.history.is_empty());
        assert_eq!(created.max_reps, None);
        assert_eq!(created.score, None);
        assert_eq!(created.last_tracked, None);
    }

    #[tokio::test]
    async fn sessions_append_and_recompute() {
        let state = state();
        record_session(&state, Exercise::Pushups, "u1", session(10, Some(60.0))).await.unwrap();
        record_session(&state, Exercise::Pushups, "u1", session(30, None)).await.unwrap();
        let Json(record) = record_session(&state, Exercise::Pushups, "u1", session(20, None)).await.unwrap();

        assert_eq!(record.history, vec![10, 30, 20]);
        assert_eq!(record.max_reps, Some(30));
        assert_eq!(record.avg_reps, Some(20.0));
        assert_eq!(record.score, Some(60.0), "absent score keeps the previous one");

        let Json(fetched) = get_record(&state, Exercise::Pushups, "u1").await.unwrap();
        assert_eq!(fetched, record);
    }

    #[tokio::test]
    async fn exercises_and_users_are_isolated() {
        let state = state();
        record_session(&state, Exercise::Pushups, "u1", session(10, None)).await.unwrap();

        assert!(get_record(&state, Exercise::Situps, "u1").await.is_err());
        assert!(get_record(&state, Exercise::Pushups, "u2").await.is_err());
    }

    #[tokio::test]
    async fn out_of_range_sessions_are_rejected() {
        let state = state();
        let err = record_session(&state, Exercise::Pushups, "u1", session(1001, None))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);

        let ok = record_session(&state, Exercise::Situps, "u1", session(1500, None)).await;
        assert!(ok.is_ok());

        let err = record_session(&state, Exercise::Situps, "u1", session(5, Some(101.0)))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
