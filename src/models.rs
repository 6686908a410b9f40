// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response structures used by the REST API. All types derive
//! `Serialize`/`Deserialize` and `ToSchema` for JSON handling and OpenAPI
//! documentation.
//!
//! ## Model Categories
//!
//! - **Exercises**: per-user rep history and aggregates (push-ups, sit-ups)
//! - **Athletes**: profile rows of the `users` table
//! - **Deep analysis**: vision coaching request/response

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::error::ApiError;

// =============================================================================
// Exercises
// =============================================================================

/// Tracked exercise. Each one is stored in a table of the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Exercise {
    Pushups,
    Situps,
}

impl Exercise {
    pub fn table(&self) -> &'static str {
        match self {
            Exercise::Pushups => "pushups",
            Exercise::Situps => "situps",
        }
    }

    /// Upper bound for reps in one session.
    pub fn max_session_reps(&self) -> u32 {
        match self {
            Exercise::Pushups => 1000,
            Exercise::Situps => 2000,
        }
    }
}

impl std::fmt::Display for Exercise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table())
    }
}

/// A user's record for one exercise.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ExerciseRecord {
    pub id: String,
    pub user_id: String,
    /// Reps per session, oldest first.
    #[serde(default)]
    pub history: Vec<u32>,
    pub max_reps: Option<u32>,
    pub avg_reps: Option<f64>,
    pub last_tracked: Option<DateTime<Utc>>,
    /// Latest session score (0-100).
    pub score: Option<f64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Aggregates derived from a rep history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepAggregates {
    pub max_reps: Option<u32>,
    pub avg_reps: Option<f64>,
}

impl RepAggregates {
    pub fn from_history(history: &[u32]) -> Self {
        if history.is_empty() {
            return Self {
                max_reps: None,
                avg_reps: None,
            };
        }
        let total: u64 = history.iter().map(|&r| u64::from(r)).sum();
        Self {
            max_reps: history.iter().copied().max(),
            avg_reps: Some(total as f64 / history.len() as f64),
        }
    }
}

/// Optional first session when creating a record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CreateExerciseRequest {
    pub session_reps: Option<u32>,
    pub session_score: Option<f64>,
}

/// A session to append to a record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecordSessionRequest {
    pub session_reps: u32,
    pub session_score: Option<f64>,
}

/// Check a session against the exercise's limits.
pub fn validate_session(
    exercise: Exercise,
    reps: Option<u32>,
    score: Option<f64>,
) -> Result<(), ApiError> {
    if let Some(reps) = reps {
        if reps > exercise.max_session_reps() {
            return Err(ApiError::unprocessable(format!(
                "session_reps must be between 0 and {}",
                exercise.max_session_reps()
            )));
        }
    }
    if let Some(score) = score {
        if !(0.0..=100.0).contains(&score) {
            return Err(ApiError::unprocessable(
                "session_score must be between 0 and 100",
            ));
        }
    }
    Ok(())
}

/// Row written when a record is first created.
#[derive(Debug, Serialize)]
pub struct NewExerciseRecord<'a> {
    pub user_id: &'a str,
    pub history: Vec<u32>,
    pub max_reps: Option<u32>,
    pub avg_reps: Option<f64>,
    pub last_tracked: Option<DateTime<Utc>>,
    pub score: Option<f64>,
}

impl<'a> NewExerciseRecord<'a> {
    pub fn new(user_id: &'a str, history: Vec<u32>, score: Option<f64>) -> Self {
        let aggregates = RepAggregates::from_history(&history);
        let last_tracked = if history.is_empty() { None } else { Some(Utc::now()) };
        Self {
            user_id,
            history,
            max_reps: aggregates.max_reps,
            avg_reps: aggregates.avg_reps,
            last_tracked,
            score,
        }
    }
}

/// Changes written when a session is appended.
#[derive(Debug, Serialize)]
pub struct SessionUpdate {
    pub history: Vec<u32>,
    pub max_reps: Option<u32>,
    pub avg_reps: Option<f64>,
    pub last_tracked: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl SessionUpdate {
    /// Append `reps` to `record`'s history and recompute aggregates.
    pub fn append(record: &ExerciseRecord, reps: u32, score: Option<f64>) -> Self {
        let mut history = record.history.clone();
        history.push(reps);
        let aggregates = RepAggregates::from_history(&history);
        Self {
            history,
            max_reps: aggregates.max_reps,
            avg_reps: aggregates.avg_reps,
            last_tracked: Utc::now(),
            score,
        }
    }
}

// =============================================================================
// Athletes
// =============================================================================

/// Columns exposed for athletes.
pub const ATHLETE_COLUMNS: &[&str] = &[
    "id",
    "username",
    "full_name",
    "age",
    "gender",
    "height_cm",
    "weight_kg",
    "coach_id",
];

/// An athlete profile (row of the `users` table).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Athlete {
    pub id: String,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub coach_id: Option<String>,
}

// =============================================================================
// Deep Analysis
// =============================================================================

/// Request for vision coaching feedback on a short set.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnalyzeRequest {
    /// User the frames belong to.
    pub user_id: String,
    pub exercise: Exercise,
    /// Base64 images or data URLs, earliest first.
    pub frames: Vec<String>,
    /// Replaces the default coaching prompt; user context is still appended.
    pub prompt: Option<String>,
    /// Overrides the configured vision model.
    pub model: Option<String>,
    /// Sampling temperature (0-2).
    pub temperature: Option<f64>,
    /// Output token cap (1-4096).
    pub max_output_tokens: Option<u32>,
}

impl AnalyzeRequest {
    pub const DEFAULT_TEMPERATURE: f64 = 0.2;
    pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 400;

    pub fn validate(&self) -> Result<(), ApiError> {
        if self.frames.is_empty() {
            return Err(ApiError::unprocessable("frames must not be empty"));
        }
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(ApiError::unprocessable("temperature must be between 0 and 2"));
            }
        }
        if let Some(n) = self.max_output_tokens {
            if !(1..=4096).contains(&n) {
                return Err(ApiError::unprocessable(
                    "max_output_tokens must be between 1 and 4096",
                ));
            }
        }
        Ok(())
    }
}

/// Coaching feedback and the context it was generated with.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnalyzeResponse {
    pub result: String,
    pub frames_used: usize,
    pub model: String,
    #[schema(value_type = Object)]
    pub context_used: HashMap<String, Value>,
}
