// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    auth::Auth,
    db::{from_row, select_one, DbResult, Row, Select},
    error::ApiError,
    models::{Athlete, ATHLETE_COLUMNS},
    state::AppState,
};

const USERS_TABLE: &str = "users";

fn athletes() -> Select {
    Select::from(USERS_TABLE).columns(ATHLETE_COLUMNS)
}

fn decode(rows: Vec<Row>) -> DbResult<Vec<Athlete>> {
    rows.into_iter().map(from_row).collect()
}

#[utoipa::path(
    get,
    path = "/athletes",
    tag = "Athletes",
    security(("bearer" = [])),
    responses((status = 200, body = [Athlete]))
)]
pub async fn list_athletes(
    Auth(_user): Auth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Athlete>>, ApiError> {
    let rows = state.db.select(&athletes()).await?;
    Ok(Json(decode(rows)?))
}

#[utoipa::path(
    get,
    path = "/athletes/{athlete_id}",
    params(
        ("athlete_id" = String, Path, description = "Identifier of the athlete")
    ),
    tag = "Athletes",
    security(("bearer" = [])),
    responses(
        (status = 200, body = Athlete),
        (status = 404, description = "Athlete not found")
    )
)]
pub async fn get_athlete(
    Auth(_user): Auth,
    Path(athlete_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Athlete>, ApiError> {
    let row = select_one(state.db.as_ref(), athletes().eq("id", athlete_id))
        .await?
        .ok_or_else(|| ApiError::not_found("Athlete not found"))?;
    Ok(Json(from_row(row)?))
}

/// Athletes assigned to a coach. An unknown coach yields an empty list.
#[utoipa::path(
    get,
    path = "/coaches/{coach_id}/athletes",
    params(
        ("coach_id" = String, Path, description = "Identifier of the coach")
    ),
    tag = "Athletes",
    security(("bearer" = [])),
    responses((status = 200, body = [Athlete]))
)]
pub async fn list_coach_athletes(
    Auth(_user): Auth,
    Path(coach_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Athlete>>, ApiError> {
    let rows = state.db.select(&athletes().eq("coach_id", coach_id)).await?;
    Ok(Json(decode(rows)?))
}
