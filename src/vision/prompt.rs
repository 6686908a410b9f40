// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Coaching prompt composition.

use chrono::{DateTime, NaiveDateTime};
use serde_json::Value;

use crate::db::Row;
use crate::models::Exercise;

/// Instructions used when the caller does not supply a prompt.
pub const DEFAULT_PROMPT: &str = "You are a movement coach reviewing one short set of an \
exercise from a sequence of frames. Do not count repetitions. Give 4 to 6 short bullet points \
about posture, joint alignment, range of motion, depth, tempo and safety. Look for patterns \
that hold across frames and ignore one-off glitches. If the camera angle or lighting makes a \
call uncertain, say so and suggest how to reposition. Do not comment on body weight, fitness \
level or training programs. Plain text only.";

const CLOSING: &str = "Return 4 to 6 precise bullets. If the camera angle or lighting blocks \
assessment, say what to adjust. No training loads and no medical claims.";

/// History entries included in the context line.
pub const RECENT_HISTORY: usize = 10;

/// Append a one-line personalization context to `base` (or [`DEFAULT_PROMPT`]).
///
/// Context lines whose values are missing are left out rather than rendered
/// as placeholders.
pub fn compose(base: Option<&str>, user: &Row, record: Option<&Row>, exercise: Exercise) -> String {
    let empty = Row::new();
    let record = record.unwrap_or(&empty);

    let name = ["full_name", "username", "id"]
        .iter()
        .find_map(|key| text(user, key));

    let lines = [
        line(&[("User", name)]),
        line(&[("Age", text(user, "age")), ("Gender", text(user, "gender"))]),
        line(&[
            ("Height", text(user, "height_cm").map(|v| format!("{v} cm"))),
            ("Weight", text(user, "weight_kg").map(|v| format!("{v} kg"))),
        ]),
        Some(format!("Exercise: {exercise}")),
        line(&[
            ("Max reps", text(record, "max_reps")),
            ("Avg reps", text(record, "avg_reps")),
            ("Score", text(record, "score")),
        ]),
        line(&[("Last tracked", record.get("last_tracked").and_then(timestamp))]),
        line(&[("Recent history (most recent last)", recent_history(record))]),
    ];

    let context = lines.into_iter().flatten().collect::<Vec<_>>().join(" | ");
    let base = base.map(str::trim).filter(|b| !b.is_empty()).unwrap_or(DEFAULT_PROMPT);

    format!(
        "{base}\n\nContext for personalization (use if relevant; do not guess missing data): \
         {context}.\n{CLOSING}"
    )
}

/// `"A: x, B: y"`, or `None` when any value is missing.
fn line(fields: &[(&str, Option<String>)]) -> Option<String> {
    let parts = fields
        .iter()
        .map(|(label, value)| value.as_ref().map(|v| format!("{label}: {v}")))
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join(", "))
}

fn text(row: &Row, key: &str) -> Option<String> {
    match row.get(key)? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// `YYYY-MM-DD HH:MM`. Accepts RFC 3339 and naive ISO 8601 (no offset);
/// anything else is returned as is.
fn timestamp(value: &Value) -> Option<String> {
    const FORMAT: &str = "%Y-%m-%d %H:%M";
    let raw = value.as_str()?;
    let formatted = DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.format(FORMAT).to_string())
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|ts| ts.format(FORMAT).to_string())
        })
        .unwrap_or_else(|_| raw.to_string());
    Some(formatted)
}

fn recent_history(record: &Row) -> Option<String> {
    let history = record.get("history")?.as_array()?;
    if history.is_empty() {
        return None;
    }
    let start = history.len().saturating_sub(RECENT_HISTORY);
    let recent: Vec<String> = history[start..].iter().map(Value::to_string).collect();
    Some(format!("[{}]", recent.join(", ")))
}
