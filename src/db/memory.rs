// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory tables.
//!
//! Used by the test suite and when no data store is configured. Mirrors the
//! managed store closely enough for handlers: inserts get an `id`,
//! `created_at` and `updated_at`; updates bump `updated_at`.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Database, DbResult, Filter, Row, Select};

#[derive(Default)]
pub struct InMemoryDatabase {
    tables: RwLock<HashMap<String, Vec<Row>>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed `table` with `rows` as-is (no generated columns).
    pub async fn seed(&self, table: &str, rows: impl IntoIterator<Item = Row>) {
        let mut tables = self.tables.write().await;
        tables.entry(table.to_string()).or_default().extend(rows);
    }
}

#[async_trait]
impl Database for InMemoryDatabase {
    async fn select(&self, query: &Select) -> DbResult<Vec<Row>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Row> = tables
            .get(&query.table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| query.filters.iter().all(|f| f.matches(row)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ordering = compare_nulls_last(a.get(&order.column), b.get(&order.column));
                match (order.descending, a.get(&order.column), b.get(&order.column)) {
                    // Nulls stay last in both directions.
                    (true, Some(x), Some(y)) if !x.is_null() && !y.is_null() => ordering.reverse(),
                    _ => ordering,
                }
            });
        }

        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }

        if let Some(columns) = &query.columns {
            rows = rows
                .into_iter()
                .map(|row| {
                    columns
                        .iter()
                        .filter_map(|c| row.get(c).map(|v| (c.clone(), v.clone())))
                        .collect()
                })
                .collect();
        }

        Ok(rows)
    }

    async fn insert(&self, table: &str, mut row: Row) -> DbResult<Vec<Row>> {
        let now = Value::String(Utc::now().to_rfc3339());
        row.entry("id")
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
        row.entry("created_at").or_insert_with(|| now.clone());
        row.insert("updated_at".to_string(), now);

        let mut tables = self.tables.write().await;
        tables.entry(table.to_string()).or_default().push(row.clone());
        Ok(vec![row])
    }

    async fn update(&self, table: &str, filters: &[Filter], changes: Row) -> DbResult<Vec<Row>> {
        let now = Value::String(Utc::now().to_rfc3339());
        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(table) else {
            return Ok(Vec::new());
        };

        let mut updated = Vec::new();
        for row in rows.iter_mut().filter(|row| filters.iter().all(|f| f.matches(row))) {
            for (column, value) in &changes {
                row.insert(column.clone(), value.clone());
            }
            row.insert("updated_at".to_string(), now.clone());
            updated.push(row.clone());
        }
        Ok(updated)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Ascending comparison with missing/null values sorted last.
fn compare_nulls_last(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::to_row;
    use serde_json::json;

    fn row(value: Value) -> Row {
        to_row(&value).unwrap()
    }

    async fn seeded() -> InMemoryDatabase {
        let db = InMemoryDatabase::new();
        db.seed(
            "users",
            [
                row(json!({"id": "a", "coach_id": "c1", "age": 31})),
                row(json!({"id": "b", "coach_id": "c2", "age": 19})),
                row(json!({"id": "c", "coach_id": "c1", "age": null})),
                row(json!({"id": "d", "coach_id": "c1", "age": 25})),
            ],
        )
        .await;
        db
    }

    fn ids(rows: &[Row]) -> Vec<&str> {
        rows.iter().map(|r| r["id"].as_str().unwrap()).collect()
    }

    #[tokio::test]
    async fn select_filters_by_equality() {
        let db = seeded().await;
        let rows = db.select(&Select::from("users").eq("coach_id", "c1")).await.unwrap();
        assert_eq!(ids(&rows), vec!["a", "c", "d"]);
    }

    #[tokio::test]
    async fn select_orders_with_nulls_last() {
        let db = seeded().await;

        let asc = db.select(&Select::from("users").order_by("age", false)).await.unwrap();
        assert_eq!(ids(&asc), vec!["b", "d", "a", "c"]);

        let desc = db.select(&Select::from("users").order_by("age", true)).await.unwrap();
        assert_eq!(ids(&desc), vec!["a", "d", "b", "c"]);
    }

    #[tokio::test]
    async fn select_applies_limit_and_projection() {
        let db = seeded().await;
        let rows = db
            .select(&Select::from("users").columns(&["id"]).order_by("age", true).limit(1))
            .await
            .unwrap();
        assert_eq!(rows, vec![row(json!({"id": "a"}))]);
    }

    #[tokio::test]
    async fn unknown_table_is_empty() {
        let db = InMemoryDatabase::new();
        assert!(db.select(&Select::from("situps")).await.unwrap().is_empty());
        assert!(db
            .update("situps", &[Filter::eq("id", "x")], Row::new())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn insert_generates_id_and_timestamps() {
        let db = InMemoryDatabase::new();
        let inserted = db
            .insert("pushups", row(json!({"user_id": "u1", "history": []})))
            .await
            .unwrap();

        let stored = &inserted[0];
        assert!(Uuid::parse_str(stored["id"].as_str().unwrap()).is_ok());
        assert!(stored.contains_key("created_at"));
        assert!(stored.contains_key("updated_at"));

        let rows = db.select(&Select::from("pushups").eq("user_id", "u1")).await.unwrap();
        assert_eq!(&rows[0], stored);
    }

    #[tokio::test]
    async fn update_changes_only_matching_rows() {
        let db = seeded().await;
        let updated = db
            .update("users", &[Filter::eq("id", "b")], row(json!({"coach_id": "c1"})))
            .await
            .unwrap();

        assert_eq!(ids(&updated), vec!["b"]);
        assert_eq!(updated[0]["coach_id"], "c1");
        assert!(updated[0].contains_key("updated_at"));

        let rows = db.select(&Select::from("users").eq("coach_id", "c1")).await.unwrap();
        assert_eq!(rows.len(), 4);
    }
}
