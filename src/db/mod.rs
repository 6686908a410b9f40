// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Data Access
//!
//! Table-scoped access to the managed relational store.
//!
//! Handlers talk to a [`Database`] trait object so the backing store can be
//! swapped:
//!
//! - [`PostgrestClient`] - the managed store's REST interface (production)
//! - [`InMemoryDatabase`] - process-local tables (development and tests)
//!
//! Rows are JSON objects. Typed views over rows live in [`crate::models`].

pub mod memory;
pub mod postgrest;

use async_trait::async_trait;
use serde_json::Value;

pub use memory::InMemoryDatabase;
pub use postgrest::PostgrestClient;

/// A single table row.
pub type Row = serde_json::Map<String, Value>;

pub type DbResult<T> = Result<T, DbError>;

/// Error type for data store operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("data store request failed: {0}")]
    Request(String),

    #[error("data store returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("data store response was invalid: {0}")]
    InvalidResponse(String),
}

/// Equality filter `column = value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Whether `row` satisfies this filter.
    pub fn matches(&self, row: &Row) -> bool {
        row.get(&self.column) == Some(&self.value)
    }
}

/// Result ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub descending: bool,
}

/// A select query: projection, equality filters, ordering and limit.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub table: String,
    /// `None` selects every column.
    pub columns: Option<Vec<String>>,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Select {
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: None,
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = Some(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::eq(column, value));
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, descending: bool) -> Self {
        self.order = Some(Order {
            column: column.into(),
            descending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Table-scoped access to the relational store.
#[async_trait]
pub trait Database: Send + Sync {
    /// Rows matching `query`.
    async fn select(&self, query: &Select) -> DbResult<Vec<Row>>;

    /// Insert `row` into `table`, returning the stored representation.
    async fn insert(&self, table: &str, row: Row) -> DbResult<Vec<Row>>;

    /// Apply `changes` to every row of `table` matching `filters`, returning
    /// the updated rows.
    async fn update(&self, table: &str, filters: &[Filter], changes: Row) -> DbResult<Vec<Row>>;

    /// Short name for logs and health output.
    fn backend_name(&self) -> &'static str;
}

/// First row of `query`, if any.
pub async fn select_one(db: &dyn Database, query: Select) -> DbResult<Option<Row>> {
    let rows = db.select(&query.limit(1)).await?;
    Ok(rows.into_iter().next())
}

/// Convert a typed value into a row.
pub fn to_row<T: serde::Serialize>(value: &T) -> DbResult<Row> {
    match serde_json::to_value(value) {
        Ok(Value::Object(row)) => Ok(row),
        Ok(other) => Err(DbError::InvalidResponse(format!(
            "expected an object, got {other}"
        ))),
        Err(e) => Err(DbError::InvalidResponse(e.to_string())),
    }
}

/// Convert a row into a typed value.
pub fn from_row<T: serde::de::DeserializeOwned>(row: Row) -> DbResult<T> {
    serde_json::from_value(Value::Object(row)).map_err(|e| DbError::InvalidResponse(e.to_string()))
}
