// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! PostgREST client for the managed data store.
//!
//! Requests go to `{url}/rest/v1/{table}` authenticated with the service
//! role key. Writes ask for `return=representation` so callers get the
//! stored rows back.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use url::Url;

use super::{Database, DbError, DbResult, Filter, Row, Select};
use crate::config::DatabaseSettings;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct PostgrestClient {
    base_url: Url,
    service_role_key: String,
    http: Client,
}

impl PostgrestClient {
    pub fn new(settings: &DatabaseSettings) -> DbResult<Self> {
        let mut base_url = Url::parse(&settings.url)
            .map_err(|e| DbError::Request(format!("invalid data store URL: {e}")))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| DbError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url,
            service_role_key: settings.service_role_key.clone(),
            http,
        })
    }

    /// `{base}/rest/v1/{table}` with PostgREST query parameters.
    pub fn table_url(&self, table: &str, filters: &[Filter]) -> DbResult<Url> {
        let mut url = self
            .base_url
            .join(&format!("rest/v1/{table}"))
            .map_err(|e| DbError::Request(format!("invalid table name {table:?}: {e}")))?;
        {
            let mut pairs = url.query_pairs_mut();
            for filter in filters {
                pairs.append_pair(&filter.column, &format!("eq.{}", filter_literal(&filter.value)));
            }
        }
        Ok(url)
    }

    fn select_url(&self, query: &Select) -> DbResult<Url> {
        let mut url = self.table_url(&query.table, &query.filters)?;
        {
            let mut pairs = url.query_pairs_mut();
            let columns = query
                .columns
                .as_ref()
                .map(|c| c.join(","))
                .unwrap_or_else(|| "*".to_string());
            pairs.append_pair("select", &columns);
            if let Some(order) = &query.order {
                let direction = if order.descending { "desc" } else { "asc" };
                pairs.append_pair("order", &format!("{}.{direction}.nullslast", order.column));
            }
            if let Some(limit) = query.limit {
                pairs.append_pair("limit", &limit.to_string());
            }
        }
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
    }

    async fn rows(response: Response) -> DbResult<Vec<Row>> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DbError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| DbError::InvalidResponse(e.to_string()))?;

        match body {
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(row) => Ok(row),
                    other => Err(DbError::InvalidResponse(format!(
                        "expected row object, got {other}"
                    ))),
                })
                .collect(),
            Value::Object(row) => Ok(vec![row]),
            other => Err(DbError::InvalidResponse(format!(
                "expected array of rows, got {other}"
            ))),
        }
    }
}

/// Render a filter value the way PostgREST expects it in `eq.` filters.
fn filter_literal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

#[async_trait]
impl Database for PostgrestClient {
    async fn select(&self, query: &Select) -> DbResult<Vec<Row>> {
        let url = self.select_url(query)?;
        let response = self
            .authorized(self.http.get(url))
            .send()
            .await
            .map_err(|e| DbError::Request(e.to_string()))?;
        Self::rows(response).await
    }

    async fn insert(&self, table: &str, row: Row) -> DbResult<Vec<Row>> {
        let url = self.table_url(table, &[])?;
        let response = self
            .authorized(self.http.post(url))
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await
            .map_err(|e| DbError::Request(e.to_string()))?;
        Self::rows(response).await
    }

    async fn update(&self, table: &str, filters: &[Filter], changes: Row) -> DbResult<Vec<Row>> {
        let url = self.table_url(table, filters)?;
        let response = self
            .authorized(self.http.patch(url))
            .header("Prefer", "return=representation")
            .json(&changes)
            .send()
            .await
            .map_err(|e| DbError::Request(e.to_string()))?;
        Self::rows(response).await
    }

    fn backend_name(&self) -> &'static str {
        "postgrest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::to_row;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(url: &str) -> PostgrestClient {
        PostgrestClient::new(&DatabaseSettings {
            url: url.to_string(),
            service_role_key: "service-key".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn select_url_encodes_query() {
        let client = client("https://project.supabase.co");
        let url = client
            .select_url(
                &Select::from("pushups")
                    .columns(&["id", "max_reps"])
                    .eq("user_id", "u 1")
                    .order_by("updated_at", true)
                    .limit(1),
            )
            .unwrap();

        assert_eq!(url.path(), "/rest/v1/pushups");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("user_id".to_string(), "eq.u 1".to_string()),
                ("select".to_string(), "id,max_reps".to_string()),
                ("order".to_string(), "updated_at.desc.nullslast".to_string()),
                ("limit".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn base_path_is_preserved() {
        let client = client("http://localhost:54321/proxy");
        let url = client.table_url("users", &[]).unwrap();
        assert_eq!(url.path(), "/proxy/rest/v1/users");
    }

    #[tokio::test]
    async fn select_sends_service_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/users"))
            .and(query_param("id", "eq.a"))
            .and(header("apikey", "service-key"))
            .and(header("authorization", "Bearer service-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "a"}])))
            .expect(1)
            .mount(&server)
            .await;

        let rows = client(&server.uri())
            .select(&Select::from("users").eq("id", "a"))
            .await
            .unwrap();
        assert_eq!(rows, vec![to_row(&json!({"id": "a"})).unwrap()]);
    }

    #[tokio::test]
    async fn insert_requests_representation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/situps"))
            .and(header("prefer", "return=representation"))
            .and(body_json(json!({"user_id": "u1"})))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!([{"id": "r1", "user_id": "u1"}])),
            )
            .mount(&server)
            .await;

        let rows = client(&server.uri())
            .insert("situps", to_row(&json!({"user_id": "u1"})).unwrap())
            .await
            .unwrap();
        assert_eq!(rows[0]["id"], "r1");
    }

    #[tokio::test]
    async fn update_filters_in_query_string() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/pushups"))
            .and(query_param("id", "eq.r1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let rows = client(&server.uri())
            .update(
                "pushups",
                &[Filter::eq("id", "r1")],
                to_row(&json!({"score": 50.0})).unwrap(),
            )
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_string("column does not exist"))
            .mount(&server)
            .await;

        let err = client(&server.uri())
            .select(&Select::from("users"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Status { status: 400, ref body } if body.contains("column")));
    }
}
