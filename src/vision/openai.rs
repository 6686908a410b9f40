// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! OpenAI Responses API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, warn};
use url::Url;

use super::{frames, VisionAnalyzer, VisionError, VisionRequest};
use crate::config::VisionSettings;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_ATTEMPTS: u32 = 3;
const BASE_RETRY_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct OpenAiVision {
    endpoint: Url,
    api_key: Option<String>,
    max_frames: usize,
    retry_delay: Duration,
    http: Client,
}

impl OpenAiVision {
    pub fn new(settings: &VisionSettings) -> Result<Self, VisionError> {
        let mut base = Url::parse(&settings.base_url)
            .map_err(|e| VisionError::Request(format!("invalid vision base URL: {e}")))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base
            .join("v1/responses")
            .map_err(|e| VisionError::Request(e.to_string()))?;

        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| VisionError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            endpoint,
            api_key: settings.api_key.clone(),
            max_frames: settings.max_frames.get(),
            retry_delay: BASE_RETRY_DELAY,
            http,
        })
    }

    /// Delay before the second attempt; doubles for each one after.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    fn body(&self, request: &VisionRequest) -> Value {
        let mut content = vec![json!({"type": "input_text", "text": request.prompt})];
        content.extend(
            frames::latest(&request.frames, self.max_frames)
                .iter()
                .map(|frame| json!({"type": "input_image", "image_url": frames::data_url(frame)})),
        );

        json!({
            "model": request.model,
            "input": [{"role": "user", "content": content}],
            "max_output_tokens": request.max_output_tokens,
            "temperature": request.temperature,
        })
    }

    async fn attempt(&self, api_key: &str, body: &Value) -> Result<String, VisionError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| VisionError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VisionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| VisionError::InvalidResponse(e.to_string()))?;
        output_text(&payload)
    }
}

/// Generated text: `output_text` when present, otherwise every `output_text`
/// content part of every output item.
fn output_text(payload: &Value) -> Result<String, VisionError> {
    if let Some(text) = payload.get("output_text").and_then(Value::as_str) {
        return Ok(text.trim().to_string());
    }

    let text: String = payload
        .get("output")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|item| item.get("content").and_then(Value::as_array))
        .flatten()
        .filter(|part| part.get("type").and_then(Value::as_str) == Some("output_text"))
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();

    if text.trim().is_empty() {
        return Err(VisionError::InvalidResponse(
            "response contained no output text".to_string(),
        ));
    }
    Ok(text.trim().to_string())
}

#[async_trait]
impl VisionAnalyzer for OpenAiVision {
    async fn analyze(&self, request: VisionRequest) -> Result<String, VisionError> {
        if request.frames.is_empty() {
            return Err(VisionError::NoFrames);
        }
        let api_key = self.api_key.as_deref().ok_or(VisionError::NotConfigured)?;
        let body = self.body(&request);

        let mut delay = self.retry_delay;
        let mut attempt = 1;
        loop {
            match self.attempt(api_key, &body).await {
                Ok(text) => {
                    debug!(model = %request.model, attempt, "Vision analysis completed");
                    return Ok(text);
                }
                Err(err) if err.is_transient() && attempt < MAX_ATTEMPTS => {
                    warn!(error = %err, attempt, "Vision request failed, retrying");
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
