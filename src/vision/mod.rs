// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Vision Analysis
//!
//! Coaching feedback from a hosted vision model.
//!
//! - [`VisionAnalyzer`] - the seam handlers depend on
//! - [`OpenAiVision`] - Responses API client with transient-failure retry
//! - [`frames`] - frame capping and data URL encoding
//! - [`prompt`] - default prompt and user context composition

pub mod frames;
pub mod openai;
pub mod prompt;

use async_trait::async_trait;

pub use openai::OpenAiVision;

/// Errors from the vision collaborator.
#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    #[error("no frames provided")]
    NoFrames,

    #[error("vision analysis is not configured")]
    NotConfigured,

    #[error("vision request failed: {0}")]
    Request(String),

    #[error("vision model returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("vision response was invalid: {0}")]
    InvalidResponse(String),
}

impl VisionError {
    /// Whether another attempt may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            VisionError::Request(_) => true,
            VisionError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// One analysis request.
#[derive(Debug, Clone, PartialEq)]
pub struct VisionRequest {
    pub prompt: String,
    /// Base64 images or data URLs, earliest first.
    pub frames: Vec<String>,
    pub model: String,
    pub max_output_tokens: u32,
    pub temperature: f64,
}

/// Turns a prompt plus an ordered frame sequence into generated text.
#[async_trait]
pub trait VisionAnalyzer: Send + Sync {
    async fn analyze(&self, request: VisionRequest) -> Result<String, VisionError>;
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Returns a canned answer and records every request.
    #[derive(Default)]
    pub struct RecordingVision {
        pub answer: String,
        pub requests: Mutex<Vec<VisionRequest>>,
    }

    impl RecordingVision {
        pub fn answering(answer: &str) -> Self {
            Self {
                answer: answer.to_string(),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn requests(&self) -> Vec<VisionRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl VisionAnalyzer for RecordingVision {
        async fn analyze(&self, request: VisionRequest) -> Result<String, VisionError> {
            self.requests.lock().unwrap().push(request);
            Ok(self.answer.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors() {
        assert!(VisionError::Request("reset".into()).is_transient());
        assert!(VisionError::Status { status: 429, body: String::new() }.is_transient());
        assert!(VisionError::Status { status: 503, body: String::new() }.is_transient());
        assert!(!VisionError::Status { status: 400, body: String::new() }.is_transient());
        assert!(!VisionError::InvalidResponse("x".into()).is_transient());
    }
}
