// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{AuthError, KeySetCache, TokenVerifier};
use crate::config::{AppConfig, VisionSettings};
use crate::db::memory::InMemoryDatabase;
use crate::db::postgrest::PostgrestClient;
use crate::db::{Database, DbError};
use crate::vision::{OpenAiVision, VisionAnalyzer, VisionError};

/// Failures while wiring collaborators at startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Database(#[from] DbError),

    #[error(transparent)]
    Vision(#[from] VisionError),
}

/// Shared handler state. Every collaborator is injected, never global.
#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<TokenVerifier>,
    pub db: Arc<dyn Database>,
    pub vision: Arc<dyn VisionAnalyzer>,
    pub vision_settings: Arc<VisionSettings>,
}

impl AppState {
    pub fn new(
        verifier: TokenVerifier,
        db: Arc<dyn Database>,
        vision: Arc<dyn VisionAnalyzer>,
        vision_settings: VisionSettings,
    ) -> Self {
        Self {
            verifier: Arc::new(verifier),
            db,
            vision,
            vision_settings: Arc::new(vision_settings),
        }
    }

    /// Build the production collaborators from configuration.
    ///
    /// Without data store settings the service runs against an in-memory
    /// store, which loses everything on restart.
    pub fn from_config(config: &AppConfig) -> Result<Self, StartupError> {
        let keys = Arc::new(KeySetCache::new(&config.auth)?);
        let verifier = TokenVerifier::new(keys, &config.auth);

        let db: Arc<dyn Database> = match &config.database {
            Some(settings) => Arc::new(PostgrestClient::new(settings)?),
            None => {
                tracing::warn!("SUPABASE_URL not set; using in-memory data store (development mode)");
                Arc::new(InMemoryDatabase::new())
            }
        };

        if config.vision.api_key.is_none() {
            tracing::warn!("OPENAI_API_KEY not set; /deep/analyze will fail until configured");
        }
        let vision: Arc<dyn VisionAnalyzer> = Arc::new(OpenAiVision::new(&config.vision)?);

        Ok(Self::new(verifier, db, vision, config.vision.clone()))
    }

    pub fn with_database(mut self, db: Arc<dyn Database>) -> Self {
        self.db = db;
        self
    }

    pub fn with_vision(mut self, vision: Arc<dyn VisionAnalyzer>) -> Self {
        self.vision = vision;
        self
    }
}

#[cfg(test)]
impl AppState {
    /// In-memory store and a canned vision answer around `verifier`.
    pub(crate) fn for_tests(verifier: TokenVerifier) -> Self {
        use crate::vision::testing::RecordingVision;

        Self::new(
            verifier,
            Arc::new(InMemoryDatabase::new()),
            Arc::new(RecordingVision::answering("- keep your core braced")),
            VisionSettings::default(),
        )
    }
}
