// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Logging setup.
//!
//! `RUST_LOG` overrides the default filter. `LOG_FORMAT=json` switches to
//! one JSON object per line for log shippers.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::config::LogFormat;

pub const DEFAULT_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid log filter: {0}")]
    InvalidFilter(String),

    #[error("failed to install subscriber: {0}")]
    Init(String),
}

/// Filter from `directives`, or [`DEFAULT_FILTER`] when none are given.
fn build_filter(directives: Option<&str>) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(directives.unwrap_or(DEFAULT_FILTER))
        .map_err(|e| TelemetryError::InvalidFilter(e.to_string()))
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init_tracing(format: LogFormat) -> Result<(), TelemetryError> {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(directives.as_deref().filter(|d| !d.trim().is_empty()))?;

    let registry = Registry::default().with(filter);
    let result = match format {
        LogFormat::Json => registry
            .with(fmt::layer().with_target(true).json().with_current_span(true))
            .try_init(),
        LogFormat::Pretty => registry.with(fmt::layer().with_target(true)).try_init(),
    };
    result.map_err(|e| TelemetryError::Init(e.to_string()))
}
