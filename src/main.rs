// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use aithletiq_server::{
    api::router,
    config::{redact, AppConfig},
    state::AppState,
    telemetry::init_tracing,
};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    let config = AppConfig::from_env().expect("Invalid configuration");
    init_tracing(config.log_format).expect("Failed to initialize logging");

    if config.auth.jwks_url.is_empty() || config.auth.audience.is_empty() {
        tracing::warn!(
            "SUPABASE_JWKS_URL or JWT_AUDIENCE not set; authenticated routes will return 500"
        );
    }
    tracing::info!(
        jwks_url = %config.auth.jwks_url,
        audience = %config.auth.audience,
        algorithm = ?config.auth.algorithm,
        data_store = config.database.as_ref().map(|d| d.url.as_str()).unwrap_or("in-memory"),
        service_role_key = %redact(config.database.as_ref().map(|d| d.service_role_key.as_str()), 4),
        openai_api_key = %redact(config.vision.api_key.as_deref(), 3),
        vision_model = %config.vision.default_model,
        "Loaded configuration"
    );

    let state = AppState::from_config(&config).expect("Failed to initialize services");
    let app = router(state);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind listener");
    tracing::info!(addr = %config.bind_addr, "AiTHLETIQ API listening (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("HTTP server failed");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutting down");
}
