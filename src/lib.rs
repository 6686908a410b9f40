// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! AiTHLETIQ API - fitness tracking backend
//!
//! A thin REST service between the mobile app, a PostgREST data store and a
//! hosted vision model. Every data route requires a bearer token issued by
//! the identity provider and verified against its published key set.
//!
//! ## Modules
//!
//! - `api` - HTTP handlers and router (Axum)
//! - `auth` - JWKS-backed bearer token verification
//! - `db` - data store access (PostgREST or in-memory)
//! - `vision` - coaching feedback from a vision model

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod state;
pub mod telemetry;
pub mod vision;
