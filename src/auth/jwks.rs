// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) fetching and caching.
//!
//! ## Behavior
//!
//! - The key set is fetched on first use and kept for the lifetime of the
//!   process unless a TTL is configured
//! - Concurrent first calls wait on a single fetch
//! - Fetch failures are returned to the caller, never retried here
//!
//! ## Usage
//!
//! Construct one `KeySetCache` at startup, wrap it in an `Arc` and hand it to
//! the [`TokenVerifier`](super::TokenVerifier).

use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet};
use jsonwebtoken::DecodingKey;
use tokio::sync::{Mutex, RwLock};

use super::error::AuthError;
use crate::config::AuthSettings;

/// Cached key set.
struct CacheEntry {
    keys: Arc<JwkSet>,
    fetched_at: Instant,
}

/// Process-wide key set cache.
pub struct KeySetCache {
    /// JWKS URL (identity provider endpoint)
    jwks_url: String,
    /// `None` keeps keys until restart
    cache_ttl: Option<Duration>,
    /// Cached JWKS
    cache: RwLock<Option<CacheEntry>>,
    /// Serializes populate so concurrent misses share one fetch
    populate: Mutex<()>,
    /// HTTP client
    client: reqwest::Client,
}

impl KeySetCache {
    /// Create a cache that fetches from `settings.jwks_url` on first use.
    pub fn new(settings: &AuthSettings) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(settings.jwks_fetch_timeout)
            .build()
            .map_err(|e| AuthError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            jwks_url: settings.jwks_url.clone(),
            cache_ttl: settings.jwks_cache_ttl,
            cache: RwLock::new(None),
            populate: Mutex::new(()),
            client,
        })
    }

    /// Create a cache pre-populated with `keys` that never goes to the network.
    pub fn from_keys(keys: JwkSet) -> Self {
        Self {
            jwks_url: String::new(),
            cache_ttl: None,
            cache: RwLock::new(Some(CacheEntry {
                keys: Arc::new(keys),
                fetched_at: Instant::now(),
            })),
            populate: Mutex::new(()),
            client: reqwest::Client::new(),
        }
    }

    /// Get the JWKS URL.
    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// Return the current key set, fetching it if nothing usable is cached.
    pub async fn get_keys(&self) -> Result<Arc<JwkSet>, AuthError> {
        if let Some(keys) = self.cached().await {
            return Ok(keys);
        }

        let _guard = self.populate.lock().await;

        // Another caller may have populated while we waited.
        if let Some(keys) = self.cached().await {
            return Ok(keys);
        }

        let keys = Arc::new(self.fetch_jwks().await?);
        self.store(keys.clone()).await;
        Ok(keys)
    }

    /// Find the key with the given key id.
    pub async fn find(&self, kid: &str) -> Result<Option<Jwk>, AuthError> {
        let keys = self.get_keys().await?;
        Ok(keys
            .keys
            .iter()
            .find(|k| k.common.key_id.as_deref() == Some(kid))
            .cloned())
    }

    /// Force refresh the JWKS cache.
    pub async fn refresh(&self) -> Result<(), AuthError> {
        let _guard = self.populate.lock().await;
        let keys = Arc::new(self.fetch_jwks().await?);
        self.store(keys).await;
        Ok(())
    }

    /// Check if JWKS is currently cached and valid.
    pub async fn is_cached(&self) -> bool {
        self.cached().await.is_some()
    }

    async fn cached(&self) -> Option<Arc<JwkSet>> {
        let cache = self.cache.read().await;
        cache
            .as_ref()
            .filter(|entry| self.is_fresh(entry))
            .map(|entry| entry.keys.clone())
    }

    fn is_fresh(&self, entry: &CacheEntry) -> bool {
        match self.cache_ttl {
            Some(ttl) => entry.fetched_at.elapsed() < ttl,
            None => true,
        }
    }

    async fn store(&self, keys: Arc<JwkSet>) {
        let mut cache = self.cache.write().await;
        *cache = Some(CacheEntry {
            keys,
            fetched_at: Instant::now(),
        });
    }

    /// Fetch JWKS from the endpoint.
    async fn fetch_jwks(&self) -> Result<JwkSet, AuthError> {
        if self.jwks_url.is_empty() {
            return Err(AuthError::Configuration("JWKS URL not configured".to_string()));
        }

        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| AuthError::KeySetFetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::KeySetFetch(format!(
                "HTTP {} from JWKS endpoint",
                response.status()
            )));
        }

        let jwks: JwkSet = response
            .json()
            .await
            .map_err(|e| AuthError::KeySetFetch(e.to_string()))?;

        tracing::info!(
            url = %self.jwks_url,
            keys = jwks.keys.len(),
            "Fetched JWKS"
        );

        Ok(jwks)
    }
}

/// Convert a JWK to a DecodingKey.
///
/// Returns `None` for key types that cannot verify signatures.
pub fn decoding_key(jwk: &Jwk) -> Option<DecodingKey> {
    match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => DecodingKey::from_rsa_components(&rsa.n, &rsa.e).ok(),
        AlgorithmParameters::EllipticCurve(ec) => {
            DecodingKey::from_ec_components(&ec.x, &ec.y).ok()
        }
        _ => None,
    }
}
