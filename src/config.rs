// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup into an
//! [`AppConfig`] and handed to the components that need it.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `SUPABASE_JWKS_URL` | JWKS endpoint for JWT verification | Required for auth |
//! | `JWT_AUDIENCE` | Expected JWT audience claim | Required for auth |
//! | `JWT_ALGORITHM` | Signature algorithm accepted for tokens | `RS256` |
//! | `JWT_LEEWAY_SECS` | Clock skew tolerance for `exp` | `0` |
//! | `JWKS_CACHE_TTL_SECS` | Refresh the key set after this many seconds | Never |
//! | `JWKS_FETCH_TIMEOUT_SECS` | Timeout for the JWKS request | `5` |
//! | `SUPABASE_URL` | Data store base URL | In-memory store |
//! | `SUPABASE_SERVICE_ROLE_KEY` | Data store service key | In-memory store |
//! | `OPENAI_API_KEY` | Vision model API key | Optional |
//! | `OPENAI_BASE_URL` | Vision model API base URL | `https://api.openai.com` |
//! | `OPENAI_VISION_MODEL` | Default vision model | `gpt-4o` |
//! | `DEEPANALYSIS_MAX_FRAMES` | Frames kept per analysis | `30` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//!
//! Empty JWKS URL or audience do not stop the server from starting; the
//! first authenticated request fails with a configuration error instead.

use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const JWKS_URL_ENV: &str = "SUPABASE_JWKS_URL";
pub const AUDIENCE_ENV: &str = "JWT_AUDIENCE";
pub const ALGORITHM_ENV: &str = "JWT_ALGORITHM";
pub const LEEWAY_ENV: &str = "JWT_LEEWAY_SECS";
pub const JWKS_TTL_ENV: &str = "JWKS_CACHE_TTL_SECS";
pub const JWKS_TIMEOUT_ENV: &str = "JWKS_FETCH_TIMEOUT_SECS";
pub const SUPABASE_URL_ENV: &str = "SUPABASE_URL";
pub const SUPABASE_KEY_ENV: &str = "SUPABASE_SERVICE_ROLE_KEY";
pub const OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";
pub const OPENAI_BASE_URL_ENV: &str = "OPENAI_BASE_URL";
pub const VISION_MODEL_ENV: &str = "OPENAI_VISION_MODEL";
pub const MAX_FRAMES_ENV: &str = "DEEPANALYSIS_MAX_FRAMES";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_JWKS_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_VISION_MODEL: &str = "gpt-4o";
pub const DEFAULT_MAX_FRAMES: NonZeroUsize = NonZeroUsize::new(30).unwrap();

/// Errors raised while reading configuration at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },

    #[error("unsupported JWT algorithm {0:?} (expected RS256, RS384, RS512, PS256, PS384, PS512, ES256 or ES384)")]
    UnsupportedAlgorithm(String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// Token verification settings.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// JWKS endpoint of the identity provider.
    pub jwks_url: String,
    /// Audience every accepted token must carry.
    pub audience: String,
    /// The only algorithm tokens may be verified with.
    pub algorithm: Algorithm,
    /// Clock skew tolerance in seconds.
    pub leeway_secs: u64,
    /// Optional key set TTL. `None` keeps the first fetched set for the
    /// lifetime of the process.
    pub jwks_cache_ttl: Option<Duration>,
    pub jwks_fetch_timeout: Duration,
}

impl AuthSettings {
    pub fn new(jwks_url: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            jwks_url: jwks_url.into(),
            audience: audience.into(),
            algorithm: Algorithm::RS256,
            leeway_secs: 0,
            jwks_cache_ttl: None,
            jwks_fetch_timeout: DEFAULT_JWKS_TIMEOUT,
        }
    }
}

/// Managed data store settings (PostgREST endpoint).
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub service_role_key: String,
}

/// Vision model settings.
#[derive(Debug, Clone)]
pub struct VisionSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub default_model: String,
    /// Most recent frames sent per analysis. Never zero.
    pub max_frames: NonZeroUsize,
}

impl Default for VisionSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            default_model: DEFAULT_VISION_MODEL.to_string(),
            max_frames: DEFAULT_MAX_FRAMES,
        }
    }
}

/// Complete service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub log_format: LogFormat,
    pub auth: AuthSettings,
    /// `None` when the data store is not configured (development mode).
    pub database: Option<DatabaseSettings>,
    pub vision: VisionSettings,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Values are trimmed; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_or(PORT_ENV, get(PORT_ENV), DEFAULT_PORT)?;
        let bind_addr = format!("{host}:{port}")
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                name: HOST_ENV,
                value: host.clone(),
            })?;

        let log_format = match get(LOG_FORMAT_ENV).as_deref() {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        let algorithm = match get(ALGORITHM_ENV) {
            Some(name) => parse_algorithm(&name)?,
            None => Algorithm::RS256,
        };

        let auth = AuthSettings {
            jwks_url: get(JWKS_URL_ENV).unwrap_or_default(),
            audience: get(AUDIENCE_ENV).unwrap_or_default(),
            algorithm,
            leeway_secs: parse_or(LEEWAY_ENV, get(LEEWAY_ENV), 0)?,
            jwks_cache_ttl: match get(JWKS_TTL_ENV) {
                Some(v) => Some(Duration::from_secs(parse_or(JWKS_TTL_ENV, Some(v), 0)?)),
                None => None,
            },
            jwks_fetch_timeout: Duration::from_secs(parse_or(
                JWKS_TIMEOUT_ENV,
                get(JWKS_TIMEOUT_ENV),
                DEFAULT_JWKS_TIMEOUT.as_secs(),
            )?),
        };

        let database = match (get(SUPABASE_URL_ENV), get(SUPABASE_KEY_ENV)) {
            (Some(url), Some(service_role_key)) => Some(DatabaseSettings {
                url,
                service_role_key,
            }),
            _ => None,
        };

        let vision = VisionSettings {
            api_key: get(OPENAI_KEY_ENV),
            base_url: get(OPENAI_BASE_URL_ENV)
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            default_model: get(VISION_MODEL_ENV)
                .unwrap_or_else(|| DEFAULT_VISION_MODEL.to_string()),
            max_frames: parse_or(MAX_FRAMES_ENV, get(MAX_FRAMES_ENV), DEFAULT_MAX_FRAMES)?,
        };

        Ok(Self {
            bind_addr,
            log_format,
            auth,
            database,
            vision,
        })
    }
}

fn parse_or<T: FromStr>(
    name: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(v) => v
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value: v }),
        None => Ok(default),
    }
}

/// Parse the configured verification algorithm.
///
/// HMAC algorithms are refused: keys come from a public key set.
fn parse_algorithm(name: &str) -> Result<Algorithm, ConfigError> {
    let algorithm = Algorithm::from_str(&name.to_ascii_uppercase())
        .map_err(|_| ConfigError::UnsupportedAlgorithm(name.to_string()))?;
    match algorithm {
        Algorithm::RS256
        | Algorithm::RS384
        | Algorithm::RS512
        | Algorithm::PS256
        | Algorithm::PS384
        | Algorithm::PS512
        | Algorithm::ES256
        | Algorithm::ES384 => Ok(algorithm),
        _ => Err(ConfigError::UnsupportedAlgorithm(name.to_string())),
    }
}

/// Redact a secret for logging: keep a short prefix and report the length.
pub fn redact(secret: Option<&str>, keep: usize) -> String {
    match secret {
        None | Some("") => "<empty>".to_string(),
        Some(s) => {
            let prefix: String = s.chars().take(keep).collect();
            format!("{prefix}… (len={})", s.chars().count())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.auth.algorithm, Algorithm::RS256);
        assert_eq!(config.auth.leeway_secs, 0);
        assert!(config.auth.jwks_url.is_empty());
        assert!(config.auth.jwks_cache_ttl.is_none());
        assert_eq!(config.auth.jwks_fetch_timeout, Duration::from_secs(5));
        assert!(config.database.is_none());
        assert_eq!(config.vision.default_model, "gpt-4o");
        assert_eq!(config.vision.max_frames.get(), 30);
    }

    #[test]
    fn values_are_trimmed() {
        let config = AppConfig::from_lookup(lookup(&[
            (JWKS_URL_ENV, "  https://auth.example.com/jwks  "),
            (AUDIENCE_ENV, "authenticated\n"),
            (SUPABASE_URL_ENV, "https://db.example.com"),
            (SUPABASE_KEY_ENV, "service-key"),
            (LOG_FORMAT_ENV, "JSON"),
        ]))
        .unwrap();
        assert_eq!(config.auth.jwks_url, "https://auth.example.com/jwks");
        assert_eq!(config.auth.audience, "authenticated");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.database.unwrap().service_role_key, "service-key");
    }

    #[test]
    fn database_requires_both_url_and_key() {
        let config =
            AppConfig::from_lookup(lookup(&[(SUPABASE_URL_ENV, "https://db.example.com")]))
                .unwrap();
        assert!(config.database.is_none());
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[(PORT_ENV, "http")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { name: PORT_ENV, .. }));
    }

    #[test]
    fn hmac_algorithms_are_refused() {
        let err = AppConfig::from_lookup(lookup(&[(ALGORITHM_ENV, "HS256")])).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedAlgorithm(_)));

        let config = AppConfig::from_lookup(lookup(&[(ALGORITHM_ENV, "es256")])).unwrap();
        assert_eq!(config.auth.algorithm, Algorithm::ES256);
    }

    #[test]
    fn cache_ttl_is_optional() {
        let config = AppConfig::from_lookup(lookup(&[(JWKS_TTL_ENV, "600")])).unwrap();
        assert_eq!(config.auth.jwks_cache_ttl, Some(Duration::from_secs(600)));
    }

    #[test]
    fn frame_cap_must_be_positive() {
        let err = AppConfig::from_lookup(lookup(&[(MAX_FRAMES_ENV, "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { name: MAX_FRAMES_ENV, ref value } if value == "0"));

        let config = AppConfig::from_lookup(lookup(&[(MAX_FRAMES_ENV, "12")])).unwrap();
        assert_eq!(config.vision.max_frames.get(), 12);
    }

    #[test]
    fn redact_keeps_prefix_and_length() {
        assert_eq!(redact(None, 3), "<empty>");
        assert_eq!(redact(Some(""), 3), "<empty>");
        assert_eq!(redact(Some("abcdefgh"), 3), "abc… (len=8)");
    }
}
