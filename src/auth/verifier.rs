// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token verification.
//!
//! A call to [`TokenVerifier::verify`] walks these steps and stops at the
//! first failure:
//!
//! 1. Decode the header without verifying (`MalformedToken`)
//! 2. Look up the header's `kid` in the key set (`UnknownKey`)
//! 3. Verify the signature with the configured algorithm (`BadSignature`)
//! 4. Check `exp` and `aud` (`ClaimRejected`)
//!
//! The algorithm always comes from configuration. A token whose header names
//! a different algorithm fails at step 3.

use std::sync::Arc;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};

use super::claims::Claims;
use super::error::{AuthError, Rejection};
use super::jwks::{decoding_key, KeySetCache};
use crate::config::AuthSettings;

/// Verifies bearer tokens against the identity provider's key set.
pub struct TokenVerifier {
    keys: Arc<KeySetCache>,
    audience: String,
    algorithm: Algorithm,
    leeway_secs: u64,
}

impl TokenVerifier {
    pub fn new(keys: Arc<KeySetCache>, settings: &AuthSettings) -> Self {
        Self {
            keys,
            audience: settings.audience.clone(),
            algorithm: settings.algorithm,
            leeway_secs: settings.leeway_secs,
        }
    }

    /// The key set this verifier consults.
    pub fn key_set(&self) -> &KeySetCache {
        &self.keys
    }

    /// Verify `token` and return its claims.
    pub async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        if self.audience.is_empty() {
            return Err(AuthError::Configuration(
                "JWT audience not configured".to_string(),
            ));
        }

        let header = decode_header(token).map_err(|_| Rejection::MalformedToken)?;

        let kid = header.kid.as_deref().ok_or(Rejection::UnknownKey)?;
        let jwk = self.keys.find(kid).await?.ok_or(Rejection::UnknownKey)?;
        let key = decoding_key(&jwk).ok_or(Rejection::UnknownKey)?;

        let mut validation = Validation::new(self.algorithm);
        validation.leeway = self.leeway_secs;
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "aud", "sub"]);

        let data = decode::<Claims>(token, &key, &validation).map_err(|e| {
            let reason = rejection_for(e.kind());
            tracing::debug!(%reason, kid, error = %e, "Token verification failed");
            reason
        })?;

        if data.claims.sub.is_empty() {
            return Err(Rejection::ClaimRejected.into());
        }

        Ok(data.claims)
    }
}

/// Map a `jsonwebtoken` failure onto the step it belongs to.
fn rejection_for(kind: &ErrorKind) -> Rejection {
    match kind {
        ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidAlgorithmName
        | ErrorKind::InvalidKeyFormat
        | ErrorKind::InvalidRsaKey(_)
        | ErrorKind::InvalidEcdsaKey => Rejection::BadSignature,
        ErrorKind::ExpiredSignature
        | ErrorKind::ImmatureSignature
        | ErrorKind::InvalidAudience
        | ErrorKind::InvalidIssuer
        | ErrorKind::InvalidSubject
        | ErrorKind::MissingRequiredClaim(_) => Rejection::ClaimRejected,
        _ => Rejection::MalformedToken,
    }
}
