// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token fixtures for tests.

use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};

pub const AUDIENCE: &str = "authenticated";
pub const KID: &str = "test-key-1";
pub const SUBJECT: &str = "7f0c3a52-4d0b-4c5e-9a43-2f3b5a0f9e11";
pub const EMAIL: &str = "athlete@example.com";

pub const SIGNING_KEY: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/signing_key.pem"));
const ROGUE_KEY: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/rogue_key.pem"));
const JWKS: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/jwks.json"));

/// The published key set containing only [`KID`].
pub fn jwks_json() -> Value {
    serde_json::from_str(JWKS).expect("testdata/jwks.json is valid JSON")
}

pub fn jwks() -> JwkSet {
    serde_json::from_str(JWKS).expect("testdata/jwks.json is a JWK set")
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Claims accepted by a verifier configured with [`AUDIENCE`].
pub fn valid_claims() -> Value {
    json!({
        "sub": SUBJECT,
        "email": EMAIL,
        "aud": AUDIENCE,
        "role": "authenticated",
        "iat": now(),
        "exp": now() + 3600,
    })
}

/// Sign `claims` with the published key under `kid`.
pub fn sign(claims: &Value, kid: &str) -> String {
    sign_with(claims, Some(kid), SIGNING_KEY)
}

/// Sign `claims` with a key that is not in the published set.
pub fn sign_rogue(claims: &Value, kid: &str) -> String {
    sign_with(claims, Some(kid), ROGUE_KEY)
}

pub fn sign_with(claims: &Value, kid: Option<&str>, pem: &str) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = kid.map(str::to_string);
    let key = EncodingKey::from_rsa_pem(pem.as_bytes()).expect("test key is valid PEM");
    encode(&header, claims, &key).expect("signing succeeds")
}

/// A well-signed token for the default subject.
pub fn valid_token() -> String {
    sign(&valid_claims(), KID)
}
