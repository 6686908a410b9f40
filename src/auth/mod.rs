// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Bearer token authentication for the AiTHLETIQ API.
//!
//! ## Auth Flow
//!
//! 1. The mobile app signs the user in with the identity provider
//! 2. The app sends `Authorization: Bearer <JWT>`
//! 3. The server:
//!    - Fetches the provider's JWKS on first use and caches it
//!    - Verifies signature (server-chosen algorithm), expiry and audience
//!    - Extracts `sub` → `user_id` and `email`
//!
//! ## Security
//!
//! - Every verification failure produces the same 401 response
//! - The verification algorithm is fixed by configuration, never by the token
//! - No roles or permissions are derived here

pub mod claims;
pub mod error;
pub mod extractor;
pub mod jwks;
pub mod verifier;

#[cfg(test)]
pub(crate) mod testing;

pub use claims::{AuthenticatedUser, Claims};
pub use error::{AuthError, Rejection, UNAUTHORIZED_MESSAGE};
pub use extractor::{authenticate, Auth};
pub use jwks::KeySetCache;
pub use verifier::TokenVerifier;
