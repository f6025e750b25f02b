// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session token issuance and verification (HS256 JWT).
//!
//! Tokens are stateless: validity depends only on the signature and the
//! `exp` claim. Nothing is stored server-side, so there is no revocation.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use super::{AuthError, AuthenticatedUser, Claims, Role};

/// Default session lifetime.
pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 7;

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: i64 = 60;

/// Signs and verifies session tokens with a shared secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    /// Issue a token for `user_id` valid from `now` for the configured lifetime.
    pub fn issue_at(&self, user_id: &str, role: Role, now: DateTime<Utc>) -> Result<String, AuthError> {
        let claims = Claims {
            sub: user_id.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::InternalError(format!("token signing failed: {e}")))
    }

    pub fn issue(&self, user_id: &str, role: Role) -> Result<String, AuthError> {
        self.issue_at(user_id, role, Utc::now())
    }

    /// Verify signature and shape, then check expiry against `now`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<AuthenticatedUser, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked below against the caller's clock.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let token_data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::MalformedToken,
            }
        })?;

        let claims = token_data.claims;
        if claims.exp + CLOCK_SKEW_LEEWAY < now.timestamp() {
            return Err(AuthError::TokenExpired);
        }

        Ok(AuthenticatedUser::from_claims(claims))
    }

    pub fn verify(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        self.verify_at(token, Utc::now())
    }
}
