// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Password verifiers (Argon2id, PHC string format).
//!
//! Only the derived verifier is persisted. Comparison goes through
//! `argon2`'s verifier, which compares digests in constant time.
//!
//! Request handlers use [`derive`] and [`check`], which run the Argon2id
//! work on tokio's blocking pool.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use super::AuthError;

/// Derive a verifier for `password` with a fresh random salt.
pub fn derive_verifier(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::InternalError(format!("password hashing failed: {e}")))
}

/// Check `password` against a stored verifier. A malformed verifier never
/// matches.
pub fn matches(password: &str, verifier: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(verifier) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// [`derive_verifier`] off the async worker threads.
pub async fn derive(password: &str) -> Result<String, AuthError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || derive_verifier(&password))
        .await
        .map_err(|e| AuthError::InternalError(format!("password hashing task failed: {e}")))?
}

/// [`matches`] off the async worker threads.
pub async fn check(password: &str, verifier: &str) -> Result<bool, AuthError> {
    let (password, verifier) = (password.to_owned(), verifier.to_owned());
    tokio::task::spawn_blocking(move || matches(&password, &verifier))
        .await
        .map_err(|e| AuthError::InternalError(format!("password check task failed: {e}")))
}
