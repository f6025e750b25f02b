// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Registration, login and session resolution.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::{password, AuthError, AuthenticatedUser, Role, TokenService};
use crate::{
    error::ApiError,
    models::{LoginRequest, RegisterRequest, UserResponse},
    storage::{DocumentStorage, StorageError, StoredUser, UserRepository},
};

/// Minimum password length in characters.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Issues and resolves member credentials.
#[derive(Clone)]
pub struct AuthService {
    storage: DocumentStorage,
    tokens: TokenService,
    /// Verifier checked when the email is unknown, so both login failures
    /// cost the same.
    decoy_verifier: Arc<str>,
}

/// Registration input that passed validation.
struct ValidRegistration {
    name: String,
    email: String,
    password: String,
    role: Role,
}

impl AuthService {
    pub fn new(storage: DocumentStorage, tokens: TokenService) -> Result<Self, AuthError> {
        let decoy_verifier = password::derive_verifier(&Uuid::new_v4().to_string())?;
        Ok(Self {
            storage,
            tokens,
            decoy_verifier: decoy_verifier.into(),
        })
    }

    #[cfg(test)]
    pub(crate) fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Register a member and open a session for them.
    ///
    /// Any registrant may request the steward role; there is no approval step.
    pub async fn register(
        &self,
        request: &RegisterRequest,
    ) -> Result<(UserResponse, String), ApiError> {
        let valid = validate_registration(request)?;
        let repo = UserRepository::new(&self.storage);

        if repo.email_taken(&valid.email) {
            return Err(ApiError::duplicate_identity());
        }

        let password_verifier = password::derive(&valid.password).await?;
        let user = StoredUser {
            id: Uuid::new_v4().to_string(),
            name: valid.name,
            email: valid.email,
            password_verifier,
            role: valid.role,
            created_at: Utc::now(),
        };

        self.insert(&user)?;

        let token = self.tokens.issue(&user.id, user.role)?;
        tracing::info!(user_id = %user.id, role = %user.role, "User registered");
        Ok((user.into(), token))
    }

    /// Persist a new user. An email claimed after the pre-check, by a
    /// concurrent registration, is reported like any other duplicate.
    fn insert(&self, user: &StoredUser) -> Result<(), ApiError> {
        UserRepository::new(&self.storage)
            .create(user)
            .map_err(|e| match e {
                StorageError::AlreadyExists(_) => ApiError::duplicate_identity(),
                other => ApiError::from(other),
            })
    }

    /// Check credentials and open a session.
    pub async fn login(&self, request: &LoginRequest) -> Result<(UserResponse, String), ApiError> {
        let (Some(email), Some(password)) = (request.email.as_deref(), request.password.as_deref())
        else {
            return Err(ApiError::invalid_input("Please provide email and password"));
        };

        let email = normalize_email(email);
        let user = UserRepository::new(&self.storage).find_by_email(&email)?;

        let Some(user) = user else {
            password::check(password, &self.decoy_verifier).await?;
            tracing::info!(reason = "unknown_email", "Login failed");
            return Err(ApiError::invalid_credentials());
        };

        if !password::check(password, &user.password_verifier).await? {
            tracing::info!(user_id = %user.id, reason = "wrong_password", "Login failed");
            return Err(ApiError::invalid_credentials());
        }

        let token = self.tokens.issue(&user.id, user.role)?;
        tracing::info!(user_id = %user.id, "User logged in");
        Ok((user.into(), token))
    }

    /// Validate a session token.
    pub fn verify(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        self.tokens.verify(token)
    }

    /// Resolve the user behind a verified session.
    pub fn current_user(&self, session: &AuthenticatedUser) -> Result<UserResponse, ApiError> {
        match UserRepository::new(&self.storage).get(&session.user_id) {
            Ok(user) => Ok(user.into()),
            Err(StorageError::NotFound(_)) => Err(AuthError::UnknownSubject.into()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Trim and lower-case an email address.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// `local@domain.tld` shape: exactly one `@`, no whitespace, and a dot in
/// the domain with characters on both sides.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

fn validate_registration(request: &RegisterRequest) -> Result<ValidRegistration, ApiError> {
    let name = request.name.as_deref().map(str::trim).unwrap_or_default();
    let email = normalize_email(request.email.as_deref().unwrap_or_default());
    let password = request.password.as_deref().unwrap_or_default();

    let mut problems = Vec::new();
    if name.is_empty() {
        problems.push("name is required".to_string());
    }
    if email.is_empty() {
        problems.push("email is required".to_string());
    } else if !is_valid_email(&email) {
        problems.push("email must be a valid email address".to_string());
    }
    if password.is_empty() {
        problems.push("password is required".to_string());
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        problems.push(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters long"
        ));
    }

    if !problems.is_empty() {
        return Err(ApiError::invalid_fields(problems));
    }

    Ok(ValidRegistration {
        name: name.to_string(),
        email,
        password: password.to_string(),
        role: Role::from_requested(request.role.as_deref()),
    })
}
