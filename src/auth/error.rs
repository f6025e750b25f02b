// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use crate::error::{ApiError, ErrorKind};

/// Failures while authenticating or authorizing a request.
///
/// Everything except `InsufficientPermissions` and `Internal` is a 401:
/// the caller did not prove who they are. `InsufficientPermissions` is a 403:
/// the caller is known but their role does not allow the operation.
#[derive(Debug)]
pub enum AuthError {
    /// No authorization header present
    MissingAuthHeader,
    /// Invalid authorization header format
    InvalidAuthHeader,
    /// Token is malformed
    MalformedToken,
    /// Token signature is invalid
    InvalidSignature,
    /// Token has expired
    TokenExpired,
    /// Token subject no longer resolves to a user
    UnknownSubject,
    /// Insufficient permissions
    InsufficientPermissions,
    /// Internal error
    InternalError(String),
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::MalformedToken => "malformed_token",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::UnknownSubject => "unknown_subject",
            AuthError::InsufficientPermissions => "insufficient_permissions",
            AuthError::InternalError(_) => "internal_error",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InsufficientPermissions => ErrorKind::Forbidden,
            AuthError::InternalError(_) => ErrorKind::Internal,
            _ => ErrorKind::Unauthenticated,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingAuthHeader => write!(f, "Authorization header is required"),
            AuthError::InvalidAuthHeader => {
                write!(f, "Invalid authorization header format (expected 'Bearer <token>')")
            }
            AuthError::MalformedToken => write!(f, "Token is malformed"),
            AuthError::InvalidSignature => write!(f, "Token signature is invalid"),
            AuthError::TokenExpired => write!(f, "Token has expired"),
            AuthError::UnknownSubject => write!(f, "Token subject is not a known user"),
            AuthError::InsufficientPermissions => {
                write!(f, "Only stewards can modify ledger entries")
            }
            AuthError::InternalError(msg) => write!(f, "Internal authentication error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        ApiError::new(e.kind(), e.to_string()).with_details(vec![e.error_code().to_string()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::to_bytes, http::StatusCode, response::IntoResponse};

    #[tokio::test]
    async fn missing_auth_returns_401() {
        let response = ApiError::from(AuthError::MissingAuthHeader).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error_code"], "unauthenticated");
        assert_eq!(body["details"][0], "missing_auth_header");
    }

    #[tokio::test]
    async fn insufficient_permissions_returns_403() {
        let response = ApiError::from(AuthError::InsufficientPermissions).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn token_failures_are_unauthenticated() {
        for err in [
            AuthError::InvalidAuthHeader,
            AuthError::MalformedToken,
            AuthError::InvalidSignature,
            AuthError::TokenExpired,
            AuthError::UnknownSubject,
        ] {
            assert_eq!(err.kind(), ErrorKind::Unauthenticated);
            assert_eq!(err.kind().status(), StatusCode::UNAUTHORIZED);
        }
    }
}
