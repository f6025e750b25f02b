// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Ledger Client
//!
//! Typed HTTP client for the ledger API.
//!
//! A [`Session`] is returned by [`LedgerClient::register`] and
//! [`LedgerClient::login`] and passed explicitly to every authorized call.
//! Logging out is dropping the session; the client itself holds no
//! credentials.
//!
//! ```rust,ignore
//! let client = LedgerClient::new("http://localhost:5000")?;
//! let session = client.login("warga@example.com", "secret123").await?;
//! let entries = client.list_entries(&session).await?;
//! ```

use reqwest::{Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use url::Url;

use crate::{
    error::{ErrorBody, ErrorKind},
    models::{
        AuthResponse, DeleteEntryResponse, EntryResponse, LoginRequest, RegisterRequest,
        SummaryResponse, UserResponse,
    },
};

/// An authenticated session: the bearer token and the user it was issued to.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: UserResponse,
}

impl From<AuthResponse> for Session {
    fn from(response: AuthResponse) -> Self {
        Self {
            token: response.token,
            user: response.user,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid base URL: {0}")]
    BaseUrl(String),
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{status} {error_code}: {message}")]
    Api {
        status: StatusCode,
        error_code: ErrorKind,
        message: String,
    },
}

impl ClientError {
    /// Stable error kind reported by the server, if any.
    pub fn error_code(&self) -> Option<ErrorKind> {
        match self {
            ClientError::Api { error_code, .. } => Some(*error_code),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LedgerClient {
    http: reqwest::Client,
    base: Url,
}

impl LedgerClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base = Url::parse(base_url)?;
        if base.cannot_be_a_base() {
            return Err(ClientError::BaseUrl(base_url.to_string()));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base,
        })
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<Session, ClientError> {
        let response: AuthResponse = self
            .send(Method::POST, &["auth", "register"], None, Some(request))
            .await?;
        Ok(response.into())
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        let request = LoginRequest {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        };
        let response: AuthResponse = self
            .send(Method::POST, &["auth", "login"], None, Some(&request))
            .await?;
        Ok(response.into())
    }

    pub async fn me(&self, session: &Session) -> Result<UserResponse, ClientError> {
        self.send::<(), _>(Method::GET, &["auth", "me"], Some(session), None)
            .await
    }

    pub async fn list_entries(&self, session: &Session) -> Result<Vec<EntryResponse>, ClientError> {
        self.send::<(), _>(Method::GET, &["entries"], Some(session), None)
            .await
    }

    pub async fn get_entry(
        &self,
        session: &Session,
        entry_id: &str,
    ) -> Result<EntryResponse, ClientError> {
        self.send::<(), _>(Method::GET, &["entries", entry_id], Some(session), None)
            .await
    }

    pub async fn delete_entry(
        &self,
        session: &Session,
        entry_id: &str,
    ) -> Result<DeleteEntryResponse, ClientError> {
        self.send::<(), _>(Method::DELETE, &["entries", entry_id], Some(session), None)
            .await
    }

    pub async fn summary(&self, session: &Session) -> Result<SummaryResponse, ClientError> {
        self.send::<(), _>(Method::GET, &["entries", "summary"], Some(session), None)
            .await
    }

    /// Absolute URL of an entry's attachment.
    pub fn attachment_url(&self, entry: &EntryResponse) -> Result<Option<Url>, ClientError> {
        entry
            .attachment_url
            .as_deref()
            .map(|locator| {
                let segments: Vec<&str> = locator.trim_start_matches('/').split('/').collect();
                self.endpoint(&segments)
            })
            .transpose()
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::BaseUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send<B, T>(
        &self,
        method: Method,
        segments: &[&str],
        session: Option<&Session>,
        body: Option<&B>,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self.http.request(method, self.endpoint(segments)?);
        if let Some(session) = session {
            request = request.bearer_auth(&session.token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let text = response.text().await?;
        Err(match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => ClientError::Api {
                status,
                error_code: body.error_code,
                message: body.error,
            },
            Err(_) => ClientError::Api {
                status,
                error_code: ErrorKind::Internal,
                message: text,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::router,
        auth::Role,
        ledger::NewEntry,
        state::AppState,
        storage::EntryKind,
    };
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    async fn serve() -> (LedgerClient, AppState, TempDir) {
        let dir = TempDir::new().unwrap();
        let state = AppState::for_tests(dir.path()).unwrap();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let app = router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = LedgerClient::new(&format!("http://{addr}")).unwrap();
        (client, state, dir)
    }

    fn registration(email: &str, role: &str) -> RegisterRequest {
        RegisterRequest {
            name: Some("Rina".to_string()),
            email: Some(email.to_string()),
            password: Some("secret123".to_string()),
            role: Some(role.to_string()),
        }
    }

    #[test]
    fn endpoints_join_onto_base_path() {
        let client = LedgerClient::new("http://ledger.local/api/").unwrap();
        assert_eq!(
            client.endpoint(&["entries", "abc"]).unwrap().as_str(),
            "http://ledger.local/api/entries/abc"
        );

        let client = LedgerClient::new("http://ledger.local").unwrap();
        assert_eq!(
            client.endpoint(&["auth", "me"]).unwrap().as_str(),
            "http://ledger.local/auth/me"
        );
    }

    #[test]
    fn base_must_be_hierarchical() {
        assert!(matches!(
            LedgerClient::new("mailto:someone@example.com"),
            Err(ClientError::BaseUrl(_))
        ));
    }

    #[tokio::test]
    async fn session_flows_through_every_call() {
        let (client, state, _dir) = serve().await;

        let steward = client
            .register(&registration("bendahara@example.com", "steward"))
            .await
            .unwrap();
        assert_eq!(steward.user.role, Role::Steward);

        let session = client.login("BENDAHARA@example.com", "secret123").await.unwrap();
        assert_eq!(client.me(&session).await.unwrap(), steward.user);
        assert!(client.list_entries(&session).await.unwrap().is_empty());

        let created = state
            .ledger()
            .create(
                NewEntry {
                    name: "Iuran".to_string(),
                    description: String::new(),
                    amount: Decimal::from(100),
                    kind: EntryKind::Income,
                },
                None,
                &session.user.id,
            )
            .unwrap();

        let fetched = client.get_entry(&session, &created.id).await.unwrap();
        assert_eq!(fetched.owner_name.as_deref(), Some("Rina"));
        assert_eq!(client.attachment_url(&fetched).unwrap(), None);

        let summary = client.summary(&session).await.unwrap();
        assert_eq!(summary.totals.balance, Decimal::from(100));

        let deleted = client.delete_entry(&session, &created.id).await.unwrap();
        assert_eq!(deleted.id, created.id);
    }

    #[tokio::test]
    async fn server_errors_decode_into_kinds() {
        let (client, _state, _dir) = serve().await;

        let err = client.login("nobody@example.com", "secret123").await.unwrap_err();
        assert_eq!(err.error_code(), Some(ErrorKind::InvalidCredentials));

        let resident = client
            .register(&registration("warga@example.com", "resident"))
            .await
            .unwrap();
        let err = client
            .delete_entry(&resident, "00000000-0000-0000-0000-000000000000")
            .await
            .unwrap_err();
        match err {
            ClientError::Api { status, error_code, .. } => {
                assert_eq!(status, StatusCode::FORBIDDEN);
                assert_eq!(error_code, ErrorKind::Forbidden);
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = client
            .get_entry(&resident, "00000000-0000-0000-0000-000000000000")
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), Some(ErrorKind::NotFound));

        let expired = Session {
            token: "not-a-token".to_string(),
            user: resident.user.clone(),
        };
        let err = client.me(&expired).await.unwrap_err();
        assert_eq!(err.error_code(), Some(ErrorKind::Unauthenticated));
    }
}
