// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::path::Path;
use std::sync::Arc;

use chrono::Duration;

use crate::{
    attachments::{AttachmentManager, FsBlobStore},
    auth::{AuthError, AuthService, TokenService, DEFAULT_TOKEN_TTL_DAYS},
    config::Config,
    ledger::LedgerStore,
    storage::{DocumentStorage, StorageError, StoragePaths},
};

/// Failure while assembling the application state.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("data directory: {0}")]
    Storage(#[from] StorageError),
    #[error("attachment store: {0}")]
    Attachments(#[from] std::io::Error),
    #[error("auth: {0}")]
    Auth(#[from] AuthError),
}

#[derive(Clone)]
pub struct AppState {
    pub storage: DocumentStorage,
    pub blobs: Arc<FsBlobStore>,
    pub attachments: AttachmentManager,
    pub auth: AuthService,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, StartupError> {
        let tokens = TokenService::new(config.jwt_secret.bytes(), config.token_ttl);
        Self::open(&config.data_dir, tokens)
    }

    /// State over `data_dir` with a fixed test secret.
    pub fn for_tests(data_dir: &Path) -> Result<Self, StartupError> {
        let tokens = TokenService::new(
            b"test-secret-test-secret-test-secret",
            Duration::days(DEFAULT_TOKEN_TTL_DAYS),
        );
        Self::open(data_dir, tokens)
    }

    fn open(data_dir: &Path, tokens: TokenService) -> Result<Self, StartupError> {
        let paths = StoragePaths::new(data_dir);
        let mut storage = DocumentStorage::new(paths.clone());
        storage.initialize()?;

        let blobs = Arc::new(FsBlobStore::new(paths.uploads_dir(), paths.staging_dir())?);
        let attachments = AttachmentManager::new(blobs.clone());
        let auth = AuthService::new(storage.clone(), tokens)?;

        Ok(Self {
            storage,
            blobs,
            attachments,
            auth,
        })
    }

    pub fn storage(&self) -> &DocumentStorage {
        &self.storage
    }

    pub fn ledger(&self) -> LedgerStore {
        LedgerStore::new(self.storage.clone(), self.attachments.clone())
    }
}
