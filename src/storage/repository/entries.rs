// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ledger entry repository.
//!
//! Each entry is stored as a separate JSON file under `entries/`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::super::{DocumentStorage, StorageError, StorageResult};
use crate::attachments::AttachmentRef;

/// Direction of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    #[default]
    Income,
    Expense,
}

impl EntryKind {
    pub fn from_str(s: &str) -> Option<EntryKind> {
        match s.trim().to_lowercase().as_str() {
            "income" => Some(EntryKind::Income),
            "expense" => Some(EntryKind::Expense),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryKind::Income => write!(f, "income"),
            EntryKind::Expense => write!(f, "expense"),
        }
    }
}

/// Ledger entry stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredEntry {
    /// Unique entry identifier (UUID)
    pub id: String,
    pub name: String,
    pub description: String,
    /// Non-negative amount in the ledger currency
    pub amount: Decimal,
    pub kind: EntryKind,
    /// Attachment owned exclusively by this entry
    #[serde(default)]
    pub attachment: Option<AttachmentRef>,
    /// Creating user (informational)
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Repository for ledger entry documents.
pub struct EntryRepository<'a> {
    storage: &'a DocumentStorage,
}

impl<'a> EntryRepository<'a> {
    pub fn new(storage: &'a DocumentStorage) -> Self {
        Self { storage }
    }

    /// Check if an entry exists.
    pub fn exists(&self, entry_id: &str) -> bool {
        Uuid::parse_str(entry_id).is_ok()
            && self.storage.exists(self.storage.paths().entry(entry_id))
    }

    /// Get an entry by ID.
    pub fn get(&self, entry_id: &str) -> StorageResult<StoredEntry> {
        if !self.exists(entry_id) {
            return Err(StorageError::NotFound(format!("Entry {entry_id}")));
        }
        self.storage.read_json(self.storage.paths().entry(entry_id))
    }

    /// Create a new entry.
    pub fn create(&self, entry: &StoredEntry) -> StorageResult<()> {
        if self.exists(&entry.id) {
            return Err(StorageError::AlreadyExists(format!("Entry {}", entry.id)));
        }
        self.storage
            .write_json(self.storage.paths().entry(&entry.id), entry)
    }

    /// Overwrite an existing entry.
    pub fn update(&self, entry: &StoredEntry) -> StorageResult<()> {
        if !self.exists(&entry.id) {
            return Err(StorageError::NotFound(format!("Entry {}", entry.id)));
        }
        self.storage
            .write_json(self.storage.paths().entry(&entry.id), entry)
    }

    /// Delete an entry document.
    pub fn delete(&self, entry_id: &str) -> StorageResult<()> {
        if !self.exists(entry_id) {
            return Err(StorageError::NotFound(format!("Entry {entry_id}")));
        }
        self.storage.delete(self.storage.paths().entry(entry_id))
    }

    /// List all entries, unordered.
    ///
    /// Entries removed between listing and reading are skipped. Any other
    /// read failure fails the whole listing.
    pub fn list_all(&self) -> StorageResult<Vec<StoredEntry>> {
        let ids = self
            .storage
            .list_files(self.storage.paths().entries_dir(), "json")?;

        let mut entries = Vec::with_capacity(ids.len());
        for id in ids {
            match self.get(&id) {
                Ok(entry) => entries.push(entry),
                Err(StorageError::NotFound(_)) => {
                    tracing::debug!(entry_id = %id, "Entry vanished during listing")
                }
                Err(e) => {
                    tracing::error!(entry_id = %id, error = %e, "Unreadable entry document");
                    return Err(e);
                }
            }
        }
        Ok(entries)
    }
}
