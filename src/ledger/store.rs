// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ledger entry lifecycle.
//!
//! Write orderings keep records and attachment files consistent when a
//! step fails or the process dies between steps:
//!
//! - create: store attachment, then write the entry
//! - update: store new attachment, write the entry, then remove the old file
//! - delete: remove the entry, then its file
//!
//! An interrupted sequence leaves at worst an unreferenced file, never an
//! entry pointing at a missing one.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::{aggregate, EntryPatch, NewEntry};
use crate::{
    attachments::{AttachmentManager, AttachmentRef, Upload},
    error::ApiError,
    models::{DeleteEntryResponse, EntryResponse, SummaryResponse},
    storage::{DocumentStorage, EntryRepository, StoredEntry, UserRepository},
};

#[derive(Clone)]
pub struct LedgerStore {
    storage: DocumentStorage,
    attachments: AttachmentManager,
}

impl LedgerStore {
    pub fn new(storage: DocumentStorage, attachments: AttachmentManager) -> Self {
        Self {
            storage,
            attachments,
        }
    }

    /// All entries, newest first, with owner names resolved.
    pub fn list(&self) -> Result<Vec<EntryResponse>, ApiError> {
        let entries = self.newest_first()?;
        let users = UserRepository::new(&self.storage);
        let mut owner_names: HashMap<String, Option<String>> = HashMap::new();

        Ok(entries
            .into_iter()
            .map(|entry| {
                let owner_name = owner_names
                    .entry(entry.owner_id.clone())
                    .or_insert_with(|| users.get(&entry.owner_id).ok().map(|u| u.name))
                    .clone();
                EntryResponse::from_stored(entry, owner_name)
            })
            .collect())
    }

    pub fn get(&self, entry_id: &str) -> Result<EntryResponse, ApiError> {
        let entry = EntryRepository::new(&self.storage).get(entry_id)?;
        Ok(self.respond(entry))
    }

    /// Record a new entry authored by `author_id`.
    pub fn create(
        &self,
        new: NewEntry,
        photo: Option<Upload>,
        author_id: &str,
    ) -> Result<EntryResponse, ApiError> {
        let attachment = photo
            .as_ref()
            .map(|upload| self.attachments.store(upload))
            .transpose()?;

        let now = Utc::now();
        let entry = StoredEntry {
            id: Uuid::new_v4().to_string(),
            name: new.name,
            description: new.description,
            amount: new.amount,
            kind: new.kind,
            attachment,
            owner_id: author_id.to_string(),
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = EntryRepository::new(&self.storage).create(&entry) {
            if let Some(stored) = &entry.attachment {
                self.discard(stored, "entry write failed");
            }
            return Err(e.into());
        }

        tracing::info!(
            entry_id = %entry.id,
            owner_id = %entry.owner_id,
            kind = %entry.kind,
            has_attachment = entry.attachment.is_some(),
            "Entry created"
        );
        Ok(self.respond(entry))
    }

    /// Overwrite the supplied fields and optionally replace the attachment.
    pub fn update(
        &self,
        entry_id: &str,
        patch: EntryPatch,
        photo: Option<Upload>,
    ) -> Result<EntryResponse, ApiError> {
        let repo = EntryRepository::new(&self.storage);
        let mut entry = repo.get(entry_id)?;

        let replacement = photo
            .as_ref()
            .map(|upload| self.attachments.store(upload))
            .transpose()?;

        patch.apply(&mut entry);
        entry.updated_at = advance(entry.updated_at);
        let replaced = replacement.is_some();
        let previous = match replacement {
            Some(new_ref) => entry.attachment.replace(new_ref),
            None => None,
        };

        if let Err(e) = repo.update(&entry) {
            if let (true, Some(stored)) = (replaced, &entry.attachment) {
                self.discard(stored, "entry write failed");
            }
            return Err(e.into());
        }

        if let Some(old) = &previous {
            self.discard(old, "attachment replaced");
        }

        tracing::info!(
            entry_id = %entry.id,
            attachment_replaced = replaced,
            "Entry updated"
        );
        Ok(self.respond(entry))
    }

    /// Remove an entry and then its attachment.
    pub fn delete(&self, entry_id: &str) -> Result<DeleteEntryResponse, ApiError> {
        let repo = EntryRepository::new(&self.storage);
        let entry = repo.get(entry_id)?;

        repo.delete(&entry.id)?;

        if let Some(attachment) = &entry.attachment {
            self.discard(attachment, "entry deleted");
        }

        tracing::info!(entry_id = %entry.id, "Entry deleted");
        Ok(DeleteEntryResponse {
            message: "Entry deleted".to_string(),
            id: entry.id,
        })
    }

    /// Running series, chart axis and totals.
    pub fn summary(&self) -> Result<SummaryResponse, ApiError> {
        let mut entries = self.newest_first()?;
        entries.reverse();

        let series = aggregate::compute(&entries);
        Ok(SummaryResponse {
            axis: aggregate::axis_range(&series),
            totals: aggregate::totals(&entries),
            series,
        })
    }

    fn newest_first(&self) -> Result<Vec<StoredEntry>, ApiError> {
        let mut entries = EntryRepository::new(&self.storage).list_all()?;
        entries.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(entries)
    }

    fn respond(&self, entry: StoredEntry) -> EntryResponse {
        let owner_name = UserRepository::new(&self.storage)
            .get(&entry.owner_id)
            .ok()
            .map(|u| u.name);
        EntryResponse::from_stored(entry, owner_name)
    }

    /// Best-effort removal; failures are logged and leave an unreferenced file.
    fn discard(&self, attachment: &AttachmentRef, reason: &str) {
        if let Err(e) = self.attachments.delete(attachment) {
            tracing::warn!(
                attachment = %attachment,
                reason,
                error = %e,
                "Failed to remove attachment; file left orphaned"
            );
        }
    }
}

/// Next `updated_at`, strictly after the previous one.
fn advance(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::milliseconds(1)
    }
}
