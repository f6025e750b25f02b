// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request and response bodies of the HTTP API.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    attachments::AttachmentManager,
    auth::Role,
    ledger::{AxisRange, RunningPoint, Totals},
    storage::{EntryKind, StoredEntry, StoredUser},
};

/// Body of `POST /auth/register`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    /// `resident` or `steward`; anything else registers a resident.
    pub role: Option<String>,
}

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Public projection of a user. Never carries the password verifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<StoredUser> for UserResponse {
    fn from(user: StoredUser) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        }
    }
}

/// Response of register and login.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub user: UserResponse,
}

/// A ledger entry as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EntryResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    #[schema(value_type = String, example = "150000.00")]
    pub amount: Decimal,
    pub kind: EntryKind,
    /// Relative locator of the attachment, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_url: Option<String>,
    pub owner_id: String,
    /// Name of the creating user at read time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EntryResponse {
    pub fn from_stored(entry: StoredEntry, owner_name: Option<String>) -> Self {
        Self {
            attachment_url: entry.attachment.as_ref().map(AttachmentManager::url_for),
            id: entry.id,
            name: entry.name,
            description: entry.description,
            amount: entry.amount,
            kind: entry.kind,
            owner_id: entry.owner_id,
            owner_name,
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        }
    }
}

/// Response after deleting an entry.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteEntryResponse {
    pub message: String,
    pub id: String,
}

/// Running series, chart axis and totals over the whole ledger.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SummaryResponse {
    pub series: Vec<RunningPoint>,
    pub axis: AxisRange,
    pub totals: Totals,
}
