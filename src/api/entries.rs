// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ledger entry endpoints.
//!
//! Reads need any valid session. Create, update and delete need the steward
//! role, checked before the request body is read.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    attachments::Upload,
    auth::{authorize, Auth, LedgerAction},
    error::{ApiError, ErrorBody},
    ledger::{entry::FIELD_PHOTO, EntryForm},
    models::{DeleteEntryResponse, EntryResponse, SummaryResponse},
    state::AppState,
};

/// List every entry, newest first.
#[utoipa::path(
    get,
    path = "/entries",
    tag = "Entries",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Entries, newest first", body = Vec<EntryResponse>),
        (status = 401, description = "Unauthenticated", body = ErrorBody)
    )
)]
pub async fn list_entries(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<Vec<EntryResponse>>, ApiError> {
    authorize(&user, LedgerAction::Read)?;
    Ok(Json(state.ledger().list()?))
}

/// Get one entry.
#[utoipa::path(
    get,
    path = "/entries/{entry_id}",
    tag = "Entries",
    security(("bearer_auth" = [])),
    params(("entry_id" = String, Path, description = "Entry ID")),
    responses(
        (status = 200, description = "Entry", body = EntryResponse),
        (status = 401, description = "Unauthenticated", body = ErrorBody),
        (status = 404, description = "Entry not found", body = ErrorBody)
    )
)]
pub async fn get_entry(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(entry_id): Path<String>,
) -> Result<Json<EntryResponse>, ApiError> {
    authorize(&user, LedgerAction::Read)?;
    Ok(Json(state.ledger().get(&entry_id)?))
}

/// Record a new entry.
///
/// Multipart fields: `name`, `amount` (required), `description`, `kind`
/// (`income` when absent or unrecognized) and an optional `photo` file.
#[utoipa::path(
    post,
    path = "/entries",
    tag = "Entries",
    security(("bearer_auth" = [])),
    request_body(content_type = "multipart/form-data", description = "Entry fields and optional photo"),
    responses(
        (status = 201, description = "Entry created", body = EntryResponse),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 401, description = "Unauthenticated", body = ErrorBody),
        (status = 403, description = "Steward role required", body = ErrorBody),
        (status = 413, description = "Attachment too large", body = ErrorBody),
        (status = 415, description = "Unsupported attachment type", body = ErrorBody)
    )
)]
pub async fn create_entry(
    Auth(user): Auth,
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<EntryResponse>), ApiError> {
    authorize(&user, LedgerAction::Create)?;

    let (new_entry, photo) = read_form(multipart?).await?.into_new_entry()?;
    let entry = state.ledger().create(new_entry, photo, &user.user_id)?;

    Ok((StatusCode::CREATED, Json(entry)))
}

/// Update the supplied fields of an entry, optionally replacing its photo.
#[utoipa::path(
    put,
    path = "/entries/{entry_id}",
    tag = "Entries",
    security(("bearer_auth" = [])),
    params(("entry_id" = String, Path, description = "Entry ID")),
    request_body(content_type = "multipart/form-data", description = "Fields to change and optional new photo"),
    responses(
        (status = 200, description = "Entry updated", body = EntryResponse),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 401, description = "Unauthenticated", body = ErrorBody),
        (status = 403, description = "Steward role required", body = ErrorBody),
        (status = 404, description = "Entry not found", body = ErrorBody),
        (status = 413, description = "Attachment too large", body = ErrorBody),
        (status = 415, description = "Unsupported attachment type", body = ErrorBody)
    )
)]
pub async fn update_entry(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(entry_id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<EntryResponse>, ApiError> {
    authorize(&user, LedgerAction::Update)?;

    let (patch, photo) = read_form(multipart?).await?.into_patch()?;
    Ok(Json(state.ledger().update(&entry_id, patch, photo)?))
}

/// Delete an entry and its attachment.
#[utoipa::path(
    delete,
    path = "/entries/{entry_id}",
    tag = "Entries",
    security(("bearer_auth" = [])),
    params(("entry_id" = String, Path, description = "Entry ID")),
    responses(
        (status = 200, description = "Entry deleted", body = DeleteEntryResponse),
        (status = 401, description = "Unauthenticated", body = ErrorBody),
        (status = 403, description = "Steward role required", body = ErrorBody),
        (status = 404, description = "Entry not found", body = ErrorBody)
    )
)]
pub async fn delete_entry(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(entry_id): Path<String>,
) -> Result<Json<DeleteEntryResponse>, ApiError> {
    authorize(&user, LedgerAction::Delete)?;
    Ok(Json(state.ledger().delete(&entry_id)?))
}

/// Running income/expense/balance series, chart axis and totals.
#[utoipa::path(
    get,
    path = "/entries/summary",
    tag = "Entries",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Ledger summary", body = SummaryResponse),
        (status = 401, description = "Unauthenticated", body = ErrorBody)
    )
)]
pub async fn summary(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<SummaryResponse>, ApiError> {
    authorize(&user, LedgerAction::Read)?;
    Ok(Json(state.ledger().summary()?))
}

/// Collect a multipart body into an [`EntryForm`].
///
/// A file input left empty by the browser arrives with a blank file name
/// and no bytes, and is ignored.
async fn read_form(mut multipart: Multipart) -> Result<EntryForm, ApiError> {
    let mut form = EntryForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        match field.file_name().map(str::to_string) {
            Some(file_name) if name == FIELD_PHOTO => {
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                form.set_photo(Upload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                })?;
            }
            _ => {
                let value = field.text().await?;
                form.set_text(&name, value)?;
            }
        }
    }

    Ok(form)
}
