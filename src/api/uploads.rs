// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    http::header::{CACHE_CONTROL, CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS},
    response::IntoResponse,
};

use crate::{
    attachments::AttachmentRef,
    error::{ApiError, ErrorBody},
    state::AppState,
};

/// Serve a stored attachment by its generated name.
///
/// Public so that image tags can load the relative locator returned with
/// each entry.
#[utoipa::path(
    get,
    path = "/uploads/{name}",
    tag = "Uploads",
    params(("name" = String, Path, description = "Generated attachment name")),
    responses(
        (status = 200, description = "Attachment content"),
        (status = 404, description = "No such attachment", body = ErrorBody)
    )
)]
pub async fn get_upload(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let reference =
        AttachmentRef::parse(&name).map_err(|_| ApiError::not_found(format!("Attachment not found: {name}")))?;
    let (bytes, kind) = state.attachments.open(&reference)?;

    Ok((
        [
            (CONTENT_TYPE, kind.media_type()),
            (X_CONTENT_TYPE_OPTIONS, "nosniff"),
            // Names are never reused, so content under a name never changes.
            (CACHE_CONTROL, "public, max-age=31536000, immutable"),
        ],
        bytes,
    ))
}
