// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Attachment Manager
//!
//! Stores, replaces and removes the single evidence file (receipt photo or
//! PDF) bound to a ledger entry. The manager validates and names uploads but
//! never interprets their content.
//!
//! ## Accepted uploads
//!
//! | Extension | Media type |
//! |-----------|------------|
//! | `.jpg`, `.jpeg` | `image/jpeg` |
//! | `.png` | `image/png` |
//! | `.gif` | `image/gif` |
//! | `.pdf` | `application/pdf` |
//!
//! Extension and media type must name the same kind. Payloads above
//! [`MAX_ATTACHMENT_BYTES`] are refused.

pub mod blob;

use std::io;
use std::sync::Arc;

use axum::http::StatusCode;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub use blob::{BlobStore, FsBlobStore};

use crate::error::ApiError;

/// Upload ceiling (5 MiB).
pub const MAX_ATTACHMENT_BYTES: usize = 5 * 1024 * 1024;

/// Route prefix under which stored attachments are served.
pub const UPLOADS_ROUTE: &str = "/uploads";

/// Attachment failures.
#[derive(Debug, thiserror::Error)]
pub enum AttachmentError {
    #[error("Only image (jpeg, png, gif) and PDF files are allowed")]
    UnsupportedType {
        file_name: String,
        content_type: String,
    },
    #[error("File extension '{extension}' does not match media type '{content_type}'")]
    TypeMismatch {
        extension: String,
        content_type: String,
    },
    #[error("Attachment is {size} bytes, limit is {limit} bytes")]
    TooLarge { size: usize, limit: usize },
    #[error("Attachment is empty")]
    Empty,
    #[error("Invalid attachment reference: {0}")]
    InvalidRef(String),
    #[error("Attachment not found: {0}")]
    NotFound(String),
    #[error("Attachment storage failed: {0}")]
    Storage(#[from] io::Error),
}

impl From<AttachmentError> for ApiError {
    fn from(e: AttachmentError) -> Self {
        let status = match &e {
            AttachmentError::UnsupportedType { .. } | AttachmentError::TypeMismatch { .. } => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            AttachmentError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AttachmentError::Empty | AttachmentError::InvalidRef(_) => StatusCode::BAD_REQUEST,
            AttachmentError::NotFound(_) => return ApiError::not_found(e.to_string()),
            AttachmentError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError::attachment(status, e.to_string())
    }
}

/// The accepted attachment kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Jpeg,
    Png,
    Gif,
    Pdf,
}

impl AttachmentKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "gif" => Some(Self::Gif),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    pub fn from_media_type(media_type: &str) -> Option<Self> {
        // Parameters such as `; charset=` are not meaningful for these types.
        let essence = media_type.split(';').next().unwrap_or("").trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/jpeg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/gif" => Some(Self::Gif),
            "application/pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    pub fn media_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::Pdf => "application/pdf",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Pdf => "pdf",
        }
    }
}

/// An uploaded file as declared by the client.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Generated storage name of a stored attachment.
///
/// Only names of the generated shape are accepted, so a reference can never
/// address anything outside the uploads area.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
pub struct AttachmentRef(String);

impl AttachmentRef {
    pub fn parse(name: &str) -> Result<Self, AttachmentError> {
        let well_formed = !name.is_empty()
            && !name.starts_with('.')
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
        let known_extension = name
            .rsplit_once('.')
            .and_then(|(_, ext)| AttachmentKind::from_extension(ext))
            .is_some();

        if well_formed && known_extension {
            Ok(Self(name.to_string()))
        } else {
            Err(AttachmentError::InvalidRef(name.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn kind(&self) -> AttachmentKind {
        self.0
            .rsplit_once('.')
            .and_then(|(_, ext)| AttachmentKind::from_extension(ext))
            .unwrap_or(AttachmentKind::Pdf)
    }

    /// Relative locator a viewing client resolves against the serving origin.
    pub fn url(&self) -> String {
        format!("{UPLOADS_ROUTE}/{}", self.0)
    }
}

impl TryFrom<String> for AttachmentRef {
    type Error = AttachmentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AttachmentRef> for String {
    fn from(value: AttachmentRef) -> Self {
        value.0
    }
}

impl std::fmt::Display for AttachmentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validates, names and persists entry attachments.
#[derive(Clone)]
pub struct AttachmentManager {
    blobs: Arc<dyn BlobStore>,
    max_bytes: usize,
}

impl AttachmentManager {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            blobs,
            max_bytes: MAX_ATTACHMENT_BYTES,
        }
    }

    /// Check an upload without storing it.
    pub fn validate(&self, upload: &Upload) -> Result<AttachmentKind, AttachmentError> {
        let unsupported = || AttachmentError::UnsupportedType {
            file_name: upload.file_name.clone(),
            content_type: upload.content_type.clone(),
        };

        let extension = upload
            .file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .ok_or_else(unsupported)?;
        let by_extension = AttachmentKind::from_extension(extension).ok_or_else(unsupported)?;
        let by_media_type =
            AttachmentKind::from_media_type(&upload.content_type).ok_or_else(unsupported)?;

        if by_extension != by_media_type {
            return Err(AttachmentError::TypeMismatch {
                extension: extension.to_string(),
                content_type: upload.content_type.clone(),
            });
        }

        if upload.bytes.len() > self.max_bytes {
            return Err(AttachmentError::TooLarge {
                size: upload.bytes.len(),
                limit: self.max_bytes,
            });
        }
        if upload.bytes.is_empty() {
            return Err(AttachmentError::Empty);
        }

        Ok(by_extension)
    }

    /// Validate and durably store an upload under a freshly generated name.
    pub fn store(&self, upload: &Upload) -> Result<AttachmentRef, AttachmentError> {
        let kind = self.validate(upload)?;
        let reference = generate_ref(kind);

        self.blobs.put(reference.as_str(), &upload.bytes)?;

        tracing::info!(
            attachment = %reference,
            size = upload.bytes.len(),
            kind = kind.media_type(),
            "Attachment stored"
        );
        Ok(reference)
    }

    /// Remove an attachment. Removing an already-missing one succeeds.
    pub fn delete(&self, reference: &AttachmentRef) -> Result<(), AttachmentError> {
        match self.blobs.remove(reference.as_str()) {
            Ok(()) => {
                tracing::info!(attachment = %reference, "Attachment removed");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Read back a stored attachment with its media kind.
    pub fn open(&self, reference: &AttachmentRef) -> Result<(Vec<u8>, AttachmentKind), AttachmentError> {
        match self.blobs.get(reference.as_str()) {
            Ok(bytes) => Ok((bytes, reference.kind())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(AttachmentError::NotFound(reference.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn url_for(reference: &AttachmentRef) -> String {
        reference.url()
    }
}

/// Millisecond timestamp plus a random suffix, so concurrent uploads never
/// collide on a name.
fn generate_ref(kind: AttachmentKind) -> AttachmentRef {
    AttachmentRef(format!(
        "{}-{}.{}",
        Utc::now().timestamp_millis(),
        uuid::Uuid::new_v4().simple(),
        kind.extension()
    ))
}
