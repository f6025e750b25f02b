// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistent state lives under a single data directory and is accessed as
//! JSON documents addressed by id.
//!
//! ## Storage Layout
//!
//! ```text
//! {DATA_DIR}/
//!   users/
//!     {user_id}.json        # Identity + role + password verifier
//!     emails/
//!       {email_key}.json    # Unique email claim (create-new)
//!   entries/
//!     {entry_id}.json       # Ledger entries
//!   uploads/
//!     {generated_name}      # Attachment blobs
//!     .staging/             # In-flight attachment writes
//! ```

pub mod documents;
pub mod paths;
pub mod repository;

pub use documents::{DocumentStorage, StorageError, StorageResult};
pub use paths::StoragePaths;
pub use repository::{EntryKind, EntryRepository, StoredEntry, StoredUser, UserRepository};
