// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Community Ledger - Shared Income/Expense Ledger Service
//!
//! Members register and log in; stewards record income and expense entries
//! with optional receipt attachments; every member can read the entries and
//! the running balance derived from them.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `attachments` - Attachment validation and blob storage
//! - `auth` - Credentials, session tokens and the role gate
//! - `client` - Session-scoped HTTP client
//! - `ledger` - Entry lifecycle and running-balance aggregation
//! - `storage` - File-backed JSON document store

pub mod api;
pub mod attachments;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod models;
pub mod state;
pub mod storage;
