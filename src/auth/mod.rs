// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Member credentials and session tokens for the ledger API.
//!
//! ## Auth Flow
//!
//! 1. Client registers or logs in with email + password
//! 2. Server returns a signed session token (HS256 JWT, 7-day lifetime)
//! 3. Client sends `Authorization: Bearer <token>` on every ledger request
//! 4. Server verifies signature and expiry, then extracts:
//!    - `sub` → `user_id`
//!    - `role` → `resident` or `steward`
//!
//! ## Authorization
//!
//! - Reading the ledger requires any valid session
//! - Creating, updating and deleting entries requires the steward role
//! - Missing/invalid token → 401, valid token with wrong role → 403

pub mod claims;
pub mod error;
pub mod extractor;
pub mod gate;
pub mod password;
pub mod roles;
pub mod service;
pub mod token;

pub use claims::{AuthenticatedUser, Claims};
pub use error::AuthError;
pub use extractor::Auth;
pub use gate::{authorize, LedgerAction};
pub use roles::Role;
pub use service::AuthService;
pub use token::{TokenService, DEFAULT_TOKEN_TTL_DAYS};
