// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User roles for authorization.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User roles for authorization.
///
/// ## Role Hierarchy
///
/// - `Steward` - May create, update and delete ledger entries
/// - `Resident` - Read-only access to the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Read-only member
    Resident,
    /// Treasurer-style role (`bph` in older clients)
    #[serde(alias = "bph")]
    Steward,
}

impl Role {
    /// Check if this role has at least the privileges of the required role.
    pub fn has_privilege(&self, required: Role) -> bool {
        match (self, required) {
            (Role::Steward, _) => true,
            (Role::Resident, Role::Resident) => true,
            _ => false,
        }
    }

    /// Parse role from string (case-insensitive).
    pub fn from_str(s: &str) -> Option<Role> {
        match s.trim().to_lowercase().as_str() {
            "resident" => Some(Role::Resident),
            "steward" | "bph" => Some(Role::Steward),
            _ => None,
        }
    }

    /// Role granted at registration: the requested one when it names a known
    /// role, otherwise `Resident`.
    pub fn from_requested(requested: Option<&str>) -> Role {
        requested.and_then(Role::from_str).unwrap_or_default()
    }
}

impl Default for Role {
    /// Default role is Resident (least privilege).
    fn default() -> Self {
        Role::Resident
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Resident => write!(f, "resident"),
            Role::Steward => write!(f, "steward"),
        }
    }
}
