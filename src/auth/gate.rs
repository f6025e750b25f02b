// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request-scoped capability check for ledger operations.

use super::{AuthError, AuthenticatedUser, Role};

/// Operations on the ledger, as seen by the authorization gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerAction {
    Read,
    Create,
    Update,
    Delete,
}

impl LedgerAction {
    /// Minimum role for the action.
    pub fn required_role(&self) -> Role {
        match self {
            LedgerAction::Read => Role::Resident,
            LedgerAction::Create | LedgerAction::Update | LedgerAction::Delete => Role::Steward,
        }
    }
}

/// Allow or refuse `action` for an already-authenticated caller.
pub fn authorize(user: &AuthenticatedUser, action: LedgerAction) -> Result<(), AuthError> {
    if user.has_role(action.required_role()) {
        Ok(())
    } else {
        tracing::info!(
            user_id = %user.user_id,
            role = %user.role,
            action = ?action,
            "Ledger mutation refused"
        );
        Err(AuthError::InsufficientPermissions)
    }
}
