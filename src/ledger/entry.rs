// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Boundary schema for entry mutations.
//!
//! Multipart forms are collected into an [`EntryForm`], which only knows the
//! fields below. Anything else is refused before it reaches the ledger.
//! Blank text fields count as not supplied.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::{
    attachments::Upload,
    error::ApiError,
    storage::{EntryKind, StoredEntry},
};

pub const FIELD_NAME: &str = "name";
pub const FIELD_DESCRIPTION: &str = "description";
pub const FIELD_AMOUNT: &str = "amount";
pub const FIELD_KIND: &str = "kind";
/// File field carrying the attachment.
pub const FIELD_PHOTO: &str = "photo";

/// Raw entry form as received.
#[derive(Debug, Default)]
pub struct EntryForm {
    pub name: Option<String>,
    pub description: Option<String>,
    pub amount: Option<String>,
    pub kind: Option<String>,
    pub photo: Option<Upload>,
}

/// Validated input for a new entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub name: String,
    pub description: String,
    pub amount: Decimal,
    pub kind: EntryKind,
}

/// Validated partial update. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub kind: Option<EntryKind>,
}

impl EntryForm {
    /// Record a text field. Unknown or repeated fields are rejected.
    pub fn set_text(&mut self, field: &str, value: String) -> Result<(), ApiError> {
        let slot = match field {
            FIELD_NAME => &mut self.name,
            FIELD_DESCRIPTION => &mut self.description,
            FIELD_AMOUNT => &mut self.amount,
            FIELD_KIND => &mut self.kind,
            FIELD_PHOTO => {
                return Err(ApiError::invalid_input("photo must be sent as a file"));
            }
            other => return Err(ApiError::invalid_input(format!("unknown field '{other}'"))),
        };

        if slot.is_some() {
            return Err(ApiError::invalid_input(format!("field '{field}' given more than once")));
        }
        *slot = Some(value);
        Ok(())
    }

    pub fn set_photo(&mut self, upload: Upload) -> Result<(), ApiError> {
        if self.photo.is_some() {
            return Err(ApiError::invalid_input("only one photo may be attached"));
        }
        self.photo = Some(upload);
        Ok(())
    }

    /// Validate for creation. Name and amount are required; an absent or
    /// unrecognized kind means income.
    pub fn into_new_entry(self) -> Result<(NewEntry, Option<Upload>), ApiError> {
        let mut problems = Vec::new();

        let name = non_blank(self.name);
        if name.is_none() {
            problems.push("name is required".to_string());
        }

        let amount = match non_blank(self.amount) {
            None => {
                problems.push("amount is required".to_string());
                None
            }
            Some(raw) => match parse_amount(&raw) {
                Ok(amount) => Some(amount),
                Err(problem) => {
                    problems.push(problem);
                    None
                }
            },
        };

        let (Some(name), Some(amount)) = (name, amount) else {
            return Err(ApiError::invalid_fields(problems));
        };

        let kind = self
            .kind
            .as_deref()
            .and_then(EntryKind::from_str)
            .unwrap_or_default();

        Ok((
            NewEntry {
                name,
                description: self.description.map(|d| d.trim().to_string()).unwrap_or_default(),
                amount,
                kind,
            },
            self.photo,
        ))
    }

    /// Validate for a partial update. Supplied values must be valid.
    pub fn into_patch(self) -> Result<(EntryPatch, Option<Upload>), ApiError> {
        let mut problems = Vec::new();

        let amount = match non_blank(self.amount) {
            None => None,
            Some(raw) => match parse_amount(&raw) {
                Ok(amount) => Some(amount),
                Err(problem) => {
                    problems.push(problem);
                    None
                }
            },
        };

        let kind = match non_blank(self.kind) {
            None => None,
            Some(raw) => match EntryKind::from_str(&raw) {
                Some(kind) => Some(kind),
                None => {
                    problems.push(format!("kind must be 'income' or 'expense', got '{raw}'"));
                    None
                }
            },
        };

        if !problems.is_empty() {
            return Err(ApiError::invalid_fields(problems));
        }

        Ok((
            EntryPatch {
                name: non_blank(self.name),
                description: non_blank(self.description),
                amount,
                kind,
            },
            self.photo,
        ))
    }
}

impl EntryPatch {
    /// Overwrite only the supplied fields.
    pub fn apply(&self, entry: &mut StoredEntry) {
        if let Some(name) = &self.name {
            entry.name = name.clone();
        }
        if let Some(description) = &self.description {
            entry.description = description.clone();
        }
        if let Some(amount) = self.amount {
            entry.amount = amount;
        }
        if let Some(kind) = self.kind {
            entry.kind = kind;
        }
    }
}

/// Parse a non-negative decimal amount.
pub fn parse_amount(raw: &str) -> Result<Decimal, String> {
    let amount = Decimal::from_str(raw.trim())
        .map_err(|_| format!("amount must be a number, got '{}'", raw.trim()))?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err("amount must not be negative".to_string());
    }
    Ok(amount.abs())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use chrono::Utc;

    fn form(fields: &[(&str, &str)]) -> EntryForm {
        let mut form = EntryForm::default();
        for (field, value) in fields {
            form.set_text(field, value.to_string()).unwrap();
        }
        form
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let mut form = EntryForm::default();
        let err = form.set_text("owner_id", "someone".to_string()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
    }

    #[test]
    fn repeated_fields_are_rejected() {
        let mut form = form(&[("name", "a")]);
        assert!(form.set_text("name", "b".to_string()).is_err());
    }

    #[test]
    fn new_entry_defaults_kind_to_income() {
        let (entry, photo) = form(&[("name", "Dues"), ("amount", "100")])
            .into_new_entry()
            .unwrap();
        assert_eq!(entry.kind, EntryKind::Income);
        assert_eq!(entry.description, "");
        assert!(photo.is_none());

        let (entry, _) = form(&[("name", "Dues"), ("amount", "100"), ("kind", "donation")])
            .into_new_entry()
            .unwrap();
        assert_eq!(entry.kind, EntryKind::Income);
    }

    #[test]
    fn new_entry_requires_name_and_valid_amount() {
        let err = form(&[("amount", "abc")]).into_new_entry().unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
        assert_eq!(err.details.len(), 2);

        let err = form(&[("name", "x"), ("amount", "-5")])
            .into_new_entry()
            .unwrap_err();
        assert_eq!(err.details, vec!["amount must not be negative".to_string()]);
    }

    #[test]
    fn amounts_are_decimal() {
        assert_eq!(parse_amount(" 12.50 ").unwrap(), Decimal::new(1250, 2));
        assert_eq!(parse_amount("0").unwrap(), Decimal::ZERO);
        assert!(parse_amount("1e3").is_err());
        assert!(parse_amount("NaN").is_err());
        assert!(parse_amount("-0.01").is_err());
    }

    #[test]
    fn patch_keeps_omitted_fields() {
        let (patch, _) = form(&[("amount", "75"), ("name", "  ")]).into_patch().unwrap();
        let now = Utc::now();
        let mut entry = StoredEntry {
            id: "e".to_string(),
            name: "Original".to_string(),
            description: "kept".to_string(),
            amount: Decimal::new(10, 0),
            kind: EntryKind::Expense,
            attachment: None,
            owner_id: "u".to_string(),
            created_at: now,
            updated_at: now,
        };

        patch.apply(&mut entry);
        assert_eq!(entry.name, "Original");
        assert_eq!(entry.description, "kept");
        assert_eq!(entry.amount, Decimal::new(75, 0));
        assert_eq!(entry.kind, EntryKind::Expense);
    }

    #[test]
    fn patch_rejects_bad_kind_and_amount() {
        let err = form(&[("kind", "refund"), ("amount", "ten")])
            .into_patch()
            .unwrap_err();
        assert_eq!(err.details.len(), 2);
    }
}
