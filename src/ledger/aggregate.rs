// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Running income/expense/balance series and chart scaling.
//!
//! Pure functions over an entry list; nothing here touches storage.
//!
//! [`compute`] expects entries oldest first. The ledger lists newest first,
//! so callers reverse before computing. Feeding newest-first input produces
//! the running totals of the reversed history, which is wrong for every
//! point but the last.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::storage::{EntryKind, StoredEntry};

/// Axis bound used when there is nothing to scale against.
pub const FALLBACK_AXIS_BOUND: i64 = 100_000;

/// Anything that moves money in or out of the ledger.
pub trait Movement {
    fn kind(&self) -> EntryKind;
    fn amount(&self) -> Decimal;
    fn timestamp(&self) -> DateTime<Utc>;
}

impl Movement for StoredEntry {
    fn kind(&self) -> EntryKind {
        self.kind
    }

    fn amount(&self) -> Decimal {
        self.amount
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Cumulative totals after one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RunningPoint {
    #[schema(value_type = String)]
    pub running_income: Decimal,
    #[schema(value_type = String)]
    pub running_expense: Decimal,
    /// `running_income - running_expense`
    #[schema(value_type = String)]
    pub running_balance: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// Value range for a chart of the series, including zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AxisRange {
    #[schema(value_type = String)]
    pub min: Decimal,
    #[schema(value_type = String)]
    pub max: Decimal,
}

impl AxisRange {
    pub fn fallback() -> Self {
        Self {
            min: Decimal::from(-FALLBACK_AXIS_BOUND),
            max: Decimal::from(FALLBACK_AXIS_BOUND),
        }
    }
}

/// Ledger-wide totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Totals {
    #[schema(value_type = String)]
    pub total_income: Decimal,
    #[schema(value_type = String)]
    pub total_expense: Decimal,
    #[schema(value_type = String)]
    pub balance: Decimal,
    pub entry_count: usize,
}

/// Running series over entries ordered oldest first.
pub fn compute<M: Movement>(entries: &[M]) -> Vec<RunningPoint> {
    let mut income = Decimal::ZERO;
    let mut expense = Decimal::ZERO;

    entries
        .iter()
        .map(|entry| {
            match entry.kind() {
                EntryKind::Income => income = income.saturating_add(entry.amount()),
                EntryKind::Expense => expense = expense.saturating_add(entry.amount()),
            }
            RunningPoint {
                running_income: income,
                running_expense: expense,
                running_balance: income.saturating_sub(expense),
                timestamp: entry.timestamp(),
            }
        })
        .collect()
}

/// `[min - buffer, max + buffer]` over every series value and zero, with
/// buffer = 10% of the span. An empty or flat series gets the fixed
/// fallback range.
pub fn axis_range(series: &[RunningPoint]) -> AxisRange {
    let values = series
        .iter()
        .flat_map(|p| [p.running_income, p.running_expense, p.running_balance]);

    let (min, max) = values.fold((Decimal::ZERO, Decimal::ZERO), |(min, max), v| {
        (min.min(v), max.max(v))
    });

    let span = max.saturating_sub(min);
    if series.is_empty() || span.is_zero() {
        return AxisRange::fallback();
    }

    let buffer = span.saturating_mul(Decimal::new(1, 1));
    AxisRange {
        min: min.saturating_sub(buffer),
        max: max.saturating_add(buffer),
    }
}

/// Order-independent totals over any entry list.
pub fn totals<M: Movement>(entries: &[M]) -> Totals {
    let (total_income, total_expense) =
        entries
            .iter()
            .fold((Decimal::ZERO, Decimal::ZERO), |(income, expense), entry| {
                match entry.kind() {
                    EntryKind::Income => (income.saturating_add(entry.amount()), expense),
                    EntryKind::Expense => (income, expense.saturating_add(entry.amount())),
                }
            });

    Totals {
        total_income,
        total_expense,
        balance: total_income.saturating_sub(total_expense),
        entry_count: entries.len(),
    }
}
