// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Ledger
//!
//! Community income/expense entries and the figures derived from them.
//!
//! - [`entry`] validates incoming entry forms
//! - [`store`] owns the entry lifecycle, including attachment ordering
//! - [`aggregate`] computes the running series, chart axis and totals

pub mod aggregate;
pub mod entry;
pub mod store;

pub use aggregate::{axis_range, compute, totals, AxisRange, Movement, RunningPoint, Totals};
pub use entry::{parse_amount, EntryForm, EntryPatch, NewEntry};
pub use store::LedgerStore;
