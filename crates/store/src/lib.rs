// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! teller-store: the persistent record store and transaction layer
//!
//! Users, accounts and loans live as fixed-layout records in flat files.
//! All cross-thread (and cross-process) consistency comes from whole-file
//! advisory locks; there is no in-memory cache of record contents, so the
//! files are the single source of truth.
//!
//! ## Mutation protocol
//!
//! ```text
//! exclusive table lock → locate record(s) → validate preconditions
//!   → journal pre-image → mutate → fsync table → commit journal
//!   → append audit line(s) → release lock
//! ```
//!
//! The journal is a single-slot scratch file holding the pre-image of the
//! one mutation that may be in flight; startup recovery rolls it back if
//! a crash left it populated. The journal file is always locked after the
//! table file, so lock acquisition order is fixed and deadlock-free.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod feedback;
pub mod journal;
pub mod migrate;
pub mod paths;
pub mod store;
pub mod table;
pub mod txlog;

pub use feedback::{FeedbackIter, FeedbackLog};
pub use journal::{Journal, JournalEntry, JournalGuard};
pub use migrate::{migrate_legacy_account_numbers, ACCOUNT_NUMBER_FLOOR};
pub use paths::StorePaths;
pub use store::Store;
pub use table::{Table, TableReadGuard, TableWriteGuard};
pub use txlog::{HistoryIter, TxnKind, TxnLog};
