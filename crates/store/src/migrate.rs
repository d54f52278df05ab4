// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One-time renumbering of legacy account numbers
//!
//! An earlier numbering scheme handed out account numbers below 1000.
//! At startup, before traffic is accepted, any such number is reassigned
//! to a fresh one above the current maximum and every historical log
//! reference is rewritten to match. Running twice is a no-op.

use std::io;

use teller_core::AccountRecord;

use crate::table::Table;
use crate::txlog::TxnLog;

/// Floor of the modern account-number range; anything below is legacy
pub const ACCOUNT_NUMBER_FLOOR: i32 = 1000;

/// Remap legacy account numbers and rewrite the transaction log
///
/// Holds the exclusive accounts lock for the whole pass. Record rewrites
/// are fsync'd before the log rewrite starts; the log swap itself is
/// all-or-nothing via atomic rename. Returns the (old, new) pairs.
pub fn migrate_legacy_account_numbers(
    accounts: &Table<AccountRecord>,
    txlog: &TxnLog,
) -> io::Result<Vec<(i32, i32)>> {
    let guard = accounts.write()?;

    let records = guard.records()?;
    let mut max_number = records
        .iter()
        .map(|(account, _)| account.account_number)
        .max()
        .unwrap_or(0)
        .max(ACCOUNT_NUMBER_FLOOR);

    let mut remaps = Vec::new();
    for (mut account, offset) in records {
        if account.account_number < ACCOUNT_NUMBER_FLOOR {
            max_number += 1;
            remaps.push((account.account_number, max_number));
            account.account_number = max_number;
            guard.write_at(offset, &account)?;
        }
    }

    if remaps.is_empty() {
        return Ok(remaps);
    }

    guard.sync()?;
    txlog.rewrite_remapped(&remaps)?;
    Ok(remaps)
}

#[cfg(test)]
#[path = "migrate_tests.rs"]
mod tests;
