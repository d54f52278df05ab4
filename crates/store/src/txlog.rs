// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only transaction log and history reads
//!
//! One pipe-delimited line per ledger effect:
//!
//! ```text
//! <unix_ts>|acct=<number>|<KIND>|amt=<amount>|bal=<balance>|<note>
//! ```
//!
//! Append order is chronological order. The log is never rewritten except
//! by legacy migration, which swaps in a remapped copy atomically.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Lines, Write};
use std::path::{Path, PathBuf};

use chrono::TimeZone;
use tempfile::NamedTempFile;

/// Ledger operation kind as it appears in the log
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxnKind {
    Deposit,
    Withdraw,
    TransferOut,
    TransferIn,
    LoanCredit,
}

impl TxnKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TxnKind::Deposit => "DEPOSIT",
            TxnKind::Withdraw => "WITHDRAW",
            TxnKind::TransferOut => "TRANSFER_OUT",
            TxnKind::TransferIn => "TRANSFER_IN",
            TxnKind::LoanCredit => "LOAN_CREDIT",
        }
    }
}

impl std::fmt::Display for TxnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The append-only transaction log
#[derive(Clone, Debug)]
pub struct TxnLog {
    path: PathBuf,
}

impl TxnLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ensure_exists(&self) -> io::Result<()> {
        OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;
        Ok(())
    }

    /// Append one audit line and fsync before returning
    pub fn append(
        &self,
        timestamp: i64,
        account_number: i32,
        kind: TxnKind,
        amount: i64,
        balance: i64,
        note: Option<&str>,
    ) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;
        writeln!(
            file,
            "{}|acct={}|{}|amt={}|bal={}|{}",
            timestamp,
            account_number,
            kind,
            amount,
            balance,
            note.unwrap_or("-")
        )?;
        file.sync_all()?;
        Ok(())
    }

    /// Lazy, restartable-from-start stream of one account's history lines
    ///
    /// The `acct=` field is compared exactly, and the unix timestamp is
    /// rendered in local time for display; the rest of the line is kept
    /// verbatim.
    pub fn history(&self, account_number: i32) -> io::Result<HistoryIter> {
        let lines = match File::open(&self.path) {
            Ok(file) => Some(BufReader::new(file).lines()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e),
        };
        Ok(HistoryIter {
            lines,
            tag: format!("acct={}", account_number),
        })
    }

    /// Rewrite the log applying account-number remaps, then atomically
    /// swap the copy in for the original
    ///
    /// This is the only operation that rewrites historical log content.
    pub fn rewrite_remapped(&self, remaps: &[(i32, i32)]) -> io::Result<()> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };

        let dir = self.path.parent().unwrap_or(Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir)?;
        for line in BufReader::new(file).lines() {
            writeln!(tmp, "{}", remap_line(&line?, remaps))?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Substitute `acct=<old>` fields, matching the whole field only so
/// `acct=5` never rewrites `acct=50`
fn remap_line(line: &str, remaps: &[(i32, i32)]) -> String {
    let fields: Vec<String> = line
        .split('|')
        .map(|field| {
            let renumbered = field
                .strip_prefix("acct=")
                .and_then(|raw| raw.parse::<i32>().ok())
                .and_then(|number| {
                    remaps
                        .iter()
                        .find(|(old, _)| *old == number)
                        .map(|(_, new)| format!("acct={}", new))
                });
            renumbered.unwrap_or_else(|| field.to_string())
        })
        .collect();
    fields.join("|")
}

/// Iterator over formatted history lines for one account
pub struct HistoryIter {
    lines: Option<Lines<BufReader<File>>>,
    tag: String,
}

impl Iterator for HistoryIter {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<io::Result<String>> {
        let lines = self.lines.as_mut()?;
        loop {
            let line = match lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e)),
            };
            if let Some(formatted) = format_history_line(&line, &self.tag) {
                return Some(Ok(formatted));
            }
        }
    }
}

/// None when the line belongs to another account or fails to parse;
/// unparsable lines are skipped, not surfaced
fn format_history_line(line: &str, tag: &str) -> Option<String> {
    let (ts_field, rest) = line.split_once('|')?;
    if rest.split('|').next()? != tag {
        return None;
    }
    let secs: i64 = ts_field.trim().parse().ok()?;
    let local = chrono::Local.timestamp_opt(secs, 0).single()?;
    Some(format!("{}|{}", local.format("%Y-%m-%d %H:%M:%S"), rest))
}

#[cfg(test)]
#[path = "txlog_tests.rs"]
mod tests;
