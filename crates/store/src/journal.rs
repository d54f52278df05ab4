// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-slot write-ahead journal with startup recovery
//!
//! Before any destructive table write, the mutation's pre-image is
//! persisted here; the slot is cleared only after the table write is
//! durably committed. A crash in between leaves the slot populated, and
//! the next startup rolls the referenced record(s) back to the recorded
//! old values. Every mutation is therefore atomic to an external
//! observer: fully visible, or fully rolled back.
//!
//! Rolling back is always sound because an operation is acknowledged
//! (and its audit line appended) only after the slot is cleared; a
//! populated slot always denotes an unacknowledged operation.
//!
//! The slot holds one checksummed JSON line. A torn or checksum-failing
//! line means the pre-image write itself never completed, so the table
//! was never touched and the slot can simply be discarded.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::FileExt as _;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use teller_core::{AccountRecord, LoanRecord, UserRecord};

use crate::table::Table;

/// Pre-image of an in-flight mutation, one case per mutation kind
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum JournalEntry {
    /// Single-balance update: deposit, withdraw, loan credit
    Account { offset: u64, before: AccountRecord },
    /// Two-account transfer; both endpoints restored together
    Transfer {
        from_offset: u64,
        from_before: AccountRecord,
        to_offset: u64,
        to_before: AccountRecord,
    },
    /// User-record update: session flags, password, active, role
    User { offset: u64, before: UserRecord },
    /// Loan-record update: assignment or decision
    Loan { offset: u64, before: LoanRecord },
}

impl JournalEntry {
    pub fn kind_name(&self) -> &'static str {
        match self {
            JournalEntry::Account { .. } => "account",
            JournalEntry::Transfer { .. } => "transfer",
            JournalEntry::User { .. } => "user",
            JournalEntry::Loan { .. } => "loan",
        }
    }
}

/// On-disk frame: the entry plus a CRC32 of its serialized form
#[derive(Serialize, Deserialize)]
struct JournalFrame {
    entry: JournalEntry,
    checksum: u32,
}

impl JournalFrame {
    fn new(entry: JournalEntry) -> io::Result<Self> {
        let checksum = Self::checksum_of(&entry)?;
        Ok(Self { entry, checksum })
    }

    fn checksum_of(entry: &JournalEntry) -> io::Result<u32> {
        let json = serde_json::to_string(entry).map_err(io::Error::other)?;
        Ok(crc32fast::hash(json.as_bytes()))
    }

    fn verify(&self) -> bool {
        Self::checksum_of(&self.entry).is_ok_and(|sum| sum == self.checksum)
    }
}

/// The single-slot journal file
#[derive(Clone, Debug)]
pub struct Journal {
    path: PathBuf,
}

impl Journal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ensure_exists(&self) -> io::Result<()> {
        self.open()?;
        Ok(())
    }

    fn open(&self) -> io::Result<File> {
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&self.path)
    }

    /// Durably persist the pre-image before any destructive write
    ///
    /// Locks the journal file exclusively (always after the caller's
    /// table lock, preserving the fixed table-then-journal acquisition
    /// order) and holds the lock until commit or drop. Because every
    /// mutation on every table funnels through this one slot, at most
    /// one journal entry is ever open.
    pub fn begin(&self, entry: JournalEntry) -> io::Result<JournalGuard> {
        let file = self.open()?;
        file.lock_exclusive()?;

        // A valid leftover frame means an earlier destructive write failed
        // and its rollback is still owed to the next recovery pass.
        // Refuse rather than overwrite the pre-image.
        if read_frame(&file)?.is_some() {
            return Err(io::Error::other("journal holds an unrecovered pre-image"));
        }

        let frame = JournalFrame::new(entry)?;
        let json = serde_json::to_string(&frame).map_err(io::Error::other)?;
        file.set_len(0)?;
        file.write_all_at(json.as_bytes(), 0)?;
        file.write_all_at(b"\n", json.len() as u64)?;
        file.sync_all()?;

        Ok(JournalGuard { file })
    }

    /// The pending entry, if a valid one is on disk
    pub fn pending(&self) -> io::Result<Option<JournalEntry>> {
        if !self.path.exists() {
            return Ok(None);
        }
        read_frame(&self.open()?)
    }

    /// Startup recovery: restore the pre-image(s) into the table files,
    /// then clear the slot
    ///
    /// Returns the rolled-back entry, or None when the slot was empty (or
    /// held a torn frame, which is discarded; see module docs).
    pub fn recover(
        &self,
        accounts: &Table<AccountRecord>,
        users: &Table<UserRecord>,
        loans: &Table<LoanRecord>,
    ) -> io::Result<Option<JournalEntry>> {
        // Runs before traffic is accepted; no mutation holds a table lock
        // here, so taking journal then table locks cannot deadlock.
        let file = self.open()?;
        file.lock_exclusive()?;

        let entry = read_frame(&file)?;
        match &entry {
            None => {}
            Some(JournalEntry::Account { offset, before }) => {
                let guard = accounts.write()?;
                guard.write_at(*offset, before)?;
                guard.sync()?;
            }
            Some(JournalEntry::Transfer {
                from_offset,
                from_before,
                to_offset,
                to_before,
            }) => {
                let guard = accounts.write()?;
                guard.write_at(*from_offset, from_before)?;
                guard.write_at(*to_offset, to_before)?;
                guard.sync()?;
            }
            Some(JournalEntry::User { offset, before }) => {
                let guard = users.write()?;
                guard.write_at(*offset, before)?;
                guard.sync()?;
            }
            Some(JournalEntry::Loan { offset, before }) => {
                let guard = loans.write()?;
                guard.write_at(*offset, before)?;
                guard.sync()?;
            }
        }

        file.set_len(0)?;
        file.sync_all()?;
        Ok(entry)
    }
}

/// Holds the journal lock between `begin` and `commit`
///
/// Dropping the guard without committing leaves the pre-image on disk
/// for the next recovery pass, exactly what a failed destructive write
/// wants.
pub struct JournalGuard {
    file: File,
}

impl JournalGuard {
    /// Mark the mutation durably committed: clear the slot and fsync
    pub fn commit(self) -> io::Result<()> {
        self.file.set_len(0)?;
        self.file.sync_all()?;
        Ok(())
    }
}

impl Drop for JournalGuard {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

fn read_frame(file: &File) -> io::Result<Option<JournalEntry>> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(None);
    }
    let mut buf = vec![0u8; len as usize];
    file.read_exact_at(&mut buf, 0)?;

    let Ok(text) = std::str::from_utf8(&buf) else {
        return Ok(None);
    };
    let Some(line) = text.lines().next() else {
        return Ok(None);
    };
    match serde_json::from_str::<JournalFrame>(line) {
        Ok(frame) if frame.verify() => Ok(Some(frame.entry)),
        // Torn write or bit rot: the pre-image never fully persisted
        _ => Ok(None),
    }
}

#[cfg(test)]
#[path = "journal_tests.rs"]
mod tests;
