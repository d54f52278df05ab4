// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed-size-record table files with whole-file lock guards
//!
//! A `Table<R>` wraps a path. Every access opens the file fresh and takes
//! the advisory lock through a guard; dropping the guard releases the lock
//! on every exit path. Lookup is a linear scan from the start of the file:
//! table sizes are small and correctness, not throughput, is the goal.

use std::fs::{File, OpenOptions};
use std::io;
use std::marker::PhantomData;
use std::ops::Deref;
use std::os::unix::fs::FileExt as _;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use teller_core::Record;

/// Ids observed outside [0, ID_SANITY_MAX] are treated as corrupt and
/// numbering restarts at 1. A defensive heuristic, not a table size limit.
const ID_SANITY_MAX: i32 = 10_000;

/// A flat file of fixed-size records, addressed by `index * R::SIZE`
#[derive(Clone, Debug)]
pub struct Table<R> {
    path: PathBuf,
    _record: PhantomData<R>,
}

impl<R: Record> Table<R> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the table file if it does not exist yet
    pub fn ensure_exists(&self) -> io::Result<()> {
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&self.path)?;
        Ok(())
    }

    fn open(&self) -> io::Result<File> {
        OpenOptions::new().read(true).write(true).open(&self.path)
    }

    /// Open fresh and block until the shared whole-file lock is granted
    pub fn read(&self) -> io::Result<TableReadGuard<R>> {
        let file = self.open()?;
        file.lock_shared()?;
        Ok(TableReadGuard {
            file,
            _record: PhantomData,
        })
    }

    /// Open fresh and block until the exclusive whole-file lock is granted
    ///
    /// Every mutation takes the exclusive lock for its whole duration,
    /// including the read-before-write. Read-modify-write under a shared
    /// lock would lose updates.
    pub fn write(&self) -> io::Result<TableWriteGuard<R>> {
        let file = self.open()?;
        file.lock_exclusive()?;
        Ok(TableWriteGuard {
            inner: TableReadGuard {
                file,
                _record: PhantomData,
            },
        })
    }
}

/// Shared-lock view of a table; read operations only
pub struct TableReadGuard<R> {
    file: File,
    _record: PhantomData<R>,
}

impl<R: Record> TableReadGuard<R> {
    fn record_at(&self, offset: u64) -> io::Result<Option<R>> {
        let mut buf = vec![0u8; R::SIZE];
        match self.file.read_exact_at(&mut buf, offset) {
            Ok(()) => R::decode(&buf).map(Some),
            // A short read at the tail is a torn append; scanning stops there
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Point read; the offset must hold a complete record
    pub fn read_at(&self, offset: u64) -> io::Result<R> {
        self.record_at(offset)?.ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "record offset past end of table",
            )
        })
    }

    /// Linear scan from the start of the file; first match wins
    pub fn scan<P>(&self, mut predicate: P) -> io::Result<Option<(R, u64)>>
    where
        P: FnMut(&R) -> bool,
    {
        let mut offset = 0u64;
        while let Some(record) = self.record_at(offset)? {
            if predicate(&record) {
                return Ok(Some((record, offset)));
            }
            offset += R::SIZE as u64;
        }
        Ok(None)
    }

    /// All complete records with their offsets
    pub fn records(&self) -> io::Result<Vec<(R, u64)>> {
        let mut out = Vec::new();
        let mut offset = 0u64;
        while let Some(record) = self.record_at(offset)? {
            out.push((record, offset));
            offset += R::SIZE as u64;
        }
        Ok(out)
    }

    /// Number of complete records on disk
    pub fn len(&self) -> io::Result<u64> {
        Ok(self.file.metadata()?.len() / R::SIZE as u64)
    }

    pub fn is_empty(&self) -> io::Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Next identifier: last record's id + 1, defaulting to 1 on an empty
    /// table or when the stored id fails the sanity bound
    pub fn next_id(&self) -> io::Result<i32> {
        let count = self.len()?;
        if count == 0 {
            return Ok(1);
        }
        let last = self.read_at((count - 1) * R::SIZE as u64)?;
        let id = last.id();
        if !(0..=ID_SANITY_MAX).contains(&id) {
            return Ok(1);
        }
        Ok(id + 1)
    }
}

impl<R> Drop for TableReadGuard<R> {
    fn drop(&mut self) {
        // Unlock explicitly; closing the handle would release it anyway
        let _ = FileExt::unlock(&self.file);
    }
}

/// Exclusive-lock view of a table; adds mutation on top of all read ops
pub struct TableWriteGuard<R> {
    inner: TableReadGuard<R>,
}

impl<R: Record> TableWriteGuard<R> {
    /// In-place rewrite of one record slot
    pub fn write_at(&self, offset: u64, record: &R) -> io::Result<()> {
        let mut buf = vec![0u8; R::SIZE];
        record.encode(&mut buf);
        self.inner.file.write_all_at(&buf, offset)
    }

    /// Append at end-of-file, clamped to a record boundary so a torn tail
    /// from an interrupted append gets overwritten rather than extended
    pub fn append(&self, record: &R) -> io::Result<u64> {
        let len = self.inner.file.metadata()?.len();
        let offset = len - len % R::SIZE as u64;
        self.write_at(offset, record)?;
        Ok(offset)
    }

    /// Flush to disk; called before the lock is released on every mutation
    pub fn sync(&self) -> io::Result<()> {
        self.inner.file.sync_all()
    }
}

impl<R> Deref for TableWriteGuard<R> {
    type Target = TableReadGuard<R>;

    fn deref(&self) -> &TableReadGuard<R> {
        &self.inner
    }
}

#[cfg(test)]
#[path = "table_tests.rs"]
mod tests;
