// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only feedback log: `<unix_ts>|uid=<user_id>|<free text>`

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Lines, Write};
use std::path::{Path, PathBuf};

/// The append-only feedback log
#[derive(Clone, Debug)]
pub struct FeedbackLog {
    path: PathBuf,
}

impl FeedbackLog {
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

    /// Append one feedback line and fsync before returning
    pub fn append(&self, timestamp: i64, user_id: i32, text: &str) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;
        let text = if text.is_empty() { "-" } else { text };
        writeln!(file, "{}|uid={}|{}", timestamp, user_id, text)?;
        file.sync_all()?;
        Ok(())
    }

    /// Lazy stream over all feedback lines, oldest first
    pub fn stream(&self) -> io::Result<FeedbackIter> {
        let lines = match File::open(&self.path) {
            Ok(file) => Some(BufReader::new(file).lines()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e),
        };
        Ok(FeedbackIter { lines })
    }
}

/// Iterator over raw feedback lines
pub struct FeedbackIter {
    lines: Option<Lines<BufReader<File>>>,
}

impl Iterator for FeedbackIter {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<io::Result<String>> {
        self.lines.as_mut()?.next()
    }
}

#[cfg(test)]
#[path = "feedback_tests.rs"]
mod tests;
