// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed-layout binary records for the three table files
//!
//! Table files are plain concatenations of fixed-size records; a record
//! lives at `offset = index * SIZE`. Integer fields are native-endian at
//! fixed offsets, text fields are NUL-padded to a fixed capacity with the
//! last byte always NUL. The codec, not a compiler ABI, defines the
//! layout.

use std::io;

use serde::{Deserialize, Serialize};

use crate::role::{LoanStatus, Role};

/// Username capacity in bytes, including the terminating NUL
pub const USERNAME_MAX: usize = 64;
/// Password capacity in bytes, including the terminating NUL
pub const PASSWORD_MAX: usize = 128;

/// A fixed-size record in a table file
pub trait Record: Sized {
    /// Encoded size in bytes; every record in a table file occupies
    /// exactly this many bytes.
    const SIZE: usize;

    /// Table-local identifier, used for monotonic id allocation
    fn id(&self) -> i32;

    /// Encode into `buf`, which must be exactly `SIZE` bytes
    fn encode(&self, buf: &mut [u8]);

    /// Decode from `buf`, which must be exactly `SIZE` bytes
    fn decode(buf: &[u8]) -> io::Result<Self>;
}

fn corrupt(what: &'static str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, what)
}

fn put_i32(buf: &mut [u8], at: usize, v: i32) {
    buf[at..at + 4].copy_from_slice(&v.to_ne_bytes());
}

fn put_i64(buf: &mut [u8], at: usize, v: i64) {
    buf[at..at + 8].copy_from_slice(&v.to_ne_bytes());
}

fn get_i32(buf: &[u8], at: usize) -> i32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&buf[at..at + 4]);
    i32::from_ne_bytes(raw)
}

fn get_i64(buf: &[u8], at: usize) -> i64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&buf[at..at + 8]);
    i64::from_ne_bytes(raw)
}

/// Truncates to `cap - 1` bytes so the final byte stays NUL
fn put_text(buf: &mut [u8], at: usize, cap: usize, text: &str) {
    let field = &mut buf[at..at + cap];
    field.fill(0);
    let bytes = text.as_bytes();
    let n = bytes.len().min(cap - 1);
    field[..n].copy_from_slice(&bytes[..n]);
}

fn get_text(buf: &[u8], at: usize, cap: usize) -> String {
    let field = &buf[at..at + cap];
    let end = field.iter().position(|&b| b == 0).unwrap_or(cap);
    String::from_utf8_lossy(&field[..end]).into_owned()
}

/// A row in the users table
///
/// `session_active` is true while a login session is open and enforces a
/// single concurrent session per user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i32,
    pub role: Role,
    pub active: bool,
    pub session_active: bool,
    pub username: String,
    pub password: String,
}

impl Record for UserRecord {
    // id i32 @0, role i32 @4, active i32 @8, session_active i32 @12,
    // username @16, password @80
    const SIZE: usize = 16 + USERNAME_MAX + PASSWORD_MAX;

    fn id(&self) -> i32 {
        self.id
    }

    fn encode(&self, buf: &mut [u8]) {
        put_i32(buf, 0, self.id);
        put_i32(buf, 4, self.role.as_i32());
        put_i32(buf, 8, i32::from(self.active));
        put_i32(buf, 12, i32::from(self.session_active));
        put_text(buf, 16, USERNAME_MAX, &self.username);
        put_text(buf, 16 + USERNAME_MAX, PASSWORD_MAX, &self.password);
    }

    fn decode(buf: &[u8]) -> io::Result<Self> {
        let role = Role::from_i32(get_i32(buf, 4))
            .ok_or_else(|| corrupt("users table: unknown role discriminant"))?;
        Ok(Self {
            id: get_i32(buf, 0),
            role,
            active: get_i32(buf, 8) != 0,
            session_active: get_i32(buf, 12) != 0,
            username: get_text(buf, 16, USERNAME_MAX),
            password: get_text(buf, 16 + USERNAME_MAX, PASSWORD_MAX),
        })
    }
}

/// A row in the accounts table; balance is in minor currency units
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub id: i32,
    pub user_id: i32,
    pub account_number: i32,
    pub balance: i64,
}

impl Record for AccountRecord {
    // id i32 @0, user_id i32 @4, account_number i32 @8, balance i64 @12
    const SIZE: usize = 20;

    fn id(&self) -> i32 {
        self.id
    }

    fn encode(&self, buf: &mut [u8]) {
        put_i32(buf, 0, self.id);
        put_i32(buf, 4, self.user_id);
        put_i32(buf, 8, self.account_number);
        put_i64(buf, 12, self.balance);
    }

    fn decode(buf: &[u8]) -> io::Result<Self> {
        Ok(Self {
            id: get_i32(buf, 0),
            user_id: get_i32(buf, 4),
            account_number: get_i32(buf, 8),
            balance: get_i64(buf, 12),
        })
    }
}

/// A row in the loans table
///
/// `assigned_employee_user_id` is 0 until assignment and is set exactly
/// once.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanRecord {
    pub id: i32,
    pub customer_user_id: i32,
    pub assigned_employee_user_id: i32,
    pub amount: i64,
    pub status: LoanStatus,
}

impl Record for LoanRecord {
    // id i32 @0, customer_user_id i32 @4, assigned_employee_user_id i32 @8,
    // amount i64 @12, status i32 @20
    const SIZE: usize = 24;

    fn id(&self) -> i32 {
        self.id
    }

    fn encode(&self, buf: &mut [u8]) {
        put_i32(buf, 0, self.id);
        put_i32(buf, 4, self.customer_user_id);
        put_i32(buf, 8, self.assigned_employee_user_id);
        put_i64(buf, 12, self.amount);
        put_i32(buf, 20, self.status.as_i32());
    }

    fn decode(buf: &[u8]) -> io::Result<Self> {
        let status = LoanStatus::from_i32(get_i32(buf, 20))
            .ok_or_else(|| corrupt("loans table: unknown status discriminant"))?;
        Ok(Self {
            id: get_i32(buf, 0),
            customer_user_id: get_i32(buf, 4),
            assigned_employee_user_id: get_i32(buf, 8),
            amount: get_i64(buf, 12),
            status,
        })
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
