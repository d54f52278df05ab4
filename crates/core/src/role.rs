// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User roles and loan lifecycle status

use serde::{Deserialize, Serialize};

/// Account-holder role, stored as an i32 discriminant in the users table
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Customer,
    Employee,
    Manager,
    Admin,
}

impl Role {
    /// On-disk discriminant
    pub fn as_i32(self) -> i32 {
        match self {
            Role::Customer => 1,
            Role::Employee => 2,
            Role::Manager => 3,
            Role::Admin => 4,
        }
    }

    pub fn from_i32(raw: i32) -> Option<Role> {
        match raw {
            1 => Some(Role::Customer),
            2 => Some(Role::Employee),
            3 => Some(Role::Manager),
            4 => Some(Role::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Role::Customer => "customer",
            Role::Employee => "employee",
            Role::Manager => "manager",
            Role::Admin => "admin",
        };
        write!(f, "{}", name)
    }
}

/// Loan lifecycle status
///
/// Pending is the only state a decision can be made from; Approved and
/// Rejected are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanStatus {
    Pending,
    Approved,
    Rejected,
}

impl LoanStatus {
    /// On-disk discriminant
    pub fn as_i32(self) -> i32 {
        match self {
            LoanStatus::Pending => 0,
            LoanStatus::Approved => 1,
            LoanStatus::Rejected => 2,
        }
    }

    pub fn from_i32(raw: i32) -> Option<LoanStatus> {
        match raw {
            0 => Some(LoanStatus::Pending),
            1 => Some(LoanStatus::Approved),
            2 => Some(LoanStatus::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, LoanStatus::Pending)
    }
}

#[cfg(test)]
#[path = "role_tests.rs"]
mod tests;
