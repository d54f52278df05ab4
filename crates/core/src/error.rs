// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed error set shared by the store and its callers
//!
//! Every store operation returns one of these kinds to its immediate
//! caller; nothing is thrown as control flow across operations. The
//! connection layer alone turns them into protocol responses.

use thiserror::Error;

/// What a failed lookup was looking for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Entity {
    User,
    Account,
    Loan,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Entity::User => "user",
            Entity::Account => "account",
            Entity::Loan => "loan",
        };
        write!(f, "{}", name)
    }
}

/// Why an otherwise well-formed operation was refused
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Precondition {
    InsufficientFunds,
    CredentialMismatch,
    AccountInactive,
    SessionAlreadyOpen,
    LoanAlreadyAssigned,
    LoanNotPending,
    NotAssignedEmployee,
    EmployeeInvalid,
}

impl std::fmt::Display for Precondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            Precondition::InsufficientFunds => "insufficient funds",
            Precondition::CredentialMismatch => "credential mismatch",
            Precondition::AccountInactive => "account inactive",
            Precondition::SessionAlreadyOpen => "session already open",
            Precondition::LoanAlreadyAssigned => "loan already assigned",
            Precondition::LoanNotPending => "loan already decided",
            Precondition::NotAssignedEmployee => "loan not assigned to this employee",
            Precondition::EmployeeInvalid => "not an active employee",
        };
        write!(f, "{}", reason)
    }
}

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(Entity),

    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("precondition failed: {0}")]
    PreconditionFailed(Precondition),

    #[error("already exists: {0}")]
    AlreadyExists(&'static str),

    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),
}
