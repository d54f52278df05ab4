// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The store facade: every ledger operation as a locked protocol
//!
//! Each public method performs one client command worth of work:
//! acquire the table lock, locate the record(s), validate preconditions,
//! journal the pre-image, mutate, fsync, commit the journal, append the
//! audit line, release the lock. Callers get a value or a typed
//! `StoreError`; the connection layer turns those into protocol lines.

use std::path::Path;

use teller_core::{
    AccountRecord, Clock, Entity, LoanRecord, LoanStatus, Precondition, Record, Role, StoreError,
    SystemClock, UserRecord,
};
use tracing::info;

use crate::feedback::{FeedbackIter, FeedbackLog};
use crate::journal::{Journal, JournalEntry};
use crate::migrate::{migrate_legacy_account_numbers, ACCOUNT_NUMBER_FLOOR};
use crate::paths::StorePaths;
use crate::table::Table;
use crate::txlog::{HistoryIter, TxnKind, TxnLog};

/// Username and password of the record seeded into an empty store
const SEED_ADMIN: &str = "admin";

/// Handle to the on-disk store
///
/// Cheap to clone: it carries paths and a clock, never open files. Every
/// operation opens its table fresh and holds the lock only for its own
/// duration, so clones in different threads coordinate purely through the
/// file locks.
#[derive(Clone)]
pub struct Store<C: Clock = SystemClock> {
    users: Table<UserRecord>,
    accounts: Table<AccountRecord>,
    loans: Table<LoanRecord>,
    journal: Journal,
    txlog: TxnLog,
    feedback: FeedbackLog,
    clock: C,
}

impl Store<SystemClock> {
    pub fn open(dir: &Path) -> Self {
        Self::with_clock(dir, SystemClock)
    }
}

impl<C: Clock> Store<C> {
    pub fn with_clock(dir: &Path, clock: C) -> Self {
        let paths = StorePaths::in_dir(dir);
        Self {
            users: Table::new(paths.users),
            accounts: Table::new(paths.accounts),
            loans: Table::new(paths.loans),
            journal: Journal::new(paths.journal),
            txlog: TxnLog::new(paths.txn_log),
            feedback: FeedbackLog::new(paths.feedback_log),
            clock,
        }
    }

    /// Bring the store to a serviceable state; idempotent
    ///
    /// Creates missing files, rolls back any in-flight mutation left in
    /// the journal, renumbers legacy accounts, and seeds the built-in
    /// admin into an empty users table. Must complete before any traffic
    /// is accepted.
    pub fn init(&self) -> Result<(), StoreError> {
        self.users.ensure_exists()?;
        self.accounts.ensure_exists()?;
        self.loans.ensure_exists()?;
        self.txlog.ensure_exists()?;
        self.feedback.ensure_exists()?;
        self.journal.ensure_exists()?;

        if let Some(entry) = self
            .journal
            .recover(&self.accounts, &self.users, &self.loans)?
        {
            info!(kind = entry.kind_name(), "rolled back in-flight mutation");
        }

        let remaps = migrate_legacy_account_numbers(&self.accounts, &self.txlog)?;
        if !remaps.is_empty() {
            info!(count = remaps.len(), "renumbered legacy accounts");
        }

        let guard = self.users.write()?;
        if guard.is_empty()? {
            let admin = UserRecord {
                id: 1,
                role: Role::Admin,
                active: true,
                session_active: false,
                username: SEED_ADMIN.to_string(),
                password: SEED_ADMIN.to_string(),
            };
            guard.append(&admin)?;
            guard.sync()?;
            info!("seeded built-in admin");
        }
        Ok(())
    }

    // ---- sessions ----

    /// Authenticate and open the user's single allowed session
    pub fn login(&self, username: &str, password: &str) -> Result<UserRecord, StoreError> {
        let guard = self.users.write()?;
        let (mut user, offset) = guard
            .scan(|u| u.username == username)?
            .ok_or(StoreError::NotFound(Entity::User))?;

        if !user.active {
            return Err(StoreError::PreconditionFailed(
                Precondition::AccountInactive,
            ));
        }
        if user.password != password {
            return Err(StoreError::PreconditionFailed(
                Precondition::CredentialMismatch,
            ));
        }
        if user.session_active {
            return Err(StoreError::PreconditionFailed(
                Precondition::SessionAlreadyOpen,
            ));
        }

        let journal = self.journal.begin(JournalEntry::User {
            offset,
            before: user.clone(),
        })?;
        user.session_active = true;
        guard.write_at(offset, &user)?;
        guard.sync()?;
        journal.commit()?;
        Ok(user)
    }

    /// Close the user's session; a no-op flag clear if none is open
    pub fn logout(&self, user_id: i32) -> Result<(), StoreError> {
        let guard = self.users.write()?;
        let (mut user, offset) = guard
            .scan(|u| u.id == user_id)?
            .ok_or(StoreError::NotFound(Entity::User))?;

        let journal = self.journal.begin(JournalEntry::User {
            offset,
            before: user.clone(),
        })?;
        user.session_active = false;
        guard.write_at(offset, &user)?;
        guard.sync()?;
        journal.commit()?;
        Ok(())
    }

    // ---- reads ----

    pub fn balance(&self, user_id: i32) -> Result<i64, StoreError> {
        let guard = self.accounts.read()?;
        let (account, _) = guard
            .scan(|a| a.user_id == user_id)?
            .ok_or(StoreError::NotFound(Entity::Account))?;
        Ok(account.balance)
    }

    pub fn account_number(&self, user_id: i32) -> Result<i32, StoreError> {
        let guard = self.accounts.read()?;
        let (account, _) = guard
            .scan(|a| a.user_id == user_id)?
            .ok_or(StoreError::NotFound(Entity::Account))?;
        Ok(account.account_number)
    }

    pub fn user_id_by_account(&self, account_number: i32) -> Result<i32, StoreError> {
        let guard = self.accounts.read()?;
        let (account, _) = guard
            .scan(|a| a.account_number == account_number)?
            .ok_or(StoreError::NotFound(Entity::Account))?;
        Ok(account.user_id)
    }

    // ---- ledger mutations ----

    /// Credit the user's account; returns the new balance
    pub fn deposit(&self, user_id: i32, amount: i64) -> Result<i64, StoreError> {
        if amount <= 0 {
            return Err(StoreError::InvalidArgument("amount must be positive"));
        }
        let guard = self.accounts.write()?;
        let (mut account, offset) = guard
            .scan(|a| a.user_id == user_id)?
            .ok_or(StoreError::NotFound(Entity::Account))?;

        let journal = self.journal.begin(JournalEntry::Account {
            offset,
            before: account.clone(),
        })?;
        account.balance += amount;
        guard.write_at(offset, &account)?;
        guard.sync()?;
        journal.commit()?;

        self.txlog.append(
            self.clock.unix_now(),
            account.account_number,
            TxnKind::Deposit,
            amount,
            account.balance,
            None,
        )?;
        Ok(account.balance)
    }

    /// Debit the user's account; never drives the balance negative
    pub fn withdraw(&self, user_id: i32, amount: i64) -> Result<i64, StoreError> {
        if amount <= 0 {
            return Err(StoreError::InvalidArgument("amount must be positive"));
        }
        let guard = self.accounts.write()?;
        let (mut account, offset) = guard
            .scan(|a| a.user_id == user_id)?
            .ok_or(StoreError::NotFound(Entity::Account))?;
        if account.balance < amount {
            return Err(StoreError::PreconditionFailed(
                Precondition::InsufficientFunds,
            ));
        }

        let journal = self.journal.begin(JournalEntry::Account {
            offset,
            before: account.clone(),
        })?;
        account.balance -= amount;
        guard.write_at(offset, &account)?;
        guard.sync()?;
        journal.commit()?;

        self.txlog.append(
            self.clock.unix_now(),
            account.account_number,
            TxnKind::Withdraw,
            amount,
            account.balance,
            None,
        )?;
        Ok(account.balance)
    }

    /// Move funds between two accounts under one exclusive lock
    ///
    /// Both endpoints are read, journaled, and written under the same
    /// accounts lock, so no reader ever observes only one side updated.
    pub fn transfer(
        &self,
        from_user_id: i32,
        to_account_number: i32,
        amount: i64,
    ) -> Result<(), StoreError> {
        if amount <= 0 {
            return Err(StoreError::InvalidArgument("amount must be positive"));
        }
        let guard = self.accounts.write()?;
        let (mut from, from_offset) = guard
            .scan(|a| a.user_id == from_user_id)?
            .ok_or(StoreError::NotFound(Entity::Account))?;
        let (mut to, to_offset) = guard
            .scan(|a| a.account_number == to_account_number)?
            .ok_or(StoreError::NotFound(Entity::Account))?;
        if from.account_number == to.account_number {
            return Err(StoreError::InvalidArgument(
                "transfer to the same account",
            ));
        }
        if from.balance < amount {
            return Err(StoreError::PreconditionFailed(
                Precondition::InsufficientFunds,
            ));
        }

        let journal = self.journal.begin(JournalEntry::Transfer {
            from_offset,
            from_before: from.clone(),
            to_offset,
            to_before: to.clone(),
        })?;
        from.balance -= amount;
        to.balance += amount;
        guard.write_at(from_offset, &from)?;
        guard.write_at(to_offset, &to)?;
        guard.sync()?;
        journal.commit()?;

        let now = self.clock.unix_now();
        self.txlog.append(
            now,
            from.account_number,
            TxnKind::TransferOut,
            amount,
            from.balance,
            Some(&format!("to={}", to.account_number)),
        )?;
        self.txlog.append(
            now,
            to.account_number,
            TxnKind::TransferIn,
            amount,
            to.balance,
            Some(&format!("from={}", from.account_number)),
        )?;
        Ok(())
    }

    // ---- loans ----

    /// File a new loan application; returns the loan id
    ///
    /// A fresh record append destroys no old value, so there is no
    /// pre-image to journal; a torn tail is clamped by the next append.
    pub fn apply_loan(&self, customer_user_id: i32, amount: i64) -> Result<i32, StoreError> {
        if amount <= 0 {
            return Err(StoreError::InvalidArgument("amount must be positive"));
        }
        let guard = self.loans.write()?;
        let loan = LoanRecord {
            id: guard.next_id()?,
            customer_user_id,
            assigned_employee_user_id: 0,
            amount,
            status: LoanStatus::Pending,
        };
        guard.append(&loan)?;
        guard.sync()?;
        Ok(loan.id)
    }

    /// Assign a pending loan to an active employee, exactly once
    pub fn assign_loan(&self, loan_id: i32, employee_user_id: i32) -> Result<(), StoreError> {
        // Validate the assignee first; the users guard is dropped before
        // the loans lock is taken so no operation holds two table locks.
        {
            let users = self.users.read()?;
            let (employee, _) = users
                .scan(|u| u.id == employee_user_id)?
                .ok_or(StoreError::NotFound(Entity::User))?;
            if employee.role != Role::Employee || !employee.active {
                return Err(StoreError::PreconditionFailed(
                    Precondition::EmployeeInvalid,
                ));
            }
        }

        let guard = self.loans.write()?;
        let (mut loan, offset) = guard
            .scan(|l| l.id == loan_id)?
            .ok_or(StoreError::NotFound(Entity::Loan))?;
        if loan.assigned_employee_user_id != 0 {
            return Err(StoreError::PreconditionFailed(
                Precondition::LoanAlreadyAssigned,
            ));
        }

        let journal = self.journal.begin(JournalEntry::Loan {
            offset,
            before: loan.clone(),
        })?;
        loan.assigned_employee_user_id = employee_user_id;
        guard.write_at(offset, &loan)?;
        guard.sync()?;
        journal.commit()?;
        Ok(())
    }

    /// Decide a pending loan; only the assigned employee may decide
    ///
    /// Approval credits the applicant's account in a second, internally
    /// sequential phase under the accounts lock, with its own journal
    /// entry and a LOAN_CREDIT audit line.
    pub fn decide_loan(
        &self,
        loan_id: i32,
        employee_user_id: i32,
        verdict: LoanStatus,
    ) -> Result<(), StoreError> {
        if !verdict.is_terminal() {
            return Err(StoreError::InvalidArgument(
                "verdict must be approved or rejected",
            ));
        }

        let decided = {
            let guard = self.loans.write()?;
            let (mut loan, offset) = guard
                .scan(|l| l.id == loan_id)?
                .ok_or(StoreError::NotFound(Entity::Loan))?;
            if loan.assigned_employee_user_id != employee_user_id {
                return Err(StoreError::PreconditionFailed(
                    Precondition::NotAssignedEmployee,
                ));
            }
            if loan.status != LoanStatus::Pending {
                return Err(StoreError::PreconditionFailed(
                    Precondition::LoanNotPending,
                ));
            }

            let journal = self.journal.begin(JournalEntry::Loan {
                offset,
                before: loan.clone(),
            })?;
            loan.status = verdict;
            guard.write_at(offset, &loan)?;
            guard.sync()?;
            journal.commit()?;
            loan
        };

        if verdict == LoanStatus::Approved {
            let guard = self.accounts.write()?;
            let (mut account, offset) = guard
                .scan(|a| a.user_id == decided.customer_user_id)?
                .ok_or(StoreError::NotFound(Entity::Account))?;

            let journal = self.journal.begin(JournalEntry::Account {
                offset,
                before: account.clone(),
            })?;
            account.balance += decided.amount;
            guard.write_at(offset, &account)?;
            guard.sync()?;
            journal.commit()?;

            self.txlog.append(
                self.clock.unix_now(),
                account.account_number,
                TxnKind::LoanCredit,
                decided.amount,
                account.balance,
                None,
            )?;
        }
        Ok(())
    }

    // ---- user administration ----

    pub fn change_password(&self, user_id: i32, new_password: &str) -> Result<(), StoreError> {
        let guard = self.users.write()?;
        let (mut user, offset) = guard
            .scan(|u| u.id == user_id)?
            .ok_or(StoreError::NotFound(Entity::User))?;

        let journal = self.journal.begin(JournalEntry::User {
            offset,
            before: user.clone(),
        })?;
        user.password = new_password.to_string();
        guard.write_at(offset, &user)?;
        guard.sync()?;
        journal.commit()?;
        Ok(())
    }

    /// Toggle a user's active flag; deactivation also closes any session
    pub fn set_active(&self, user_id: i32, active: bool) -> Result<(), StoreError> {
        let guard = self.users.write()?;
        let (mut user, offset) = guard
            .scan(|u| u.id == user_id)?
            .ok_or(StoreError::NotFound(Entity::User))?;

        let journal = self.journal.begin(JournalEntry::User {
            offset,
            before: user.clone(),
        })?;
        user.active = active;
        if !active {
            user.session_active = false;
        }
        guard.write_at(offset, &user)?;
        guard.sync()?;
        journal.commit()?;
        Ok(())
    }

    pub fn set_role(&self, username: &str, role: Role) -> Result<(), StoreError> {
        let guard = self.users.write()?;
        let (mut user, offset) = guard
            .scan(|u| u.username == username)?
            .ok_or(StoreError::NotFound(Entity::User))?;

        let journal = self.journal.begin(JournalEntry::User {
            offset,
            before: user.clone(),
        })?;
        user.role = role;
        guard.write_at(offset, &user)?;
        guard.sync()?;
        journal.commit()?;
        Ok(())
    }

    /// Provision a user; customers also get an account with a fresh
    /// account number and the given opening balance
    ///
    /// Returns the new user id and, for customers, the account number.
    /// The two appends run under separate, sequential locks.
    pub fn create_user_with_account(
        &self,
        username: &str,
        password: &str,
        role: Role,
        active: bool,
        initial_balance: i64,
    ) -> Result<(i32, Option<i32>), StoreError> {
        if username.is_empty() {
            return Err(StoreError::InvalidArgument("username must not be empty"));
        }
        if initial_balance < 0 {
            return Err(StoreError::InvalidArgument(
                "initial balance must not be negative",
            ));
        }

        let user_id = {
            let guard = self.users.write()?;
            if guard.scan(|u| u.username == username)?.is_some() {
                return Err(StoreError::AlreadyExists("username"));
            }
            let user = UserRecord {
                id: guard.next_id()?,
                role,
                active,
                session_active: false,
                username: username.to_string(),
                password: password.to_string(),
            };
            guard.append(&user)?;
            guard.sync()?;
            user.id
        };

        if role != Role::Customer {
            return Ok((user_id, None));
        }

        let guard = self.accounts.write()?;
        let account_number = next_account_number(&guard)?;
        let account = AccountRecord {
            id: guard.next_id()?,
            user_id,
            account_number,
            balance: initial_balance,
        };
        guard.append(&account)?;
        guard.sync()?;
        Ok((user_id, Some(account_number)))
    }

    // ---- audit trails ----

    pub fn append_feedback(&self, user_id: i32, text: &str) -> Result<(), StoreError> {
        self.feedback
            .append(self.clock.unix_now(), user_id, text)?;
        Ok(())
    }

    /// History lines for the account owned by `user_id`
    pub fn history_by_user(&self, user_id: i32) -> Result<HistoryIter, StoreError> {
        let account_number = self.account_number(user_id)?;
        Ok(self.txlog.history(account_number)?)
    }

    /// History lines for an account number; unknown numbers yield an
    /// empty stream rather than an error
    pub fn history_by_account(&self, account_number: i32) -> Result<HistoryIter, StoreError> {
        Ok(self.txlog.history(account_number)?)
    }

    pub fn feedback_stream(&self) -> Result<FeedbackIter, StoreError> {
        Ok(self.feedback.stream()?)
    }
}

/// Max account number seen across a full scan, plus one, floored so new
/// accounts never land in the legacy range; an empty table starts at 1000
fn next_account_number(
    guard: &crate::table::TableWriteGuard<AccountRecord>,
) -> Result<i32, StoreError> {
    let mut max_number = 0;
    for (account, _) in guard.records()? {
        max_number = max_number.max(account.account_number);
    }
    Ok((max_number + 1).max(ACCOUNT_NUMBER_FLOOR))
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
