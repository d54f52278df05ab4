// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire protocol: command parsing, role capabilities, response rendering
//!
//! Client verbs form a closed enumeration dispatched through one handler
//! with a per-role capability check. Verbs are case-insensitive; response
//! lines follow the original wire format exactly.

use teller_core::{Entity, Precondition, Role, StoreError};

/// One client verb with its parsed arguments
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    ViewBalance,
    Deposit {
        amount: i64,
    },
    Withdraw {
        amount: i64,
    },
    Transfer {
        to_account: i32,
        amount: i64,
    },
    ApplyLoan {
        amount: i64,
    },
    ChangePassword {
        new_password: String,
    },
    History,
    Feedback {
        text: String,
    },
    AddCustomer {
        username: String,
        password: String,
        initial_balance: i64,
    },
    ViewTxns {
        account_number: i32,
    },
    ApproveLoan {
        loan_id: i32,
    },
    RejectLoan {
        loan_id: i32,
    },
    Activate {
        account_number: i32,
    },
    Deactivate {
        account_number: i32,
    },
    ReviewFeedback,
    AssignLoan {
        loan_id: i32,
        employee_user_id: i32,
    },
    AddEmployee {
        username: String,
        password: String,
    },
    SetRole {
        username: String,
        role: Role,
    },
    Logout,
}

/// Why a line failed to parse into a command
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// Verb not in the command set
    UnknownCommand,
    /// Verb recognized but arguments malformed; carries the `ERR` text
    Usage(&'static str),
}

impl Command {
    /// Parse one client line; the verb is matched case-insensitively
    pub fn parse(line: &str) -> Result<Command, ParseError> {
        let mut tokens = line.split_whitespace();
        let verb = tokens.next().ok_or(ParseError::UnknownCommand)?;

        match verb.to_ascii_uppercase().as_str() {
            "VIEW_BALANCE" => Ok(Command::ViewBalance),
            "DEPOSIT" => Ok(Command::Deposit {
                amount: parse_amount(tokens.next()).ok_or(ParseError::Usage("Invalid amount"))?,
            }),
            "WITHDRAW" => Ok(Command::Withdraw {
                amount: parse_amount(tokens.next()).ok_or(ParseError::Usage("Invalid amount"))?,
            }),
            "TRANSFER" => {
                let usage = ParseError::Usage("Usage: TRANSFER <to_acct_no> <amount>");
                let to_account = parse_i32(tokens.next()).ok_or(usage.clone())?;
                let amount = parse_amount(tokens.next()).ok_or(usage)?;
                Ok(Command::Transfer { to_account, amount })
            }
            "APPLY_LOAN" => Ok(Command::ApplyLoan {
                amount: parse_amount(tokens.next()).ok_or(ParseError::Usage("Invalid amount"))?,
            }),
            "CHANGE_PASSWORD" => {
                let new_password = tokens
                    .next()
                    .ok_or(ParseError::Usage("Usage: CHANGE_PASSWORD <new_password>"))?;
                Ok(Command::ChangePassword {
                    new_password: new_password.to_string(),
                })
            }
            "HISTORY" => Ok(Command::History),
            "FEEDBACK" => {
                // Free text: everything after the verb, whitespace kept
                let text = line
                    .split_once(char::is_whitespace)
                    .map(|(_, rest)| rest.trim())
                    .unwrap_or("");
                if text.is_empty() {
                    return Err(ParseError::Usage("Provide feedback text"));
                }
                Ok(Command::Feedback {
                    text: text.to_string(),
                })
            }
            "ADD_CUSTOMER" => {
                let usage = ParseError::Usage(
                    "Usage: ADD_CUSTOMER <username> <password> <initial_balance>",
                );
                let username = tokens.next().ok_or(usage.clone())?.to_string();
                let password = tokens.next().ok_or(usage.clone())?.to_string();
                let initial_balance = parse_i64(tokens.next()).ok_or(usage.clone())?;
                if initial_balance < 0 {
                    return Err(usage);
                }
                Ok(Command::AddCustomer {
                    username,
                    password,
                    initial_balance,
                })
            }
            "VIEW_TXNS" => Ok(Command::ViewTxns {
                account_number: parse_i32(tokens.next())
                    .ok_or(ParseError::Usage("Usage: VIEW_TXNS <acct_no>"))?,
            }),
            "APPROVE_LOAN" => Ok(Command::ApproveLoan {
                loan_id: parse_i32(tokens.next())
                    .ok_or(ParseError::Usage("Usage: APPROVE_LOAN <loan_id>"))?,
            }),
            "REJECT_LOAN" => Ok(Command::RejectLoan {
                loan_id: parse_i32(tokens.next())
                    .ok_or(ParseError::Usage("Usage: REJECT_LOAN <loan_id>"))?,
            }),
            "ACTIVATE" => Ok(Command::Activate {
                account_number: parse_i32(tokens.next())
                    .ok_or(ParseError::Usage("Usage: ACTIVATE <acct_no>"))?,
            }),
            "DEACTIVATE" => Ok(Command::Deactivate {
                account_number: parse_i32(tokens.next())
                    .ok_or(ParseError::Usage("Usage: DEACTIVATE <acct_no>"))?,
            }),
            "REVIEW_FEEDBACK" => Ok(Command::ReviewFeedback),
            "ASSIGN_LOAN" => {
                let usage = ParseError::Usage("Usage: ASSIGN_LOAN <loan_id> <employee_user_id>");
                let loan_id = parse_i32(tokens.next()).ok_or(usage.clone())?;
                let employee_user_id = parse_i32(tokens.next()).ok_or(usage)?;
                Ok(Command::AssignLoan {
                    loan_id,
                    employee_user_id,
                })
            }
            "ADD_EMPLOYEE" => {
                let usage = ParseError::Usage("Usage: ADD_EMPLOYEE <username> <password>");
                let username = tokens.next().ok_or(usage.clone())?.to_string();
                let password = tokens.next().ok_or(usage)?.to_string();
                Ok(Command::AddEmployee { username, password })
            }
            "SET_ROLE" => {
                let usage = ParseError::Usage("Usage: SET_ROLE <username> <role_int>");
                let username = tokens.next().ok_or(usage.clone())?.to_string();
                let role = parse_i32(tokens.next())
                    .and_then(Role::from_i32)
                    .ok_or(usage)?;
                Ok(Command::SetRole { username, role })
            }
            "LOGOUT" => Ok(Command::Logout),
            _ => Err(ParseError::UnknownCommand),
        }
    }

    /// Capability check: which roles may issue this command
    pub fn allowed_for(&self, role: Role) -> bool {
        use Command::*;
        match self {
            ViewBalance | Deposit { .. } | Withdraw { .. } | Transfer { .. }
            | ApplyLoan { .. } | History | Feedback { .. } => role == Role::Customer,
            AddCustomer { .. } | ViewTxns { .. } | ApproveLoan { .. } | RejectLoan { .. } => {
                role == Role::Employee
            }
            Activate { .. } | Deactivate { .. } | ReviewFeedback | AssignLoan { .. } => {
                role == Role::Manager
            }
            AddEmployee { .. } | SetRole { .. } => role == Role::Admin,
            ChangePassword { .. } | Logout => true,
        }
    }
}

fn parse_i32(token: Option<&str>) -> Option<i32> {
    token?.parse().ok()
}

fn parse_i64(token: Option<&str>) -> Option<i64> {
    token?.parse().ok()
}

/// Amounts must parse and be positive
fn parse_amount(token: Option<&str>) -> Option<i64> {
    parse_i64(token).filter(|amount| *amount > 0)
}

/// The menu block sent after login, one line per item
pub fn menu_lines(role: Role) -> Vec<&'static str> {
    match role {
        Role::Customer => vec![
            "MENU Customer Menu",
            "1) VIEW_BALANCE",
            "2) DEPOSIT <amount>",
            "3) WITHDRAW <amount>",
            "4) TRANSFER <to_acct_no> <amount>",
            "5) APPLY_LOAN <amount>",
            "6) CHANGE_PASSWORD <new_password>",
            "7) HISTORY",
            "8) FEEDBACK <text>",
            "9) LOGOUT",
        ],
        Role::Employee => vec![
            "MENU Employee Menu",
            "1) ADD_CUSTOMER <username> <password> <initial_balance>",
            "2) VIEW_TXNS <acct_no>",
            "3) APPROVE_LOAN <loan_id> | REJECT_LOAN <loan_id>",
            "4) CHANGE_PASSWORD <new_password>",
            "5) LOGOUT",
        ],
        Role::Manager => vec![
            "MENU Manager Menu",
            "1) ACTIVATE <acct_no>",
            "2) DEACTIVATE <acct_no>",
            "3) REVIEW_FEEDBACK",
            "4) ASSIGN_LOAN <loan_id> <employee_user_id>",
            "5) CHANGE_PASSWORD <new_password>",
            "6) LOGOUT",
        ],
        Role::Admin => vec![
            "MENU Admin Menu",
            "1) ADD_EMPLOYEE <username> <password>",
            "2) SET_ROLE <username> <role_int>",
            "3) CHANGE_PASSWORD <new_password>",
            "4) LOGOUT",
        ],
    }
}

/// Render a store failure as the wire protocol reports it for this command
pub fn failure_line(command: &Command, err: &StoreError) -> String {
    use Command::*;
    let text = match (command, err) {
        (
            ApproveLoan { .. } | RejectLoan { .. },
            StoreError::PreconditionFailed(Precondition::NotAssignedEmployee),
        ) => "Not assigned to you",
        (ApproveLoan { .. } | RejectLoan { .. }, StoreError::NotFound(Entity::Loan)) => {
            "Loan not found"
        }
        (
            ApproveLoan { .. } | RejectLoan { .. },
            StoreError::PreconditionFailed(Precondition::LoanNotPending),
        ) => "Invalid state",
        (
            AssignLoan { .. },
            StoreError::PreconditionFailed(Precondition::LoanAlreadyAssigned),
        ) => "Loan already assigned",
        (AssignLoan { .. }, StoreError::NotFound(Entity::Loan)) => "Loan not found",
        (
            AssignLoan { .. },
            StoreError::NotFound(Entity::User)
            | StoreError::PreconditionFailed(Precondition::EmployeeInvalid),
        ) => "Employee invalid",
        (Activate { .. } | Deactivate { .. }, StoreError::NotFound(Entity::Account)) => {
            "Account not found"
        }
        (ViewBalance, _) => "Could not read balance",
        (Deposit { .. }, _) => "Deposit failed",
        (Withdraw { .. }, _) => "Withdraw failed",
        (Transfer { .. }, _) => "Transfer failed",
        (ApplyLoan { .. }, _) => "Loan application failed",
        (ChangePassword { .. }, _) => "Change password failed",
        (History, _) => "History read failed",
        (ViewTxns { .. }, _) => "History failed",
        (Feedback { .. }, _) => "Feedback failed",
        (AddCustomer { .. }, _) => "Add customer failed",
        (ApproveLoan { .. }, _) => "Approve failed",
        (RejectLoan { .. }, _) => "Reject failed",
        (Activate { .. }, _) => "Activate failed",
        (Deactivate { .. }, _) => "Deactivate failed",
        (ReviewFeedback, _) => "Feedback read failed",
        (AssignLoan { .. }, _) => "Assign loan failed",
        (AddEmployee { .. }, _) => "Add employee failed",
        (SetRole { .. }, _) => "Set role failed",
        (Logout, _) => "Logout failed",
    };
    format!("ERR {}", text)
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
