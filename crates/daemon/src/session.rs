// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-connection session: LOGIN handshake, menu, command dispatch
//!
//! One session per connection. Store calls run on blocking worker threads
//! because every store operation may block on a file lock. A client
//! disconnecting mid-session is logged out; it never interrupts an
//! in-flight mutation, which always runs to completion on its worker.

use std::io;

use teller_core::{Clock, LoanStatus, Role, StoreError, UserRecord};
use teller_store::Store;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

use crate::protocol::{self, Command, ParseError};

/// Drive one client connection to completion
pub async fn run<S, C>(stream: S, store: Store<C>) -> io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
    C: Clock + 'static,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut lines = BufReader::new(reader).lines();

    send(&mut writer, "WELCOME Banking Management System").await?;
    send(&mut writer, "LOGIN <username> <password>").await?;

    // Authentication phase: nothing but LOGIN is accepted
    let user = loop {
        let Some(line) = lines.next_line().await? else {
            // Client left before logging in
            return Ok(());
        };
        let mut tokens = line.split_whitespace();
        let verb = tokens.next().unwrap_or("");
        if !verb.eq_ignore_ascii_case("LOGIN") {
            send(&mut writer, "ERR Please LOGIN first").await?;
            continue;
        }
        let (Some(username), Some(password)) = (tokens.next(), tokens.next()) else {
            send(&mut writer, "ERR Usage: LOGIN <username> <password>").await?;
            continue;
        };

        let attempt = {
            let store = store.clone();
            let username = username.to_string();
            let password = password.to_string();
            blocking(move || store.login(&username, &password)).await
        };
        match attempt {
            Ok(user) => {
                send(&mut writer, &format!("LOGIN_OK ROLE {}", user.role.as_i32())).await?;
                break user;
            }
            Err(e) => {
                // One wire line for every refusal; the reason stays server-side
                debug!(error = %e, "login refused");
                send(&mut writer, "ERR Login failed").await?;
            }
        }
    };

    for line in protocol::menu_lines(user.role) {
        send(&mut writer, line).await?;
    }

    // Command phase
    loop {
        send(&mut writer, "OK Awaiting command").await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(ParseError::UnknownCommand) => {
                send(&mut writer, "ERR Unknown command").await?;
                continue;
            }
            Err(ParseError::Usage(usage)) => {
                send(&mut writer, &format!("ERR {}", usage)).await?;
                continue;
            }
        };
        if !command.allowed_for(user.role) {
            // Out-of-role verbs read the same as unknown ones
            send(&mut writer, "ERR Unknown command").await?;
            continue;
        }
        if command == Command::Logout {
            send(&mut writer, "BYE").await?;
            break;
        }
        dispatch(&mut writer, &store, &user, command).await?;
    }

    // Close the session on the way out, after BYE or disconnect alike
    let user_id = user.id;
    let store = store.clone();
    if let Err(e) = blocking(move || store.logout(user_id)).await {
        warn!(user_id, error = %e, "logout on session end failed");
    }
    Ok(())
}

/// Run one command against the store and write its response line(s)
async fn dispatch<W, C>(
    writer: &mut W,
    store: &Store<C>,
    user: &UserRecord,
    command: Command,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
    C: Clock + 'static,
{
    let user_id = user.id;
    debug!(user_id, ?command, "dispatching");

    let outcome: Result<Vec<String>, StoreError> = match command.clone() {
        Command::ViewBalance => {
            let store = store.clone();
            blocking(move || {
                let account_number = store.account_number(user_id)?;
                let balance = store.balance(user_id)?;
                Ok(vec![format!("BALANCE acct={} {}", account_number, balance)])
            })
            .await
        }
        Command::Deposit { amount } => {
            let store = store.clone();
            blocking(move || {
                let account_number = store.account_number(user_id)?;
                let balance = store.deposit(user_id, amount)?;
                Ok(vec![format!(
                    "DEPOSITED acct={} {} NEW_BAL {}",
                    account_number, amount, balance
                )])
            })
            .await
        }
        Command::Withdraw { amount } => {
            let store = store.clone();
            blocking(move || {
                let account_number = store.account_number(user_id)?;
                let balance = store.withdraw(user_id, amount)?;
                Ok(vec![format!(
                    "WITHDREW acct={} {} NEW_BAL {}",
                    account_number, amount, balance
                )])
            })
            .await
        }
        Command::Transfer { to_account, amount } => {
            let store = store.clone();
            blocking(move || {
                store.transfer(user_id, to_account, amount)?;
                Ok(vec![format!("TRANSFER OK to acct={} {}", to_account, amount)])
            })
            .await
        }
        Command::ApplyLoan { amount } => {
            let store = store.clone();
            blocking(move || {
                let loan_id = store.apply_loan(user_id, amount)?;
                Ok(vec![format!("LOAN_APPLIED {} AMOUNT {}", loan_id, amount)])
            })
            .await
        }
        Command::ChangePassword { new_password } => {
            let store = store.clone();
            blocking(move || {
                store.change_password(user_id, &new_password)?;
                Ok(vec!["PASSWORD_CHANGED".to_string()])
            })
            .await
        }
        Command::History => {
            let store = store.clone();
            blocking(move || {
                let mut out = Vec::new();
                for line in store.history_by_user(user_id)? {
                    out.push(line?);
                }
                out.push("HISTORY_END".to_string());
                Ok(out)
            })
            .await
        }
        Command::Feedback { text } => {
            let store = store.clone();
            blocking(move || {
                store.append_feedback(user_id, &text)?;
                Ok(vec!["FEEDBACK_OK".to_string()])
            })
            .await
        }
        Command::AddCustomer {
            username,
            password,
            initial_balance,
        } => {
            let store = store.clone();
            blocking(move || {
                let (new_user_id, account_number) = store.create_user_with_account(
                    &username,
                    &password,
                    Role::Customer,
                    true,
                    initial_balance,
                )?;
                Ok(vec![format!(
                    "CUSTOMER_ADDED {} ID {} ACCT {}",
                    username,
                    new_user_id,
                    account_number.unwrap_or(-1)
                )])
            })
            .await
        }
        Command::ViewTxns { account_number } => {
            let store = store.clone();
            blocking(move || {
                let mut out = Vec::new();
                for line in store.history_by_account(account_number)? {
                    out.push(line?);
                }
                out.push("HISTORY_END".to_string());
                Ok(out)
            })
            .await
        }
        Command::ApproveLoan { loan_id } => {
            let store = store.clone();
            blocking(move || {
                store.decide_loan(loan_id, user_id, LoanStatus::Approved)?;
                Ok(vec![format!("LOAN_APPROVED {}", loan_id)])
            })
            .await
        }
        Command::RejectLoan { loan_id } => {
            let store = store.clone();
            blocking(move || {
                store.decide_loan(loan_id, user_id, LoanStatus::Rejected)?;
                Ok(vec![format!("LOAN_REJECTED {}", loan_id)])
            })
            .await
        }
        Command::Activate { account_number } => {
            let store = store.clone();
            blocking(move || {
                let target = store.user_id_by_account(account_number)?;
                store.set_active(target, true)?;
                Ok(vec![format!("ACTIVATED acct={} uid={}", account_number, target)])
            })
            .await
        }
        Command::Deactivate { account_number } => {
            let store = store.clone();
            blocking(move || {
                let target = store.user_id_by_account(account_number)?;
                store.set_active(target, false)?;
                Ok(vec![format!(
                    "DEACTIVATED acct={} uid={}",
                    account_number, target
                )])
            })
            .await
        }
        Command::ReviewFeedback => {
            let store = store.clone();
            blocking(move || {
                let mut out = Vec::new();
                for line in store.feedback_stream()? {
                    out.push(line?);
                }
                out.push("FEEDBACK_END".to_string());
                Ok(out)
            })
            .await
        }
        Command::AssignLoan {
            loan_id,
            employee_user_id,
        } => {
            let store = store.clone();
            blocking(move || {
                store.assign_loan(loan_id, employee_user_id)?;
                Ok(vec![format!(
                    "LOAN_ASSIGNED {} emp_id={}",
                    loan_id, employee_user_id
                )])
            })
            .await
        }
        Command::AddEmployee { username, password } => {
            let store = store.clone();
            blocking(move || {
                let (new_user_id, _) = store.create_user_with_account(
                    &username,
                    &password,
                    Role::Employee,
                    true,
                    0,
                )?;
                Ok(vec![format!("EMPLOYEE_ADDED {} ID {}", username, new_user_id)])
            })
            .await
        }
        Command::SetRole { username, role } => {
            let store = store.clone();
            blocking(move || {
                store.set_role(&username, role)?;
                Ok(vec![format!("ROLE_SET {} {}", username, role.as_i32())])
            })
            .await
        }
        // Handled by the session loop before dispatch
        Command::Logout => Ok(Vec::new()),
    };

    match outcome {
        Ok(out) => {
            for line in out {
                send(writer, &line).await?;
            }
        }
        Err(e) => {
            debug!(user_id, error = %e, "command refused");
            send(writer, &protocol::failure_line(&command, &e)).await?;
        }
    }
    Ok(())
}

/// Run a store call on a blocking worker thread
async fn blocking<T, F>(f: F) -> Result<T, StoreError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result,
        Err(e) => Err(StoreError::Io(io::Error::other(e))),
    }
}

async fn send<W: AsyncWrite + Unpin>(writer: &mut W, line: &str) -> io::Result<()> {
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
