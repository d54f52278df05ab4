// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Full ledger lifecycle specs
//!
//! Walk a fresh store through onboarding, deposits, withdrawals and a
//! loan from application to approval, checking every wire line.

use crate::prelude::*;

/// Seeded admin (id 1) provisions an employee (id 2); the employee
/// onboards alice (id 3, account 1000) with an opening balance of 100.
fn onboard_alice(daemon: &Daemon) {
    let out = run_as(daemon, "admin", "admin", "ADD_EMPLOYEE emp pw");
    assert_eq!(out, vec!["EMPLOYEE_ADDED emp ID 2"]);

    let out = run_as(daemon, "emp", "pw", "ADD_CUSTOMER alice pw1 100");
    assert_eq!(out, vec!["CUSTOMER_ADDED alice ID 3 ACCT 1000"]);
}

#[test]
fn deposits_and_withdrawals_move_the_balance() {
    let daemon = Daemon::start();
    onboard_alice(&daemon);

    let mut alice = daemon.client();
    alice.login("alice", "pw1");

    assert_eq!(alice.cmd("VIEW_BALANCE"), vec!["BALANCE acct=1000 100"]);
    assert_eq!(
        alice.cmd("DEPOSIT 50"),
        vec!["DEPOSITED acct=1000 50 NEW_BAL 150"]
    );
    assert_eq!(
        alice.cmd("WITHDRAW 30"),
        vec!["WITHDREW acct=1000 30 NEW_BAL 120"]
    );
    assert_eq!(alice.cmd("VIEW_BALANCE"), vec!["BALANCE acct=1000 120"]);
    alice.logout();
}

#[test]
fn overdrafts_fail_and_leave_the_balance_alone() {
    let daemon = Daemon::start();
    onboard_alice(&daemon);

    let mut alice = daemon.client();
    alice.login("alice", "pw1");
    assert_eq!(alice.cmd("WITHDRAW 101"), vec!["ERR Withdraw failed"]);
    assert_eq!(alice.cmd("VIEW_BALANCE"), vec!["BALANCE acct=1000 100"]);
    alice.logout();
}

#[test]
fn malformed_amounts_never_reach_the_store() {
    let daemon = Daemon::start();
    onboard_alice(&daemon);

    let mut alice = daemon.client();
    alice.login("alice", "pw1");
    assert_eq!(alice.cmd("DEPOSIT -5"), vec!["ERR Invalid amount"]);
    assert_eq!(alice.cmd("DEPOSIT abc"), vec!["ERR Invalid amount"]);
    assert_eq!(alice.cmd("WITHDRAW 0"), vec!["ERR Invalid amount"]);
    assert_eq!(alice.cmd("VIEW_BALANCE"), vec!["BALANCE acct=1000 100"]);
    alice.logout();
}

#[test]
fn a_loan_runs_from_application_to_credited_approval() {
    let daemon = Daemon::start();
    onboard_alice(&daemon);

    // Promote a second provisioned user to manager for the assignment
    let out = run_as(&daemon, "admin", "admin", "ADD_EMPLOYEE mgr pw");
    assert_eq!(out, vec!["EMPLOYEE_ADDED mgr ID 4"]);
    let out = run_as(&daemon, "admin", "admin", "SET_ROLE mgr 3");
    assert_eq!(out, vec!["ROLE_SET mgr 3"]);

    let mut alice = daemon.client();
    alice.login("alice", "pw1");
    alice.cmd("DEPOSIT 50");
    alice.cmd("WITHDRAW 30");
    assert_eq!(alice.cmd("APPLY_LOAN 500"), vec!["LOAN_APPLIED 1 AMOUNT 500"]);
    alice.logout();

    let out = run_as(&daemon, "mgr", "pw", "ASSIGN_LOAN 1 2");
    assert_eq!(out, vec!["LOAN_ASSIGNED 1 emp_id=2"]);

    let out = run_as(&daemon, "emp", "pw", "APPROVE_LOAN 1");
    assert_eq!(out, vec!["LOAN_APPROVED 1"]);

    let mut alice = daemon.client();
    alice.login("alice", "pw1");
    assert_eq!(alice.cmd("VIEW_BALANCE"), vec!["BALANCE acct=1000 620"]);

    let history = alice.cmd("HISTORY");
    assert_eq!(history.last().map(String::as_str), Some("HISTORY_END"));
    let credits: Vec<&String> = history
        .iter()
        .filter(|line| line.contains("LOAN_CREDIT"))
        .collect();
    assert_eq!(credits.len(), 1);
    assert!(credits[0].ends_with("|acct=1000|LOAN_CREDIT|amt=500|bal=620|-"));
    alice.logout();
}

#[test]
fn an_approved_loan_cannot_be_decided_again() {
    let daemon = Daemon::start();
    onboard_alice(&daemon);
    run_as(&daemon, "admin", "admin", "ADD_EMPLOYEE mgr pw");
    run_as(&daemon, "admin", "admin", "SET_ROLE mgr 3");

    let out = run_as(&daemon, "alice", "pw1", "APPLY_LOAN 500");
    assert_eq!(out, vec!["LOAN_APPLIED 1 AMOUNT 500"]);
    run_as(&daemon, "mgr", "pw", "ASSIGN_LOAN 1 2");
    run_as(&daemon, "emp", "pw", "APPROVE_LOAN 1");

    assert_eq!(
        run_as(&daemon, "emp", "pw", "APPROVE_LOAN 1"),
        vec!["ERR Invalid state"]
    );

    // No double credit
    let out = run_as(&daemon, "alice", "pw1", "VIEW_BALANCE");
    assert_eq!(out, vec!["BALANCE acct=1000 600"]);
}

#[test]
fn only_the_assigned_employee_may_decide() {
    let daemon = Daemon::start();
    onboard_alice(&daemon);
    run_as(&daemon, "admin", "admin", "ADD_EMPLOYEE mgr pw");
    run_as(&daemon, "admin", "admin", "SET_ROLE mgr 3");
    run_as(&daemon, "admin", "admin", "ADD_EMPLOYEE other pw2");

    run_as(&daemon, "alice", "pw1", "APPLY_LOAN 500");
    run_as(&daemon, "mgr", "pw", "ASSIGN_LOAN 1 2");

    assert_eq!(
        run_as(&daemon, "other", "pw2", "REJECT_LOAN 1"),
        vec!["ERR Not assigned to you"]
    );
    assert_eq!(
        run_as(&daemon, "emp", "pw", "REJECT_LOAN 1"),
        vec!["LOAN_REJECTED 1"]
    );

    // Rejection never credits
    let out = run_as(&daemon, "alice", "pw1", "VIEW_BALANCE");
    assert_eq!(out, vec!["BALANCE acct=1000 100"]);
}

#[test]
fn assignment_is_refused_for_a_non_employee() {
    let daemon = Daemon::start();
    onboard_alice(&daemon);
    run_as(&daemon, "admin", "admin", "ADD_EMPLOYEE mgr pw");
    run_as(&daemon, "admin", "admin", "SET_ROLE mgr 3");
    run_as(&daemon, "alice", "pw1", "APPLY_LOAN 500");

    // alice (user id 3) is a customer, not an assignee
    assert_eq!(
        run_as(&daemon, "mgr", "pw", "ASSIGN_LOAN 1 3"),
        vec!["ERR Employee invalid"]
    );
    assert_eq!(
        run_as(&daemon, "mgr", "pw", "ASSIGN_LOAN 99 2"),
        vec!["ERR Loan not found"]
    );
}

#[test]
fn duplicate_usernames_are_refused_at_onboarding() {
    let daemon = Daemon::start();
    onboard_alice(&daemon);

    assert_eq!(
        run_as(&daemon, "emp", "pw", "ADD_CUSTOMER alice other 0"),
        vec!["ERR Add customer failed"]
    );
}
