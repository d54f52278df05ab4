// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transfer specs
//!
//! Two customers, one transfer, two cross-referencing history lines.

use crate::prelude::*;

/// admin → employee → customers alice (acct 1000, 200) and bob
/// (acct 1001, 50)
fn onboard_pair(daemon: &Daemon) {
    run_as(daemon, "admin", "admin", "ADD_EMPLOYEE emp pw");
    let out = run_as(daemon, "emp", "pw", "ADD_CUSTOMER alice pw1 200");
    assert_eq!(out, vec!["CUSTOMER_ADDED alice ID 3 ACCT 1000"]);
    let out = run_as(daemon, "emp", "pw", "ADD_CUSTOMER bob pw2 50");
    assert_eq!(out, vec!["CUSTOMER_ADDED bob ID 4 ACCT 1001"]);
}

#[test]
fn a_transfer_moves_funds_between_accounts() {
    let daemon = Daemon::start();
    onboard_pair(&daemon);

    let mut alice = daemon.client();
    alice.login("alice", "pw1");
    assert_eq!(
        alice.cmd("TRANSFER 1001 80"),
        vec!["TRANSFER OK to acct=1001 80"]
    );
    assert_eq!(alice.cmd("VIEW_BALANCE"), vec!["BALANCE acct=1000 120"]);
    alice.logout();

    let out = run_as(&daemon, "bob", "pw2", "VIEW_BALANCE");
    assert_eq!(out, vec!["BALANCE acct=1001 130"]);
}

#[test]
fn both_sides_of_a_transfer_appear_in_history() {
    let daemon = Daemon::start();
    onboard_pair(&daemon);
    run_as(&daemon, "alice", "pw1", "TRANSFER 1001 80");

    let history = run_as(&daemon, "alice", "pw1", "HISTORY");
    assert_eq!(history.len(), 2);
    assert!(history[0].ends_with("|acct=1000|TRANSFER_OUT|amt=80|bal=120|to=1001"));
    assert_eq!(history[1], "HISTORY_END");

    let history = run_as(&daemon, "bob", "pw2", "HISTORY");
    assert_eq!(history.len(), 2);
    assert!(history[0].ends_with("|acct=1001|TRANSFER_IN|amt=80|bal=130|from=1000"));
}

#[test]
fn employees_read_any_account_history_by_number() {
    let daemon = Daemon::start();
    onboard_pair(&daemon);
    run_as(&daemon, "alice", "pw1", "TRANSFER 1001 80");

    let out = run_as(&daemon, "emp", "pw", "VIEW_TXNS 1001");
    assert_eq!(out.len(), 2);
    assert!(out[0].contains("|acct=1001|TRANSFER_IN|"));
    assert_eq!(out[1], "HISTORY_END");

    // An account with no traffic yields just the terminator
    let out = run_as(&daemon, "emp", "pw", "VIEW_TXNS 4242");
    assert_eq!(out, vec!["HISTORY_END"]);
}

#[test]
fn transfers_to_the_same_account_are_refused() {
    let daemon = Daemon::start();
    onboard_pair(&daemon);

    let mut alice = daemon.client();
    alice.login("alice", "pw1");
    assert_eq!(alice.cmd("TRANSFER 1000 10"), vec!["ERR Transfer failed"]);
    assert_eq!(alice.cmd("VIEW_BALANCE"), vec!["BALANCE acct=1000 200"]);
    alice.logout();
}

#[test]
fn transfers_beyond_the_balance_change_neither_side() {
    let daemon = Daemon::start();
    onboard_pair(&daemon);

    assert_eq!(
        run_as(&daemon, "alice", "pw1", "TRANSFER 1001 201"),
        vec!["ERR Transfer failed"]
    );
    let out = run_as(&daemon, "alice", "pw1", "VIEW_BALANCE");
    assert_eq!(out, vec!["BALANCE acct=1000 200"]);
    let out = run_as(&daemon, "bob", "pw2", "VIEW_BALANCE");
    assert_eq!(out, vec!["BALANCE acct=1001 50"]);
}

#[test]
fn transfers_to_unknown_accounts_are_refused() {
    let daemon = Daemon::start();
    onboard_pair(&daemon);

    assert_eq!(
        run_as(&daemon, "alice", "pw1", "TRANSFER 9999 10"),
        vec!["ERR Transfer failed"]
    );
    assert_eq!(
        run_as(&daemon, "alice", "pw1", "TRANSFER abc"),
        vec!["ERR Usage: TRANSFER <to_acct_no> <amount>"]
    );
}
