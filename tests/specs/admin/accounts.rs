// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Account administration specs
//!
//! Manager activation toggles and feedback review, admin role changes.

use crate::prelude::*;

fn onboard(daemon: &Daemon) {
    run_as(daemon, "admin", "admin", "ADD_EMPLOYEE emp pw");
    run_as(daemon, "admin", "admin", "ADD_EMPLOYEE mgr pw");
    run_as(daemon, "admin", "admin", "SET_ROLE mgr 3");
    let out = run_as(daemon, "emp", "pw", "ADD_CUSTOMER alice pw1 100");
    assert_eq!(out, vec!["CUSTOMER_ADDED alice ID 4 ACCT 1000"]);
}

#[test]
fn deactivation_locks_the_customer_out_until_reactivation() {
    let daemon = Daemon::start();
    onboard(&daemon);

    assert_eq!(
        run_as(&daemon, "mgr", "pw", "DEACTIVATE 1000"),
        vec!["DEACTIVATED acct=1000 uid=4"]
    );

    let mut locked_out = daemon.client();
    locked_out.banner();
    locked_out.send("LOGIN alice pw1");
    assert_eq!(locked_out.recv(), "ERR Login failed");

    assert_eq!(
        run_as(&daemon, "mgr", "pw", "ACTIVATE 1000"),
        vec!["ACTIVATED acct=1000 uid=4"]
    );
    let mut back = daemon.client();
    assert_eq!(back.login("alice", "pw1"), "LOGIN_OK ROLE 1");
    back.logout();
}

#[test]
fn deactivating_a_logged_in_customer_ends_their_session_claim() {
    let daemon = Daemon::start();
    onboard(&daemon);

    let mut alice = daemon.client();
    alice.login("alice", "pw1");

    run_as(&daemon, "mgr", "pw", "DEACTIVATE 1000");
    run_as(&daemon, "mgr", "pw", "ACTIVATE 1000");

    // The stale session flag was cleared; a new login works even though
    // the old connection never logged out
    let mut fresh = daemon.client();
    assert_eq!(fresh.login("alice", "pw1"), "LOGIN_OK ROLE 1");
    fresh.logout();
}

#[test]
fn toggling_an_unknown_account_is_refused() {
    let daemon = Daemon::start();
    onboard(&daemon);

    assert_eq!(
        run_as(&daemon, "mgr", "pw", "DEACTIVATE 9999"),
        vec!["ERR Account not found"]
    );
}

#[test]
fn feedback_flows_from_customer_to_manager() {
    let daemon = Daemon::start();
    onboard(&daemon);

    assert_eq!(
        run_as(&daemon, "alice", "pw1", "FEEDBACK the queue moves fast"),
        vec!["FEEDBACK_OK"]
    );

    let review = run_as(&daemon, "mgr", "pw", "REVIEW_FEEDBACK");
    assert_eq!(review.len(), 2);
    assert!(review[0].contains("|uid=4|the queue moves fast"));
    assert_eq!(review[1], "FEEDBACK_END");
}

#[test]
fn feedback_without_text_is_refused() {
    let daemon = Daemon::start();
    onboard(&daemon);

    assert_eq!(
        run_as(&daemon, "alice", "pw1", "FEEDBACK"),
        vec!["ERR Provide feedback text"]
    );
}

#[test]
fn set_role_rewires_the_menu_on_next_login() {
    let daemon = Daemon::start();
    run_as(&daemon, "admin", "admin", "ADD_EMPLOYEE pat pw");

    assert_eq!(
        run_as(&daemon, "admin", "admin", "SET_ROLE pat 3"),
        vec!["ROLE_SET pat 3"]
    );

    let mut pat = daemon.client();
    assert_eq!(pat.login("pat", "pw"), "LOGIN_OK ROLE 3");
    pat.logout();
}

#[test]
fn set_role_rejects_unknown_users_and_roles() {
    let daemon = Daemon::start();

    assert_eq!(
        run_as(&daemon, "admin", "admin", "SET_ROLE ghost 2"),
        vec!["ERR Set role failed"]
    );
    assert_eq!(
        run_as(&daemon, "admin", "admin", "SET_ROLE admin 9"),
        vec!["ERR Usage: SET_ROLE <username> <role_int>"]
    );
}
