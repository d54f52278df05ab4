// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle specs
//!
//! Startup marker, flag handling, config errors, and durability of the
//! store across daemon restarts.

use crate::prelude::*;

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_documents_the_flags() {
    Command::new(tellerd_bin())
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("--data-dir")
                .and(predicate::str::contains("--port"))
                .and(predicate::str::contains("--log")),
        );
}

#[test]
fn a_malformed_config_file_fails_startup() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("teller.toml"), "port = \"not a port\"\n").unwrap();

    Command::new(tellerd_bin())
        .arg("--data-dir")
        .arg(dir.path())
        .args(["--port", "0"])
        .assert()
        .failure();
}

#[test]
fn the_config_file_supplies_defaults_flags_override() {
    let dir = tempfile::TempDir::new().unwrap();
    // File pins a port; the --port 0 flag must still win
    std::fs::write(dir.path().join("teller.toml"), "port = 4999\n").unwrap();

    let daemon = Daemon::start_in(dir.path());
    let mut client = daemon.client();
    assert_eq!(client.login("admin", "admin"), "LOGIN_OK ROLE 4");
    client.logout();
}

#[test]
fn balances_survive_a_daemon_restart() {
    let dir = tempfile::TempDir::new().unwrap();

    {
        let daemon = Daemon::start_in(dir.path());
        run_as(&daemon, "admin", "admin", "ADD_EMPLOYEE emp pw");
        let out = run_as(&daemon, "emp", "pw", "ADD_CUSTOMER alice pw1 100");
        assert_eq!(out, vec!["CUSTOMER_ADDED alice ID 3 ACCT 1000"]);
        run_as(&daemon, "alice", "pw1", "DEPOSIT 50");
        // Killed here, holding nothing in flight
    }

    let daemon = Daemon::start_in(dir.path());
    let out = run_as(&daemon, "alice", "pw1", "VIEW_BALANCE");
    assert_eq!(out, vec!["BALANCE acct=1000 150"]);

    let history = run_as(&daemon, "alice", "pw1", "HISTORY");
    assert_eq!(history.len(), 2);
    assert!(history[0].contains("|acct=1000|DEPOSIT|amt=50|bal=150|-"));
}

#[test]
fn the_admin_is_seeded_exactly_once() {
    let dir = tempfile::TempDir::new().unwrap();

    {
        let daemon = Daemon::start_in(dir.path());
        run_as(&daemon, "admin", "admin", "CHANGE_PASSWORD rotated");
    }

    // A reseed would resurrect the default credential
    let daemon = Daemon::start_in(dir.path());
    let mut client = daemon.client();
    client.banner();
    client.send("LOGIN admin admin");
    assert_eq!(client.recv(), "ERR Login failed");
    client.send("LOGIN admin rotated");
    assert_eq!(client.recv(), "LOGIN_OK ROLE 4");
    client.until_prompt();
    client.logout();
}
