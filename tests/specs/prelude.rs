// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixture: a live daemon on an ephemeral port, driven through
//! real TCP connections speaking the line protocol.

use std::io::{BufRead, BufReader, Lines, Write};
use std::net::TcpStream;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use tempfile::TempDir;

pub fn tellerd_bin() -> PathBuf {
    assert_cmd::cargo::cargo_bin("tellerd")
}

/// A running `tellerd` over a temporary data directory
///
/// Killed (not signalled) on drop, so tests that restart over the same
/// directory exercise exactly what a crash leaves behind.
pub struct Daemon {
    child: Child,
    port: u16,
    _dir: Option<TempDir>,
}

impl Daemon {
    /// Start over a fresh temporary data directory
    pub fn start() -> Daemon {
        let dir = TempDir::new().unwrap();
        let mut daemon = Daemon::start_in(dir.path());
        daemon._dir = Some(dir);
        daemon
    }

    /// Start over an existing data directory; restarts reuse the files
    pub fn start_in(data_dir: &Path) -> Daemon {
        let mut child = Command::new(tellerd_bin())
            .arg("--data-dir")
            .arg(data_dir)
            .args(["--port", "0"])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .unwrap();

        // The daemon prints READY <port> once the listener is bound
        let stdout = child.stdout.take().unwrap();
        let mut ready = String::new();
        BufReader::new(stdout).read_line(&mut ready).unwrap();
        let port = ready
            .trim()
            .strip_prefix("READY ")
            .unwrap_or_else(|| panic!("unexpected startup line: {ready:?}"))
            .parse()
            .unwrap();

        Daemon {
            child,
            port,
            _dir: None,
        }
    }

    pub fn client(&self) -> Client {
        Client::connect(self.port)
    }
}

impl Drop for Daemon {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// One protocol connection
pub struct Client {
    lines: Lines<BufReader<TcpStream>>,
    writer: TcpStream,
}

impl Client {
    fn connect(port: u16) -> Client {
        let stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
        let writer = stream.try_clone().unwrap();
        Client {
            lines: BufReader::new(stream).lines(),
            writer,
        }
    }

    pub fn send(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).unwrap();
        self.writer.write_all(b"\n").unwrap();
    }

    pub fn recv(&mut self) -> String {
        self.lines.next().unwrap().unwrap()
    }

    /// Collect lines until the next command prompt (exclusive)
    pub fn until_prompt(&mut self) -> Vec<String> {
        let mut out = Vec::new();
        loop {
            let line = self.recv();
            if line == "OK Awaiting command" {
                return out;
            }
            out.push(line);
        }
    }

    /// Send one command and collect its response lines
    pub fn cmd(&mut self, line: &str) -> Vec<String> {
        self.send(line);
        self.until_prompt()
    }

    /// Consume the connection banner up to the LOGIN prompt
    pub fn banner(&mut self) {
        assert_eq!(self.recv(), "WELCOME Banking Management System");
        assert_eq!(self.recv(), "LOGIN <username> <password>");
    }

    /// Drive the LOGIN handshake through the menu to the first prompt;
    /// returns the LOGIN_OK line
    pub fn login(&mut self, username: &str, password: &str) -> String {
        self.banner();
        self.send(&format!("LOGIN {} {}", username, password));
        let ok = self.recv();
        assert!(ok.starts_with("LOGIN_OK ROLE "), "login refused: {ok}");
        // Menu block, then the first prompt
        self.until_prompt();
        ok
    }

    pub fn logout(&mut self) {
        self.send("LOGOUT");
        assert_eq!(self.recv(), "BYE");
    }
}

/// One logged-in command on a fresh connection, then logout
pub fn run_as(daemon: &Daemon, username: &str, password: &str, line: &str) -> Vec<String> {
    let mut client = daemon.client();
    client.login(username, password);
    let out = client.cmd(line);
    client.logout();
    out
}
