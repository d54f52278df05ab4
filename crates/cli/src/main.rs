// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! teller: interactive terminal client for the banking daemon
//!
//! Connects over TCP, prints server lines as they arrive, and relays
//! stdin lines to the server. The classic select() loop becomes a reader
//! thread plus the main stdin loop.

use std::io::{BufRead, BufReader, Write};
use std::net::{Shutdown, TcpStream};

use anyhow::Context;
use clap::Parser;

/// Terminal client for tellerd
#[derive(Debug, Parser)]
#[command(name = "teller", version, about)]
struct Args {
    /// Server host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(long, default_value_t = 4000)]
    port: u16,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let stream = TcpStream::connect((args.host.as_str(), args.port))
        .with_context(|| format!("connect to {}:{}", args.host, args.port))?;
    let mut writer = stream.try_clone().context("clone stream")?;

    // Server lines go straight to the terminal; when the server hangs up
    // there is nothing left to do, even if the user is mid-keystroke
    let reader = std::thread::spawn(move || {
        let mut lines = BufReader::new(stream).lines();
        while let Some(Ok(line)) = lines.next() {
            println!("{}", line);
        }
        println!("(connection closed)");
        std::process::exit(0);
    });

    for line in std::io::stdin().lock().lines() {
        let line = line.context("read stdin")?;
        writer.write_all(line.as_bytes()).context("send")?;
        writer.write_all(b"\n").context("send")?;
    }

    // stdin is done; half-close so the server ends the session cleanly
    writer.shutdown(Shutdown::Write).context("shutdown")?;
    let _ = reader.join();
    Ok(())
}
