// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `swlanectl` — the supervisor-control and debugging client for the
//! `swlaned` agent orchestration daemon.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{daemon, rpc};
use swimlane_daemon::config::Config;

#[derive(Parser)]
#[command(name = "swlanectl", version, about = "Control the swimlane agent orchestration daemon")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start, stop, or inspect the daemon process
    Daemon {
        #[command(subcommand)]
        command: daemon::DaemonCommand,
    },
    /// Call any JSON-RPC method the daemon exposes
    Rpc(rpc::RpcArgs),
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Daemon { command } => daemon::handle(command, &config).await,
        Commands::Rpc(args) => rpc::handle(args, &config).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parses_daemon_start() {
        let cli = Cli::try_parse_from(["swlanectl", "daemon", "start"]).unwrap();
        assert!(matches!(cli.command, Commands::Daemon { command: daemon::DaemonCommand::Start { foreground: false } }));
    }

    #[test]
    fn parses_daemon_start_foreground() {
        let cli = Cli::try_parse_from(["swlanectl", "daemon", "start", "--foreground"]).unwrap();
        assert!(matches!(cli.command, Commands::Daemon { command: daemon::DaemonCommand::Start { foreground: true } }));
    }

    #[test]
    fn parses_rpc_with_default_params() {
        let cli = Cli::try_parse_from(["swlanectl", "rpc", "daemon.health"]).unwrap();
        match cli.command {
            Commands::Rpc(args) => {
                assert_eq!(args.method, "daemon.health");
                assert_eq!(args.params, "{}");
            }
            _ => panic!("expected Rpc command"),
        }
    }

    #[test]
    fn rejects_unknown_subcommand() {
        assert!(Cli::try_parse_from(["swlanectl", "bogus"]).is_err());
    }
}
