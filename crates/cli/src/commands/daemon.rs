// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `swlanectl daemon` — process lifecycle for the supervisor/worker pair
//! (spec §4.11), grounded on the teacher's `oj daemon` subcommand set
//! (`cli/src/commands/daemon.rs`), scoped down to what a process-level
//! supervisor actually needs: start, stop, status, logs. Entity queries
//! (tasks, agents, lanes, ...) go through `swlanectl rpc` instead of a
//! bespoke per-entity command tree, since every one of those already has a
//! typed JSON-RPC method.

use crate::client::{ClientError, DaemonClient};
use anyhow::{anyhow, Result};
use clap::Subcommand;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::time::Duration;
use swimlane_daemon::config::Config;

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Start the supervisor (and, through it, the worker)
    Start {
        /// Run in the foreground instead of daemonizing
        #[arg(long)]
        foreground: bool,
    },
    /// Stop the supervisor and its worker
    Stop,
    /// Check whether the daemon is running and report basic stats
    Status,
    /// Stop and start the daemon
    Restart {
        #[arg(long)]
        foreground: bool,
    },
    /// View the daemon's log file
    Logs {
        /// Number of recent lines to show
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
        /// Show the entire file
        #[arg(long, conflicts_with = "limit")]
        no_limit: bool,
    },
}

pub async fn handle(command: DaemonCommand, config: &Config) -> Result<()> {
    match command {
        DaemonCommand::Start { foreground } => start(config, foreground),
        DaemonCommand::Stop => stop(config).await,
        DaemonCommand::Restart { foreground } => restart(config, foreground).await,
        DaemonCommand::Status => status(config).await,
        DaemonCommand::Logs { limit, no_limit } => logs(config, limit, no_limit),
    }
}

fn start(config: &Config, foreground: bool) -> Result<()> {
    if config.socket_path.exists() && DaemonClient::connect(config).is_ok() {
        println!("daemon already running");
        return Ok(());
    }

    let exe = find_swlaned_binary()?;
    let mut command = std::process::Command::new(&exe);
    if foreground {
        command.env(swimlane_daemon::supervisor::FOREGROUND_ENV_VAR, "1");
        let status = command.status().map_err(|err| anyhow!("failed to run {}: {err}", exe.display()))?;
        if !status.success() {
            return Err(anyhow!("daemon exited with {status}"));
        }
        return Ok(());
    }

    command.spawn().map_err(|err| anyhow!("failed to start {}: {err}", exe.display()))?;
    println!("daemon starting");
    Ok(())
}

async fn stop(config: &Config) -> Result<()> {
    let Some(pid) = read_pid(config) else {
        println!("daemon not running");
        return Ok(());
    };

    signal::kill(Pid::from_raw(pid), Signal::SIGTERM).map_err(|err| anyhow!("failed to signal pid {pid}: {err}"))?;

    let deadline = std::time::Instant::now() + Duration::from_secs(12);
    while std::time::Instant::now() < deadline {
        if signal::kill(Pid::from_raw(pid), None).is_err() {
            println!("daemon stopped");
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    Err(anyhow!("daemon did not stop within the shutdown deadline"))
}

async fn restart(config: &Config, foreground: bool) -> Result<()> {
    let was_running = read_pid(config).is_some();
    if was_running {
        stop(config).await?;
    }
    start(config, foreground)
}

async fn status(config: &Config) -> Result<()> {
    let client = match DaemonClient::connect(config) {
        Ok(client) => client,
        Err(ClientError::NotRunning(_)) => {
            println!("daemon not running");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    let health = client.call("daemon.health", serde_json::json!({})).await?;
    println!("{}", serde_json::to_string_pretty(&health)?);
    Ok(())
}

fn logs(config: &Config, limit: usize, no_limit: bool) -> Result<()> {
    if !config.log_path.exists() {
        println!("no log file at {}", config.log_path.display());
        return Ok(());
    }

    let file = std::fs::File::open(&config.log_path)?;
    let all_lines: Vec<String> = BufReader::new(file).lines().collect::<std::io::Result<_>>()?;
    let start = if no_limit { 0 } else { all_lines.len().saturating_sub(limit) };
    for line in &all_lines[start..] {
        println!("{line}");
    }
    Ok(())
}

fn read_pid(config: &Config) -> Option<i32> {
    std::fs::read_to_string(&config.pid_path).ok()?.trim().parse().ok()
}

/// Looks for `swlaned` next to the current executable before falling back
/// to `PATH`, matching the teacher's `find_ojd_binary` lookup order.
fn find_swlaned_binary() -> Result<PathBuf> {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join("swlaned");
            if sibling.exists() {
                return Ok(sibling);
            }
        }
    }
    Ok(PathBuf::from("swlaned"))
}
