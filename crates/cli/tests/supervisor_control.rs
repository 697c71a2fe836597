// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end checks of the `swlanectl` binary's argument handling and its
//! behavior against a daemon that isn't running, run against the built
//! executable rather than in-process (spec §4.11's supervisor/CLI split is
//! a process boundary, so the test should exercise that boundary).

#![allow(clippy::unwrap_used, clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;

fn cli() -> Command {
    Command::cargo_bin("swlanectl").expect("swlanectl binary should build")
}

fn isolated_data_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("tempdir")
}

#[test]
fn unknown_subcommand_fails() {
    cli().arg("bogus").assert().failure();
}

#[test]
fn daemon_status_reports_not_running_without_a_socket() {
    let data_dir = isolated_data_dir();
    cli()
        .env("SWIMLANE_DATA_DIR", data_dir.path())
        .args(["daemon", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not running"));
}

#[test]
fn rpc_against_a_missing_daemon_fails() {
    let data_dir = isolated_data_dir();
    cli()
        .env("SWIMLANE_DATA_DIR", data_dir.path())
        .args(["rpc", "daemon.health"])
        .assert()
        .failure();
}

#[test]
fn daemon_logs_reports_missing_file_gracefully() {
    let data_dir = isolated_data_dir();
    cli()
        .env("SWIMLANE_DATA_DIR", data_dir.path())
        .args(["daemon", "logs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no log file"));
}
