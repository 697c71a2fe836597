// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The terminal-multiplexer adapter (spec §4.2): a driver trait, a
//! `tmux`-backed implementation generic over local/remote execution, a
//! shared tree cache, and (test-only) a fake driver.

mod cache;
mod driver;
mod quote;
mod shell_exec;
mod types;

#[cfg(any(test, feature = "test-support"))]
mod fake;

pub use cache::TreeCache;
pub use driver::{MuxDriver, TmuxMuxDriver};
pub use quote::{quote_shell_arg, validate_session_name};
pub use shell_exec::{LocalShell, RemoteShell, RemoteShellConfig, ShellExec};
pub use types::{
    ExecOutput, NewSessionOpts, PaneInfo, PaneOptions, SessionInfo, SplitDirection, WindowInfo,
};

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeMuxDriver, MuxCall};
