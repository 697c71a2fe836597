// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters for external I/O: the terminal-multiplexer driver (spec §4.2)
//! and the AI-provider registry (spec §4.3).

pub mod env;
pub mod mux;
pub mod provider;

pub use mux::{
    quote_shell_arg, validate_session_name, ExecOutput, LocalShell, MuxDriver, NewSessionOpts,
    PaneInfo, PaneOptions, SessionInfo, ShellExec, SplitDirection, TmuxMuxDriver, WindowInfo,
};
pub use provider::{
    deprecated_model_alias, detect_from_capture, from_cc_state, get_interactive_launch_command,
    get_spawn_config, resolve_model, resolve_provider, DetectedStatus, LaunchCommand,
    ModelFlagStyle, ProviderConfig, SpawnConfig,
};

#[cfg(any(test, feature = "test-support"))]
pub use mux::{FakeMuxDriver, MuxCall};
