// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tree types returned by `MuxDriver::get_tree` (spec §4.2).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaneInfo {
    pub index: u32,
    /// Basename of the foreground process.
    pub command: String,
    pub cwd: PathBuf,
    pub active: bool,
    pub pid: u32,
    /// Absent on older multiplexers that don't report a pane id.
    pub pane_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowInfo {
    pub index: u32,
    pub name: String,
    pub active: bool,
    pub panes: Vec<PaneInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub name: String,
    pub attached: bool,
    pub created: u64,
    pub activity: u64,
    pub windows: Vec<WindowInfo>,
}

impl SessionInfo {
    pub fn window_named_containing(&self, needle: &str) -> Option<&WindowInfo> {
        self.windows.iter().find(|w| w.name.contains(needle))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitDirection {
    Horizontal,
    Vertical,
}

impl SplitDirection {
    pub fn flag(self) -> &'static str {
        match self {
            SplitDirection::Horizontal => "-h",
            SplitDirection::Vertical => "-v",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewSessionOpts {
    pub window_name: Option<String>,
    pub cwd: Option<PathBuf>,
}

/// A batch-read `@cc_*`-namespaced pane option bag (spec §4.2).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaneOptions {
    pub cc_state: Option<String>,
    pub cc_model: Option<String>,
    pub cc_session_id: Option<String>,
    pub cc_cost: Option<String>,
    pub cc_tokens_in: Option<String>,
    pub cc_tokens_out: Option<String>,
    pub cc_context_pct: Option<String>,
    pub cc_git_branch: Option<String>,
}

/// Result of a raw shell/exec invocation (spec §4.2 `execCommand`).
#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}
