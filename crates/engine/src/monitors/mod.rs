// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The four periodic monitors (spec §4.7). Each runs on its own timer in
//! `swimlane-daemon` and is independent of the others; overlap on the same
//! task/lane id is prevented by a dedicated [`crate::guard::ProcessingGuard`]
//! per monitor.

pub mod auto_close;
pub mod auto_monitor;
pub mod auto_pilot;
pub mod session_sync;

pub use auto_close::{summarize, AutoClose};
pub use auto_monitor::AutoMonitor;
pub use auto_pilot::AutoPilot;
pub use session_sync::SessionSync;

use swimlane_core::TmuxBinding;

/// The `session:window.pane` target string a binding resolves to.
pub(crate) fn binding_target(binding: &TmuxBinding) -> String {
    format!("{}:{}.{}", binding.session_name, binding.window_index, binding.pane_index)
}
