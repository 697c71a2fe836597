// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the engine crate, matching
//! `swimlane-adapters::env`'s pattern of one function per tunable.

use std::time::Duration;

/// Delay between typing the launch command and pasting the prompt,
/// `SWIMLANE_LAUNCH_SETTLE_MS` (default 3000ms, spec §4.4 step 7 — gives the
/// provider CLI time to start before the prompt buffer is pasted in).
/// Shrunk to near-zero under test builds so the launcher's unit tests don't
/// pay the real-world settle time.
pub fn launch_settle_delay() -> Duration {
    if cfg!(test) {
        return Duration::from_millis(1);
    }
    std::env::var("SWIMLANE_LAUNCH_SETTLE_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(3))
}

/// Delay between pasting the prompt and sending the `Enter` keystroke,
/// `SWIMLANE_PASTE_SETTLE_MS` (default 500ms, spec §4.4 step 7).
pub fn paste_settle_delay() -> Duration {
    if cfg!(test) {
        return Duration::from_millis(1);
    }
    std::env::var("SWIMLANE_PASTE_SETTLE_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_millis(500))
}

/// How long a task must sit in `done` before auto-close sweeps its window,
/// `SWIMLANE_AUTO_CLOSE_DELAY_MS` (default 10 minutes, spec §4.7).
pub fn auto_close_delay() -> Duration {
    std::env::var("SWIMLANE_AUTO_CLOSE_DELAY_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(600))
}
