// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the adapters crate.

use std::time::Duration;

/// Multiplexer tree cache TTL override, `SWIMLANE_MUX_CACHE_MS` (default 2000ms, spec §4.2/§5).
pub fn mux_cache_ttl() -> Duration {
    std::env::var("SWIMLANE_MUX_CACHE_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_millis(2000))
}

/// Timeout for a typical outbound shell command, `SWIMLANE_MUX_TIMEOUT_MS` (default 10s, spec §5).
pub fn mux_command_timeout() -> Duration {
    std::env::var("SWIMLANE_MUX_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(10))
}

/// Timeout for provider routing calls (`ai.summarize`, etc.), `SWIMLANE_PROVIDER_TIMEOUT_MS`
/// (default 30s, spec §5).
pub fn provider_command_timeout() -> Duration {
    std::env::var("SWIMLANE_PROVIDER_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(30))
}
