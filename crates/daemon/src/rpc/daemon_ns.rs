// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `daemon.*` (spec §6): the daemon's own self-management surface —
//! health, config introspection, and shutdown. `reload` is declared but
//! not implemented in this scope; restarting through the supervisor is
//! the only supported way to pick up a changed `config.toml`.

use crate::rpc::RouteError;
use crate::state::AppState;
use serde_json::{json, Value};
use std::sync::Arc;
use swimlane_core::ApiError;

pub async fn dispatch(state: &Arc<AppState>, method: &str, _params: Value) -> Result<Value, RouteError> {
    match method {
        "health" => health(state).await,
        "config" => config(state).await,
        "reload" => reload(state).await,
        "stats" => stats(state).await,
        "shutdown" => shutdown(state).await,
        _ => Err(RouteError::NotFound),
    }
}

async fn health(state: &Arc<AppState>) -> Result<Value, RouteError> {
    Ok(json!(state.health_report().await))
}

/// A safe view of `Config`: paths and ports, never anything that isn't
/// already world-readable in `config.toml`.
async fn config(state: &Arc<AppState>) -> Result<Value, RouteError> {
    let c = &state.config;
    Ok(json!({
        "dataDir": c.data_dir,
        "socketPath": c.socket_path,
        "pidPath": c.pid_path,
        "logPath": c.log_path,
        "dbPath": c.db_path,
        "configPath": c.config_path,
        "httpPort": c.http_port,
        "wsPort": c.ws_port,
        "logLevel": c.log_level,
        "enableAutoMonitor": c.enable_auto_monitor,
        "autoMonitorIntervalMs": c.auto_monitor_interval_ms,
        "reconcileOnStart": c.reconcile_on_start,
        "maxRestarts": c.max_restarts,
        "restartWindowMs": c.restart_window_ms,
        "backoffDelayMs": c.backoff_delay_ms,
        "enableCors": c.enable_cors,
        "corsOrigins": c.cors_origins,
        "maxRequestSize": c.max_request_size,
        "requestTimeoutMs": c.request_timeout_ms,
        "runtimeCount": c.runtimes.len(),
    }))
}

async fn reload(_state: &Arc<AppState>) -> Result<Value, RouteError> {
    Err(ApiError::Unimplemented("daemon.reload").into())
}

async fn stats(state: &Arc<AppState>) -> Result<Value, RouteError> {
    let tasks = state.store.list_tasks();
    let agents = state.store.list_agents();
    let lanes = state.store.list_lanes();

    let mut tasks_by_column = std::collections::BTreeMap::new();
    for task in &tasks {
        *tasks_by_column.entry(format!("{:?}", task.kanban_column)).or_insert(0u64) += 1;
    }
    let mut agents_by_state = std::collections::BTreeMap::new();
    for agent in &agents {
        *agents_by_state.entry(format!("{:?}", agent.state)).or_insert(0u64) += 1;
    }

    Ok(json!({
        "uptimeMs": state.clock.epoch_ms().saturating_sub(state.started_at_epoch_ms),
        "taskCount": tasks.len(),
        "tasksByColumn": tasks_by_column,
        "agentCount": agents.len(),
        "agentsByState": agents_by_state,
        "laneCount": lanes.len(),
    }))
}

/// Notifies the main loop's shutdown watcher and returns immediately; the
/// actual teardown (flushing the store, closing listeners) happens in
/// `main.rs` once the `Notify` wakes it, the same as a received `SIGTERM`.
async fn shutdown(state: &Arc<AppState>) -> Result<Value, RouteError> {
    state.shutdown.notify_one();
    Ok(json!({"shuttingDown": true}))
}
