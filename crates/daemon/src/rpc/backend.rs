// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `backend.*` (spec §6). External issue-tracker mappings are peripheral
//! bookkeeping (spec §1) — `sync` only stamps `lastSyncedAt`, it never talks
//! to a real Github/Gitlab/Jira/Linear API.

use crate::rpc::{parse_params, RouteError};
use crate::state::AppState;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use swimlane_core::{ApiError, BackendKind, BackendMapping, EntityKind, SyncError};

pub async fn dispatch(state: &Arc<AppState>, method: &str, params: Value) -> Result<Value, RouteError> {
    match method {
        "list" => list(state).await,
        "add" => add(state, params).await,
        "remove" => remove(state, params).await,
        "enable" => set_enabled(state, params, true).await,
        "disable" => set_enabled(state, params, false).await,
        "sync" => sync(state, params).await,
        "status" => status(state, params).await,
        "retryErrors" => retry_errors(state, params).await,
        _ => Err(RouteError::NotFound),
    }
}

async fn list(state: &Arc<AppState>) -> Result<Value, RouteError> {
    Ok(json!(state.store.list_backends()))
}

#[derive(Deserialize)]
struct AddParams {
    kind: BackendKind,
    name: String,
}

async fn add(state: &Arc<AppState>, params: Value) -> Result<Value, RouteError> {
    let p: AddParams = parse_params(params)?;
    let now = state.clock.epoch_ms();
    let backend = BackendMapping::new(p.kind, p.name, now);
    state.store.save_backend(backend.clone());
    Ok(json!(backend))
}

#[derive(Deserialize)]
struct IdParam {
    id: String,
}

/// No dedicated delete path in the store; disabling is the documented
/// soft-delete (same gap noted for `team.delete`/`role.delete`).
async fn remove(state: &Arc<AppState>, params: Value) -> Result<Value, RouteError> {
    set_enabled(state, json!({"id": parse_params::<IdParam>(params)?.id}), false).await?;
    Ok(json!({"removed": true}))
}

async fn set_enabled(state: &Arc<AppState>, params: Value, enabled: bool) -> Result<Value, RouteError> {
    let p: IdParam = parse_params(params)?;
    let mut backend = state
        .store
        .get_backend(&p.id.clone().into())
        .ok_or_else(|| ApiError::not_found(EntityKind::Backend, &p.id))?;
    backend.enabled = enabled;
    state.store.save_backend(backend.clone());
    Ok(json!(backend))
}

async fn sync(state: &Arc<AppState>, params: Value) -> Result<Value, RouteError> {
    let p: IdParam = parse_params(params)?;
    let mut backend = state
        .store
        .get_backend(&p.id.clone().into())
        .ok_or_else(|| ApiError::not_found(EntityKind::Backend, &p.id))?;
    if !backend.enabled {
        return Err(ApiError::conflict("backend is disabled").into());
    }
    backend.last_synced_at = Some(state.clock.epoch_ms());
    state.store.save_backend(backend.clone());
    Ok(json!(backend))
}

async fn status(state: &Arc<AppState>, params: Value) -> Result<Value, RouteError> {
    let p: IdParam = parse_params(params)?;
    let backend = state
        .store
        .get_backend(&p.id.clone().into())
        .ok_or_else(|| ApiError::not_found(EntityKind::Backend, &p.id))?;
    let errors = state.store.sync_errors_for(&backend.id);
    Ok(json!({"backend": backend, "recentErrors": errors}))
}

async fn retry_errors(state: &Arc<AppState>, params: Value) -> Result<Value, RouteError> {
    let p: IdParam = parse_params(params)?;
    let backend = state
        .store
        .get_backend(&p.id.clone().into())
        .ok_or_else(|| ApiError::not_found(EntityKind::Backend, &p.id))?;
    let errors = state.store.sync_errors_for(&backend.id);
    if errors.is_empty() {
        return Ok(json!({"retried": 0}));
    }
    // No real sync engine is built (spec §1); a retry attempt re-stamps
    // `lastSyncedAt` and logs a placeholder outcome rather than replaying
    // the original sync calls.
    let now = state.clock.epoch_ms();
    state.store.log_sync_error(SyncError {
        backend_id: backend.id.clone(),
        message: "retry attempted, no sync engine configured".to_string(),
        occurred_at: now,
    });
    Ok(json!({"retried": errors.len()}))
}
