// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `runtime.*` (spec §6). `ping` mirrors the per-kind reachability probe
//! `swimlane_engine::health::check_runtime` runs as part of `daemon.health`,
//! just scoped to a single runtime on demand rather than the whole set.

use crate::rpc::{parse_params, RouteError};
use crate::state::AppState;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use swimlane_core::{ApiError, EntityKind, Runtime, RuntimeKind};

pub async fn dispatch(state: &Arc<AppState>, method: &str, params: Value) -> Result<Value, RouteError> {
    match method {
        "list" => list(state).await,
        "add" => add(state, params).await,
        "remove" => remove(state, params).await,
        "ping" => ping(state, params).await,
        "register" => add(state, params).await,
        _ => Err(RouteError::NotFound),
    }
}

async fn list(state: &Arc<AppState>) -> Result<Value, RouteError> {
    Ok(json!(state.store.list_runtimes()))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddParams {
    kind: RuntimeKind,
    host: Option<String>,
    port: Option<u16>,
    user: Option<String>,
    config_file: Option<String>,
    context: Option<String>,
}

async fn add(state: &Arc<AppState>, params: Value) -> Result<Value, RouteError> {
    let p: AddParams = parse_params(params)?;
    let mut runtime = Runtime::new(p.kind);
    runtime.host = p.host;
    runtime.port = p.port;
    runtime.user = p.user;
    runtime.config_file = p.config_file;
    runtime.context = p.context;
    state.store.save_runtime(runtime.clone());
    Ok(json!(runtime))
}

#[derive(Deserialize)]
struct IdParam {
    id: String,
}

async fn remove(state: &Arc<AppState>, params: Value) -> Result<Value, RouteError> {
    let p: IdParam = parse_params(params)?;
    state.store.delete_runtime(&p.id.into());
    Ok(json!({"removed": true}))
}

/// Probe command per kind, mirroring `swimlane_engine::health::check_runtime`.
fn probe_command(kind: RuntimeKind) -> &'static str {
    match kind {
        RuntimeKind::LocalTmux => "tmux -V",
        RuntimeKind::Docker => "docker info",
        RuntimeKind::K8s => "kubectl cluster-info",
        RuntimeKind::Ssh => "true",
    }
}

async fn ping(state: &Arc<AppState>, params: Value) -> Result<Value, RouteError> {
    let p: IdParam = parse_params(params)?;
    let runtime = state
        .store
        .get_runtime(&p.id.clone().into())
        .ok_or_else(|| ApiError::not_found(EntityKind::Runtime, &p.id))?;
    let out = state
        .driver
        .exec_command(probe_command(runtime.kind))
        .await
        .map_err(ApiError::from)?;
    Ok(json!({"reachable": out.success}))
}
