// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ai.*` (spec §6): thin wrappers over the provider-registry resolution
//! chain and heuristic session summarizer (spec §4.3, §4.7).

use crate::rpc::{parse_params, RouteError};
use crate::state::AppState;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use swimlane_adapters::{get_spawn_config, resolve_model, resolve_provider};
use swimlane_core::ApiError;

const SYSTEM_DEFAULT_PROVIDER: swimlane_core::Provider = swimlane_core::Provider::Claude;

pub async fn dispatch(state: &Arc<AppState>, method: &str, params: Value) -> Result<Value, RouteError> {
    match method {
        "resolveConfig" => resolve_config(state, params).await,
        "getSpawnConfig" => get_spawn_config_rpc(params).await,
        "summarize" => summarize(params).await,
        _ => Err(RouteError::NotFound),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResolveConfigParams {
    task_provider: Option<String>,
    lane_provider: Option<String>,
    task_model: Option<String>,
    lane_model: Option<String>,
}

async fn resolve_config(_state: &Arc<AppState>, params: Value) -> Result<Value, RouteError> {
    let p: ResolveConfigParams = parse_params(params)?;
    let provider = resolve_provider(p.task_provider.as_deref(), p.lane_provider.as_deref(), SYSTEM_DEFAULT_PROVIDER)
        .map_err(ApiError::from)?;
    let model = resolve_model(p.task_model.as_deref(), p.lane_model.as_deref());
    Ok(json!({"provider": provider, "model": model}))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpawnConfigParams {
    provider: swimlane_core::Provider,
    model: Option<String>,
}

async fn get_spawn_config_rpc(params: Value) -> Result<Value, RouteError> {
    let p: SpawnConfigParams = parse_params(params)?;
    let spawn = get_spawn_config(p.provider, p.model.as_deref());
    Ok(json!({"binary": spawn.binary, "argv": spawn.argv, "env": spawn.env}))
}

#[derive(Deserialize)]
struct SummarizeParams {
    capture: String,
}

async fn summarize(params: Value) -> Result<Value, RouteError> {
    let p: SummarizeParams = parse_params(params)?;
    Ok(json!({"summary": swimlane_engine::summarize(&p.capture)}))
}
