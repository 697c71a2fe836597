// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `agent.*` (spec §6). `getAttachCommand` validates the session name
//! against the multiplexer's whitelist before it ever reaches a shell
//! string (spec §4.9 rule 3).

use crate::rpc::{parse_params, RouteError};
use crate::state::AppState;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use swimlane_adapters::validate_session_name;
use swimlane_core::{AgentId, AgentState, ApiError, EntityKind};

pub async fn dispatch(state: &Arc<AppState>, method: &str, params: Value) -> Result<Value, RouteError> {
    match method {
        "list" => list(state).await,
        "get" => get(state, params).await,
        "spawn" => spawn(state, params).await,
        "kill" => kill(state, params).await,
        "sendPrompt" => send_prompt(state, params).await,
        "getOutput" => get_output(state, params).await,
        "getStatus" => get_status(state, params).await,
        "getAttachCommand" => get_attach_command(state, params).await,
        _ => Err(RouteError::NotFound),
    }
}

async fn list(state: &Arc<AppState>) -> Result<Value, RouteError> {
    Ok(json!(state.store.list_agents()))
}

#[derive(Deserialize)]
struct IdParam {
    id: String,
}

async fn get(state: &Arc<AppState>, params: Value) -> Result<Value, RouteError> {
    let p: IdParam = parse_params(params)?;
    let agent = state
        .store
        .get_agent(&AgentId::from(p.id.clone()))
        .ok_or_else(|| ApiError::not_found(EntityKind::Agent, &p.id))?;
    Ok(json!(agent))
}

async fn spawn(_state: &Arc<AppState>, _params: Value) -> Result<Value, RouteError> {
    Err(ApiError::Unimplemented("agent.spawn").into())
}

async fn kill(state: &Arc<AppState>, params: Value) -> Result<Value, RouteError> {
    let p: IdParam = parse_params(params)?;
    let id = AgentId::from(p.id);
    state.orchestrator.remove_agent(&id);
    Ok(json!({"killed": true}))
}

async fn send_prompt(_state: &Arc<AppState>, _params: Value) -> Result<Value, RouteError> {
    Err(ApiError::Unimplemented("agent.sendPrompt").into())
}

async fn get_output(state: &Arc<AppState>, params: Value) -> Result<Value, RouteError> {
    let p: IdParam = parse_params(params)?;
    let agent = state
        .store
        .get_agent(&AgentId::from(p.id.clone()))
        .ok_or_else(|| ApiError::not_found(EntityKind::Agent, &p.id))?;
    let Some(session_name) = &agent.location.session_name else {
        return Ok(json!({"output": ""}));
    };
    let window = agent.location.window_index.unwrap_or(0);
    let pane = agent.location.pane_index.unwrap_or(0);
    let target = format!("{session_name}:{window}.{pane}");
    let capture = state.driver.capture_pane_content(&target, 500).await.map_err(ApiError::from)?;
    Ok(json!({"output": capture}))
}

async fn get_status(state: &Arc<AppState>, params: Value) -> Result<Value, RouteError> {
    let p: IdParam = parse_params(params)?;
    let agent = state
        .store
        .get_agent(&AgentId::from(p.id.clone()))
        .ok_or_else(|| ApiError::not_found(EntityKind::Agent, &p.id))?;
    Ok(json!({"state": agent_state_name(agent.state)}))
}

fn agent_state_name(state: AgentState) -> &'static str {
    match state {
        AgentState::Spawning => "spawning",
        AgentState::Idle => "idle",
        AgentState::Working => "working",
        AgentState::Error => "error",
        AgentState::Completed => "completed",
        AgentState::Terminated => "terminated",
    }
}

async fn get_attach_command(state: &Arc<AppState>, params: Value) -> Result<Value, RouteError> {
    let p: IdParam = parse_params(params)?;
    let agent = state
        .store
        .get_agent(&AgentId::from(p.id.clone()))
        .ok_or_else(|| ApiError::not_found(EntityKind::Agent, &p.id))?;
    let Some(session_name) = &agent.location.session_name else {
        return Err(ApiError::validation("agent has no live session").into());
    };
    if !validate_session_name(session_name) {
        return Err(ApiError::validation(format!("unsafe session name: {session_name}")).into());
    }
    Ok(json!({"command": format!("tmux attach -t {session_name}")}))
}
