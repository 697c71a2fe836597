// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `team.*` (spec §6). Teams are peripheral bookkeeping (spec §1's explicit
//! out-of-scope note) — plain CRUD plus membership edits, no execution
//! semantics of their own. `quickCode`/`quickResearch` are thin sugar over
//! `team.create` with a role preset, not a distinct subsystem.

use crate::rpc::{parse_params, RouteError};
use crate::state::AppState;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use swimlane_core::{Agent, AgentId, ApiError, EntityKind, Provider, Team};

pub async fn dispatch(state: &Arc<AppState>, method: &str, params: Value) -> Result<Value, RouteError> {
    match method {
        "list" => list(state).await,
        "create" => create(state, params).await,
        "delete" => delete(state, params).await,
        "addAgent" => add_agent(state, params).await,
        "removeAgent" => remove_agent(state, params).await,
        "quickCode" => quick_team(state, params, "coder").await,
        "quickResearch" => quick_team(state, params, "researcher").await,
        _ => Err(RouteError::NotFound),
    }
}

async fn list(state: &Arc<AppState>) -> Result<Value, RouteError> {
    Ok(json!(state.store.list_teams()))
}

#[derive(Deserialize)]
struct CreateParams {
    name: String,
}

async fn create(state: &Arc<AppState>, params: Value) -> Result<Value, RouteError> {
    let p: CreateParams = parse_params(params)?;
    let now = state.clock.epoch_ms();
    let team = Team::new(p.name, now);
    state.store.save_team(team.clone());
    Ok(json!(team))
}

#[derive(Deserialize)]
struct IdParam {
    id: String,
}

/// Teams have no dedicated delete path in the store (spec §1's
/// peripheral-bookkeeping framing); an empty-membership save is the
/// documented "soft delete" until the store gains one.
async fn delete(state: &Arc<AppState>, params: Value) -> Result<Value, RouteError> {
    let p: IdParam = parse_params(params)?;
    let mut team = state
        .store
        .get_team(&p.id.clone().into())
        .ok_or_else(|| ApiError::not_found(EntityKind::Team, &p.id))?;
    team.members.clear();
    state.store.save_team(team);
    Ok(json!({"deleted": true}))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MemberParams {
    team_id: String,
    agent_id: String,
}

async fn add_agent(state: &Arc<AppState>, params: Value) -> Result<Value, RouteError> {
    let p: MemberParams = parse_params(params)?;
    let mut team = state
        .store
        .get_team(&p.team_id.clone().into())
        .ok_or_else(|| ApiError::not_found(EntityKind::Team, &p.team_id))?;
    let agent_id = AgentId::from(p.agent_id);
    if !team.members.contains(&agent_id) {
        team.members.push(agent_id.clone());
    }
    if let Some(mut agent) = state.store.get_agent(&agent_id) {
        agent.team_id = Some(team.id.clone());
        state.store.save_agent(agent);
    }
    state.store.save_team(team.clone());
    Ok(json!(team))
}

async fn remove_agent(state: &Arc<AppState>, params: Value) -> Result<Value, RouteError> {
    let p: MemberParams = parse_params(params)?;
    let mut team = state
        .store
        .get_team(&p.team_id.clone().into())
        .ok_or_else(|| ApiError::not_found(EntityKind::Team, &p.team_id))?;
    let agent_id = AgentId::from(p.agent_id);
    team.members.retain(|m| m != &agent_id);
    if let Some(mut agent) = state.store.get_agent(&agent_id) {
        if agent.team_id.as_ref() == Some(&team.id) {
            agent.team_id = None;
            state.store.save_agent(agent);
        }
    }
    state.store.save_team(team.clone());
    Ok(json!(team))
}

#[derive(Deserialize)]
struct QuickParams {
    name: String,
}

/// Creates a team plus a single freshly spawned agent in the given role
/// (spec §6 `quickCode`/`quickResearch` convenience constructors).
async fn quick_team(state: &Arc<AppState>, params: Value, role: &str) -> Result<Value, RouteError> {
    let p: QuickParams = parse_params(params)?;
    let now = state.clock.epoch_ms();
    let mut team = Team::new(p.name.clone(), now);
    let agent = Agent::new(format!("{}-1", p.name), role, Provider::Claude, now);
    team.members.push(agent.id.clone());
    state.orchestrator.register_agent(agent.clone());
    state.store.save_team(team.clone());
    Ok(json!({"team": team, "agent": agent}))
}
