// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `db.*` (spec §4.9, §6): the generic store proxy. `call` only accepts a
//! fixed whitelist of store method names — there is no way to reach an
//! arbitrary method through this surface. Any whitelisted name matching
//! `save|delete|add|mark|log|clear|update` emits `db.changed` after it runs.

use crate::rpc::RouteError;
use crate::state::AppState;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use swimlane_core::{
    Agent, AgentId, ApiError, BackendId, BackendMapping, Lane, LaneId, Pipeline, PipelineId, Role,
    RoleId, Runtime, RuntimeId, Task, TaskId, Team, TeamId,
};

pub async fn dispatch(state: &Arc<AppState>, method: &str, params: Value) -> Result<Value, RouteError> {
    match method {
        "call" => call(state, params).await,
        "snapshot" => snapshot(state).await,
        _ => Err(RouteError::NotFound),
    }
}

#[derive(Deserialize)]
struct CallParams {
    method: String,
    #[serde(default)]
    args: Vec<Value>,
}

fn arg_string(args: &[Value], index: usize) -> Result<String, RouteError> {
    args.get(index)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ApiError::validation(format!("db.call: missing string argument at position {index}")).into())
}

fn arg_object<T: serde::de::DeserializeOwned>(args: &[Value], index: usize) -> Result<T, RouteError> {
    let value = args
        .get(index)
        .cloned()
        .ok_or_else(|| ApiError::validation(format!("db.call: missing argument at position {index}")))?;
    serde_json::from_value(value).map_err(|err| ApiError::validation(format!("db.call: {err}")).into())
}

const WRITE_PREFIXES: &[&str] = &["save", "delete", "add", "mark", "log", "clear", "update"];

fn is_write_method(name: &str) -> bool {
    WRITE_PREFIXES.iter().any(|p| name.starts_with(p))
}

/// The whitelist (spec §4.9): every store method reachable through
/// `db.call`, nothing else. Each arm converts the `args` array into the
/// matching `Store` call's parameters.
async fn call(state: &Arc<AppState>, params: Value) -> Result<Value, RouteError> {
    let p: CallParams = serde_json::from_value(params).map_err(|err| ApiError::validation(err.to_string()))?;
    let args = &p.args;

    let result = match p.method.as_str() {
        "listLanes" => json!(state.store.list_lanes()),
        "getLane" => json!(state.store.get_lane(&LaneId::from(arg_string(args, 0)?))),
        "saveLane" => {
            let lane: Lane = arg_object(args, 0)?;
            state.store.save_lane(lane.clone());
            json!(lane)
        }
        "deleteLane" => {
            state.store.delete_lane(&LaneId::from(arg_string(args, 0)?));
            json!({"deleted": true})
        }
        "listTasks" => json!(state.store.list_tasks()),
        "getTask" => json!(state.store.get_task(&TaskId::from(arg_string(args, 0)?))),
        "saveTask" => {
            let task: Task = arg_object(args, 0)?;
            state.store.save_task(task.clone());
            json!(task)
        }
        "deleteTask" => {
            state.store.delete_task(&TaskId::from(arg_string(args, 0)?));
            json!({"deleted": true})
        }
        "listAgents" => json!(state.store.list_agents()),
        "getAgent" => json!(state.store.get_agent(&AgentId::from(arg_string(args, 0)?))),
        "saveAgent" => {
            let agent: Agent = arg_object(args, 0)?;
            state.store.save_agent(agent.clone());
            json!(agent)
        }
        "deleteAgent" => {
            state.store.delete_agent(&AgentId::from(arg_string(args, 0)?));
            json!({"deleted": true})
        }
        "listTeams" => json!(state.store.list_teams()),
        "getTeam" => json!(state.store.get_team(&TeamId::from(arg_string(args, 0)?))),
        "saveTeam" => {
            let team: Team = arg_object(args, 0)?;
            state.store.save_team(team.clone());
            json!(team)
        }
        "listPipelines" => json!(state.store.list_pipelines()),
        "getPipeline" => json!(state.store.get_pipeline(&PipelineId::from(arg_string(args, 0)?))),
        "savePipeline" => {
            let pipeline: Pipeline = arg_object(args, 0)?;
            state.store.save_pipeline(pipeline.clone());
            json!(pipeline)
        }
        "listRoles" => json!(state.store.list_roles()),
        "getRole" => json!(state.store.get_role(&RoleId::from(arg_string(args, 0)?))),
        "saveRole" => {
            let role: Role = arg_object(args, 0)?;
            state.store.save_role(role.clone());
            json!(role)
        }
        "listBackends" => json!(state.store.list_backends()),
        "getBackend" => json!(state.store.get_backend(&BackendId::from(arg_string(args, 0)?))),
        "saveBackend" => {
            let backend: BackendMapping = arg_object(args, 0)?;
            state.store.save_backend(backend.clone());
            json!(backend)
        }
        "listRuntimes" => json!(state.store.list_runtimes()),
        "getRuntime" => json!(state.store.get_runtime(&RuntimeId::from(arg_string(args, 0)?))),
        "saveRuntime" => {
            let runtime: Runtime = arg_object(args, 0)?;
            state.store.save_runtime(runtime.clone());
            json!(runtime)
        }
        "deleteRuntime" => {
            state.store.delete_runtime(&RuntimeId::from(arg_string(args, 0)?));
            json!({"deleted": true})
        }
        other => return Err(ApiError::validation(format!("db.call: method not whitelisted: {other}")).into()),
    };

    if is_write_method(&p.method) {
        state.events.emit(swimlane_core::Event::DbChanged { method: p.method.clone() });
    }
    Ok(result)
}

/// A full dump of every collection the store holds — an escape hatch for
/// clients that want to rebuild their local view from scratch rather than
/// replaying every event since connecting.
async fn snapshot(state: &Arc<AppState>) -> Result<Value, RouteError> {
    Ok(json!({
        "lanes": state.store.list_lanes(),
        "tasks": state.store.list_tasks(),
        "agents": state.store.list_agents(),
        "teams": state.store.list_teams(),
        "pipelines": state.store.list_pipelines(),
        "roles": state.store.list_roles(),
        "backends": state.store.list_backends(),
        "runtimes": state.store.list_runtimes(),
    }))
}
