// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `kanban.*` (spec §6). Owns the one true `startTask` code path
//! (spec §4.9 rule 1) that `task.move` also delegates to, and whitelists
//! `editLane`'s fields (rule 2) — in particular excluding `sessionName`/
//! `sessionActive`, which are owned exclusively by the session-sync monitor.

use crate::rpc::{parse_params, RouteError};
use crate::state::AppState;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use swimlane_core::{ApiError, EntityKind, KanbanColumn, Lane, Provider, Task, TaskId, TaskStatus};

pub async fn dispatch(state: &Arc<AppState>, method: &str, params: Value) -> Result<Value, RouteError> {
    match method {
        "listLanes" => list_lanes(state).await,
        "createLane" => create_lane(state, params).await,
        "editLane" => edit_lane(state, params).await,
        "deleteLane" => delete_lane(state, params).await,
        "saveLane" => save_lane(state, params).await,
        "getBoard" => get_board(state, params).await,
        "startTask" => start_task_rpc(state, params).await,
        "stopTask" => stop_task(state, params).await,
        "restartTask" => restart_task(state, params).await,
        "startBundle" => start_bundle(state, params).await,
        "closeTaskWindow" => close_task_window(state, params).await,
        "cleanupWorktree" => cleanup_worktree(state, params).await,
        _ => Err(RouteError::NotFound),
    }
}

/// The shared launch path every caller that starts a task — `kanban.startTask`,
/// `kanban.startBundle`, and `task.move`'s `inProgress` case — goes through.
pub(crate) async fn start_task(state: &Arc<AppState>, task_id: &TaskId) -> Result<(), RouteError> {
    state.launcher.start_task(task_id).await.map_err(RouteError::from)
}

async fn list_lanes(state: &Arc<AppState>) -> Result<Value, RouteError> {
    Ok(json!(state.store.list_lanes()))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateLaneParams {
    name: String,
    server_id: String,
    working_directory: String,
    session_name: String,
}

async fn create_lane(state: &Arc<AppState>, params: Value) -> Result<Value, RouteError> {
    let p: CreateLaneParams = parse_params(params)?;
    let now = state.clock.epoch_ms();
    let lane = Lane::new(p.name, p.server_id, p.working_directory.into(), p.session_name, now);
    state.store.save_lane(lane.clone());
    Ok(json!(lane))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EditLaneParams {
    id: String,
    name: Option<String>,
    working_directory: Option<String>,
    ai_provider: Option<Provider>,
    ai_model: Option<String>,
    context_instructions: Option<String>,
    default_toggles: Option<swimlane_core::LaneToggleDefaults>,
    memory_file_id: Option<String>,
    memory_path: Option<String>,
}

/// Whitelist deliberately excludes `sessionName`/`sessionActive`/`serverId`:
/// the first two are session-sync-owned (spec §4.7), the third is fixed at
/// creation.
async fn edit_lane(state: &Arc<AppState>, params: Value) -> Result<Value, RouteError> {
    let p: EditLaneParams = parse_params(params)?;
    let mut lane = state
        .store
        .get_lane(&p.id.clone().into())
        .ok_or_else(|| ApiError::not_found(EntityKind::Lane, &p.id))?;

    if let Some(v) = p.name {
        lane.name = v;
    }
    if let Some(v) = p.working_directory {
        lane.working_directory = v.into();
    }
    if p.ai_provider.is_some() {
        lane.ai_provider = p.ai_provider;
    }
    if p.ai_model.is_some() {
        lane.ai_model = p.ai_model;
    }
    if p.context_instructions.is_some() {
        lane.context_instructions = p.context_instructions;
    }
    if let Some(v) = p.default_toggles {
        lane.default_toggles = v;
    }
    if p.memory_file_id.is_some() {
        lane.memory_file_id = p.memory_file_id;
    }
    if let Some(v) = p.memory_path {
        lane.memory_path = Some(v.into());
    }

    state.store.save_lane(lane.clone());
    Ok(json!(lane))
}

#[derive(Deserialize)]
struct IdParam {
    id: String,
}

async fn delete_lane(state: &Arc<AppState>, params: Value) -> Result<Value, RouteError> {
    let p: IdParam = parse_params(params)?;
    state.store.delete_lane(&p.id.into());
    Ok(json!({"deleted": true}))
}

async fn save_lane(state: &Arc<AppState>, params: Value) -> Result<Value, RouteError> {
    let lane: Lane = parse_params(params)?;
    state.store.save_lane(lane.clone());
    Ok(json!(lane))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BoardParams {
    lane_id: Option<String>,
}

async fn get_board(state: &Arc<AppState>, params: Value) -> Result<Value, RouteError> {
    let p: BoardParams = parse_params(params)?;
    let lanes: Vec<Lane> = match &p.lane_id {
        Some(id) => state.store.get_lane(&id.clone().into()).into_iter().collect(),
        None => state.store.list_lanes(),
    };

    let mut board = Vec::new();
    for lane in lanes {
        let tasks = state.store.tasks_in_lane(&lane.id);
        let mut columns: std::collections::BTreeMap<&'static str, Vec<&Task>> = std::collections::BTreeMap::new();
        for column in [
            KanbanColumn::Backlog,
            KanbanColumn::Todo,
            KanbanColumn::InProgress,
            KanbanColumn::InReview,
            KanbanColumn::Done,
        ] {
            columns.insert(column_name(column), tasks.iter().filter(|t| t.kanban_column == column).collect());
        }
        board.push(json!({"lane": lane, "columns": columns}));
    }
    Ok(json!(board))
}

fn column_name(column: KanbanColumn) -> &'static str {
    match column {
        KanbanColumn::Backlog => "backlog",
        KanbanColumn::Todo => "todo",
        KanbanColumn::InProgress => "inProgress",
        KanbanColumn::InReview => "inReview",
        KanbanColumn::Done => "done",
    }
}

async fn start_task_rpc(state: &Arc<AppState>, params: Value) -> Result<Value, RouteError> {
    let p: IdParam = parse_params(params)?;
    let task_id: TaskId = p.id.into();
    start_task(state, &task_id).await?;
    let task = state
        .store
        .get_task(&task_id)
        .ok_or_else(|| ApiError::not_found(EntityKind::Task, task_id.as_str()))?;
    Ok(json!(task))
}

/// Kills the task's window, clears its binding, and drops it back to `todo`
/// so it is eligible for another `startTask` call.
async fn stop_task(state: &Arc<AppState>, params: Value) -> Result<Value, RouteError> {
    let p: IdParam = parse_params(params)?;
    let task_id: TaskId = p.id.into();
    let mut task = state
        .store
        .get_task(&task_id)
        .ok_or_else(|| ApiError::not_found(EntityKind::Task, task_id.as_str()))?;

    if let Some(binding) = task.binding.take() {
        let target = format!("{}:{}.{}", binding.session_name, binding.window_index, binding.pane_index);
        let _ = state.driver.kill_window(&target).await;
    }
    let now = state.clock.epoch_ms();
    task.record_status_change(TaskStatus::Pending, KanbanColumn::Todo, now);
    state.store.save_task(task.clone());
    Ok(json!(task))
}

async fn restart_task(state: &Arc<AppState>, params: Value) -> Result<Value, RouteError> {
    let p: IdParam = parse_params(params)?;
    stop_task(state, json!({"id": p.id.clone()})).await?;
    start_task_rpc(state, json!({"id": p.id})).await
}

async fn start_bundle(state: &Arc<AppState>, params: Value) -> Result<Value, RouteError> {
    start_task_rpc(state, params).await
}

/// Manual trigger of what the auto-close monitor does on a timer: capture,
/// append a heuristic summary, kill the window, clear the binding.
async fn close_task_window(state: &Arc<AppState>, params: Value) -> Result<Value, RouteError> {
    let p: IdParam = parse_params(params)?;
    let task_id: TaskId = p.id.into();
    let mut task = state
        .store
        .get_task(&task_id)
        .ok_or_else(|| ApiError::not_found(EntityKind::Task, task_id.as_str()))?;

    let Some(binding) = task.binding.take() else {
        return Ok(json!(task));
    };
    let target = format!("{}:{}.{}", binding.session_name, binding.window_index, binding.pane_index);
    let capture = state.driver.capture_pane_content(&target, 500).await.unwrap_or_default();
    let summary = swimlane_engine::summarize(&capture);
    task.input = format!("{}\n\n**Session Summary**\n{}", task.input, summary);
    let _ = state.driver.kill_window(&target).await;
    state.store.save_task(task.clone());
    Ok(json!(task))
}

async fn cleanup_worktree(state: &Arc<AppState>, params: Value) -> Result<Value, RouteError> {
    let p: IdParam = parse_params(params)?;
    let task_id: TaskId = p.id.into();
    let mut task = state
        .store
        .get_task(&task_id)
        .ok_or_else(|| ApiError::not_found(EntityKind::Task, task_id.as_str()))?;

    if let Some(path) = task.worktree_path.take() {
        let command = format!(
            "git worktree remove --force {}",
            swimlane_adapters::quote_shell_arg(&path.display().to_string())
        );
        let _ = state.driver.exec_command(&command).await;
        state.store.save_task(task.clone());
    }
    Ok(json!(task))
}
