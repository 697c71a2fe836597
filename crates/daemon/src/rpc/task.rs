// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `task.*` (spec §6). `move` into `InProgress` delegates to the same
//! launcher call `kanban.startTask` uses rather than re-implementing the
//! launch sequence (spec §4.9 rule 1); `update` whitelists fields (rule 2).

use crate::rpc::{kanban, parse_params, RouteError};
use crate::state::AppState;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use swimlane_core::{ApiError, EntityKind, KanbanColumn, Provider, Task, TaskId, TaskStatus, TaskToggles};

pub async fn dispatch(state: &Arc<AppState>, method: &str, params: Value) -> Result<Value, RouteError> {
    match method {
        "list" => list(state, params).await,
        "get" => get(state, params).await,
        "submit" => submit(state, params).await,
        "move" => move_task(state, params).await,
        "cancel" => cancel(state, params).await,
        "delete" => delete(state, params).await,
        "update" => update(state, params).await,
        "save" => save(state, params).await,
        "getOutput" => get_output(state, params).await,
        _ => Err(RouteError::NotFound),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LaneFilter {
    lane_id: Option<String>,
}

async fn list(state: &Arc<AppState>, params: Value) -> Result<Value, RouteError> {
    let filter: LaneFilter = parse_params(params)?;
    let tasks = match filter.lane_id {
        Some(lane_id) => state.store.tasks_in_lane(&lane_id.into()),
        None => state.store.list_tasks(),
    };
    Ok(json!(tasks))
}

#[derive(Deserialize)]
struct IdParam {
    id: String,
}

async fn get(state: &Arc<AppState>, params: Value) -> Result<Value, RouteError> {
    let p: IdParam = parse_params(params)?;
    let task = state
        .store
        .get_task(&p.id.clone().into())
        .ok_or_else(|| ApiError::not_found(EntityKind::Task, &p.id))?;
    Ok(json!(task))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitParams {
    description: String,
    input: String,
    swim_lane_id: Option<String>,
    priority: Option<i32>,
    target_role: Option<String>,
    tags: Option<Vec<String>>,
    toggles: Option<TaskToggles>,
    ai_provider: Option<Provider>,
    ai_model: Option<String>,
    depends_on: Option<Vec<String>>,
    parent_task_id: Option<String>,
}

/// Queues a new task; does not launch it (spec §4.4's nine-step sequence
/// only runs from `startTask`/`startBundle`, never implicitly on submit).
async fn submit(state: &Arc<AppState>, params: Value) -> Result<Value, RouteError> {
    let p: SubmitParams = parse_params(params)?;
    let now = state.clock.epoch_ms();
    let mut task = Task::new(p.description, p.input, now);
    task.swim_lane_id = p.swim_lane_id.map(Into::into);
    if let Some(priority) = p.priority {
        task.priority = priority;
    }
    task.target_role = p.target_role;
    task.tags = p.tags.unwrap_or_default();
    task.toggles = p.toggles.unwrap_or_default();
    task.ai_provider = p.ai_provider;
    task.ai_model = p.ai_model;
    task.depends_on = p.depends_on.unwrap_or_default().into_iter().map(Into::into).collect();
    task.parent_task_id = p.parent_task_id.map(Into::into);

    state.orchestrator.submit_task(task.clone());
    state.events.emit(swimlane_core::Event::DbChanged {
        method: "task.submit".to_string(),
    });
    Ok(json!(task))
}

#[derive(Deserialize)]
struct MoveParams {
    id: String,
    column: KanbanColumn,
}

/// Moves a task's kanban column. Entering `inProgress` goes through
/// [`kanban::start_task`]; every other transition is a direct status/column
/// update, matching the shape the launcher itself writes on success.
async fn move_task(state: &Arc<AppState>, params: Value) -> Result<Value, RouteError> {
    let p: MoveParams = parse_params(params)?;
    let task_id: TaskId = p.id.into();

    if p.column == KanbanColumn::InProgress {
        kanban::start_task(state, &task_id).await?;
    } else {
        let mut task = state
            .store
            .get_task(&task_id)
            .ok_or_else(|| ApiError::not_found(EntityKind::Task, task_id.as_str()))?;
        let now = state.clock.epoch_ms();
        let from = task.kanban_column;
        task.record_status_change(task.status, p.column, now);
        state.store.save_task(task);
        state.events.emit(swimlane_core::Event::TaskMoved {
            task_id: task_id.clone(),
            from,
            to: p.column,
        });
    }

    let task = state
        .store
        .get_task(&task_id)
        .ok_or_else(|| ApiError::not_found(EntityKind::Task, task_id.as_str()))?;
    Ok(json!(task))
}

async fn cancel(state: &Arc<AppState>, params: Value) -> Result<Value, RouteError> {
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
    task.record_status_change(TaskStatus::Cancelled, task.kanban_column, now);
    state.store.save_task(task.clone());
    state.orchestrator.cancel_task(&task_id);
    Ok(json!(task))
}

async fn delete(state: &Arc<AppState>, params: Value) -> Result<Value, RouteError> {
    let p: IdParam = parse_params(params)?;
    state.store.delete_task(&p.id.into());
    Ok(json!({"deleted": true}))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateParams {
    id: String,
    description: Option<String>,
    input: Option<String>,
    priority: Option<i32>,
    tags: Option<Vec<String>>,
    target_role: Option<String>,
    ai_provider: Option<Provider>,
    ai_model: Option<String>,
    toggles: Option<TaskToggles>,
    depends_on: Option<Vec<String>>,
    server_override: Option<String>,
    working_directory_override: Option<String>,
}

/// Field-whitelisted partial update (spec §4.9 rule 2) — every field on
/// [`UpdateParams`] is the full allow-list; anything else in the request
/// body is silently ignored by serde rather than rejected, since JSON-RPC
/// params are already a closed shape here.
async fn update(state: &Arc<AppState>, params: Value) -> Result<Value, RouteError> {
    let p: UpdateParams = parse_params(params)?;
    let mut task = state
        .store
        .get_task(&p.id.clone().into())
        .ok_or_else(|| ApiError::not_found(EntityKind::Task, &p.id))?;

    if let Some(v) = p.description {
        task.description = v;
    }
    if let Some(v) = p.input {
        task.input = v;
    }
    if let Some(v) = p.priority {
        task.priority = v;
    }
    if let Some(v) = p.tags {
        task.tags = v;
    }
    if p.target_role.is_some() {
        task.target_role = p.target_role;
    }
    if p.ai_provider.is_some() {
        task.ai_provider = p.ai_provider;
    }
    if p.ai_model.is_some() {
        task.ai_model = p.ai_model;
    }
    if let Some(v) = p.toggles {
        task.toggles = v;
    }
    if let Some(v) = p.depends_on {
        task.depends_on = v.into_iter().map(Into::into).collect();
    }
    if p.server_override.is_some() {
        task.server_override = p.server_override;
    }
    if let Some(v) = p.working_directory_override {
        task.working_directory_override = Some(v.into());
    }

    state.store.save_task(task.clone());
    state.events.emit(swimlane_core::Event::TaskUpdated { task: task.clone() });
    Ok(json!(task))
}

/// Trusted full-object upsert, used by app-internal callers that already
/// hold a complete, valid `Task` (unlike `update`, no field whitelist).
async fn save(state: &Arc<AppState>, params: Value) -> Result<Value, RouteError> {
    let task: Task = parse_params(params)?;
    state.store.save_task(task.clone());
    Ok(json!(task))
}

async fn get_output(state: &Arc<AppState>, params: Value) -> Result<Value, RouteError> {
    let p: IdParam = parse_params(params)?;
    let task = state
        .store
        .get_task(&p.id.clone().into())
        .ok_or_else(|| ApiError::not_found(EntityKind::Task, &p.id))?;

    if let Some(binding) = &task.binding {
        let target = format!("{}:{}.{}", binding.session_name, binding.window_index, binding.pane_index);
        let capture = state.driver.capture_pane_content(&target, 500).await.map_err(ApiError::from)?;
        return Ok(json!({"output": capture}));
    }
    Ok(json!({"output": task.output}))
}
