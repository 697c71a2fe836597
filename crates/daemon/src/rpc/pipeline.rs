// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pipeline.*` (spec §6). The DAG execution engine itself is out of scope
//! (spec §1) — `run`/`pause`/`resume`/`cancel` only move a
//! [`PipelineRun`]'s status/stage bookkeeping, they never dispatch stage
//! tasks or evaluate stage ordering.

use crate::rpc::{parse_params, RouteError};
use crate::state::AppState;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use swimlane_core::{ApiError, EntityKind, Pipeline, PipelineRun, PipelineRunStatus};

pub async fn dispatch(state: &Arc<AppState>, method: &str, params: Value) -> Result<Value, RouteError> {
    match method {
        "list" => list(state).await,
        "create" => create(state, params).await,
        "run" => run(state, params).await,
        "getStatus" => get_status(state, params).await,
        "getActive" => get_active(state).await,
        "pause" => set_status(state, params, PipelineRunStatus::Paused).await,
        "resume" => set_status(state, params, PipelineRunStatus::Running).await,
        "cancel" => set_status(state, params, PipelineRunStatus::Cancelled).await,
        _ => Err(RouteError::NotFound),
    }
}

async fn list(state: &Arc<AppState>) -> Result<Value, RouteError> {
    Ok(json!(state.store.list_pipelines()))
}

#[derive(Deserialize)]
struct CreateParams {
    name: String,
}

async fn create(state: &Arc<AppState>, params: Value) -> Result<Value, RouteError> {
    let p: CreateParams = parse_params(params)?;
    let now = state.clock.epoch_ms();
    let pipeline = Pipeline::new(p.name, now);
    state.store.save_pipeline(pipeline.clone());
    Ok(json!(pipeline))
}

#[derive(Deserialize)]
struct RunParams {
    #[serde(rename = "pipelineId")]
    pipeline_id: String,
}

async fn run(state: &Arc<AppState>, params: Value) -> Result<Value, RouteError> {
    let p: RunParams = parse_params(params)?;
    let pipeline_id = p.pipeline_id.into();
    state
        .store
        .get_pipeline(&pipeline_id)
        .ok_or_else(|| ApiError::not_found(EntityKind::Pipeline, pipeline_id.as_str()))?;
    let now = state.clock.epoch_ms();
    let run = PipelineRun::new(pipeline_id, now);
    state.store.save_pipeline_run(run.clone());
    Ok(json!(run))
}

#[derive(Deserialize)]
struct IdParam {
    id: String,
}

async fn get_status(state: &Arc<AppState>, params: Value) -> Result<Value, RouteError> {
    let p: IdParam = parse_params(params)?;
    let run = state
        .store
        .get_pipeline_run(&p.id.clone().into())
        .ok_or_else(|| ApiError::not_found(EntityKind::PipelineRun, &p.id))?;
    Ok(json!(run))
}

async fn get_active(state: &Arc<AppState>) -> Result<Value, RouteError> {
    Ok(json!(state.store.active_pipeline_runs()))
}

async fn set_status(state: &Arc<AppState>, params: Value, status: PipelineRunStatus) -> Result<Value, RouteError> {
    let p: IdParam = parse_params(params)?;
    let mut run = state
        .store
        .get_pipeline_run(&p.id.clone().into())
        .ok_or_else(|| ApiError::not_found(EntityKind::PipelineRun, &p.id))?;
    run.status = status;
    if matches!(status, PipelineRunStatus::Completed | PipelineRunStatus::Failed | PipelineRunStatus::Cancelled) {
        run.finished_at = Some(state.clock.epoch_ms());
    }
    state.store.save_pipeline_run(run.clone());
    Ok(json!(run))
}
