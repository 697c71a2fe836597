// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline entity — peripheral to core scheduling (spec §1 explicitly
//! places the DAG engine itself out of scope). These types back the
//! `pipeline` RPC namespace's CRUD and status surface only.

use crate::define_id;
use crate::id::random_id;
use crate::task::TaskId;
use serde::{Deserialize, Serialize};

define_id! {
    /// Opaque unique pipeline identifier.
    pub struct PipelineId;
}

impl PipelineId {
    pub fn generate() -> Self {
        Self(random_id("pipeline-"))
    }
}

define_id! {
    /// Opaque unique pipeline-run identifier.
    pub struct PipelineRunId;
}

impl PipelineRunId {
    pub fn generate() -> Self {
        Self(random_id("run-"))
    }
}

/// A single stage; stages reference the tasks they spawn once a run starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStage {
    pub name: String,
    pub task_ids: Vec<TaskId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    pub id: PipelineId,
    pub name: String,
    pub stages: Vec<PipelineStage>,
    pub created_at: u64,
}

impl Pipeline {
    pub fn new(name: impl Into<String>, created_at: u64) -> Self {
        Self {
            id: PipelineId::generate(),
            name: name.into(),
            stages: Vec::new(),
            created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineRunStatus {
    Running,
    Paused,
    Completed,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRun {
    pub id: PipelineRunId,
    pub pipeline_id: PipelineId,
    pub status: PipelineRunStatus,
    pub current_stage: usize,
    pub started_at: u64,
    pub finished_at: Option<u64>,
}

impl PipelineRun {
    pub fn new(pipeline_id: PipelineId, started_at: u64) -> Self {
        Self {
            id: PipelineRunId::generate(),
            pipeline_id,
            status: PipelineRunStatus::Running,
            current_stage: 0,
            started_at,
            finished_at: None,
        }
    }
}
