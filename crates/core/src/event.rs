// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event bus payload types (spec §2, §6). The bus itself (a broadcast
//! channel wrapper) lives in `swimlane-daemon::event_bus`; these are the
//! typed payloads it carries so every publisher and subscriber agrees on
//! shape without round-tripping through `serde_json::Value`.

use crate::agent::AgentId;
use crate::lane::LaneId;
use crate::task::{KanbanColumn, Task, TaskId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum Event {
    #[serde(rename = "task.started")]
    TaskStarted { task: Task },
    #[serde(rename = "task.moved")]
    TaskMoved {
        task_id: TaskId,
        from: KanbanColumn,
        to: KanbanColumn,
    },
    #[serde(rename = "task.updated")]
    TaskUpdated { task: Task },
    #[serde(rename = "task.completed")]
    TaskCompleted { task_id: TaskId },
    #[serde(rename = "db.changed")]
    DbChanged { method: String },
    #[serde(rename = "info")]
    Info { message: String },
    #[serde(rename = "warning")]
    Warning { message: String },
    #[serde(rename = "error")]
    Error { message: String },
    #[serde(rename = "agent.stateChanged")]
    AgentStateChanged {
        agent_id: AgentId,
        state: crate::agent::AgentState,
    },
    #[serde(rename = "lane.sessionChanged")]
    LaneSessionChanged { lane_id: LaneId, active: bool },
}

impl Event {
    /// The flat name used on the `GET /events` SSE channel (spec §6).
    pub fn name(&self) -> &'static str {
        match self {
            Event::TaskStarted { .. } => "task.started",
            Event::TaskMoved { .. } => "task.moved",
            Event::TaskUpdated { .. } => "task.updated",
            Event::TaskCompleted { .. } => "task.completed",
            Event::DbChanged { .. } => "db.changed",
            Event::Info { .. } => "info",
            Event::Warning { .. } => "warning",
            Event::Error { .. } => "error",
            Event::AgentStateChanged { .. } => "agent.stateChanged",
            Event::LaneSessionChanged { .. } => "lane.sessionChanged",
        }
    }
}
