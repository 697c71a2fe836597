// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task entity and its lifecycle types (spec §3).

use crate::agent::AgentId;
use crate::define_id;
use crate::id::random_id;
use crate::lane::LaneId;
use crate::provider::Provider;
use crate::toggle::TaskToggles;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

define_id! {
    /// Opaque unique task identifier.
    pub struct TaskId;
}

impl TaskId {
    pub fn generate() -> Self {
        Self(random_id("task-"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Assigned,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KanbanColumn {
    Backlog,
    Todo,
    InProgress,
    InReview,
    Done,
}

/// The quadruple that links a task to a live multiplexer window.
///
/// Modeled as a single optional struct rather than four independent
/// optional fields so invariant 2 (all-set-or-all-unset) is structural
/// instead of checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TmuxBinding {
    pub server_id: String,
    pub session_name: String,
    pub window_index: u32,
    pub pane_index: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub body: String,
    pub created_at: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusHistoryEntry {
    pub task_id: TaskId,
    pub from_status: Option<TaskStatus>,
    pub to_status: TaskStatus,
    pub from_column: Option<KanbanColumn>,
    pub to_column: KanbanColumn,
    pub changed_at: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub description: String,
    pub input: String,
    pub status: TaskStatus,
    pub kanban_column: KanbanColumn,
    /// 1-10, lower = earlier.
    pub priority: i32,
    pub created_at: u64,
    pub started_at: Option<u64>,
    pub completed_at: Option<u64>,
    /// Set exactly when entering `done` with a binding still populated.
    pub done_at: Option<u64>,
    pub error_message: Option<String>,
    pub output: Option<String>,
    pub target_role: Option<String>,
    pub assigned_agent_id: Option<AgentId>,
    pub swim_lane_id: Option<LaneId>,
    pub parent_task_id: Option<TaskId>,
    pub subtask_ids: Vec<TaskId>,
    pub depends_on: Vec<TaskId>,
    pub tags: Vec<String>,
    pub comments: Vec<Comment>,
    pub status_history: Vec<StatusHistoryEntry>,
    pub toggles: TaskToggles,
    pub ai_provider: Option<Provider>,
    pub ai_model: Option<String>,
    pub server_override: Option<String>,
    pub working_directory_override: Option<PathBuf>,
    pub binding: Option<TmuxBinding>,
    pub worktree_path: Option<PathBuf>,
}

impl Task {
    pub fn new(description: impl Into<String>, input: impl Into<String>, created_at: u64) -> Self {
        Self {
            id: TaskId::generate(),
            description: description.into(),
            input: input.into(),
            status: TaskStatus::Pending,
            kanban_column: KanbanColumn::Backlog,
            priority: 5,
            created_at,
            started_at: None,
            completed_at: None,
            done_at: None,
            error_message: None,
            output: None,
            target_role: None,
            assigned_agent_id: None,
            swim_lane_id: None,
            parent_task_id: None,
            subtask_ids: Vec::new(),
            depends_on: Vec::new(),
            tags: Vec::new(),
            comments: Vec::new(),
            status_history: Vec::new(),
            toggles: TaskToggles::default(),
            ai_provider: None,
            ai_model: None,
            server_override: None,
            working_directory_override: None,
            binding: None,
            worktree_path: None,
        }
    }

    /// Derive the completion-signal id: last 8 characters of the task id.
    pub fn signal_id(&self) -> &str {
        self.id.suffix(8)
    }

    /// The `"{first4OfDescription}-{first15OfId}"` task window naming convention.
    pub fn window_name(&self) -> String {
        use crate::id::ShortId;
        let desc_prefix: String = self.description.chars().take(4).collect();
        format!("{desc_prefix}-{}", self.id.as_str().short(15))
    }

    pub fn record_status_change(
        &mut self,
        to_status: TaskStatus,
        to_column: KanbanColumn,
        changed_at: u64,
    ) {
        self.status_history.push(StatusHistoryEntry {
            task_id: self.id.clone(),
            from_status: Some(self.status),
            to_status,
            from_column: Some(self.kanban_column),
            to_column,
            changed_at,
        });
        self.status = to_status;
        let was_done = self.kanban_column == KanbanColumn::Done;
        self.kanban_column = to_column;
        if to_column == KanbanColumn::Done && !was_done {
            self.done_at = Some(changed_at);
        } else if to_column != KanbanColumn::Done && was_done {
            self.done_at = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_name_uses_first_four_chars_and_first_fifteen_of_id() {
        let mut task = Task::new("hello world", "", 0);
        task.id = TaskId::new("task-0123456789012345678901234567890");
        assert_eq!(task.window_name(), "hell-task-0123456789");
    }

    #[test]
    fn signal_id_is_last_eight_chars() {
        let mut task = Task::new("x", "", 0);
        task.id = TaskId::new("task-0000000000000000abcd1234");
        assert_eq!(task.signal_id(), "abcd1234");
    }

    #[test]
    fn short_description_does_not_panic() {
        let task = Task::new("hi", "", 0);
        assert!(task.window_name().starts_with("hi-"));
    }

    #[test]
    fn record_status_change_sets_done_at_on_entering_done() {
        let mut task = Task::new("x", "", 0);
        assert!(task.done_at.is_none());
        task.record_status_change(TaskStatus::Completed, KanbanColumn::Done, 100);
        assert_eq!(task.done_at, Some(100));
    }

    #[test]
    fn record_status_change_clears_done_at_on_leaving_done() {
        let mut task = Task::new("x", "", 0);
        task.record_status_change(TaskStatus::Completed, KanbanColumn::Done, 100);
        task.record_status_change(TaskStatus::Pending, KanbanColumn::Todo, 200);
        assert!(task.done_at.is_none());
    }

    #[test]
    fn record_status_change_leaves_done_at_unchanged_within_done() {
        let mut task = Task::new("x", "", 0);
        task.record_status_change(TaskStatus::Completed, KanbanColumn::Done, 100);
        task.record_status_change(TaskStatus::Completed, KanbanColumn::Done, 150);
        assert_eq!(task.done_at, Some(100));
    }
}
