// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The orchestrator (spec §4.6): an in-memory index of live agents and a
//! priority-ordered task queue, mirroring the store as the authoritative
//! source of truth.

use parking_lot::Mutex;
use std::sync::Arc;
use swimlane_core::{Agent, AgentId, AgentState, Clock, Task, TaskId, TaskStatus};
use swimlane_storage::Store;

struct QueueEntry {
    task_id: TaskId,
    priority: i32,
    seq: u64,
}

/// In-memory task queue plus agent-state transition logic (spec §4.6).
pub struct Orchestrator<C: Clock> {
    store: Arc<Store>,
    clock: C,
    queue: Mutex<Vec<QueueEntry>>,
    next_seq: Mutex<u64>,
}

impl<C: Clock> Orchestrator<C> {
    pub fn new(store: Arc<Store>, clock: C) -> Self {
        Self {
            store,
            clock,
            queue: Mutex::new(Vec::new()),
            next_seq: Mutex::new(0),
        }
    }

    pub fn register_agent(&self, agent: Agent) {
        self.store.save_agent(agent);
    }

    /// Marks the agent `terminated` rather than deleting its record, so its
    /// history remains queryable.
    pub fn remove_agent(&self, id: &AgentId) {
        if let Some(mut agent) = self.store.get_agent(id) {
            agent.state = AgentState::Terminated;
            agent.last_activity_at = self.clock.epoch_ms();
            self.store.save_agent(agent);
        }
    }

    /// Inserts `task` into the priority queue (lower `priority` integer
    /// first; insertion order is the tie-break) and persists it.
    pub fn submit_task(&self, task: Task) {
        let task_id = task.id.clone();
        let priority = task.priority;
        self.store.save_task(task);

        let seq = {
            let mut next = self.next_seq.lock();
            let seq = *next;
            *next += 1;
            seq
        };
        let mut queue = self.queue.lock();
        queue.push(QueueEntry { task_id, priority, seq });
        queue.sort_by(|a, b| a.priority.cmp(&b.priority).then(a.seq.cmp(&b.seq)));
    }

    /// Task ids in queue order (lowest priority integer, then insertion
    /// order).
    pub fn queued_task_ids(&self) -> Vec<TaskId> {
        self.queue.lock().iter().map(|e| e.task_id.clone()).collect()
    }

    pub fn cancel_task(&self, id: &TaskId) {
        self.queue.lock().retain(|e| &e.task_id != id);
        if let Some(mut task) = self.store.get_task(id) {
            let now = self.clock.epoch_ms();
            task.record_status_change(TaskStatus::Cancelled, task.kanban_column, now);
            self.store.save_task(task);
        }
    }

    /// Updates an agent's state. A transition `-> idle` while the agent had
    /// a `currentTaskId` marks that task completed and clears the agent's
    /// current task (spec §3 lifecycle, §4.6).
    pub fn update_agent_state(&self, id: &AgentId, new_state: AgentState, error_message: Option<String>) {
        let Some(mut agent) = self.store.get_agent(id) else {
            return;
        };
        let now = self.clock.epoch_ms();
        let prior_task = agent.current_task_id.clone();
        agent.state = new_state;
        agent.error_message = error_message;
        agent.last_activity_at = now;

        if new_state == AgentState::Idle {
            if let Some(task_id) = prior_task.take() {
                if let Some(mut task) = self.store.get_task(&task_id) {
                    task.completed_at = Some(now);
                    task.record_status_change(TaskStatus::Completed, task.kanban_column, now);
                    self.store.save_task(task);
                }
                agent.current_task_id = None;
            }
        }
        self.store.save_agent(agent);
    }

    pub fn idle_agents(&self, role: Option<&str>) -> Vec<Agent> {
        self.store
            .list_agents()
            .into_iter()
            .filter(|a| a.state == AgentState::Idle)
            .filter(|a| role.map(|r| a.role == r).unwrap_or(true))
            .collect()
    }

    pub fn agents_by_role(&self, role: &str) -> Vec<Agent> {
        self.store.list_agents().into_iter().filter(|a| a.role == role).collect()
    }

    pub fn agents_by_team(&self, team_id: &swimlane_core::TeamId) -> Vec<Agent> {
        self.store
            .list_agents()
            .into_iter()
            .filter(|a| a.team_id.as_ref() == Some(team_id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swimlane_core::{FakeClock, Provider};

    async fn orchestrator() -> Orchestrator<FakeClock> {
        let store = Arc::new(Store::open_in_memory().await);
        Orchestrator::new(store, FakeClock::new())
    }

    #[tokio::test]
    async fn submit_task_orders_by_priority_then_insertion() {
        let orch = orchestrator().await;
        let mut a = Task::new("a", "", 0);
        a.priority = 8;
        let mut b = Task::new("b", "", 0);
        b.priority = 3;
        let mut c = Task::new("c", "", 0);
        c.priority = 8;
        let (a_id, b_id, c_id) = (a.id.clone(), b.id.clone(), c.id.clone());
        orch.submit_task(a);
        orch.submit_task(b);
        orch.submit_task(c);
        assert_eq!(orch.queued_task_ids(), vec![b_id, a_id, c_id]);
    }

    #[tokio::test]
    async fn cancel_task_removes_from_queue_and_marks_cancelled() {
        let orch = orchestrator().await;
        let task = Task::new("x", "", 0);
        let id = task.id.clone();
        orch.submit_task(task);
        orch.cancel_task(&id);
        assert!(orch.queued_task_ids().is_empty());
        assert_eq!(orch.store.get_task(&id).unwrap().status, TaskStatus::Cancelled);
    }

    #[tokio::test]
    async fn idle_transition_completes_current_task_and_clears_it() {
        let orch = orchestrator().await;
        let task = Task::new("x", "", 0);
        let task_id = task.id.clone();
        orch.store.save_task(task);

        let mut agent = Agent::new("a1", "coder", Provider::Claude, 0);
        agent.current_task_id = Some(task_id.clone());
        agent.state = AgentState::Working;
        let agent_id = agent.id.clone();
        orch.store.save_agent(agent);

        orch.update_agent_state(&agent_id, AgentState::Idle, None);

        let agent = orch.store.get_agent(&agent_id).unwrap();
        assert!(agent.current_task_id.is_none());
        assert_eq!(agent.state, AgentState::Idle);
        assert_eq!(orch.store.get_task(&task_id).unwrap().status, TaskStatus::Completed);
    }

    #[tokio::test]
    async fn idle_agents_filters_by_role() {
        let orch = orchestrator().await;
        let mut a1 = Agent::new("a1", "coder", Provider::Claude, 0);
        a1.state = AgentState::Idle;
        let mut a2 = Agent::new("a2", "reviewer", Provider::Claude, 0);
        a2.state = AgentState::Idle;
        orch.store.save_agent(a1);
        orch.store.save_agent(a2);
        assert_eq!(orch.idle_agents(Some("coder")).len(), 1);
        assert_eq!(orch.idle_agents(None).len(), 2);
    }
}
