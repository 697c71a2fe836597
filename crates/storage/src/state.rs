// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory mirror of the persisted image. Every write lands here first
//! and is immediately visible to readers; the sqlite-backed persistence
//! layer trails behind on the debounced flush timer.

use std::collections::HashMap;
use swimlane_core::{
    Agent, AgentId, BackendId, BackendMapping, Lane, LaneId, Pipeline, PipelineId, PipelineRun,
    PipelineRunId, Role, RoleId, Runtime, RuntimeId, SyncError, Task, TaskId, Team, TeamId,
};

#[derive(Debug, Default)]
pub struct MaterializedState {
    pub lanes: HashMap<LaneId, Lane>,
    pub tasks: HashMap<TaskId, Task>,
    pub agents: HashMap<AgentId, Agent>,
    pub teams: HashMap<TeamId, Team>,
    pub pipelines: HashMap<PipelineId, Pipeline>,
    pub pipeline_runs: HashMap<PipelineRunId, PipelineRun>,
    pub roles: HashMap<RoleId, Role>,
    pub backends: HashMap<BackendId, BackendMapping>,
    pub sync_errors: Vec<SyncError>,
    pub runtimes: HashMap<RuntimeId, Runtime>,
}

impl MaterializedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_lane(&mut self, lane: Lane) {
        self.lanes.insert(lane.id.clone(), lane);
    }

    pub fn get_lane(&self, id: &LaneId) -> Option<&Lane> {
        self.lanes.get(id)
    }

    pub fn delete_lane(&mut self, id: &LaneId) -> Option<Lane> {
        self.lanes.remove(id)
    }

    pub fn list_lanes(&self) -> Vec<&Lane> {
        self.lanes.values().collect()
    }

    pub fn save_task(&mut self, task: Task) {
        self.tasks.insert(task.id.clone(), task);
    }

    pub fn get_task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.get(id)
    }

    /// Cascades to status history, comments, tags, subtask edges, and
    /// dependency edges by virtue of deleting the single owning record —
    /// those collections live inline on `Task`, so there is nothing else
    /// in the in-memory mirror to clean up. The persistence layer performs
    /// the equivalent cascade against the normalized join tables.
    pub fn delete_task(&mut self, id: &TaskId) -> Option<Task> {
        for task in self.tasks.values_mut() {
            task.subtask_ids.retain(|t| t != id);
            task.depends_on.retain(|t| t != id);
        }
        self.tasks.remove(id)
    }

    pub fn list_tasks(&self) -> Vec<&Task> {
        self.tasks.values().collect()
    }

    pub fn tasks_in_lane(&self, lane_id: &LaneId) -> Vec<&Task> {
        self.tasks
            .values()
            .filter(|t| t.swim_lane_id.as_ref() == Some(lane_id))
            .collect()
    }

    pub fn save_agent(&mut self, agent: Agent) {
        self.agents.insert(agent.id.clone(), agent);
    }

    pub fn get_agent(&self, id: &AgentId) -> Option<&Agent> {
        self.agents.get(id)
    }

    pub fn delete_agent(&mut self, id: &AgentId) -> Option<Agent> {
        self.agents.remove(id)
    }

    pub fn list_agents(&self) -> Vec<&Agent> {
        self.agents.values().collect()
    }

    pub fn save_team(&mut self, team: Team) {
        self.teams.insert(team.id.clone(), team);
    }

    pub fn get_team(&self, id: &TeamId) -> Option<&Team> {
        self.teams.get(id)
    }

    pub fn delete_team(&mut self, id: &TeamId) -> Option<Team> {
        self.teams.remove(id)
    }

    pub fn list_teams(&self) -> Vec<&Team> {
        self.teams.values().collect()
    }

    pub fn save_pipeline(&mut self, pipeline: Pipeline) {
        self.pipelines.insert(pipeline.id.clone(), pipeline);
    }

    pub fn get_pipeline(&self, id: &PipelineId) -> Option<&Pipeline> {
        self.pipelines.get(id)
    }

    pub fn delete_pipeline(&mut self, id: &PipelineId) -> Option<Pipeline> {
        self.pipelines.remove(id)
    }

    pub fn list_pipelines(&self) -> Vec<&Pipeline> {
        self.pipelines.values().collect()
    }

    pub fn save_pipeline_run(&mut self, run: PipelineRun) {
        self.pipeline_runs.insert(run.id.clone(), run);
    }

    pub fn get_pipeline_run(&self, id: &PipelineRunId) -> Option<&PipelineRun> {
        self.pipeline_runs.get(id)
    }

    pub fn active_pipeline_runs(&self) -> Vec<&PipelineRun> {
        self.pipeline_runs
            .values()
            .filter(|r| r.status == swimlane_core::PipelineRunStatus::Running)
            .collect()
    }

    pub fn save_role(&mut self, role: Role) {
        self.roles.insert(role.id.clone(), role);
    }

    pub fn get_role(&self, id: &RoleId) -> Option<&Role> {
        self.roles.get(id)
    }

    pub fn delete_role(&mut self, id: &RoleId) -> Option<Role> {
        self.roles.remove(id)
    }

    pub fn list_roles(&self) -> Vec<&Role> {
        self.roles.values().collect()
    }

    pub fn save_backend(&mut self, backend: BackendMapping) {
        self.backends.insert(backend.id.clone(), backend);
    }

    pub fn get_backend(&self, id: &BackendId) -> Option<&BackendMapping> {
        self.backends.get(id)
    }

    pub fn delete_backend(&mut self, id: &BackendId) -> Option<BackendMapping> {
        self.backends.remove(id)
    }

    pub fn list_backends(&self) -> Vec<&BackendMapping> {
        self.backends.values().collect()
    }

    pub fn log_sync_error(&mut self, err: SyncError) {
        self.sync_errors.push(err);
    }

    pub fn sync_errors_for(&self, backend_id: &BackendId) -> Vec<&SyncError> {
        self.sync_errors
            .iter()
            .filter(|e| &e.backend_id == backend_id)
            .collect()
    }

    pub fn save_runtime(&mut self, runtime: Runtime) {
        self.runtimes.insert(runtime.id.clone(), runtime);
    }

    pub fn get_runtime(&self, id: &RuntimeId) -> Option<&Runtime> {
        self.runtimes.get(id)
    }

    pub fn delete_runtime(&mut self, id: &RuntimeId) -> Option<Runtime> {
        self.runtimes.remove(id)
    }

    pub fn list_runtimes(&self) -> Vec<&Runtime> {
        self.runtimes.values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_save_get_task() {
        let mut state = MaterializedState::new();
        let task = Task::new("hi", "body", 0);
        let id = task.id.clone();
        state.save_task(task.clone());
        assert_eq!(state.get_task(&id).unwrap().description, "hi");
    }

    #[test]
    fn delete_task_removes_it_from_other_tasks_edges() {
        let mut state = MaterializedState::new();
        let mut a = Task::new("a", "", 0);
        let b = Task::new("b", "", 0);
        a.depends_on.push(b.id.clone());
        let a_id = a.id.clone();
        let b_id = b.id.clone();
        state.save_task(a);
        state.save_task(b);
        state.delete_task(&b_id);
        assert!(state.get_task(&a_id).unwrap().depends_on.is_empty());
        assert!(state.get_task(&b_id).is_none());
    }
}
