// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The public store API (spec §4.1): synchronous-feeling accessors backed
//! by an in-memory mirror, with writes trailing to sqlite on a debounced
//! ~500 ms timer.

use crate::persist::SqlitePersistence;
use crate::state::MaterializedState;
use parking_lot::RwLock;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use swimlane_core::{
    Agent, AgentId, BackendId, BackendMapping, Lane, LaneId, Pipeline, PipelineId, PipelineRun,
    PipelineRunId, Role, RoleId, Runtime, RuntimeId, SyncError, Task, TaskId, Team, TeamId,
};
use tokio::sync::Notify;
use tracing::{error, warn};

const FLUSH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Single-writer, single-reader embedded store (spec §4.1).
///
/// Reads never touch disk — they are served from `state`. Writes update
/// `state` immediately and enqueue a sqlite write that the background
/// flush loop applies after the debounce window settles.
pub struct Store {
    state: Arc<RwLock<MaterializedState>>,
    persistence: Arc<SqlitePersistence>,
    dirty: Arc<Notify>,
    closing: Arc<AtomicBool>,
    pending: Arc<RwLock<Vec<PendingWrite>>>,
}

enum PendingWrite {
    Lane(Lane),
    DeleteLane(LaneId),
    Task(Task),
    DeleteTask(TaskId),
    Agent(Agent),
    DeleteAgent(AgentId),
    Team(Team),
    Pipeline(Pipeline),
    PipelineRun(PipelineRun),
    Role(Role),
    Backend(BackendMapping),
    SyncError(SyncError),
    Runtime(Runtime),
    DeleteRuntime(RuntimeId),
}

impl Store {
    /// Opens (or creates) the store at `path`. On disk-read failure at
    /// open time, falls back to an empty in-memory image rather than
    /// failing the daemon (spec §4.1 failure semantics).
    pub async fn open(path: impl AsRef<Path>) -> Self {
        let persistence = match SqlitePersistence::open(path.as_ref()).await {
            Ok(p) => p,
            Err(err) => {
                error!(error = %err, path = %path.as_ref().display(), "failed to open store, falling back to empty in-memory image");
                // `open_in_memory` only fails if sqlite itself cannot allocate a
                // connection, which would also doom the fallback; propagate as a
                // last resort by constructing an empty, unwritable persistence.
                SqlitePersistence::open_in_memory()
                    .await
                    .unwrap_or_else(|e| panic!("cannot open even an in-memory sqlite db: {e}"))
            }
        };

        let state = match persistence.load_all().await {
            Ok(s) => s,
            Err(err) => {
                error!(error = %err, "failed to load store image, starting empty");
                MaterializedState::new()
            }
        };

        Self::with_parts(state, persistence)
    }

    pub async fn open_in_memory() -> Self {
        let persistence = SqlitePersistence::open_in_memory()
            .await
            .unwrap_or_else(|e| panic!("cannot open in-memory sqlite db: {e}"));
        Self::with_parts(MaterializedState::new(), persistence)
    }

    fn with_parts(state: MaterializedState, persistence: SqlitePersistence) -> Self {
        let store = Self {
            state: Arc::new(RwLock::new(state)),
            persistence: Arc::new(persistence),
            dirty: Arc::new(Notify::new()),
            closing: Arc::new(AtomicBool::new(false)),
            pending: Arc::new(RwLock::new(Vec::new())),
        };
        store.spawn_flush_loop();
        store
    }

    fn spawn_flush_loop(&self) {
        let dirty = self.dirty.clone();
        let pending = self.pending.clone();
        let persistence = self.persistence.clone();
        let closing = self.closing.clone();
        tokio::spawn(async move {
            loop {
                dirty.notified().await;
                if closing.load(Ordering::Acquire) {
                    break;
                }
                loop {
                    tokio::select! {
                        _ = tokio::time::sleep(FLUSH_DEBOUNCE) => break,
                        _ = dirty.notified() => continue,
                    }
                }
                flush_pending(&pending, &persistence).await;
                if closing.load(Ordering::Acquire) {
                    break;
                }
            }
        });
    }

    fn enqueue(&self, write: PendingWrite) {
        self.pending.write().push(write);
        self.dirty.notify_one();
    }

    /// Synchronously flushes every pending write. Called on graceful
    /// shutdown so the on-disk image matches the in-memory one exactly.
    pub async fn flush_now(&self) {
        self.closing.store(true, Ordering::Release);
        flush_pending(&self.pending, &self.persistence).await;
        self.dirty.notify_one();
    }

    // -- lanes ---------------------------------------------------------

    pub fn save_lane(&self, lane: Lane) {
        self.state.write().save_lane(lane.clone());
        self.enqueue(PendingWrite::Lane(lane));
    }

    pub fn get_lane(&self, id: &LaneId) -> Option<Lane> {
        self.state.read().get_lane(id).cloned()
    }

    pub fn list_lanes(&self) -> Vec<Lane> {
        self.state.read().list_lanes().into_iter().cloned().collect()
    }

    pub fn delete_lane(&self, id: &LaneId) {
        self.state.write().delete_lane(id);
        self.enqueue(PendingWrite::DeleteLane(id.clone()));
    }

    // -- tasks -----------------------------------------------------------

    pub fn save_task(&self, task: Task) {
        self.state.write().save_task(task.clone());
        self.enqueue(PendingWrite::Task(task));
    }

    pub fn get_task(&self, id: &TaskId) -> Option<Task> {
        self.state.read().get_task(id).cloned()
    }

    pub fn list_tasks(&self) -> Vec<Task> {
        self.state.read().list_tasks().into_iter().cloned().collect()
    }

    pub fn tasks_in_lane(&self, lane_id: &LaneId) -> Vec<Task> {
        self.state.read().tasks_in_lane(lane_id).into_iter().cloned().collect()
    }

    pub fn delete_task(&self, id: &TaskId) {
        self.state.write().delete_task(id);
        self.enqueue(PendingWrite::DeleteTask(id.clone()));
    }

    // -- agents ----------------------------------------------------------

    pub fn save_agent(&self, agent: Agent) {
        self.state.write().save_agent(agent.clone());
        self.enqueue(PendingWrite::Agent(agent));
    }

    pub fn get_agent(&self, id: &AgentId) -> Option<Agent> {
        self.state.read().get_agent(id).cloned()
    }

    pub fn list_agents(&self) -> Vec<Agent> {
        self.state.read().list_agents().into_iter().cloned().collect()
    }

    pub fn delete_agent(&self, id: &AgentId) {
        self.state.write().delete_agent(id);
        self.enqueue(PendingWrite::DeleteAgent(id.clone()));
    }

    // -- teams -------------------------------------------------------------

    pub fn save_team(&self, team: Team) {
        self.state.write().save_team(team.clone());
        self.enqueue(PendingWrite::Team(team));
    }

    pub fn get_team(&self, id: &TeamId) -> Option<Team> {
        self.state.read().get_team(id).cloned()
    }

    pub fn list_teams(&self) -> Vec<Team> {
        self.state.read().list_teams().into_iter().cloned().collect()
    }

    // -- pipelines ---------------------------------------------------------

    pub fn save_pipeline(&self, pipeline: Pipeline) {
        self.state.write().save_pipeline(pipeline.clone());
        self.enqueue(PendingWrite::Pipeline(pipeline));
    }

    pub fn get_pipeline(&self, id: &PipelineId) -> Option<Pipeline> {
        self.state.read().get_pipeline(id).cloned()
    }

    pub fn list_pipelines(&self) -> Vec<Pipeline> {
        self.state.read().list_pipelines().into_iter().cloned().collect()
    }

    pub fn save_pipeline_run(&self, run: PipelineRun) {
        self.state.write().save_pipeline_run(run.clone());
        self.enqueue(PendingWrite::PipelineRun(run));
    }

    pub fn get_pipeline_run(&self, id: &PipelineRunId) -> Option<PipelineRun> {
        self.state.read().get_pipeline_run(id).cloned()
    }

    pub fn active_pipeline_runs(&self) -> Vec<PipelineRun> {
        self.state.read().active_pipeline_runs().into_iter().cloned().collect()
    }

    // -- roles ---------------------------------------------------------

    pub fn save_role(&self, role: Role) {
        self.state.write().save_role(role.clone());
        self.enqueue(PendingWrite::Role(role));
    }

    pub fn get_role(&self, id: &RoleId) -> Option<Role> {
        self.state.read().get_role(id).cloned()
    }

    pub fn list_roles(&self) -> Vec<Role> {
        self.state.read().list_roles().into_iter().cloned().collect()
    }

    // -- backends --------------------------------------------------------

    pub fn save_backend(&self, backend: BackendMapping) {
        self.state.write().save_backend(backend.clone());
        self.enqueue(PendingWrite::Backend(backend));
    }

    pub fn get_backend(&self, id: &BackendId) -> Option<BackendMapping> {
        self.state.read().get_backend(id).cloned()
    }

    pub fn list_backends(&self) -> Vec<BackendMapping> {
        self.state.read().list_backends().into_iter().cloned().collect()
    }

    pub fn log_sync_error(&self, err: SyncError) {
        self.state.write().log_sync_error(err.clone());
        self.enqueue(PendingWrite::SyncError(err));
    }

    pub fn sync_errors_for(&self, backend_id: &BackendId) -> Vec<SyncError> {
        self.state.read().sync_errors_for(backend_id).into_iter().cloned().collect()
    }

    // -- runtimes --------------------------------------------------------

    pub fn save_runtime(&self, runtime: Runtime) {
        self.state.write().save_runtime(runtime.clone());
        self.enqueue(PendingWrite::Runtime(runtime));
    }

    pub fn get_runtime(&self, id: &RuntimeId) -> Option<Runtime> {
        self.state.read().get_runtime(id).cloned()
    }

    pub fn list_runtimes(&self) -> Vec<Runtime> {
        self.state.read().list_runtimes().into_iter().cloned().collect()
    }

    pub fn delete_runtime(&self, id: &RuntimeId) {
        self.state.write().delete_runtime(id);
        self.enqueue(PendingWrite::DeleteRuntime(id.clone()));
    }
}

async fn flush_pending(
    pending: &Arc<RwLock<Vec<PendingWrite>>>,
    persistence: &Arc<SqlitePersistence>,
) {
    let batch: Vec<PendingWrite> = std::mem::take(&mut *pending.write());
    for write in batch {
        let result = match write {
            PendingWrite::Lane(lane) => persistence.write_lane(lane).await,
            PendingWrite::DeleteLane(id) => persistence.delete_lane(id).await,
            PendingWrite::Task(task) => persistence.write_task(task).await,
            PendingWrite::DeleteTask(id) => persistence.delete_task(id).await,
            PendingWrite::Agent(agent) => persistence.write_agent(agent).await,
            PendingWrite::DeleteAgent(id) => persistence.delete_agent(id).await,
            PendingWrite::Team(team) => persistence.write_team(team).await,
            PendingWrite::Pipeline(p) => persistence.write_pipeline(p).await,
            PendingWrite::PipelineRun(r) => persistence.write_pipeline_run(r).await,
            PendingWrite::Role(r) => persistence.write_role(r).await,
            PendingWrite::Backend(b) => persistence.write_backend(b).await,
            PendingWrite::SyncError(e) => persistence.log_sync_error(e).await,
            PendingWrite::Runtime(r) => persistence.write_runtime(r).await,
            PendingWrite::DeleteRuntime(id) => persistence.delete_runtime(id).await,
        };
        if let Err(err) = result {
            warn!(error = %err, "store flush write failed, in-memory image remains authoritative");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swimlane_core::Task;

    #[tokio::test]
    async fn save_then_get_round_trips_in_memory() {
        let store = Store::open_in_memory().await;
        let task = Task::new("hi", "body", 0);
        let id = task.id.clone();
        store.save_task(task);
        assert_eq!(store.get_task(&id).unwrap().description, "hi");
    }

    #[tokio::test]
    async fn flush_now_persists_to_sqlite() {
        let store = Store::open_in_memory().await;
        let task = Task::new("flush me", "body", 0);
        let id = task.id.clone();
        store.save_task(task);
        store.flush_now().await;
        let reloaded = store.persistence.load_all().await.unwrap();
        assert_eq!(reloaded.get_task(&id).unwrap().description, "flush me");
    }

    #[tokio::test]
    async fn reopening_a_file_backed_store_restores_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.db");
        {
            let store = Store::open(&path).await;
            let task = Task::new("persisted", "body", 0);
            store.save_task(task);
            store.flush_now().await;
        }
        let store = Store::open(&path).await;
        let tasks = store.list_tasks();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].description, "persisted");
    }
}
