// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sqlite-backed persistence: row <-> entity mapping, plus the load-at-open
//! and write-on-flush paths the debounced `Store` drives.

use crate::error::{StoreError, StoreResult};
use crate::schema;
use crate::state::MaterializedState;
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::str::FromStr;
use swimlane_core::{
    Agent, AgentId, AgentLocation, AgentState, BackendId, BackendKind, BackendMapping, Comment,
    KanbanColumn, Lane, LaneId, LaneToggleDefaults, Persona, Pipeline, PipelineId, PipelineRun,
    PipelineRunId, PipelineRunStatus, PipelineStage, Provider, Role, RoleId, Runtime, RuntimeId,
    RuntimeKind, StatusHistoryEntry, SyncError, Task, TaskId, TaskStatus, TaskToggles, TmuxBinding,
    Team, TeamId,
};

pub struct SqlitePersistence {
    conn: tokio_rusqlite::Connection,
}

fn enum_to_json<T: serde::Serialize>(v: &T) -> String {
    serde_json::to_string(v).unwrap_or_else(|_| "null".to_string())
}

fn json_to_enum<T: serde::de::DeserializeOwned>(s: &str) -> Option<T> {
    serde_json::from_str(s).ok()
}

impl SqlitePersistence {
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = tokio_rusqlite::Connection::open(path.as_ref()).await?;
        conn.call(|conn| Ok(schema::init_and_migrate(conn)?))
            .await?;
        Ok(Self { conn })
    }

    pub async fn open_in_memory() -> StoreResult<Self> {
        let conn = tokio_rusqlite::Connection::open_in_memory().await?;
        conn.call(|conn| Ok(schema::init_and_migrate(conn)?))
            .await?;
        Ok(Self { conn })
    }

    /// Loads every entity and rebuilds a fresh `MaterializedState`. Called
    /// once at daemon startup; on failure the caller falls back to an
    /// empty image rather than propagating (spec §4.1 failure semantics).
    pub async fn load_all(&self) -> StoreResult<MaterializedState> {
        self.conn
            .call(|conn| {
                let mut state = MaterializedState::new();
                for lane in load_lanes(conn)? {
                    state.save_lane(lane);
                }
                for task in load_tasks(conn)? {
                    state.save_task(task);
                }
                for agent in load_agents(conn)? {
                    state.save_agent(agent);
                }
                for team in load_teams(conn)? {
                    state.save_team(team);
                }
                for pipeline in load_pipelines(conn)? {
                    state.save_pipeline(pipeline);
                }
                for run in load_pipeline_runs(conn)? {
                    state.save_pipeline_run(run);
                }
                for role in load_roles(conn)? {
                    state.save_role(role);
                }
                for backend in load_backends(conn)? {
                    state.save_backend(backend);
                }
                for err in load_sync_errors(conn)? {
                    state.log_sync_error(err);
                }
                for runtime in load_runtimes(conn)? {
                    state.save_runtime(runtime);
                }
                Ok(state)
            })
            .await
            .map_err(StoreError::from)
    }

    pub async fn write_lane(&self, lane: Lane) -> StoreResult<()> {
        self.conn
            .call(move |conn| Ok(write_lane_row(conn, &lane)?))
            .await
            .map_err(StoreError::from)
    }

    pub async fn delete_lane(&self, id: LaneId) -> StoreResult<()> {
        self.conn
            .call(move |conn| {
                conn.execute("DELETE FROM lanes WHERE id = ?1", params![id.as_str()])?;
                Ok(())
            })
            .await
            .map_err(StoreError::from)
    }

    pub async fn write_task(&self, task: Task) -> StoreResult<()> {
        self.conn
            .call(move |conn| Ok(write_task_row(conn, &task)?))
            .await
            .map_err(StoreError::from)
    }

    pub async fn delete_task(&self, id: TaskId) -> StoreResult<()> {
        self.conn
            .call(move |conn| {
                conn.execute("DELETE FROM tasks WHERE id = ?1", params![id.as_str()])?;
                Ok(())
            })
            .await
            .map_err(StoreError::from)
    }

    pub async fn write_agent(&self, agent: Agent) -> StoreResult<()> {
        self.conn
            .call(move |conn| Ok(write_agent_row(conn, &agent)?))
            .await
            .map_err(StoreError::from)
    }

    pub async fn delete_agent(&self, id: AgentId) -> StoreResult<()> {
        self.conn
            .call(move |conn| {
                conn.execute("DELETE FROM agents WHERE id = ?1", params![id.as_str()])?;
                Ok(())
            })
            .await
            .map_err(StoreError::from)
    }

    pub async fn write_team(&self, team: Team) -> StoreResult<()> {
        self.conn
            .call(move |conn| Ok(write_team_row(conn, &team)?))
            .await
            .map_err(StoreError::from)
    }

    pub async fn write_pipeline(&self, pipeline: Pipeline) -> StoreResult<()> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO pipelines (id, name, stages, created_at) VALUES (?1,?2,?3,?4)
                     ON CONFLICT(id) DO UPDATE SET name=excluded.name, stages=excluded.stages",
                    params![
                        pipeline.id.as_str(),
                        pipeline.name,
                        serde_json::to_string(&pipeline.stages).unwrap_or_default(),
                        pipeline.created_at as i64,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(StoreError::from)
    }

    pub async fn write_pipeline_run(&self, run: PipelineRun) -> StoreResult<()> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO pipeline_runs (id, pipeline_id, status, current_stage, started_at, finished_at)
                     VALUES (?1,?2,?3,?4,?5,?6)
                     ON CONFLICT(id) DO UPDATE SET status=excluded.status,
                        current_stage=excluded.current_stage, finished_at=excluded.finished_at",
                    params![
                        run.id.as_str(),
                        run.pipeline_id.as_str(),
                        enum_to_json(&run.status),
                        run.current_stage as i64,
                        run.started_at as i64,
                        run.finished_at.map(|v| v as i64),
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(StoreError::from)
    }

    pub async fn write_role(&self, role: Role) -> StoreResult<()> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO roles (id, name, description, created_at) VALUES (?1,?2,?3,?4)
                     ON CONFLICT(id) DO UPDATE SET name=excluded.name, description=excluded.description",
                    params![role.id.as_str(), role.name, role.description, role.created_at as i64],
                )?;
                Ok(())
            })
            .await
            .map_err(StoreError::from)
    }

    pub async fn write_backend(&self, backend: BackendMapping) -> StoreResult<()> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO backends (id, kind, name, enabled, config, created_at, last_synced_at)
                     VALUES (?1,?2,?3,?4,?5,?6,?7)
                     ON CONFLICT(id) DO UPDATE SET kind=excluded.kind, name=excluded.name,
                        enabled=excluded.enabled, config=excluded.config, last_synced_at=excluded.last_synced_at",
                    params![
                        backend.id.as_str(),
                        enum_to_json(&backend.kind),
                        backend.name,
                        backend.enabled,
                        backend.config.to_string(),
                        backend.created_at as i64,
                        backend.last_synced_at.map(|v| v as i64),
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(StoreError::from)
    }

    pub async fn log_sync_error(&self, err: SyncError) -> StoreResult<()> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO sync_errors (backend_id, message, occurred_at) VALUES (?1,?2,?3)",
                    params![err.backend_id.as_str(), err.message, err.occurred_at as i64],
                )?;
                Ok(())
            })
            .await
            .map_err(StoreError::from)
    }

    pub async fn write_runtime(&self, runtime: Runtime) -> StoreResult<()> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO runtimes (id, kind, host, port, user, config_file, context)
                     VALUES (?1,?2,?3,?4,?5,?6,?7)
                     ON CONFLICT(id) DO UPDATE SET kind=excluded.kind, host=excluded.host,
                        port=excluded.port, user=excluded.user, config_file=excluded.config_file,
                        context=excluded.context",
                    params![
                        runtime.id.as_str(),
                        enum_to_json(&runtime.kind),
                        runtime.host,
                        runtime.port,
                        runtime.user,
                        runtime.config_file,
                        runtime.context,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(StoreError::from)
    }

    pub async fn delete_runtime(&self, id: RuntimeId) -> StoreResult<()> {
        self.conn
            .call(move |conn| {
                conn.execute("DELETE FROM runtimes WHERE id = ?1", params![id.as_str()])?;
                Ok(())
            })
            .await
            .map_err(StoreError::from)
    }
}

fn write_lane_row(conn: &Connection, lane: &Lane) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO lanes (id, name, server_id, working_directory, session_name, created_at,
            session_active, ai_provider, ai_model, context_instructions, default_toggles,
            memory_file_id, memory_path)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13)
         ON CONFLICT(id) DO UPDATE SET
            name=excluded.name, server_id=excluded.server_id,
            working_directory=excluded.working_directory, session_name=excluded.session_name,
            session_active=excluded.session_active, ai_provider=excluded.ai_provider,
            ai_model=excluded.ai_model, context_instructions=excluded.context_instructions,
            default_toggles=excluded.default_toggles, memory_file_id=excluded.memory_file_id,
            memory_path=excluded.memory_path",
        params![
            lane.id.as_str(),
            lane.name,
            lane.server_id,
            lane.working_directory.to_string_lossy(),
            lane.session_name,
            lane.created_at as i64,
            lane.session_active,
            lane.ai_provider.map(|p| p.as_str()),
            lane.ai_model,
            lane.context_instructions,
            enum_to_json(&lane.default_toggles),
            lane.memory_file_id,
            lane.memory_path.as_ref().map(|p| p.to_string_lossy().to_string()),
        ],
    )?;
    Ok(())
}

fn row_to_lane(row: &Row) -> rusqlite::Result<Lane> {
    let ai_provider: Option<String> = row.get("ai_provider")?;
    let default_toggles: String = row.get("default_toggles")?;
    let memory_path: Option<String> = row.get("memory_path")?;
    Ok(Lane {
        id: LaneId::new(row.get::<_, String>("id")?),
        name: row.get("name")?,
        server_id: row.get("server_id")?,
        working_directory: row.get::<_, String>("working_directory")?.into(),
        session_name: row.get("session_name")?,
        created_at: row.get::<_, i64>("created_at")? as u64,
        session_active: row.get("session_active")?,
        ai_provider: ai_provider.and_then(|s| Provider::from_str(&s).ok()),
        ai_model: row.get("ai_model")?,
        context_instructions: row.get("context_instructions")?,
        default_toggles: json_to_enum::<LaneToggleDefaults>(&default_toggles).unwrap_or_default(),
        memory_file_id: row.get("memory_file_id")?,
        memory_path: memory_path.map(Into::into),
    })
}

fn load_lanes(conn: &Connection) -> rusqlite::Result<Vec<Lane>> {
    let mut stmt = conn.prepare("SELECT * FROM lanes")?;
    let rows = stmt.query_map([], row_to_lane)?;
    rows.collect()
}

fn write_task_row(conn: &Connection, task: &Task) -> rusqlite::Result<()> {
    let tx = conn.unchecked_transaction()?;
    let binding = task.binding.as_ref();
    tx.execute(
        "INSERT INTO tasks (id, description, input, status, kanban_column, priority, created_at,
            started_at, completed_at, done_at, error_message, output, target_role,
            assigned_agent_id, swim_lane_id, parent_task_id, toggles, ai_provider, ai_model,
            server_override, working_directory_override, tmux_server_id, tmux_session_name,
            tmux_window_index, tmux_pane_index, worktree_path)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18,?19,?20,?21,?22,?23,?24,?25,?26)
         ON CONFLICT(id) DO UPDATE SET
            description=excluded.description, input=excluded.input, status=excluded.status,
            kanban_column=excluded.kanban_column, priority=excluded.priority,
            started_at=excluded.started_at, completed_at=excluded.completed_at,
            done_at=excluded.done_at, error_message=excluded.error_message,
            output=excluded.output, target_role=excluded.target_role,
            assigned_agent_id=excluded.assigned_agent_id, swim_lane_id=excluded.swim_lane_id,
            parent_task_id=excluded.parent_task_id, toggles=excluded.toggles,
            ai_provider=excluded.ai_provider, ai_model=excluded.ai_model,
            server_override=excluded.server_override,
            working_directory_override=excluded.working_directory_override,
            tmux_server_id=excluded.tmux_server_id, tmux_session_name=excluded.tmux_session_name,
            tmux_window_index=excluded.tmux_window_index, tmux_pane_index=excluded.tmux_pane_index,
            worktree_path=excluded.worktree_path",
        params![
            task.id.as_str(),
            task.description,
            task.input,
            enum_to_json(&task.status),
            enum_to_json(&task.kanban_column),
            task.priority,
            task.created_at as i64,
            task.started_at.map(|v| v as i64),
            task.completed_at.map(|v| v as i64),
            task.done_at.map(|v| v as i64),
            task.error_message,
            task.output,
            task.target_role,
            task.assigned_agent_id.as_ref().map(|a| a.as_str()),
            task.swim_lane_id.as_ref().map(|l| l.as_str()),
            task.parent_task_id.as_ref().map(|t| t.as_str()),
            enum_to_json(&task.toggles),
            task.ai_provider.map(|p| p.as_str()),
            task.ai_model,
            task.server_override,
            task.working_directory_override.as_ref().map(|p| p.to_string_lossy().to_string()),
            binding.map(|b| b.server_id.as_str()),
            binding.map(|b| b.session_name.as_str()),
            binding.map(|b| b.window_index),
            binding.map(|b| b.pane_index),
            task.worktree_path.as_ref().map(|p| p.to_string_lossy().to_string()),
        ],
    )?;

    // Rebuild edges: delete-then-insert, all in the transaction opened above
    // so a crash or failed insert mid-sequence never leaves a child table
    // inconsistent with the task row (spec §4.1).
    tx.execute("DELETE FROM task_tags WHERE task_id = ?1", params![task.id.as_str()])?;
    for tag in &task.tags {
        tx.execute(
            "INSERT INTO task_tags (task_id, tag) VALUES (?1,?2)",
            params![task.id.as_str(), tag],
        )?;
    }

    tx.execute("DELETE FROM task_comments WHERE task_id = ?1", params![task.id.as_str()])?;
    for c in &task.comments {
        tx.execute(
            "INSERT INTO task_comments (id, task_id, author, body, created_at) VALUES (?1,?2,?3,?4,?5)",
            params![c.id, task.id.as_str(), c.author, c.body, c.created_at as i64],
        )?;
    }

    tx.execute(
        "DELETE FROM task_status_history WHERE task_id = ?1",
        params![task.id.as_str()],
    )?;
    for h in &task.status_history {
        tx.execute(
            "INSERT INTO task_status_history (task_id, from_status, to_status, from_column, to_column, changed_at)
             VALUES (?1,?2,?3,?4,?5,?6)",
            params![
                task.id.as_str(),
                h.from_status.map(|s| enum_to_json(&s)),
                enum_to_json(&h.to_status),
                h.from_column.map(|c| enum_to_json(&c)),
                enum_to_json(&h.to_column),
                h.changed_at as i64,
            ],
        )?;
    }

    tx.execute(
        "DELETE FROM subtask_relations WHERE parent_id = ?1",
        params![task.id.as_str()],
    )?;
    for child in &task.subtask_ids {
        tx.execute(
            "INSERT INTO subtask_relations (parent_id, child_id) VALUES (?1,?2)",
            params![task.id.as_str(), child.as_str()],
        )?;
    }

    tx.execute(
        "DELETE FROM task_dependencies WHERE task_id = ?1",
        params![task.id.as_str()],
    )?;
    for dep in &task.depends_on {
        tx.execute(
            "INSERT INTO task_dependencies (task_id, depends_on_id) VALUES (?1,?2)",
            params![task.id.as_str(), dep.as_str()],
        )?;
    }

    tx.commit()
}

fn row_to_task(conn: &Connection, row: &Row) -> rusqlite::Result<Task> {
    let id: String = row.get("id")?;
    let status: String = row.get("status")?;
    let kanban_column: String = row.get("kanban_column")?;
    let toggles: String = row.get("toggles")?;
    let ai_provider: Option<String> = row.get("ai_provider")?;
    let tmux_server_id: Option<String> = row.get("tmux_server_id")?;
    let tmux_session_name: Option<String> = row.get("tmux_session_name")?;
    let tmux_window_index: Option<u32> = row.get("tmux_window_index")?;
    let tmux_pane_index: Option<u32> = row.get("tmux_pane_index")?;
    let working_directory_override: Option<String> = row.get("working_directory_override")?;
    let worktree_path: Option<String> = row.get("worktree_path")?;

    let binding = match (tmux_server_id, tmux_session_name, tmux_window_index, tmux_pane_index) {
        (Some(server_id), Some(session_name), Some(window_index), Some(pane_index)) => {
            Some(TmuxBinding { server_id, session_name, window_index, pane_index })
        }
        _ => None,
    };

    let mut tags_stmt = conn.prepare("SELECT tag FROM task_tags WHERE task_id = ?1")?;
    let tags: Vec<String> = tags_stmt
        .query_map(params![id], |r| r.get(0))?
        .filter_map(Result::ok)
        .collect();

    let mut comments_stmt = conn.prepare(
        "SELECT id, author, body, created_at FROM task_comments WHERE task_id = ?1 ORDER BY created_at",
    )?;
    let comments: Vec<Comment> = comments_stmt
        .query_map(params![id], |r| {
            Ok(Comment {
                id: r.get(0)?,
                author: r.get(1)?,
                body: r.get(2)?,
                created_at: r.get::<_, i64>(3)? as u64,
            })
        })?
        .filter_map(Result::ok)
        .collect();

    let mut history_stmt = conn.prepare(
        "SELECT from_status, to_status, from_column, to_column, changed_at
         FROM task_status_history WHERE task_id = ?1 ORDER BY changed_at",
    )?;
    let status_history: Vec<StatusHistoryEntry> = history_stmt
        .query_map(params![id], |r| {
            let from_status: Option<String> = r.get(0)?;
            let to_status: String = r.get(1)?;
            let from_column: Option<String> = r.get(2)?;
            let to_column: String = r.get(3)?;
            Ok(StatusHistoryEntry {
                task_id: TaskId::new(id.clone()),
                from_status: from_status.and_then(|s| json_to_enum::<TaskStatus>(&s)),
                to_status: json_to_enum::<TaskStatus>(&to_status).unwrap_or(TaskStatus::Pending),
                from_column: from_column.and_then(|s| json_to_enum::<KanbanColumn>(&s)),
                to_column: json_to_enum::<KanbanColumn>(&to_column).unwrap_or(KanbanColumn::Backlog),
                changed_at: r.get::<_, i64>(4)? as u64,
            })
        })?
        .filter_map(Result::ok)
        .collect();

    let mut subtask_stmt = conn.prepare("SELECT child_id FROM subtask_relations WHERE parent_id = ?1")?;
    let subtask_ids: Vec<TaskId> = subtask_stmt
        .query_map(params![id], |r| r.get::<_, String>(0))?
        .filter_map(Result::ok)
        .map(TaskId::new)
        .collect();

    let mut deps_stmt = conn.prepare("SELECT depends_on_id FROM task_dependencies WHERE task_id = ?1")?;
    let depends_on: Vec<TaskId> = deps_stmt
        .query_map(params![id], |r| r.get::<_, String>(0))?
        .filter_map(Result::ok)
        .map(TaskId::new)
        .collect();

    Ok(Task {
        id: TaskId::new(id),
        description: row.get("description")?,
        input: row.get("input")?,
        status: json_to_enum(&status).unwrap_or(TaskStatus::Pending),
        kanban_column: json_to_enum(&kanban_column).unwrap_or(KanbanColumn::Backlog),
        priority: row.get("priority")?,
        created_at: row.get::<_, i64>("created_at")? as u64,
        started_at: row.get::<_, Option<i64>>("started_at")?.map(|v| v as u64),
        completed_at: row.get::<_, Option<i64>>("completed_at")?.map(|v| v as u64),
        done_at: row.get::<_, Option<i64>>("done_at")?.map(|v| v as u64),
        error_message: row.get("error_message")?,
        output: row.get("output")?,
        target_role: row.get("target_role")?,
        assigned_agent_id: row.get::<_, Option<String>>("assigned_agent_id")?.map(AgentId::new),
        swim_lane_id: row.get::<_, Option<String>>("swim_lane_id")?.map(LaneId::new),
        parent_task_id: row.get::<_, Option<String>>("parent_task_id")?.map(TaskId::new),
        subtask_ids,
        depends_on,
        tags,
        comments,
        status_history,
        toggles: json_to_enum(&toggles).unwrap_or_default(),
        ai_provider: ai_provider.and_then(|s| Provider::from_str(&s).ok()),
        ai_model: row.get("ai_model")?,
        server_override: row.get("server_override")?,
        working_directory_override: working_directory_override.map(Into::into),
        binding,
        worktree_path: worktree_path.map(Into::into),
    })
}

fn load_tasks(conn: &Connection) -> rusqlite::Result<Vec<Task>> {
    let mut stmt = conn.prepare("SELECT * FROM tasks")?;
    let ids: Vec<String> = stmt
        .query_map([], |r| r.get::<_, String>("id"))?
        .filter_map(Result::ok)
        .collect();
    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        let mut row_stmt = conn.prepare("SELECT * FROM tasks WHERE id = ?1")?;
        let task = row_stmt.query_row(params![id], |row| row_to_task(conn, row))?;
        out.push(task);
    }
    Ok(out)
}

fn write_agent_row(conn: &Connection, agent: &Agent) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO agents (id, template_id, name, role, ai_provider, state, server_id,
            session_name, window_index, pane_index, team_id, current_task_id, created_at,
            last_activity_at, error_message, persona)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16)
         ON CONFLICT(id) DO UPDATE SET
            template_id=excluded.template_id, name=excluded.name, role=excluded.role,
            ai_provider=excluded.ai_provider, state=excluded.state, server_id=excluded.server_id,
            session_name=excluded.session_name, window_index=excluded.window_index,
            pane_index=excluded.pane_index, team_id=excluded.team_id,
            current_task_id=excluded.current_task_id, last_activity_at=excluded.last_activity_at,
            error_message=excluded.error_message, persona=excluded.persona",
        params![
            agent.id.as_str(),
            agent.template_id,
            agent.name,
            agent.role,
            agent.ai_provider.as_str(),
            enum_to_json(&agent.state),
            agent.location.server_id,
            agent.location.session_name,
            agent.location.window_index,
            agent.location.pane_index,
            agent.team_id.as_ref().map(|t| t.as_str()),
            agent.current_task_id.as_ref().map(|t| t.as_str()),
            agent.created_at as i64,
            agent.last_activity_at as i64,
            agent.error_message,
            agent.persona.as_ref().map(enum_to_json),
        ],
    )?;
    Ok(())
}

fn row_to_agent(row: &Row) -> rusqlite::Result<Agent> {
    let ai_provider: String = row.get("ai_provider")?;
    let state: String = row.get("state")?;
    let persona: Option<String> = row.get("persona")?;
    Ok(Agent {
        id: AgentId::new(row.get::<_, String>("id")?),
        template_id: row.get("template_id")?,
        name: row.get("name")?,
        role: row.get("role")?,
        ai_provider: Provider::from_str(&ai_provider).unwrap_or(Provider::Claude),
        state: json_to_enum(&state).unwrap_or(AgentState::Terminated),
        location: AgentLocation {
            server_id: row.get("server_id")?,
            session_name: row.get("session_name")?,
            window_index: row.get("window_index")?,
            pane_index: row.get("pane_index")?,
        },
        team_id: row.get::<_, Option<String>>("team_id")?.map(TeamId::new),
        current_task_id: row.get::<_, Option<String>>("current_task_id")?.map(TaskId::new),
        created_at: row.get::<_, i64>("created_at")? as u64,
        last_activity_at: row.get::<_, i64>("last_activity_at")? as u64,
        error_message: row.get("error_message")?,
        persona: persona.and_then(|s| json_to_enum::<Persona>(&s)),
    })
}

fn load_agents(conn: &Connection) -> rusqlite::Result<Vec<Agent>> {
    let mut stmt = conn.prepare("SELECT * FROM agents")?;
    let rows = stmt.query_map([], row_to_agent)?;
    rows.collect()
}

fn write_team_row(conn: &Connection, team: &Team) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO teams (id, name, created_at) VALUES (?1,?2,?3)
         ON CONFLICT(id) DO UPDATE SET name=excluded.name",
        params![team.id.as_str(), team.name, team.created_at as i64],
    )?;
    conn.execute("DELETE FROM team_members WHERE team_id = ?1", params![team.id.as_str()])?;
    for member in &team.members {
        conn.execute(
            "INSERT INTO team_members (team_id, agent_id) VALUES (?1,?2)",
            params![team.id.as_str(), member.as_str()],
        )?;
    }
    Ok(())
}

fn load_teams(conn: &Connection) -> rusqlite::Result<Vec<Team>> {
    let mut stmt = conn.prepare("SELECT id, name, created_at FROM teams")?;
    let rows: Vec<(String, String, i64)> = stmt
        .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))?
        .filter_map(Result::ok)
        .collect();
    let mut out = Vec::with_capacity(rows.len());
    for (id, name, created_at) in rows {
        let mut mem_stmt = conn.prepare("SELECT agent_id FROM team_members WHERE team_id = ?1")?;
        let members: Vec<AgentId> = mem_stmt
            .query_map(params![id], |r| r.get::<_, String>(0))?
            .filter_map(Result::ok)
            .map(AgentId::new)
            .collect();
        out.push(Team { id: TeamId::new(id), name, members, created_at: created_at as u64 });
    }
    Ok(out)
}

fn load_pipelines(conn: &Connection) -> rusqlite::Result<Vec<Pipeline>> {
    let mut stmt = conn.prepare("SELECT id, name, stages, created_at FROM pipelines")?;
    let rows = stmt.query_map([], |row| {
        let stages: String = row.get(2)?;
        Ok(Pipeline {
            id: PipelineId::new(row.get::<_, String>(0)?),
            name: row.get(1)?,
            stages: serde_json::from_str::<Vec<PipelineStage>>(&stages).unwrap_or_default(),
            created_at: row.get::<_, i64>(3)? as u64,
        })
    })?;
    rows.collect()
}

fn load_pipeline_runs(conn: &Connection) -> rusqlite::Result<Vec<PipelineRun>> {
    let mut stmt =
        conn.prepare("SELECT id, pipeline_id, status, current_stage, started_at, finished_at FROM pipeline_runs")?;
    let rows = stmt.query_map([], |row| {
        let status: String = row.get(2)?;
        Ok(PipelineRun {
            id: PipelineRunId::new(row.get::<_, String>(0)?),
            pipeline_id: PipelineId::new(row.get::<_, String>(1)?),
            status: json_to_enum(&status).unwrap_or(PipelineRunStatus::Failed),
            current_stage: row.get::<_, i64>(3)? as usize,
            started_at: row.get::<_, i64>(4)? as u64,
            finished_at: row.get::<_, Option<i64>>(5)?.map(|v| v as u64),
        })
    })?;
    rows.collect()
}

fn load_roles(conn: &Connection) -> rusqlite::Result<Vec<Role>> {
    let mut stmt = conn.prepare("SELECT id, name, description, created_at FROM roles")?;
    let rows = stmt.query_map([], |row| {
        Ok(Role {
            id: RoleId::new(row.get::<_, String>(0)?),
            name: row.get(1)?,
            description: row.get(2)?,
            created_at: row.get::<_, i64>(3)? as u64,
        })
    })?;
    rows.collect()
}

fn load_backends(conn: &Connection) -> rusqlite::Result<Vec<BackendMapping>> {
    let mut stmt =
        conn.prepare("SELECT id, kind, name, enabled, config, created_at, last_synced_at FROM backends")?;
    let rows = stmt.query_map([], |row| {
        let kind: String = row.get(1)?;
        let config: String = row.get(4)?;
        Ok(BackendMapping {
            id: BackendId::new(row.get::<_, String>(0)?),
            kind: json_to_enum(&kind).unwrap_or(BackendKind::Github),
            name: row.get(2)?,
            enabled: row.get(3)?,
            config: serde_json::from_str(&config).unwrap_or(serde_json::Value::Null),
            created_at: row.get::<_, i64>(5)? as u64,
            last_synced_at: row.get::<_, Option<i64>>(6)?.map(|v| v as u64),
        })
    })?;
    rows.collect()
}

fn load_sync_errors(conn: &Connection) -> rusqlite::Result<Vec<SyncError>> {
    let mut stmt = conn.prepare("SELECT backend_id, message, occurred_at FROM sync_errors")?;
    let rows = stmt.query_map([], |row| {
        Ok(SyncError {
            backend_id: BackendId::new(row.get::<_, String>(0)?),
            message: row.get(1)?,
            occurred_at: row.get::<_, i64>(2)? as u64,
        })
    })?;
    rows.collect()
}

fn load_runtimes(conn: &Connection) -> rusqlite::Result<Vec<Runtime>> {
    let mut stmt =
        conn.prepare("SELECT id, kind, host, port, user, config_file, context FROM runtimes")?;
    let rows = stmt.query_map([], |row| {
        let kind: String = row.get(1)?;
        Ok(Runtime {
            id: RuntimeId::new(row.get::<_, String>(0)?),
            kind: json_to_enum(&kind).unwrap_or(RuntimeKind::LocalTmux),
            host: row.get(2)?,
            port: row.get(3)?,
            user: row.get(4)?,
            config_file: row.get(5)?,
            context: row.get(6)?,
        })
    })?;
    rows.collect()
}
