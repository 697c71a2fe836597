// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The launcher: `startTask` (spec §4.4), the nine-step sequence that turns
//! a queued task into a live multiplexer window running a provider CLI.

use crate::env::{launch_settle_delay, paste_settle_delay};
use crate::guard::ProcessingGuard;
use crate::prompt::{build_bundle_description, build_prompt, single_task_description, PromptContext};
use crate::worktree::provision_worktree;
use std::sync::Arc;
use swimlane_adapters::{get_interactive_launch_command, quote_shell_arg, resolve_model, resolve_provider, MuxDriver, NewSessionOpts};
use swimlane_core::{
    effective, ApiError, ApiResult, Clock, Event, KanbanColumn, Provider, Task, TaskId, TaskStatus, TmuxBinding,
    ToggleKey,
};
use swimlane_storage::Store;
use tracing::warn;

/// System-wide default provider used when neither the task nor its lane
/// picks one (spec §4.3 `systemDefault`). No spec-level config surface names
/// a different default, so `claude` — the teacher's only historically
/// supported provider — is kept as the fallback.
const SYSTEM_DEFAULT_PROVIDER: Provider = Provider::Claude;

/// Where the launcher and monitors publish state-change notifications.
/// Implemented by `swimlane-daemon`'s broadcast-backed event bus; a no-op
/// implementation is provided for callers (and tests) that don't need one.
pub trait EventSink: Send + Sync + 'static {
    fn emit(&self, event: Event);
}

pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn emit(&self, _event: Event) {}
}

pub struct Launcher<C: Clock> {
    store: Arc<Store>,
    driver: Arc<dyn MuxDriver>,
    clock: C,
    events: Arc<dyn EventSink>,
    guard: ProcessingGuard<TaskId>,
}

impl<C: Clock> Launcher<C> {
    pub fn new(store: Arc<Store>, driver: Arc<dyn MuxDriver>, clock: C, events: Arc<dyn EventSink>) -> Self {
        Self {
            store,
            driver,
            clock,
            events,
            guard: ProcessingGuard::new(),
        }
    }

    /// Launches `task_id`. Returns a conflict error rather than blocking if
    /// another call is already launching the same task (spec §5 idempotency:
    /// at most one concurrent launch per task id).
    pub async fn start_task(&self, task_id: &TaskId) -> ApiResult<()> {
        let Some(_permit) = self.guard.try_claim(task_id.clone()) else {
            return Err(ApiError::conflict(format!("task {task_id} is already being launched")));
        };
        self.start_task_inner(task_id).await
    }

    async fn start_task_inner(&self, task_id: &TaskId) -> ApiResult<()> {
        let mut task = self
            .store
            .get_task(task_id)
            .ok_or_else(|| ApiError::not_found(swimlane_core::EntityKind::Task, task_id.as_str()))?;

        let lane_id = task
            .swim_lane_id
            .clone()
            .ok_or_else(|| ApiError::validation("task has no swim lane assigned"))?;
        let lane = self
            .store
            .get_lane(&lane_id)
            .ok_or_else(|| ApiError::not_found(swimlane_core::EntityKind::Lane, lane_id.as_str()))?;

        // Step 1: resolve effective server id and working directory.
        let server_id = task.server_override.clone().unwrap_or_else(|| lane.server_id.clone());
        let working_directory = task
            .working_directory_override
            .clone()
            .unwrap_or_else(|| lane.working_directory.clone());

        // Step 2: ensure the lane's session exists, tracking whether we
        // created it so its placeholder window can be cleaned up below.
        let created_session = !self.driver.has_session(&lane.session_name).await?;
        if created_session {
            self.driver
                .new_session(
                    &lane.session_name,
                    NewSessionOpts {
                        window_name: Some("placeholder".to_string()),
                        cwd: Some(working_directory.clone()),
                    },
                )
                .await?;
        }

        // Step 3: create the task's own window.
        let window_name = task.window_name();
        let window_index = match self.driver.new_window(&lane.session_name, Some(&window_name)).await {
            Ok(index) => index,
            Err(err) => {
                if created_session {
                    let _ = self.driver.delete_session(&lane.session_name).await;
                }
                return Err(ApiError::from(err));
            }
        };
        let target = format!("{}:{window_index}.0", lane.session_name);

        if created_session {
            self.cleanup_placeholder_window(&lane.session_name, window_index).await;
        }

        // Step 4: worktree provisioning, gated on the effective toggle.
        let mut worktree_path = None;
        if effective(&task.toggles, Some(&lane.default_toggles), ToggleKey::UseWorktree) {
            match provision_worktree(self.driver.as_ref(), &working_directory, task.signal_id()).await {
                Ok(path) => {
                    let cd = format!("cd {}", quote_shell_arg(&path.display().to_string()));
                    if let Err(err) = self.driver.send_keys(&target, &cd).await {
                        warn!(task_id = %task_id, error = %err, "failed to cd into provisioned worktree");
                    }
                    worktree_path = Some(path);
                }
                Err(err) => {
                    warn!(task_id = %task_id, error = %err, "worktree provisioning failed, falling back to working directory");
                    let cd = format!("cd {}", quote_shell_arg(&working_directory.display().to_string()));
                    let _ = self.driver.send_keys(&target, &cd).await;
                }
            }
        }

        // Step 5: build the prompt, bundling subtasks when present.
        let subtasks: Vec<Task> = task
            .subtask_ids
            .iter()
            .filter_map(|id| self.store.get_task(id))
            .collect();
        let description = if subtasks.is_empty() {
            single_task_description(&task)
        } else {
            build_bundle_description(&task, &subtasks)
        };
        let ctx = PromptContext {
            auto_close: effective(&task.toggles, Some(&lane.default_toggles), ToggleKey::AutoClose),
            ask_for_context: false,
            report_progress: false,
            ..PromptContext::default()
        };
        let prompt = build_prompt(&task, &lane, &description, &ctx);

        // Step 6: resolve provider and model.
        let explicit_provider = task.ai_provider.map(|p| p.as_str());
        let lane_provider = lane.ai_provider.map(|p| p.as_str());
        let provider = resolve_provider(explicit_provider, lane_provider, SYSTEM_DEFAULT_PROVIDER)?;
        let model = resolve_model(task.ai_model.as_deref(), lane.ai_model.as_deref());
        let auto_pilot = effective(&task.toggles, Some(&lane.default_toggles), ToggleKey::AutoPilot);
        let launch_command = get_interactive_launch_command(provider, model.as_deref(), auto_pilot);

        // Step 7: launch sequence.
        if let Err(err) = self.run_launch_sequence(&target, &launch_command.0, &prompt).await {
            if created_session {
                let _ = self.driver.delete_session(&lane.session_name).await;
            } else {
                let _ = self.driver.kill_window(&target).await;
            }
            return Err(ApiError::from(err));
        }

        // Step 8: bind the task to the live window.
        let now = self.clock.epoch_ms();
        let binding = TmuxBinding {
            server_id,
            session_name: lane.session_name.clone(),
            window_index,
            pane_index: 0,
        };
        task.binding = Some(binding.clone());
        task.worktree_path = worktree_path;
        task.ai_provider = Some(provider);
        task.started_at = Some(now);
        task.record_status_change(TaskStatus::InProgress, KanbanColumn::InProgress, now);
        self.store.save_task(task.clone());

        for subtask_id in &task.subtask_ids {
            if let Some(mut subtask) = self.store.get_task(subtask_id) {
                subtask.binding = Some(binding.clone());
                subtask.started_at = Some(now);
                subtask.record_status_change(TaskStatus::InProgress, KanbanColumn::InProgress, now);
                self.store.save_task(subtask);
            }
        }

        // Step 9: emit events for subscribers.
        self.events.emit(Event::TaskStarted { task: task.clone() });
        self.events.emit(Event::DbChanged {
            method: "kanban.startTask".to_string(),
        });

        Ok(())
    }

    async fn run_launch_sequence(
        &self,
        target: &str,
        launch_command: &str,
        prompt: &str,
    ) -> Result<(), swimlane_core::MultiplexerErrorKind> {
        self.driver.send_keys(target, launch_command).await?;
        tokio::time::sleep(launch_settle_delay()).await;
        self.driver.paste_text(target, prompt).await?;
        tokio::time::sleep(paste_settle_delay()).await;
        self.driver.send_raw_keys(target, "Enter").await?;
        Ok(())
    }

    /// Kills the session's lingering `placeholder` window once the real task
    /// window has been created, so a freshly created lane session doesn't
    /// carry a dead extra window forever (spec §4.4 step 2).
    async fn cleanup_placeholder_window(&self, session_name: &str, task_window_index: u32) {
        let Ok(tree) = self.driver.get_tree(true).await else {
            return;
        };
        let Some(session) = tree.iter().find(|s| s.name == session_name) else {
            return;
        };
        for window in &session.windows {
            if window.name == "placeholder" && window.index != task_window_index {
                let target = format!("{session_name}:{}", window.index);
                let _ = self.driver.kill_window(&target).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use swimlane_adapters::FakeMuxDriver;
    use swimlane_core::{FakeClock, Lane, TaskToggles, Toggle};

    async fn build() -> (Launcher<FakeClock>, Arc<Store>, Arc<FakeMuxDriver>) {
        let store = Arc::new(Store::open_in_memory().await);
        let fake = Arc::new(FakeMuxDriver::new());
        let driver: Arc<dyn MuxDriver> = fake.clone();
        let clock = FakeClock::new();
        let launcher = Launcher::new(store.clone(), driver, clock, Arc::new(NoopEventSink));
        (launcher, store, fake)
    }

    #[tokio::test]
    async fn start_task_creates_session_and_window_then_binds_task() {
        let (launcher, store, _driver) = build().await;
        let lane = Lane::new("main", "local", PathBuf::from("/repo"), "lane-main", 0);
        store.save_lane(lane.clone());

        let mut task = Task::new("fix the bug", "details here", 0);
        task.swim_lane_id = Some(lane.id.clone());
        let task_id = task.id.clone();
        store.save_task(task);

        launcher.start_task(&task_id).await.unwrap();

        let started = store.get_task(&task_id).unwrap();
        assert_eq!(started.status, TaskStatus::InProgress);
        assert!(started.binding.is_some());
        assert_eq!(started.binding.as_ref().unwrap().session_name, "lane-main");
    }

    #[tokio::test]
    async fn second_concurrent_launch_of_same_task_is_rejected() {
        let (launcher, store, _driver) = build().await;
        let lane = Lane::new("main", "local", PathBuf::from("/repo"), "lane-main", 0);
        store.save_lane(lane.clone());
        let mut task = Task::new("x", "", 0);
        task.swim_lane_id = Some(lane.id.clone());
        let task_id = task.id.clone();
        store.save_task(task);

        let _permit = launcher.guard.try_claim(task_id.clone()).unwrap();
        let result = launcher.start_task(&task_id).await;
        assert!(matches!(result, Err(ApiError::Conflict(_))));
    }

    #[tokio::test]
    async fn launch_sends_command_then_pastes_prompt_then_enter() {
        let (launcher, store, driver) = build().await;
        let lane = Lane::new("main", "local", PathBuf::from("/repo"), "lane-main", 0);
        store.save_lane(lane.clone());
        let mut task = Task::new("ship it", "do the thing", 0);
        task.swim_lane_id = Some(lane.id.clone());
        task.toggles = TaskToggles {
            auto_pilot: Toggle::True,
            ..TaskToggles::default()
        };
        let task_id = task.id.clone();
        store.save_task(task);

        launcher.start_task(&task_id).await.unwrap();

        let calls = driver.calls();
        let send_keys_idx = calls
            .iter()
            .position(|c| matches!(c, swimlane_adapters::MuxCall::SendKeys { .. }))
            .unwrap();
        let paste_idx = calls
            .iter()
            .position(|c| matches!(c, swimlane_adapters::MuxCall::PasteText { .. }))
            .unwrap();
        let enter_idx = calls
            .iter()
            .position(|c| matches!(c, swimlane_adapters::MuxCall::SendRawKeys { .. }))
            .unwrap();
        assert!(send_keys_idx < paste_idx);
        assert!(paste_idx < enter_idx);
    }
}
