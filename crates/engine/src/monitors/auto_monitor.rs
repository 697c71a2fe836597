// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Auto-monitor (spec §4.7): watches in-progress, auto-close-enabled tasks
//! for the completion-signal marker and closes them out, then cascades to
//! any dependent tasks that are now ready to start.

use super::binding_target;
use crate::guard::ProcessingGuard;
use crate::launcher::{EventSink, Launcher};
use std::sync::Arc;
use swimlane_adapters::MuxDriver;
use swimlane_core::completion::parse_completion;
use swimlane_core::{effective, Clock, Event, KanbanColumn, Task, TaskId, TaskStatus, ToggleKey};
use swimlane_storage::Store;
use tracing::{info, warn};

const CAPTURE_LINES: u32 = 100;

pub struct AutoMonitor<C: Clock> {
    store: Arc<Store>,
    driver: Arc<dyn MuxDriver>,
    clock: C,
    events: Arc<dyn EventSink>,
    launcher: Arc<Launcher<C>>,
    guard: ProcessingGuard<TaskId>,
}

impl<C: Clock> AutoMonitor<C> {
    pub fn new(
        store: Arc<Store>,
        driver: Arc<dyn MuxDriver>,
        clock: C,
        events: Arc<dyn EventSink>,
        launcher: Arc<Launcher<C>>,
    ) -> Self {
        Self {
            store,
            driver,
            clock,
            events,
            launcher,
            guard: ProcessingGuard::new(),
        }
    }

    /// Runs one sweep. Returns the number of tasks closed out this tick.
    pub async fn tick(&self) -> usize {
        let candidates: Vec<Task> = self
            .store
            .list_tasks()
            .into_iter()
            .filter(|t| t.kanban_column == KanbanColumn::InProgress)
            .filter(|t| t.binding.is_some())
            .filter(|t| {
                let lane_defaults = t
                    .swim_lane_id
                    .as_ref()
                    .and_then(|id| self.store.get_lane(id))
                    .map(|l| l.default_toggles);
                effective(&t.toggles, lane_defaults.as_ref(), ToggleKey::AutoClose)
            })
            .collect();

        let mut closed = 0usize;
        for task in candidates {
            let Some(permit) = self.guard.try_claim(task.id.clone()) else {
                continue;
            };
            if self.process_task(task).await {
                closed += 1;
            }
            drop(permit);
        }
        closed
    }

    async fn process_task(&self, mut task: Task) -> bool {
        let Some(binding) = task.binding.clone() else {
            return false;
        };
        let target = binding_target(&binding);
        let capture = match self.driver.capture_pane_content(&target, CAPTURE_LINES).await {
            Ok(capture) => capture,
            Err(err) => {
                warn!(task_id = %task.id, error = %err, "auto-monitor capture failed");
                return false;
            }
        };

        let parsed = parse_completion(&capture, task.signal_id());
        if !parsed.done {
            return false;
        }

        if let Some(summary) = &parsed.summary {
            task.input = format!("{}\n\n**Completion Summary:**\n{}", task.input, summary);
        }

        let _ = self.driver.kill_window(&target).await;
        if let Some(worktree_path) = &task.worktree_path {
            let command = format!(
                "git worktree remove --force {}",
                swimlane_adapters::quote_shell_arg(&worktree_path.display().to_string())
            );
            if let Err(err) = self.driver.exec_command(&command).await {
                warn!(task_id = %task.id, error = %err, "failed to remove worktree on auto-close");
            }
        }

        let now = self.clock.epoch_ms();
        task.binding = None;
        task.worktree_path = None;
        task.completed_at = Some(now);
        task.record_status_change(TaskStatus::Completed, KanbanColumn::Done, now);
        let task_id = task.id.clone();
        self.store.save_task(task);

        for subtask_id in self.store.get_task(&task_id).map(|t| t.subtask_ids).unwrap_or_default() {
            if let Some(mut subtask) = self.store.get_task(&subtask_id) {
                subtask.completed_at = Some(now);
                subtask.record_status_change(TaskStatus::Completed, KanbanColumn::Done, now);
                self.store.save_task(subtask);
            }
        }

        self.events.emit(Event::TaskCompleted { task_id: task_id.clone() });
        self.events.emit(Event::DbChanged {
            method: "autoMonitor.complete".to_string(),
        });

        self.start_ready_dependents(&task_id).await;
        info!(task_id = %task_id, "auto-monitor closed out completed task");
        true
    }

    /// Starts every task that depends on `completed_id`, is now fully
    /// unblocked, has `effective(autoStart)`, sits in `todo`/`backlog`, and
    /// has a lane (spec §4.7 "trigger dependents").
    async fn start_ready_dependents(&self, completed_id: &TaskId) {
        let dependents: Vec<Task> = self
            .store
            .list_tasks()
            .into_iter()
            .filter(|t| t.depends_on.contains(completed_id))
            .filter(|t| matches!(t.kanban_column, KanbanColumn::Todo | KanbanColumn::Backlog))
            .filter(|t| t.swim_lane_id.is_some())
            .collect();

        for mut task in dependents {
            let all_deps_completed = task
                .depends_on
                .iter()
                .all(|dep| self.store.get_task(dep).map(|d| d.status == TaskStatus::Completed).unwrap_or(false));
            if !all_deps_completed {
                continue;
            }
            let lane_defaults = task
                .swim_lane_id
                .as_ref()
                .and_then(|id| self.store.get_lane(id))
                .map(|l| l.default_toggles);
            if !effective(&task.toggles, lane_defaults.as_ref(), ToggleKey::AutoStart) {
                continue;
            }

            let now = self.clock.epoch_ms();
            task.record_status_change(task.status, KanbanColumn::Todo, now);
            let task_id = task.id.clone();
            self.store.save_task(task);

            if let Err(err) = self.launcher.start_task(&task_id).await {
                warn!(task_id = %task_id, error = %err, "failed to auto-start dependent task");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launcher::NoopEventSink;
    use std::path::PathBuf;
    use swimlane_adapters::FakeMuxDriver;
    use swimlane_core::{FakeClock, Lane, TaskToggles, Toggle};

    fn binding() -> TmuxBinding {
        TmuxBinding {
            server_id: "local".to_string(),
            session_name: "lane-main".to_string(),
            window_index: 1,
            pane_index: 0,
        }
    }

    async fn harness() -> (AutoMonitor<FakeClock>, Arc<Store>, Arc<FakeMuxDriver>) {
        let store = Arc::new(Store::open_in_memory().await);
        let fake = Arc::new(FakeMuxDriver::new());
        let driver: Arc<dyn MuxDriver> = fake.clone();
        let clock = FakeClock::new();
        let events: Arc<dyn EventSink> = Arc::new(NoopEventSink);
        let launcher = Arc::new(Launcher::new(store.clone(), driver.clone(), clock.clone(), events.clone()));
        let monitor = AutoMonitor::new(store.clone(), driver, clock, events, launcher);
        (monitor, store, fake)
    }

    #[tokio::test]
    async fn completion_marker_closes_task_and_appends_summary() {
        let (monitor, store, driver) = harness().await;
        let mut task = Task::new("hi", "body", 0);
        task.kanban_column = KanbanColumn::InProgress;
        task.status = TaskStatus::InProgress;
        task.binding = Some(binding());
        task.toggles = TaskToggles {
            auto_close: Toggle::True,
            ..TaskToggles::default()
        };
        let sig = task.signal_id().to_string();
        let task_id = task.id.clone();
        store.save_task(task);

        driver.set_capture(
            "lane-main:1.0",
            format!("working...\n<promise>{sig}-DONE</promise>\n<promise-summary>{sig}\nAll done.\n</promise-summary>"),
        );

        let closed = monitor.tick().await;
        assert_eq!(closed, 1);

        let finished = store.get_task(&task_id).unwrap();
        assert_eq!(finished.status, TaskStatus::Completed);
        assert_eq!(finished.kanban_column, KanbanColumn::Done);
        assert!(finished.binding.is_none());
        assert!(finished.input.contains("All done."));
    }

    #[tokio::test]
    async fn task_without_completion_marker_is_left_untouched() {
        let (monitor, store, driver) = harness().await;
        let mut task = Task::new("hi", "", 0);
        task.kanban_column = KanbanColumn::InProgress;
        task.binding = Some(binding());
        task.toggles = TaskToggles {
            auto_close: Toggle::True,
            ..TaskToggles::default()
        };
        let task_id = task.id.clone();
        store.save_task(task);
        driver.set_capture("lane-main:1.0", "still thinking...");

        let closed = monitor.tick().await;
        assert_eq!(closed, 0);
        assert_eq!(store.get_task(&task_id).unwrap().kanban_column, KanbanColumn::InProgress);
    }

    #[tokio::test]
    async fn ready_dependent_is_auto_started_after_completion() {
        let (monitor, store, driver) = harness().await;
        let lane = Lane::new("main", "local", PathBuf::from("/repo"), "lane-main", 0);
        store.save_lane(lane.clone());

        let mut upstream = Task::new("upstream", "", 0);
        upstream.swim_lane_id = Some(lane.id.clone());
        upstream.kanban_column = KanbanColumn::InProgress;
        upstream.status = TaskStatus::InProgress;
        upstream.binding = Some(binding());
        upstream.toggles = TaskToggles {
            auto_close: Toggle::True,
            ..TaskToggles::default()
        };
        let upstream_sig = upstream.signal_id().to_string();
        let upstream_id = upstream.id.clone();
        store.save_task(upstream);

        let mut downstream = Task::new("downstream", "", 0);
        downstream.swim_lane_id = Some(lane.id.clone());
        downstream.kanban_column = KanbanColumn::Backlog;
        downstream.depends_on = vec![upstream_id.clone()];
        downstream.toggles = TaskToggles {
            auto_start: Toggle::True,
            ..TaskToggles::default()
        };
        let downstream_id = downstream.id.clone();
        store.save_task(downstream);

        driver.set_capture("lane-main:1.0", format!("<promise>{upstream_sig}-DONE</promise>"));

        monitor.tick().await;

        let started = store.get_task(&downstream_id).unwrap();
        assert_eq!(started.status, TaskStatus::InProgress);
        assert!(started.binding.is_some());
    }
}
