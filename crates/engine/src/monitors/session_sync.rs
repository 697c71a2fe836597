// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session-sync (spec §4.7): the sole owner of `Lane::session_active`.
//! Reconciles each lane's tmux session against the live tree, fails out
//! tasks whose session vanished, and re-binds tasks that lost their window
//! reference but whose session is still alive.

use super::binding_target;
use crate::guard::ProcessingGuard;
use std::sync::Arc;
use swimlane_adapters::MuxDriver;
use swimlane_core::id::ShortId;
use swimlane_core::{Clock, KanbanColumn, LaneId, Task, TaskStatus, TmuxBinding};
use swimlane_storage::Store;
use tracing::warn;

const ID_PREFIX_LEN: usize = 15;

pub struct SessionSync<C: Clock> {
    store: Arc<Store>,
    driver: Arc<dyn MuxDriver>,
    clock: C,
    guard: ProcessingGuard<LaneId>,
}

impl<C: Clock> SessionSync<C> {
    pub fn new(store: Arc<Store>, driver: Arc<dyn MuxDriver>, clock: C) -> Self {
        Self {
            store,
            driver,
            clock,
            guard: ProcessingGuard::new(),
        }
    }

    /// Runs one sweep over every lane. Returns the number of lanes processed.
    pub async fn tick(&self) -> usize {
        let tree = match self.driver.get_tree(true).await {
            Ok(tree) => tree,
            Err(err) => {
                warn!(error = %err, "session-sync failed to fetch tree");
                return 0;
            }
        };

        let mut processed = 0usize;
        for lane in self.store.list_lanes() {
            let Some(permit) = self.guard.try_claim(lane.id.clone()) else {
                continue;
            };
            self.sync_lane(lane, &tree).await;
            drop(permit);
            processed += 1;
        }
        processed
    }

    async fn sync_lane(&self, mut lane: swimlane_core::Lane, tree: &[swimlane_adapters::SessionInfo]) {
        let session = tree.iter().find(|s| s.name == lane.session_name);

        match session {
            None => {
                lane.session_active = false;
                self.fail_bound_tasks(&lane).await;
            }
            Some(session) => {
                lane.session_active = session.attached;
                self.rebind_unbound_tasks(&lane, session).await;
            }
        }
        self.store.save_lane(lane);
    }

    /// Tasks bound to a session that no longer exists can't be recovered;
    /// fail them out and release the binding.
    async fn fail_bound_tasks(&self, lane: &swimlane_core::Lane) {
        let affected: Vec<Task> = self
            .store
            .tasks_in_lane(&lane.id)
            .into_iter()
            .filter(|t| matches!(t.kanban_column, KanbanColumn::InProgress | KanbanColumn::InReview))
            .filter(|t| t.binding.as_ref().map(|b| b.session_name == lane.session_name).unwrap_or(false))
            .collect();

        let now = self.clock.epoch_ms();
        for mut task in affected {
            task.binding = None;
            task.error_message = Some("Tmux session no longer exists".to_string());
            task.record_status_change(TaskStatus::Failed, task.kanban_column, now);
            self.store.save_task(task);
        }
    }

    /// Unbound (or window-lost) tasks in a still-live session get a chance
    /// to re-bind if a window named after their id prefix turns up.
    async fn rebind_unbound_tasks(&self, lane: &swimlane_core::Lane, session: &swimlane_adapters::SessionInfo) {
        let candidates: Vec<Task> = self
            .store
            .tasks_in_lane(&lane.id)
            .into_iter()
            .filter(|t| matches!(t.kanban_column, KanbanColumn::InProgress | KanbanColumn::InReview))
            .collect();

        for mut task in candidates {
            let window_still_present = task.binding.as_ref().map(|binding| {
                let target = binding_target(binding);
                session
                    .windows
                    .iter()
                    .any(|w| format!("{}:{}.0", session.name, w.index) == target || w.index == binding.window_index)
            });

            if window_still_present == Some(true) {
                continue;
            }

            let needle = task.id.as_str().short(ID_PREFIX_LEN);
            let Some(window) = session.window_named_containing(needle) else {
                continue;
            };

            let pane_index = window.panes.first().map(|p| p.index).unwrap_or(0);
            task.binding = Some(TmuxBinding {
                server_id: lane.server_id.clone(),
                session_name: lane.session_name.clone(),
                window_index: window.index,
                pane_index,
            });
            self.store.save_task(task);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use swimlane_adapters::{FakeMuxDriver, MuxDriver};
    use swimlane_core::{FakeClock, Lane};

    async fn harness() -> (SessionSync<FakeClock>, Arc<Store>, Arc<FakeMuxDriver>) {
        let store = Arc::new(Store::open_in_memory().await);
        let fake = Arc::new(FakeMuxDriver::new());
        let driver: Arc<dyn MuxDriver> = fake.clone();
        let clock = FakeClock::new();
        let sync = SessionSync::new(store.clone(), driver, clock);
        (sync, store, fake)
    }

    #[tokio::test]
    async fn missing_session_marks_inactive_and_fails_bound_tasks() {
        let (sync, store, _fake) = harness().await;
        let lane = Lane::new("main", "local", PathBuf::from("/repo"), "lane-main", 0);
        store.save_lane(lane.clone());

        let mut task = Task::new("hi", "", 0);
        task.swim_lane_id = Some(lane.id.clone());
        task.kanban_column = KanbanColumn::InProgress;
        task.binding = Some(TmuxBinding {
            server_id: "local".to_string(),
            session_name: "lane-main".to_string(),
            window_index: 1,
            pane_index: 0,
        });
        let task_id = task.id.clone();
        store.save_task(task);

        sync.tick().await;

        let updated_lane = store.get_lane(&lane.id).unwrap();
        assert!(!updated_lane.session_active);

        let failed = store.get_task(&task_id).unwrap();
        assert_eq!(failed.status, TaskStatus::Failed);
        assert!(failed.binding.is_none());
        assert_eq!(failed.error_message.as_deref(), Some("Tmux session no longer exists"));
    }

    #[tokio::test]
    async fn live_session_marks_active() {
        let (sync, store, fake) = harness().await;
        let lane = Lane::new("main", "local", PathBuf::from("/repo"), "lane-main", 0);
        store.save_lane(lane.clone());
        fake.seed_session(swimlane_adapters::SessionInfo {
            name: "lane-main".to_string(),
            attached: true,
            created: 0,
            activity: 0,
            windows: vec![],
        });

        sync.tick().await;

        let updated_lane = store.get_lane(&lane.id).unwrap();
        assert!(updated_lane.session_active);
    }
}
