// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Auto-pilot (spec §4.7): scans in-progress tasks for a provider CLI
//! waiting on an approval prompt and answers `yes` on the user's behalf.

use super::binding_target;
use crate::guard::ProcessingGuard;
use std::sync::Arc;
use swimlane_adapters::MuxDriver;
use swimlane_core::{effective, KanbanColumn, Task, TaskId, ToggleKey};
use swimlane_storage::Store;
use tracing::warn;

const CAPTURE_LINES: u32 = 30;

/// Fixed set of English approval-prompt phrases (spec §4.7), matched
/// case-insensitively against the captured tail.
const APPROVAL_PHRASES: &[&str] = &[
    "do you want to proceed",
    "(y/n)",
    "press enter to",
    "shall i",
    "may i",
];

fn looks_like_approval_prompt(capture: &str) -> bool {
    let lower = capture.to_lowercase();
    if APPROVAL_PHRASES.iter().any(|phrase| lower.contains(phrase)) {
        return true;
    }
    lower
        .lines()
        .last()
        .map(|line| line.trim_end().ends_with('?'))
        .unwrap_or(false)
}

pub struct AutoPilot {
    store: Arc<Store>,
    driver: Arc<dyn MuxDriver>,
    guard: ProcessingGuard<TaskId>,
}

impl AutoPilot {
    pub fn new(store: Arc<Store>, driver: Arc<dyn MuxDriver>) -> Self {
        Self {
            store,
            driver,
            guard: ProcessingGuard::new(),
        }
    }

    /// Runs one sweep. Returns the number of prompts answered this tick.
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
                effective(&t.toggles, lane_defaults.as_ref(), ToggleKey::AutoPilot)
            })
            .collect();

        let mut answered = 0usize;
        for task in candidates {
            let Some(permit) = self.guard.try_claim(task.id.clone()) else {
                continue;
            };
            if self.process_task(&task).await {
                answered += 1;
            }
            drop(permit);
        }
        answered
    }

    async fn process_task(&self, task: &Task) -> bool {
        let Some(binding) = task.binding.as_ref() else {
            return false;
        };
        let target = binding_target(binding);
        let capture = match self.driver.capture_pane_content(&target, CAPTURE_LINES).await {
            Ok(capture) => capture,
            Err(err) => {
                warn!(task_id = %task.id, error = %err, "auto-pilot capture failed");
                return false;
            }
        };

        if !looks_like_approval_prompt(&capture) {
            return false;
        }

        if let Err(err) = self.driver.send_keys(&target, "yes").await {
            warn!(task_id = %task.id, error = %err, "auto-pilot failed to answer prompt");
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swimlane_adapters::{FakeMuxDriver, MuxCall};
    use swimlane_core::{TaskToggles, Toggle, TmuxBinding};

    fn binding() -> TmuxBinding {
        TmuxBinding {
            server_id: "local".to_string(),
            session_name: "lane-main".to_string(),
            window_index: 1,
            pane_index: 0,
        }
    }

    #[test]
    fn recognizes_yn_prompt() {
        assert!(looks_like_approval_prompt("Delete this file? (y/n)"));
    }

    #[test]
    fn recognizes_trailing_question_mark() {
        assert!(looks_like_approval_prompt("output\nShall I continue?"));
    }

    #[test]
    fn plain_output_is_not_a_prompt() {
        assert!(!looks_like_approval_prompt("compiling...\ndone."));
    }

    #[tokio::test]
    async fn approval_prompt_triggers_yes_keystroke() {
        let store = Arc::new(Store::open_in_memory().await);
        let fake = Arc::new(FakeMuxDriver::new());
        let driver: Arc<dyn MuxDriver> = fake.clone();
        let monitor = AutoPilot::new(store.clone(), driver);

        let mut task = Task::new("hi", "", 0);
        task.kanban_column = KanbanColumn::InProgress;
        task.binding = Some(binding());
        task.toggles = TaskToggles {
            auto_pilot: Toggle::True,
            ..TaskToggles::default()
        };
        store.save_task(task);
        fake.set_capture("lane-main:1.0", "Do you want to proceed? (y/n)");

        let answered = monitor.tick().await;
        assert_eq!(answered, 1);
        assert!(fake
            .calls()
            .iter()
            .any(|c| matches!(c, MuxCall::SendKeys { text, .. } if text == "yes")));
    }

    #[tokio::test]
    async fn non_prompt_output_is_ignored() {
        let store = Arc::new(Store::open_in_memory().await);
        let fake = Arc::new(FakeMuxDriver::new());
        let driver: Arc<dyn MuxDriver> = fake.clone();
        let monitor = AutoPilot::new(store.clone(), driver);

        let mut task = Task::new("hi", "", 0);
        task.kanban_column = KanbanColumn::InProgress;
        task.binding = Some(binding());
        task.toggles = TaskToggles {
            auto_pilot: Toggle::True,
            ..TaskToggles::default()
        };
        store.save_task(task);
        fake.set_capture("lane-main:1.0", "compiling crate swimlane-engine...");

        assert_eq!(monitor.tick().await, 0);
    }
}
