// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Auto-close (spec §4.7): after a task has sat in `done` for long enough,
//! sweeps its window, appends a heuristic session summary, and releases the
//! binding. No LLM involved — plain keyword scanning over the tail capture.

use super::binding_target;
use crate::env::auto_close_delay;
use crate::guard::ProcessingGuard;
use std::sync::Arc;
use swimlane_adapters::MuxDriver;
use swimlane_core::{Clock, KanbanColumn, Task, TaskId};
use swimlane_storage::Store;
use tracing::warn;

const CAPTURE_LINES: u32 = 500;

const ERROR_KEYWORDS: &[&str] = &["error", "fail", "exception", "panic", "abort", "fatal", "warn"];
const RESULT_KEYWORDS: &[&str] = &[
    "pass", "success", "complete", "done", "finish", "built", "created", "merged", "deployed",
];

/// Heuristic session summary (spec §4.7): up to the last three "result"
/// lines bullet-listed, up to the last two "error" lines joined under
/// "Issues:", falling back to the last three lines if neither matches.
pub fn summarize(capture: &str) -> String {
    let lines: Vec<&str> = capture.lines().map(str::trim).filter(|l| !l.is_empty()).collect();

    let matches = |line: &str, keywords: &[&str]| {
        let lower = line.to_lowercase();
        keywords.iter().any(|kw| lower.contains(kw))
    };

    let results: Vec<&str> = lines.iter().rev().filter(|l| matches(l, RESULT_KEYWORDS)).take(3).rev().copied().collect();
    let errors: Vec<&str> = lines.iter().rev().filter(|l| matches(l, ERROR_KEYWORDS)).take(2).rev().copied().collect();

    if results.is_empty() && errors.is_empty() {
        let tail: Vec<&str> = lines.iter().rev().take(3).rev().copied().collect();
        return tail.join("\n");
    }

    let mut out = String::new();
    if !results.is_empty() {
        for line in &results {
            out.push_str("- ");
            out.push_str(line);
            out.push('\n');
        }
    }
    if !errors.is_empty() {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str("Issues:\n");
        for line in &errors {
            out.push_str("- ");
            out.push_str(line);
            out.push('\n');
        }
    }
    out.trim_end().to_string()
}

pub struct AutoClose<C: Clock> {
    store: Arc<Store>,
    driver: Arc<dyn MuxDriver>,
    clock: C,
    guard: ProcessingGuard<TaskId>,
}

impl<C: Clock> AutoClose<C> {
    pub fn new(store: Arc<Store>, driver: Arc<dyn MuxDriver>, clock: C) -> Self {
        Self {
            store,
            driver,
            clock,
            guard: ProcessingGuard::new(),
        }
    }

    /// Runs one sweep. Returns the number of windows swept this tick.
    pub async fn tick(&self) -> usize {
        let delay_ms = auto_close_delay().as_millis() as u64;
        let now = self.clock.epoch_ms();

        let candidates: Vec<Task> = self
            .store
            .list_tasks()
            .into_iter()
            .filter(|t| t.kanban_column == KanbanColumn::Done)
            .filter(|t| t.binding.is_some())
            .filter(|t| t.done_at.map(|done_at| now.saturating_sub(done_at) > delay_ms).unwrap_or(false))
            .collect();

        let mut swept = 0usize;
        for task in candidates {
            let Some(permit) = self.guard.try_claim(task.id.clone()) else {
                continue;
            };
            if self.process_task(task).await {
                swept += 1;
            }
            drop(permit);
        }
        swept
    }

    async fn process_task(&self, mut task: Task) -> bool {
        let Some(binding) = task.binding.clone() else {
            return false;
        };
        let target = binding_target(&binding);

        let capture = match self.driver.capture_pane_content(&target, CAPTURE_LINES).await {
            Ok(capture) => capture,
            Err(err) => {
                warn!(task_id = %task.id, error = %err, "auto-close capture failed");
                return false;
            }
        };

        let summary = summarize(&capture);
        task.input = format!("{}\n\n**Session Summary**\n{}", task.input, summary);

        if let Err(err) = self.driver.kill_window(&target).await {
            warn!(task_id = %task.id, error = %err, "auto-close failed to kill window");
        }
        task.binding = None;
        self.store.save_task(task);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swimlane_core::{FakeClock, TmuxBinding};
    use swimlane_adapters::FakeMuxDriver;
    use std::time::Duration;

    fn binding() -> TmuxBinding {
        TmuxBinding {
            server_id: "local".to_string(),
            session_name: "lane-main".to_string(),
            window_index: 1,
            pane_index: 0,
        }
    }

    #[test]
    fn summarize_prefers_result_and_error_lines() {
        let capture = "building...\nran tests\nAll tests pass\nerror: flaky test retried\nBuild succeeded";
        let summary = summarize(capture);
        assert!(summary.contains("All tests pass"));
        assert!(summary.contains("Build succeeded"));
        assert!(summary.contains("Issues:"));
        assert!(summary.contains("error: flaky test retried"));
    }

    #[test]
    fn summarize_falls_back_to_last_three_lines() {
        let capture = "one\ntwo\nthree\nfour";
        let summary = summarize(capture);
        assert_eq!(summary, "two\nthree\nfour");
    }

    #[tokio::test]
    async fn sweeps_window_after_delay_elapses() {
        let store = Arc::new(Store::open_in_memory().await);
        let fake = Arc::new(FakeMuxDriver::new());
        let driver: Arc<dyn MuxDriver> = fake.clone();
        let clock = FakeClock::new();
        let monitor = AutoClose::new(store.clone(), driver, clock.clone());

        let mut task = Task::new("hi", "", 0);
        task.kanban_column = KanbanColumn::Done;
        task.binding = Some(binding());
        task.done_at = Some(clock.epoch_ms());
        let task_id = task.id.clone();
        store.save_task(task);
        fake.set_capture("lane-main:1.0", "Build succeeded\ndeployed to staging");

        assert_eq!(monitor.tick().await, 0);

        clock.advance(Duration::from_secs(601));
        let swept = monitor.tick().await;
        assert_eq!(swept, 1);
        let closed = store.get_task(&task_id).unwrap();
        assert!(closed.binding.is_none());
        assert!(closed.input.contains("Session Summary"));
    }
}
