// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The prompt builder (spec §4.5): a pure, deterministic function from a
//! task plus context into the multi-line string pasted into a provider CLI.

use swimlane_core::completion::{done_marker, summary_open_tag, SUMMARY_CLOSE_TAG};
use swimlane_core::{Lane, Task};

/// Optional contextual blocks layered on top of the task description.
#[derive(Debug, Clone, Default)]
pub struct PromptContext<'a> {
    pub persona: Option<&'a str>,
    pub guild: Option<&'a str>,
    pub memory_load: Option<&'a str>,
    pub memory_save: Option<&'a str>,
    pub additional_instructions: Option<&'a str>,
    pub ask_for_context: bool,
    pub report_progress: bool,
    /// When true, the completion-protocol block is appended (spec §4.5:
    /// gated on `effective(autoClose)`).
    pub auto_close: bool,
}

/// A bundle of subtasks to enumerate in place of a single description
/// (spec §4.4 step 5: "if it has subtasks, a bundle prompt enumerating
/// them").
pub fn build_bundle_description(parent: &Task, subtasks: &[Task]) -> String {
    let mut out = String::new();
    out.push_str(&format!("**{}**\n\n", parent.description));
    if !parent.input.is_empty() {
        out.push_str(&parent.input);
        out.push_str("\n\n");
    }
    out.push_str("This task bundles the following subtasks:\n");
    for (i, sub) in subtasks.iter().enumerate() {
        out.push_str(&format!("{}. {} — {}\n", i + 1, sub.description, sub.input));
    }
    out
}

/// Builds the final prompt string for `task` in `lane`.
///
/// `description` is either the task's own `{description}\n\n{input}` form or
/// a pre-built bundle description from [`build_bundle_description`].
pub fn build_prompt(task: &Task, lane: &Lane, description: &str, ctx: &PromptContext<'_>) -> String {
    let mut sections: Vec<String> = Vec::new();

    if let Some(instructions) = lane.context_instructions.as_deref().filter(|s| !s.is_empty()) {
        sections.push(instructions.to_string());
    }

    if let Some(persona) = ctx.persona.filter(|s| !s.is_empty()) {
        sections.push(format!("**Persona:**\n{persona}"));
    }

    if let Some(guild) = ctx.guild.filter(|s| !s.is_empty()) {
        sections.push(format!("**Guild knowledge:**\n{guild}"));
    }

    if let Some(memory) = ctx.memory_load.filter(|s| !s.is_empty()) {
        sections.push(format!("**Memory:**\n{memory}"));
    }

    sections.push(description.to_string());

    if let Some(extra) = ctx.additional_instructions.filter(|s| !s.is_empty()) {
        sections.push(extra.to_string());
    }

    if ctx.ask_for_context {
        sections.push(
            "If anything about this task is ambiguous, ask a clarifying question before proceeding."
                .to_string(),
        );
    }

    if ctx.report_progress {
        sections.push(
            "Periodically report your progress as you work through this task.".to_string(),
        );
    }

    if let Some(memory_save) = ctx.memory_save.filter(|s| !s.is_empty()) {
        sections.push(format!("**Before finishing, save to memory:**\n{memory_save}"));
    }

    if ctx.auto_close {
        let sig_id = task.signal_id();
        sections.push(format!(
            "When you are completely finished with this task, emit the literal line:\n{}\n\nOptionally, immediately after it, include a short human-readable summary wrapped like this:\n{}\nYour summary here.\n{}",
            done_marker(sig_id),
            summary_open_tag(sig_id),
            SUMMARY_CLOSE_TAG,
        ));
    }

    sections.join("\n\n")
}

/// Convenience wrapper building the single-task description block
/// (`"{description}\n\n{input}"`, input omitted if empty).
pub fn single_task_description(task: &Task) -> String {
    if task.input.is_empty() {
        task.description.clone()
    } else {
        format!("{}\n\n{}", task.description, task.input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swimlane_core::TaskId;
    use std::path::PathBuf;

    fn lane() -> Lane {
        Lane::new("L", "local", PathBuf::from("/tmp"), "lane-s1", 0)
    }

    #[test]
    fn omits_empty_sections() {
        let task = Task::new("hello", "", 0);
        let ctx = PromptContext::default();
        let prompt = build_prompt(&task, &lane(), &single_task_description(&task), &ctx);
        assert_eq!(prompt, "hello");
    }

    #[test]
    fn includes_lane_context_instructions_first() {
        let mut l = lane();
        l.context_instructions = Some("Follow house style.".to_string());
        let task = Task::new("hello", "body", 0);
        let ctx = PromptContext::default();
        let prompt = build_prompt(&task, &l, &single_task_description(&task), &ctx);
        assert!(prompt.starts_with("Follow house style."));
    }

    #[test]
    fn completion_protocol_block_embeds_signal_id_from_task() {
        let mut task = Task::new("hello", "", 0);
        task.id = TaskId::new("task-0000000000000000abcd1234");
        let ctx = PromptContext {
            auto_close: true,
            ..Default::default()
        };
        let prompt = build_prompt(&task, &lane(), &single_task_description(&task), &ctx);
        assert!(prompt.contains("<promise>abcd1234-DONE</promise>"));
        assert!(prompt.contains("<promise-summary>abcd1234"));
    }

    #[test]
    fn no_completion_block_when_auto_close_is_false() {
        let task = Task::new("hello", "", 0);
        let ctx = PromptContext::default();
        let prompt = build_prompt(&task, &lane(), &single_task_description(&task), &ctx);
        assert!(!prompt.contains("<promise>"));
    }

    #[test]
    fn bundle_description_enumerates_subtasks() {
        let parent = Task::new("Ship v2", "", 0);
        let subtasks = vec![Task::new("write docs", "draft", 0), Task::new("add tests", "unit", 0)];
        let bundle = build_bundle_description(&parent, &subtasks);
        assert!(bundle.contains("1. write docs"));
        assert!(bundle.contains("2. add tests"));
    }
}
