// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Heuristic status detection from captured terminal output (spec §4.3),
//! used when the authoritative `cc_state` pane option is absent. New code —
//! the teacher detects completion via structured log watching
//! (`crates/adapters/src/agent/watcher.rs`) rather than terminal-text
//! heuristics — grounded on the shape of the teacher's `AgentState` enum.

const SPINNER_GLYPHS: &[char] = &[
    '⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏', '◐', '◓', '◑', '◒',
];

const WORKING_KEYWORDS: &[&str] = &[
    "Thinking",
    "Generating",
    "Processing",
    "Analyzing",
    "Writing",
    "Reading",
];

const PROMPT_MARKERS: &[&str] = &["❯", ">>>", "claude>"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedStatus {
    Idle,
    Waiting,
    Working,
}

/// Maps the authoritative `cc_state` pane option value, when present, to a
/// `DetectedStatus` (`busy`→working, `user`→waiting, `idle`→idle).
pub fn from_cc_state(cc_state: &str) -> Option<DetectedStatus> {
    match cc_state {
        "busy" => Some(DetectedStatus::Working),
        "user" => Some(DetectedStatus::Waiting),
        "idle" => Some(DetectedStatus::Idle),
        _ => None,
    }
}

/// Heuristic fallback over captured pane text (spec §4.3).
pub fn detect_from_capture(capture: &str) -> DetectedStatus {
    let trimmed = capture.trim();
    if trimmed.is_empty() {
        return DetectedStatus::Idle;
    }

    if let Some(last_line) = trimmed.lines().last() {
        let last_line_trimmed = last_line.trim();
        if PROMPT_MARKERS.iter().any(|m| last_line_trimmed.ends_with(m))
            || last_line_trimmed.ends_with('$')
            || last_line_trimmed.ends_with('?')
        {
            return DetectedStatus::Waiting;
        }
    }

    let lines: Vec<&str> = trimmed.lines().collect();
    let tail_start = lines.len().saturating_sub(10);
    let tail = &lines[tail_start..];

    let has_spinner = tail.iter().any(|line| {
        line.chars().any(|c| SPINNER_GLYPHS.contains(&c))
            || (line.trim().len() <= 5 && line.trim().chars().any(|c| "|/-\\".contains(c)))
    });
    let has_working_keyword = tail
        .iter()
        .any(|line| WORKING_KEYWORDS.iter().any(|kw| line.contains(kw)));

    if has_spinner || has_working_keyword || trimmed.len() > 500 {
        return DetectedStatus::Working;
    }

    DetectedStatus::Idle
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cc_state_maps_busy_to_working() {
        assert_eq!(from_cc_state("busy"), Some(DetectedStatus::Working));
    }

    #[test]
    fn cc_state_unknown_value_is_none() {
        assert_eq!(from_cc_state("whatever"), None);
    }

    #[test]
    fn empty_capture_is_idle() {
        assert_eq!(detect_from_capture("   \n  "), DetectedStatus::Idle);
    }

    #[test]
    fn prompt_marker_is_waiting() {
        assert_eq!(detect_from_capture("some output\n❯ "), DetectedStatus::Waiting);
    }

    #[test]
    fn trailing_question_mark_is_waiting() {
        assert_eq!(detect_from_capture("Continue?"), DetectedStatus::Waiting);
    }

    #[test]
    fn spinner_glyph_is_working() {
        assert_eq!(detect_from_capture("⠋ Thinking about it"), DetectedStatus::Working);
    }

    #[test]
    fn working_keyword_is_working() {
        assert_eq!(detect_from_capture("Generating response..."), DetectedStatus::Working);
    }

    #[test]
    fn long_tail_is_working() {
        let long = "x".repeat(600);
        assert_eq!(detect_from_capture(&long), DetectedStatus::Working);
    }

    #[test]
    fn plain_text_is_idle() {
        assert_eq!(detect_from_capture("done.\nall good"), DetectedStatus::Idle);
    }
}
