// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The completion-signal protocol (spec §3, §4.5, §6 — load-bearing).
//!
//! `sigId` is always the last 8 characters of the task id; use
//! `Task::signal_id` to derive it rather than slicing the id by hand.

/// Builds the literal `<promise>{sigId}-DONE</promise>` completion marker.
pub fn done_marker(sig_id: &str) -> String {
    format!("<promise>{sig_id}-DONE</promise>")
}

/// Builds an opening `<promise-summary>{sigId}` tag; callers append the
/// summary body and a closing `</promise-summary>` tag.
pub fn summary_open_tag(sig_id: &str) -> String {
    format!("<promise-summary>{sig_id}")
}

pub const SUMMARY_CLOSE_TAG: &str = "</promise-summary>";

/// A parsed completion signal extracted from captured pane text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCompletion {
    pub done: bool,
    pub summary: Option<String>,
}

/// Scan `capture` for `sig_id`'s done marker and, if present, its summary
/// block. The summary's first line (the bare `{sigId}` echo) is skipped.
pub fn parse_completion(capture: &str, sig_id: &str) -> ParsedCompletion {
    let marker = done_marker(sig_id);
    let done = capture.contains(&marker);
    if !done {
        return ParsedCompletion {
            done: false,
            summary: None,
        };
    }

    let open = summary_open_tag(sig_id);
    let summary = capture.find(&open).and_then(|start| {
        let body_start = start + open.len();
        let rest = &capture[body_start..];
        rest.find(SUMMARY_CLOSE_TAG).map(|end| {
            let block = &rest[..end];
            block
                .trim_start_matches(['\n', '\r'])
                .trim_end()
                .to_string()
        })
    });

    ParsedCompletion { done, summary }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_done_marker() {
        let capture = "working...\n<promise>abcd1234-DONE</promise>\n";
        let parsed = parse_completion(capture, "abcd1234");
        assert!(parsed.done);
    }

    #[test]
    fn extracts_summary_skipping_id_echo_line() {
        let capture = "<promise>abcd1234-DONE</promise>\n<promise-summary>abcd1234\nBuilt feature X\nAll tests pass\n</promise-summary>";
        let parsed = parse_completion(capture, "abcd1234");
        assert!(parsed.done);
        assert_eq!(
            parsed.summary.as_deref(),
            Some("Built feature X\nAll tests pass")
        );
    }

    #[test]
    fn no_marker_means_not_done() {
        let parsed = parse_completion("still thinking", "abcd1234");
        assert!(!parsed.done);
        assert!(parsed.summary.is_none());
    }

    #[test]
    fn wrong_sig_id_does_not_match() {
        let capture = "<promise>ffffffff-DONE</promise>";
        let parsed = parse_completion(capture, "abcd1234");
        assert!(!parsed.done);
    }
}
