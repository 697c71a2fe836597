// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The single shell-quoting function every interpolation of a user-controlled
//! identifier into a shell command string must go through (spec §9). The
//! session-name whitelist check used by `agentGetAttachCommand` is a second
//! line of defense on top of this, not a replacement for it.

/// POSIX single-quote a shell argument: wrap in `'...'`, escaping embedded
/// single quotes as `'\''`.
pub fn quote_shell_arg(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for ch in s.chars() {
        if ch == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(ch);
        }
    }
    out.push('\'');
    out
}

/// Session/window names must match `[A-Za-z0-9_\-:.]+` before being
/// interpolated into a returned shell command string (spec §4.9).
pub fn validate_session_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b':' | b'.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_plain_string() {
        assert_eq!(quote_shell_arg("hello"), "'hello'");
    }

    #[test]
    fn escapes_embedded_single_quote() {
        assert_eq!(quote_shell_arg("it's"), "'it'\\''s'");
    }

    #[test]
    fn validates_safe_session_names() {
        assert!(validate_session_name("lane-foo_bar:1.2"));
    }

    #[test]
    fn rejects_names_with_shell_metacharacters() {
        assert!(!validate_session_name("foo; rm -rf /"));
        assert!(!validate_session_name("foo$(whoami)"));
        assert!(!validate_session_name(""));
    }
}
