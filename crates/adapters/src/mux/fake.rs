// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake multiplexer driver for tests — an in-memory tree with recorded
//! calls, grounded on the teacher's `FakeSessionAdapter`.

use crate::mux::driver::MuxDriver;
use crate::mux::types::{ExecOutput, NewSessionOpts, PaneInfo, PaneOptions, SessionInfo, SplitDirection, WindowInfo};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use swimlane_core::MultiplexerErrorKind;

#[derive(Debug, Clone)]
pub enum MuxCall {
    NewSession { name: String },
    DeleteSession { name: String },
    NewWindow { session: String, name: Option<String> },
    KillWindow { target: String },
    CapturePaneContent { target: String, lines: u32 },
    SendKeys { target: String, text: String },
    SendRawKeys { target: String, raw: String },
    PasteText { target: String, text: String },
    ExecCommand { command: String },
}

struct FakeState {
    sessions: Vec<SessionInfo>,
    captures: HashMap<String, String>,
    pane_options: HashMap<String, PaneOptions>,
    calls: Vec<MuxCall>,
    next_window_index: u32,
    fail_exec: bool,
}

/// Deterministic in-memory stand-in for a `tmux`-backed `MuxDriver`.
#[derive(Clone)]
pub struct FakeMuxDriver {
    inner: Arc<Mutex<FakeState>>,
}

impl Default for FakeMuxDriver {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeState {
                sessions: Vec::new(),
                captures: HashMap::new(),
                pane_options: HashMap::new(),
                calls: Vec::new(),
                next_window_index: 1,
                fail_exec: false,
            })),
        }
    }
}

impl FakeMuxDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<MuxCall> {
        self.inner.lock().calls.clone()
    }

    /// Seeds a session so tests can assert on pre-existing multiplexer state.
    pub fn seed_session(&self, session: SessionInfo) {
        self.inner.lock().sessions.push(session);
    }

    /// Sets the text a subsequent `capture_pane_content(target, _)` returns.
    pub fn set_capture(&self, target: &str, content: impl Into<String>) {
        self.inner.lock().captures.insert(target.to_string(), content.into());
    }

    pub fn set_pane_options(&self, pane_id: &str, opts: PaneOptions) {
        self.inner.lock().pane_options.insert(pane_id.to_string(), opts);
    }

    /// Simulates an external `kill-session`: removes the session entirely.
    pub fn simulate_session_killed(&self, name: &str) {
        self.inner.lock().sessions.retain(|s| s.name != name);
    }

    pub fn fail_next_exec(&self) {
        self.inner.lock().fail_exec = true;
    }
}

#[async_trait]
impl MuxDriver for FakeMuxDriver {
    async fn get_tree(&self, _fresh: bool) -> Result<Vec<SessionInfo>, MultiplexerErrorKind> {
        Ok(self.inner.lock().sessions.clone())
    }

    async fn list_sessions(&self) -> Result<Vec<String>, MultiplexerErrorKind> {
        Ok(self.inner.lock().sessions.iter().map(|s| s.name.clone()).collect())
    }

    async fn new_session(
        &self,
        name: &str,
        opts: NewSessionOpts,
    ) -> Result<(), MultiplexerErrorKind> {
        let mut state = self.inner.lock();
        if state.sessions.iter().any(|s| s.name == name) {
            return Err(MultiplexerErrorKind::DuplicateSession(name.to_string()));
        }
        let window_index = state.next_window_index;
        state.next_window_index += 1;
        state.sessions.push(SessionInfo {
            name: name.to_string(),
            attached: false,
            created: 0,
            activity: 0,
            windows: vec![WindowInfo {
                index: window_index,
                name: opts.window_name.unwrap_or_else(|| "placeholder".to_string()),
                active: true,
                panes: vec![PaneInfo {
                    index: 0,
                    command: "bash".to_string(),
                    cwd: opts.cwd.unwrap_or_default(),
                    active: true,
                    pid: 0,
                    pane_id: Some(format!("%{window_index}")),
                }],
            }],
        });
        state.calls.push(MuxCall::NewSession { name: name.to_string() });
        Ok(())
    }

    async fn delete_session(&self, name: &str) -> Result<(), MultiplexerErrorKind> {
        let mut state = self.inner.lock();
        state.sessions.retain(|s| s.name != name);
        state.calls.push(MuxCall::DeleteSession { name: name.to_string() });
        Ok(())
    }

    async fn rename_session(&self, old: &str, new: &str) -> Result<(), MultiplexerErrorKind> {
        let mut state = self.inner.lock();
        let Some(session) = state.sessions.iter_mut().find(|s| s.name == old) else {
            return Err(MultiplexerErrorKind::SessionNotFound(old.to_string()));
        };
        session.name = new.to_string();
        Ok(())
    }

    async fn has_session(&self, name: &str) -> Result<bool, MultiplexerErrorKind> {
        Ok(self.inner.lock().sessions.iter().any(|s| s.name == name))
    }

    async fn new_window(
        &self,
        session: &str,
        name: Option<&str>,
    ) -> Result<u32, MultiplexerErrorKind> {
        let mut state = self.inner.lock();
        let index = state.next_window_index;
        state.next_window_index += 1;
        let window_name = name.unwrap_or("window").to_string();
        let Some(s) = state.sessions.iter_mut().find(|s| s.name == session) else {
            return Err(MultiplexerErrorKind::SessionNotFound(session.to_string()));
        };
        s.windows.push(WindowInfo {
            index,
            name: window_name.clone(),
            active: true,
            panes: vec![PaneInfo {
                index: 0,
                command: "bash".to_string(),
                cwd: PathBuf::new(),
                active: true,
                pid: 0,
                pane_id: Some(format!("%{index}")),
            }],
        });
        state.calls.push(MuxCall::NewWindow {
            session: session.to_string(),
            name: name.map(|s| s.to_string()),
        });
        Ok(index)
    }

    async fn rename_window(&self, target: &str, name: &str) -> Result<(), MultiplexerErrorKind> {
        let mut state = self.inner.lock();
        for session in &mut state.sessions {
            for window in &mut session.windows {
                if format!("{}:{}", session.name, window.index) == target {
                    window.name = name.to_string();
                    return Ok(());
                }
            }
        }
        Err(MultiplexerErrorKind::WindowNotFound(target.to_string()))
    }

    async fn kill_window(&self, target: &str) -> Result<(), MultiplexerErrorKind> {
        let mut state = self.inner.lock();
        for session in &mut state.sessions {
            session.windows.retain(|w| format!("{}:{}", session.name, w.index) != target);
        }
        state.calls.push(MuxCall::KillWindow { target: target.to_string() });
        Ok(())
    }

    async fn select_window(&self, _target: &str) -> Result<(), MultiplexerErrorKind> {
        Ok(())
    }

    async fn kill_pane(&self, _target: &str) -> Result<(), MultiplexerErrorKind> {
        Ok(())
    }

    async fn select_pane(&self, _target: &str) -> Result<(), MultiplexerErrorKind> {
        Ok(())
    }

    async fn split_pane(
        &self,
        _target: &str,
        _dir: SplitDirection,
    ) -> Result<(), MultiplexerErrorKind> {
        Ok(())
    }

    async fn capture_pane_content(
        &self,
        target: &str,
        lines: u32,
    ) -> Result<String, MultiplexerErrorKind> {
        self.inner.lock().calls.push(MuxCall::CapturePaneContent {
            target: target.to_string(),
            lines,
        });
        Ok(self
            .inner
            .lock()
            .captures
            .get(target)
            .cloned()
            .unwrap_or_default())
    }

    async fn send_keys(&self, target: &str, text: &str) -> Result<(), MultiplexerErrorKind> {
        self.inner.lock().calls.push(MuxCall::SendKeys {
            target: target.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_raw_keys(&self, target: &str, raw: &str) -> Result<(), MultiplexerErrorKind> {
        self.inner.lock().calls.push(MuxCall::SendRawKeys {
            target: target.to_string(),
            raw: raw.to_string(),
        });
        Ok(())
    }

    async fn paste_text(&self, target: &str, text: &str) -> Result<(), MultiplexerErrorKind> {
        self.inner.lock().calls.push(MuxCall::PasteText {
            target: target.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn get_multiple_pane_options(
        &self,
        pane_ids: &[String],
    ) -> Result<HashMap<String, PaneOptions>, MultiplexerErrorKind> {
        let state = self.inner.lock();
        Ok(pane_ids
            .iter()
            .filter_map(|id| state.pane_options.get(id).map(|o| (id.clone(), o.clone())))
            .collect())
    }

    async fn exec_command(&self, command: &str) -> Result<ExecOutput, MultiplexerErrorKind> {
        let mut state = self.inner.lock();
        state.calls.push(MuxCall::ExecCommand { command: command.to_string() });
        if state.fail_exec {
            state.fail_exec = false;
            return Err(MultiplexerErrorKind::Generic("simulated failure".into()));
        }
        Ok(ExecOutput {
            success: true,
            stdout: String::new(),
            stderr: String::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn new_session_then_duplicate_fails() {
        let driver = FakeMuxDriver::new();
        driver.new_session("lane-a", NewSessionOpts::default()).await.unwrap();
        let err = driver.new_session("lane-a", NewSessionOpts::default()).await.unwrap_err();
        assert!(matches!(err, MultiplexerErrorKind::DuplicateSession(_)));
    }

    #[tokio::test]
    async fn simulate_session_killed_removes_it() {
        let driver = FakeMuxDriver::new();
        driver.new_session("lane-a", NewSessionOpts::default()).await.unwrap();
        driver.simulate_session_killed("lane-a");
        assert!(!driver.has_session("lane-a").await.unwrap());
    }
}
