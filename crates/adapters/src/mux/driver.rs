// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `MuxDriver` trait (spec §4.2) and its `tmux`-backed implementation,
//! generic over the local/remote execution boundary (`ShellExec`).

use crate::env::mux_cache_ttl;
use crate::mux::cache::TreeCache;
use crate::mux::shell_exec::ShellExec;
use crate::mux::types::{ExecOutput, NewSessionOpts, PaneInfo, PaneOptions, SessionInfo, SplitDirection, WindowInfo};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use swimlane_core::MultiplexerErrorKind;

/// Abstracts the external terminal-multiplexer so higher layers deal in
/// `(serverId, sessionName, windowIndex, paneIndex)` coordinates regardless
/// of whether the multiplexer runs locally or behind a remote shell (spec
/// §4.2).
#[async_trait]
pub trait MuxDriver: Send + Sync + 'static {
    async fn get_tree(&self, fresh: bool) -> Result<Vec<SessionInfo>, MultiplexerErrorKind>;
    async fn list_sessions(&self) -> Result<Vec<String>, MultiplexerErrorKind>;
    async fn new_session(
        &self,
        name: &str,
        opts: NewSessionOpts,
    ) -> Result<(), MultiplexerErrorKind>;
    async fn delete_session(&self, name: &str) -> Result<(), MultiplexerErrorKind>;
    async fn rename_session(&self, old: &str, new: &str) -> Result<(), MultiplexerErrorKind>;
    async fn has_session(&self, name: &str) -> Result<bool, MultiplexerErrorKind>;

    async fn new_window(
        &self,
        session: &str,
        name: Option<&str>,
    ) -> Result<u32, MultiplexerErrorKind>;
    async fn rename_window(&self, target: &str, name: &str) -> Result<(), MultiplexerErrorKind>;
    async fn kill_window(&self, target: &str) -> Result<(), MultiplexerErrorKind>;
    async fn select_window(&self, target: &str) -> Result<(), MultiplexerErrorKind>;

    async fn kill_pane(&self, target: &str) -> Result<(), MultiplexerErrorKind>;
    async fn select_pane(&self, target: &str) -> Result<(), MultiplexerErrorKind>;
    async fn split_pane(
        &self,
        target: &str,
        dir: SplitDirection,
    ) -> Result<(), MultiplexerErrorKind>;

    async fn capture_pane_content(
        &self,
        target: &str,
        lines: u32,
    ) -> Result<String, MultiplexerErrorKind>;
    /// Types `text` then an Enter key; quotes embedded in `text` are escaped.
    async fn send_keys(&self, target: &str, text: &str) -> Result<(), MultiplexerErrorKind>;
    /// Sends a literal multiplexer key token (e.g. `Enter`).
    async fn send_raw_keys(&self, target: &str, raw: &str) -> Result<(), MultiplexerErrorKind>;
    /// Loads `text` through stdin into the paste buffer and pastes it,
    /// avoiding shell escaping for multi-line prompts.
    async fn paste_text(&self, target: &str, text: &str) -> Result<(), MultiplexerErrorKind>;

    async fn get_multiple_pane_options(
        &self,
        pane_ids: &[String],
    ) -> Result<HashMap<String, PaneOptions>, MultiplexerErrorKind>;

    /// Runs an arbitrary command in the same shell context the multiplexer
    /// commands use; used for worktree manipulation.
    async fn exec_command(&self, command: &str) -> Result<ExecOutput, MultiplexerErrorKind>;
}

/// `tmux`-backed implementation, generic over local/remote execution.
pub struct TmuxMuxDriver<E: ShellExec> {
    exec: E,
    cache: TreeCache,
}

impl<E: ShellExec> TmuxMuxDriver<E> {
    pub fn new(exec: E) -> Self {
        Self {
            exec,
            cache: TreeCache::new(mux_cache_ttl()),
        }
    }

    async fn tmux(&self, args: &[&str]) -> Result<ExecOutput, MultiplexerErrorKind> {
        let mut argv = vec!["tmux".to_string()];
        argv.extend(args.iter().map(|s| s.to_string()));
        self.exec.exec(&argv).await
    }

    async fn run_or_classify(&self, args: &[&str]) -> Result<ExecOutput, MultiplexerErrorKind> {
        let out = self.tmux(args).await?;
        if out.success {
            Ok(out)
        } else if out.stderr.contains("no server running")
            || out.stderr.contains("can't find session")
        {
            Err(MultiplexerErrorKind::SessionNotFound(out.stderr))
        } else {
            Err(MultiplexerErrorKind::Generic(out.stderr))
        }
    }

    async fn fetch_tree(&self) -> Result<Vec<SessionInfo>, MultiplexerErrorKind> {
        let (sessions_out, windows_out, panes_out) = tokio::try_join!(
            self.tmux(&[
                "list-sessions",
                "-F",
                "#{session_name}:#{session_attached}:#{session_created}:#{session_activity}"
            ]),
            self.tmux(&[
                "list-windows",
                "-a",
                "-F",
                "#{session_name}:#{window_index}:#{window_name}:#{window_active}"
            ]),
            self.tmux(&[
                "list-panes",
                "-a",
                "-F",
                "#{session_name}:#{window_index}:#{pane_index}:#{pane_current_command}:#{pane_current_path}:#{pane_active}:#{pane_pid}:#{pane_id}"
            ]),
        )?;

        if !sessions_out.success {
            if sessions_out.stderr.contains("no server running") {
                return Ok(Vec::new());
            }
            return Err(MultiplexerErrorKind::Generic(sessions_out.stderr));
        }

        let mut sessions: Vec<SessionInfo> = Vec::new();
        for line in sessions_out.stdout.lines() {
            let parts: Vec<&str> = line.splitn(4, ':').collect();
            if parts.len() != 4 {
                continue;
            }
            sessions.push(SessionInfo {
                name: parts[0].to_string(),
                attached: parts[1] == "1",
                created: parts[2].parse().unwrap_or(0),
                activity: parts[3].parse().unwrap_or(0),
                windows: Vec::new(),
            });
        }

        let mut windows: HashMap<String, Vec<WindowInfo>> = HashMap::new();
        for line in windows_out.stdout.lines() {
            let parts: Vec<&str> = line.splitn(4, ':').collect();
            if parts.len() != 4 {
                continue;
            }
            let (session, index, name, active) = (parts[0], parts[1], parts[2], parts[3]);
            windows.entry(session.to_string()).or_default().push(WindowInfo {
                index: index.parse().unwrap_or(0),
                name: name.to_string(),
                active: active == "1",
                panes: Vec::new(),
            });
        }

        for line in panes_out.stdout.lines() {
            let parts: Vec<&str> = line.splitn(8, ':').collect();
            if parts.len() < 7 {
                continue;
            }
            let session = parts[0];
            let window_index: u32 = parts[1].parse().unwrap_or(0);
            let pane = PaneInfo {
                index: parts[2].parse().unwrap_or(0),
                command: parts[3].to_string(),
                cwd: PathBuf::from(parts[4]),
                active: parts[5] == "1",
                pid: parts[6].parse().unwrap_or(0),
                pane_id: parts.get(7).map(|s| s.to_string()).filter(|s| !s.is_empty()),
            };
            if let Some(wins) = windows.get_mut(session) {
                if let Some(win) = wins.iter_mut().find(|w| w.index == window_index) {
                    win.panes.push(pane);
                }
            }
        }

        for session in &mut sessions {
            session.windows = windows.remove(&session.name).unwrap_or_default();
            session.windows.sort_by_key(|w| w.index);
        }

        Ok(sessions)
    }
}

#[async_trait]
impl<E: ShellExec> MuxDriver for TmuxMuxDriver<E> {
    async fn get_tree(&self, fresh: bool) -> Result<Vec<SessionInfo>, MultiplexerErrorKind> {
        if !fresh {
            if let Some(tree) = self.cache.get() {
                return Ok(tree);
            }
        }
        let tree = self.fetch_tree().await?;
        self.cache.fill(tree.clone());
        Ok(tree)
    }

    async fn list_sessions(&self) -> Result<Vec<String>, MultiplexerErrorKind> {
        Ok(self.get_tree(false).await?.into_iter().map(|s| s.name).collect())
    }

    async fn new_session(
        &self,
        name: &str,
        opts: NewSessionOpts,
    ) -> Result<(), MultiplexerErrorKind> {
        if self.has_session(name).await? {
            return Err(MultiplexerErrorKind::DuplicateSession(name.to_string()));
        }
        let mut args = vec!["new-session", "-d", "-s", name];
        let cwd_str;
        if let Some(cwd) = &opts.cwd {
            cwd_str = cwd.display().to_string();
            args.push("-c");
            args.push(&cwd_str);
        }
        if let Some(window_name) = &opts.window_name {
            args.push("-n");
            args.push(window_name);
        }
        self.run_or_classify(&args).await?;
        self.cache.invalidate();
        Ok(())
    }

    async fn delete_session(&self, name: &str) -> Result<(), MultiplexerErrorKind> {
        self.run_or_classify(&["kill-session", "-t", name]).await?;
        self.cache.invalidate();
        Ok(())
    }

    async fn rename_session(&self, old: &str, new: &str) -> Result<(), MultiplexerErrorKind> {
        self.run_or_classify(&["rename-session", "-t", old, new]).await?;
        self.cache.invalidate();
        Ok(())
    }

    async fn has_session(&self, name: &str) -> Result<bool, MultiplexerErrorKind> {
        let out = self.tmux(&["has-session", "-t", name]).await?;
        Ok(out.success)
    }

    async fn new_window(
        &self,
        session: &str,
        name: Option<&str>,
    ) -> Result<u32, MultiplexerErrorKind> {
        let mut args = vec!["new-window", "-t", session, "-P", "-F", "#{window_index}"];
        if let Some(name) = name {
            args.push("-n");
            args.push(name);
        }
        let out = self.run_or_classify(&args).await?;
        self.cache.invalidate();
        out.stdout
            .trim()
            .parse()
            .map_err(|_| MultiplexerErrorKind::Generic("unparseable window index".into()))
    }

    async fn rename_window(&self, target: &str, name: &str) -> Result<(), MultiplexerErrorKind> {
        self.run_or_classify(&["rename-window", "-t", target, name]).await?;
        self.cache.invalidate();
        Ok(())
    }

    async fn kill_window(&self, target: &str) -> Result<(), MultiplexerErrorKind> {
        let out = self.tmux(&["kill-window", "-t", target]).await?;
        self.cache.invalidate();
        if out.success || out.stderr.contains("can't find window") {
            Ok(())
        } else {
            Err(MultiplexerErrorKind::WindowNotFound(target.to_string()))
        }
    }

    async fn select_window(&self, target: &str) -> Result<(), MultiplexerErrorKind> {
        self.run_or_classify(&["select-window", "-t", target]).await.map(|_| ())
    }

    async fn kill_pane(&self, target: &str) -> Result<(), MultiplexerErrorKind> {
        let out = self.tmux(&["kill-pane", "-t", target]).await?;
        self.cache.invalidate();
        if out.success || out.stderr.contains("can't find pane") {
            Ok(())
        } else {
            Err(MultiplexerErrorKind::PaneNotFound(target.to_string()))
        }
    }

    async fn select_pane(&self, target: &str) -> Result<(), MultiplexerErrorKind> {
        self.run_or_classify(&["select-pane", "-t", target]).await.map(|_| ())
    }

    async fn split_pane(
        &self,
        target: &str,
        dir: SplitDirection,
    ) -> Result<(), MultiplexerErrorKind> {
        self.run_or_classify(&["split-window", dir.flag(), "-t", target]).await?;
        self.cache.invalidate();
        Ok(())
    }

    async fn capture_pane_content(
        &self,
        target: &str,
        lines: u32,
    ) -> Result<String, MultiplexerErrorKind> {
        let start = format!("-{lines}");
        let out = self
            .run_or_classify(&["capture-pane", "-t", target, "-p", "-S", &start])
            .await?;
        Ok(out.stdout)
    }

    async fn send_keys(&self, target: &str, text: &str) -> Result<(), MultiplexerErrorKind> {
        self.run_or_classify(&["send-keys", "-t", target, "-l", "--", text]).await?;
        self.run_or_classify(&["send-keys", "-t", target, "Enter"]).await?;
        Ok(())
    }

    async fn send_raw_keys(&self, target: &str, raw: &str) -> Result<(), MultiplexerErrorKind> {
        self.run_or_classify(&["send-keys", "-t", target, raw]).await.map(|_| ())
    }

    async fn paste_text(&self, target: &str, text: &str) -> Result<(), MultiplexerErrorKind> {
        // Loaded as a single argv element rather than interpolated into a
        // shell string, so multi-line prompt text (including the
        // completion-signal markers) never needs shell escaping.
        self.run_or_classify(&["set-buffer", "-b", "swimlane-paste", text]).await?;
        self.run_or_classify(&["paste-buffer", "-b", "swimlane-paste", "-t", target]).await?;
        Ok(())
    }

    async fn get_multiple_pane_options(
        &self,
        pane_ids: &[String],
    ) -> Result<HashMap<String, PaneOptions>, MultiplexerErrorKind> {
        let mut result = HashMap::new();
        for pane_id in pane_ids {
            let out = self
                .tmux(&["show-options", "-p", "-t", pane_id])
                .await?;
            if !out.success {
                continue;
            }
            let mut opts = PaneOptions::default();
            for line in out.stdout.lines() {
                let Some((key, value)) = line.split_once(' ') else {
                    continue;
                };
                let value = value.trim().trim_matches('"').to_string();
                match key {
                    "@cc_state" => opts.cc_state = Some(value),
                    "@cc_model" => opts.cc_model = Some(value),
                    "@cc_session_id" => opts.cc_session_id = Some(value),
                    "@cc_cost" => opts.cc_cost = Some(value),
                    "@cc_tokens_in" => opts.cc_tokens_in = Some(value),
                    "@cc_tokens_out" => opts.cc_tokens_out = Some(value),
                    "@cc_context_pct" => opts.cc_context_pct = Some(value),
                    "@cc_git_branch" => opts.cc_git_branch = Some(value),
                    _ => {}
                }
            }
            result.insert(pane_id.clone(), opts);
        }
        Ok(result)
    }

    async fn exec_command(&self, command: &str) -> Result<ExecOutput, MultiplexerErrorKind> {
        self.exec.exec(&["bash".to_string(), "-lc".to_string(), command.to_string()]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Replies to `tmux list-sessions/list-windows/list-panes` with canned
    /// output and records every argv it was called with.
    struct FakeExec {
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl FakeExec {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ShellExec for FakeExec {
        async fn exec(&self, argv: &[String]) -> Result<ExecOutput, MultiplexerErrorKind> {
            self.calls.lock().push(argv.to_vec());
            let out = match argv.get(1).map(String::as_str) {
                Some("list-sessions") => "lane-a:1:100:200\nlane-b:0:101:201\n",
                Some("list-windows") => "lane-a:1:editor:1\nlane-b:1:agent:1\n",
                Some("list-panes") => {
                    "lane-a:1:0:vim:/home/a:1:111:%1\nlane-b:1:0:claude:/home/b:1:222:%2\n"
                }
                _ => "",
            };
            Ok(ExecOutput {
                success: true,
                stdout: out.to_string(),
                stderr: String::new(),
            })
        }
    }

    fn driver() -> TmuxMuxDriver<FakeExec> {
        TmuxMuxDriver::new(FakeExec::new())
    }

    #[tokio::test]
    async fn fetch_tree_stitches_sessions_windows_and_panes() {
        let driver = driver();
        let tree = driver.get_tree(true).await.unwrap();
        assert_eq!(tree.len(), 2);

        let lane_a = tree.iter().find(|s| s.name == "lane-a").unwrap();
        assert!(lane_a.attached);
        assert_eq!(lane_a.windows.len(), 1);
        assert_eq!(lane_a.windows[0].name, "editor");
        assert_eq!(lane_a.windows[0].panes.len(), 1);
        assert_eq!(lane_a.windows[0].panes[0].command, "vim");
        assert_eq!(lane_a.windows[0].panes[0].pane_id.as_deref(), Some("%1"));

        let lane_b = tree.iter().find(|s| s.name == "lane-b").unwrap();
        assert!(!lane_b.attached);
        assert_eq!(lane_b.windows[0].panes[0].command, "claude");
    }

    #[tokio::test]
    async fn get_tree_caches_within_ttl() {
        let driver = driver();
        driver.get_tree(false).await.unwrap();
        driver.get_tree(false).await.unwrap();
        let calls = driver.exec.calls.lock();
        let list_session_calls = calls
            .iter()
            .filter(|argv| argv.get(1).map(String::as_str) == Some("list-sessions"))
            .count();
        assert_eq!(list_session_calls, 1, "second get_tree should hit the cache");
    }

    #[tokio::test]
    async fn get_tree_fresh_bypasses_cache() {
        let driver = driver();
        driver.get_tree(false).await.unwrap();
        driver.get_tree(true).await.unwrap();
        let calls = driver.exec.calls.lock();
        let list_session_calls = calls
            .iter()
            .filter(|argv| argv.get(1).map(String::as_str) == Some("list-sessions"))
            .count();
        assert_eq!(list_session_calls, 2);
    }

    #[tokio::test]
    async fn paste_text_uses_set_buffer_then_paste_buffer_as_single_argv_element() {
        let driver = driver();
        driver.paste_text("lane-a:1.0", "line one\nline two").await.unwrap();
        let calls = driver.exec.calls.lock();
        let set_buffer = calls.iter().find(|a| a.get(1).map(String::as_str) == Some("set-buffer")).unwrap();
        assert!(set_buffer.iter().any(|a| a == "line one\nline two"));
        assert!(calls.iter().any(|a| a.get(1).map(String::as_str) == Some("paste-buffer")));
    }
}
