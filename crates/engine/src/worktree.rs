// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Git worktree provisioning for a task (spec §4.4 step 4).

use std::path::{Path, PathBuf};
use swimlane_adapters::{quote_shell_arg, MuxDriver};
use swimlane_core::MultiplexerErrorKind;

/// Provisions a fresh worktree named `task-{signal_id}` under
/// `{workingDirectory}/.worktrees`, removing any stale worktree/branch of
/// the same name first. Runs entirely through `exec_command` so it works
/// identically against local and remote runtimes.
pub async fn provision_worktree(
    driver: &dyn MuxDriver,
    working_directory: &Path,
    signal_id: &str,
) -> Result<PathBuf, MultiplexerErrorKind> {
    let worktree_name = format!("task-{signal_id}");
    let worktree_path = working_directory.join(".worktrees").join(&worktree_name);

    let command = format!(
        "cd {wd} && git worktree remove --force {path} >/dev/null 2>&1; git branch -D {branch} >/dev/null 2>&1; git worktree add -b {branch} {path}",
        wd = quote_shell_arg(&working_directory.display().to_string()),
        path = quote_shell_arg(&worktree_path.display().to_string()),
        branch = quote_shell_arg(&worktree_name),
    );

    let out = driver.exec_command(&command).await?;
    if !out.success {
        return Err(MultiplexerErrorKind::Generic(out.stderr));
    }
    Ok(worktree_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use swimlane_adapters::{FakeMuxDriver, MuxCall};

    #[tokio::test]
    async fn successful_provision_returns_worktrees_subpath() {
        let driver = FakeMuxDriver::new();
        let path = provision_worktree(&driver, Path::new("/repo"), "abcd1234").await.unwrap();
        assert_eq!(path, PathBuf::from("/repo/.worktrees/task-abcd1234"));
    }

    #[tokio::test]
    async fn issued_command_contains_worktree_add_and_branch_name() {
        let driver = FakeMuxDriver::new();
        provision_worktree(&driver, Path::new("/repo"), "abcd1234").await.unwrap();
        let calls = driver.calls();
        let exec_call = calls
            .iter()
            .find_map(|c| match c {
                MuxCall::ExecCommand { command } => Some(command.clone()),
                _ => None,
            })
            .expect("exec_command call recorded");
        assert!(exec_call.contains("git worktree add -b 'task-abcd1234'"));
    }

    #[tokio::test]
    async fn exec_failure_is_propagated() {
        let driver = FakeMuxDriver::new();
        driver.fail_next_exec();
        let result = provision_worktree(&driver, Path::new("/repo"), "abcd1234").await;
        assert!(result.is_err());
    }
}
