// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The local-vs-remote execution boundary underneath `TmuxMuxDriver` (spec
//! §4.2, §9 "runtime polymorphism over multiplexer/backend"). Everything
//! above this trait deals in `tmux` argv; everything below it decides
//! whether that argv runs as a direct subprocess or gets wrapped through a
//! remote login shell.

use crate::env::mux_command_timeout;
use crate::mux::quote::quote_shell_arg;
use crate::mux::types::ExecOutput;
use async_trait::async_trait;
use swimlane_core::MultiplexerErrorKind;
use tokio::process::Command;

/// Runs an argv vector (program + args) and returns its output, or a
/// `MultiplexerErrorKind` classifying the failure.
#[async_trait]
pub trait ShellExec: Send + Sync + 'static {
    async fn exec(&self, argv: &[String]) -> Result<ExecOutput, MultiplexerErrorKind>;
}

/// Runs commands directly on the local machine.
#[derive(Debug, Clone, Default)]
pub struct LocalShell;

#[async_trait]
impl ShellExec for LocalShell {
    async fn exec(&self, argv: &[String]) -> Result<ExecOutput, MultiplexerErrorKind> {
        let Some((program, args)) = argv.split_first() else {
            return Err(MultiplexerErrorKind::Generic("empty argv".into()));
        };
        let fut = Command::new(program).args(args).output();
        let output = match tokio::time::timeout(mux_command_timeout(), fut).await {
            Ok(Ok(o)) => o,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(MultiplexerErrorKind::NotInstalled)
            }
            Ok(Err(e)) => return Err(MultiplexerErrorKind::Generic(e.to_string())),
            Err(_) => return Err(MultiplexerErrorKind::TimedOut),
        };
        Ok(ExecOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Configuration for reaching a `tmux` instance over a remote shell (spec
/// §4.2 "remote wrapping").
#[derive(Debug, Clone)]
pub struct RemoteShellConfig {
    pub host: String,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub identity_file: Option<String>,
    pub connect_timeout_secs: u64,
}

impl RemoteShellConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            user: None,
            identity_file: None,
            connect_timeout_secs: 10,
        }
    }
}

/// Wraps every command through `ssh [timeout/batch-mode/accept-new-host-key
/// flags] [identity] 'login-shell -c "escaped-command"'`. Login-shell
/// invocation is mandatory so shell profile files contribute to `PATH`
/// (spec §4.2).
#[derive(Debug, Clone)]
pub struct RemoteShell {
    config: RemoteShellConfig,
}

impl RemoteShell {
    pub fn new(config: RemoteShellConfig) -> Self {
        Self { config }
    }

    fn ssh_target(&self) -> String {
        match &self.config.user {
            Some(user) => format!("{user}@{}", self.config.host),
            None => self.config.host.clone(),
        }
    }

    fn build_argv(&self, remote_command: &str) -> Vec<String> {
        let mut argv = vec!["ssh".to_string()];
        argv.push("-o".into());
        argv.push(format!(
            "ConnectTimeout={}",
            self.config.connect_timeout_secs
        ));
        argv.push("-o".into());
        argv.push("BatchMode=yes".into());
        argv.push("-o".into());
        argv.push("StrictHostKeyChecking=accept-new".into());
        if let Some(port) = self.config.port {
            argv.push("-p".into());
            argv.push(port.to_string());
        }
        if let Some(identity) = &self.config.identity_file {
            argv.push("-i".into());
            argv.push(identity.clone());
        }
        argv.push(self.ssh_target());
        let login_shell = format!("bash -lc {}", quote_shell_arg(remote_command));
        argv.push(login_shell);
        argv
    }
}

#[async_trait]
impl ShellExec for RemoteShell {
    async fn exec(&self, argv: &[String]) -> Result<ExecOutput, MultiplexerErrorKind> {
        let remote_command = argv
            .iter()
            .map(|a| quote_shell_arg(a))
            .collect::<Vec<_>>()
            .join(" ");
        let wrapped = self.build_argv(&remote_command);
        let Some((program, args)) = wrapped.split_first() else {
            return Err(MultiplexerErrorKind::Generic("empty argv".into()));
        };
        let fut = Command::new(program).args(args).output();
        let output = match tokio::time::timeout(mux_command_timeout(), fut).await {
            Ok(Ok(o)) => o,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(MultiplexerErrorKind::NotInstalled)
            }
            Ok(Err(e)) => return Err(MultiplexerErrorKind::Generic(e.to_string())),
            Err(_) => return Err(MultiplexerErrorKind::TimedOut),
        };

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            if stderr.contains("Permission denied")
                || stderr.contains("Authentication failed")
            {
                return Err(MultiplexerErrorKind::AuthFailed);
            }
            if stderr.contains("Connection refused") || stderr.contains("Connection timed out") {
                return Err(MultiplexerErrorKind::ConnectionRefused);
            }
        }

        Ok(ExecOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_argv_uses_login_shell_and_escapes_command() {
        let shell = RemoteShell::new(RemoteShellConfig::new("example.com"));
        let argv = shell.build_argv("tmux list-sessions");
        let joined = argv.join(" ");
        assert!(joined.contains("bash -lc"));
        assert!(joined.contains("example.com"));
        assert!(joined.contains("BatchMode=yes"));
    }

    #[test]
    fn remote_argv_includes_identity_and_port_when_set() {
        let mut config = RemoteShellConfig::new("host");
        config.port = Some(2222);
        config.identity_file = Some("/home/u/.ssh/id_ed25519".into());
        config.user = Some("deploy".into());
        let shell = RemoteShell::new(config);
        let argv = shell.build_argv("tmux list-sessions");
        assert!(argv.contains(&"-p".to_string()));
        assert!(argv.contains(&"2222".to_string()));
        assert!(argv.contains(&"-i".to_string()));
        assert!(argv.iter().any(|a| a == "deploy@host"));
    }
}
