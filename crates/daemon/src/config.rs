// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration (spec §6): a restricted TOML file plus a handful
//! of environment-variable overrides, grounded on the teacher's
//! `lifecycle::Config`/`state_dir()` path-resolution idiom.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use swimlane_core::{Runtime, RuntimeId, RuntimeKind};
use thiserror::Error;

fn default_unix_socket() -> String {
    "daemon.sock".to_string()
}
fn default_http_port() -> u16 {
    3456
}
fn default_ws_port() -> u16 {
    3457
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_auto_monitor_interval() -> u64 {
    5_000
}
fn default_max_restarts() -> u32 {
    5
}
fn default_restart_window() -> u64 {
    30_000
}
fn default_backoff_delay() -> u64 {
    60_000
}
fn default_max_request_size() -> usize {
    1_048_576
}
fn default_request_timeout() -> u64 {
    30_000
}

/// A `[[runtimes]]` table entry in `config.toml` (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: RuntimeKind,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub config_file: Option<String>,
    pub context: Option<String>,
}

impl RuntimeEntry {
    pub fn into_runtime(self) -> Runtime {
        Runtime {
            id: RuntimeId::new(self.id),
            kind: self.kind,
            host: self.host,
            port: self.port,
            user: self.user,
            config_file: self.config_file.map(PathBuf::from),
            context: self.context,
        }
    }
}

/// Restricted TOML configuration surface (spec §6). Unknown keys are
/// ignored by `toml`'s default deserialization; invalid values fail
/// [`Config::validate`] rather than `toml::from_str` itself so the
/// supervisor can print a complete list of problems instead of bailing on
/// the first one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileConfig {
    pub unix_socket: String,
    pub http_port: u16,
    pub ws_port: u16,
    pub log_level: String,
    pub log_file: Option<String>,
    pub pid_file: Option<String>,
    pub data_dir: Option<String>,
    pub db_path: Option<String>,
    pub enable_auto_monitor: bool,
    pub auto_monitor_interval: u64,
    pub reconcile_on_start: bool,
    pub max_restarts: u32,
    pub restart_window: u64,
    pub backoff_delay: u64,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub max_request_size: usize,
    pub request_timeout: u64,
    pub runtimes: Vec<RuntimeEntry>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            unix_socket: default_unix_socket(),
            http_port: default_http_port(),
            ws_port: default_ws_port(),
            log_level: default_log_level(),
            log_file: None,
            pid_file: None,
            data_dir: None,
            db_path: None,
            enable_auto_monitor: default_true(),
            auto_monitor_interval: default_auto_monitor_interval(),
            reconcile_on_start: default_true(),
            max_restarts: default_max_restarts(),
            restart_window: default_restart_window(),
            backoff_delay: default_backoff_delay(),
            enable_cors: default_true(),
            cors_origins: Vec::new(),
            max_request_size: default_max_request_size(),
            request_timeout: default_request_timeout(),
            runtimes: Vec::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine home directory")]
    NoHomeDir,
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0:?}")]
    Invalid(Vec<String>),
}

/// Fully-resolved daemon configuration: the parsed file plus every
/// filesystem path the daemon touches, already joined against `data_dir`.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub socket_path: PathBuf,
    pub pid_path: PathBuf,
    pub log_path: PathBuf,
    pub db_path: PathBuf,
    pub config_path: PathBuf,
    pub http_port: u16,
    pub ws_port: u16,
    pub log_level: String,
    pub enable_auto_monitor: bool,
    pub auto_monitor_interval_ms: u64,
    pub reconcile_on_start: bool,
    pub max_restarts: u32,
    pub restart_window_ms: u64,
    pub backoff_delay_ms: u64,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub max_request_size: usize,
    pub request_timeout_ms: u64,
    pub runtimes: Vec<Runtime>,
}

/// Default data directory: `SWIMLANE_DATA_DIR` > `$HOME/.swimlane`
/// (spec.md's `$HOME/.tmux-agents` is renamed per the » note in
/// SPEC_FULL.md; the directory name itself is not a load-bearing
/// invariant).
pub fn default_data_dir() -> Result<PathBuf, ConfigError> {
    if let Ok(dir) = std::env::var("SWIMLANE_DATA_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home.join(".swimlane"))
}

impl Config {
    /// Loads `config.toml` from the data directory (if present), applies
    /// defaults for anything absent, resolves every path, and validates.
    pub fn load() -> Result<Self, ConfigError> {
        let data_dir = default_data_dir()?;
        let config_path = data_dir.join("config.toml");

        let file_config = if config_path.exists() {
            let raw = std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
                path: config_path.clone(),
                source,
            })?;
            toml::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: config_path.clone(),
                source,
            })?
        } else {
            FileConfig::default()
        };

        Self::from_file_config(data_dir, config_path, file_config)
    }

    fn from_file_config(
        data_dir: PathBuf,
        config_path: PathBuf,
        file: FileConfig,
    ) -> Result<Self, ConfigError> {
        let resolve = |configured: Option<String>, default_name: &str| {
            configured.map(PathBuf::from).unwrap_or_else(|| data_dir.join(default_name))
        };

        let config = Self {
            socket_path: data_dir.join(&file.unix_socket),
            pid_path: resolve(file.pid_file, "daemon.pid"),
            log_path: resolve(file.log_file, "daemon.log"),
            db_path: resolve(file.db_path, "data.db"),
            http_port: file.http_port,
            ws_port: file.ws_port,
            log_level: file.log_level,
            enable_auto_monitor: file.enable_auto_monitor,
            auto_monitor_interval_ms: file.auto_monitor_interval,
            reconcile_on_start: file.reconcile_on_start,
            max_restarts: file.max_restarts,
            restart_window_ms: file.restart_window,
            backoff_delay_ms: file.backoff_delay,
            enable_cors: file.enable_cors,
            cors_origins: file.cors_origins,
            max_request_size: file.max_request_size,
            request_timeout_ms: file.request_timeout,
            runtimes: file.runtimes.into_iter().map(RuntimeEntry::into_runtime).collect(),
            data_dir,
            config_path,
        };

        let errors = config.validate();
        if !errors.is_empty() {
            return Err(ConfigError::Invalid(errors));
        }
        Ok(config)
    }

    /// Returns every validation problem found, rather than stopping at the
    /// first (spec §6: "the validator returns a non-empty error list").
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !["debug", "info", "warn", "error"].contains(&self.log_level.as_str()) {
            errors.push(format!("logLevel must be one of debug/info/warn/error, got {}", self.log_level));
        }
        if self.http_port == 0 {
            errors.push("httpPort must be nonzero".to_string());
        }
        if self.ws_port == 0 {
            errors.push("wsPort must be nonzero".to_string());
        }
        if self.max_restarts == 0 {
            errors.push("maxRestarts must be at least 1".to_string());
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_validation() {
        let config = Config::from_file_config(
            PathBuf::from("/tmp/swimlane-test"),
            PathBuf::from("/tmp/swimlane-test/config.toml"),
            FileConfig::default(),
        )
        .unwrap();
        assert!(config.validate().is_empty());
        assert_eq!(config.http_port, 3456);
    }

    #[test]
    fn invalid_log_level_is_rejected() {
        let mut file = FileConfig::default();
        file.log_level = "verbose".to_string();
        let err = Config::from_file_config(
            PathBuf::from("/tmp/swimlane-test"),
            PathBuf::from("/tmp/swimlane-test/config.toml"),
            file,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn runtime_entries_convert_to_core_runtime() {
        let mut file = FileConfig::default();
        file.runtimes.push(RuntimeEntry {
            id: "prod".to_string(),
            kind: RuntimeKind::Docker,
            host: None,
            port: None,
            user: None,
            config_file: None,
            context: None,
        });
        let config = Config::from_file_config(
            PathBuf::from("/tmp/swimlane-test"),
            PathBuf::from("/tmp/swimlane-test/config.toml"),
            file,
        )
        .unwrap();
        assert_eq!(config.runtimes.len(), 1);
        assert_eq!(config.runtimes[0].kind, RuntimeKind::Docker);
    }
}
