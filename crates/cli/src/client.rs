// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A thin JSON-RPC client over the daemon's Unix socket, grounded on the
//! teacher's `DaemonClient` (`cli/src/client.rs`) — connect-only, no
//! framing beyond a trailing newline since the daemon speaks one JSON
//! value per line.

use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use swimlane_daemon::config::Config;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("daemon not running (no socket at {0})")]
    NotRunning(PathBuf),
    #[error("request timed out")]
    Timeout,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed response from daemon: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("daemon returned an error: {0}")]
    Rpc(String),
}

/// Request timeout, overridable for slow calls like `db.snapshot`.
fn timeout() -> Duration {
    std::env::var("SWLANECTL_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(10))
}

pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    /// Connects to the running daemon's Unix socket. No auto-start: the
    /// supervisor owns process lifecycle, not individual RPC calls (spec
    /// §4.11 — callers that want auto-start use `swlanectl daemon start`).
    pub fn connect(config: &Config) -> Result<Self, ClientError> {
        if !config.socket_path.exists() {
            return Err(ClientError::NotRunning(config.socket_path.clone()));
        }
        Ok(Self { socket_path: config.socket_path.clone() })
    }

    /// Sends one JSON-RPC request and returns the parsed `result` value.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, ClientError> {
        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = tokio::time::timeout(timeout(), self.send(&request)).await.map_err(|_| ClientError::Timeout)??;

        if let Some(err) = response.get("error") {
            let message = err.get("message").and_then(Value::as_str).unwrap_or("unknown error").to_string();
            return Err(ClientError::Rpc(message));
        }
        Ok(response.get("result").cloned().unwrap_or(Value::Null))
    }

    async fn send(&self, request: &Value) -> Result<Value, ClientError> {
        let stream = UnixStream::connect(&self.socket_path).await?;
        let (reader, mut writer) = stream.into_split();

        let mut line = serde_json::to_vec(request)?;
        line.push(b'\n');
        writer.write_all(&line).await?;
        writer.flush().await?;

        let mut lines = BufReader::new(reader).lines();
        let response_line = lines.next_line().await?.ok_or_else(|| {
            ClientError::Io(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "daemon closed the connection"))
        })?;

        Ok(serde_json::from_str(&response_line)?)
    }
}
