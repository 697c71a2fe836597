// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Unix socket transport (spec §4.10): one JSON-RPC request per line
//! in, one JSON-RPC response per line out. Grounded on the teacher's
//! `listener::Listener` accept-loop shape (`daemon/src/listener/mod.rs`),
//! generalized from the teacher's bespoke framed protocol to newline
//! delimiting since every request here already fits in one JSON value.

use crate::rpc;
use crate::state::AppState;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, error, warn};

/// Runs the accept loop until the socket is closed or an I/O error stops
/// it. Each connection is handled in its own spawned task so one slow or
/// misbehaving client can't stall the others.
pub async fn serve(listener: UnixListener, state: Arc<AppState>) {
    loop {
        match listener.accept().await {
            Ok((stream, _addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    if let Err(err) = handle_connection(stream, &state).await {
                        warn!(error = %err, "socket connection ended with an error");
                    }
                });
            }
            Err(err) => {
                error!(error = %err, "unix socket accept failed");
                break;
            }
        }
    }
}

async fn handle_connection(stream: UnixStream, state: &Arc<AppState>) -> std::io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = match rpc::parse_request(&line) {
            Ok(request) => rpc::dispatch(state, request).await,
            Err(response) => Some(response),
        };

        let Some(response) = response else {
            // Notification: no `id`, so no response line is written.
            continue;
        };

        debug!(response = ?response, "socket response");
        let mut body = serde_json::to_vec(&response).unwrap_or_else(|_| b"{}".to_vec());
        body.push(b'\n');
        writer.write_all(&body).await?;
    }

    Ok(())
}
