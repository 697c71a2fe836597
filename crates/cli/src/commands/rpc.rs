// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `swlanectl rpc` — a generic passthrough to any JSON-RPC method the
//! daemon exposes (spec §4.9/§6), for scripting and debugging without a
//! dedicated subcommand per entity.

use crate::client::DaemonClient;
use anyhow::{anyhow, Result};
use clap::Args;
use swimlane_daemon::config::Config;

#[derive(Args)]
pub struct RpcArgs {
    /// Fully-qualified method name, e.g. `task.list` or `daemon.health`
    pub method: String,
    /// Params as a JSON object; defaults to `{}`
    #[arg(default_value = "{}")]
    pub params: String,
}

pub async fn handle(args: RpcArgs, config: &Config) -> Result<()> {
    let params: serde_json::Value = serde_json::from_str(&args.params).map_err(|err| anyhow!("invalid params JSON: {err}"))?;

    let client = DaemonClient::connect(config)?;
    let result = client.call(&args.method, params).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
