// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `tmux.*` (spec §6): a direct read-through to the multiplexer tree, for
//! UIs that want the raw session/window/pane layout rather than a
//! task/lane-shaped view of it.

use crate::rpc::RouteError;
use crate::state::AppState;
use serde_json::{json, Value};
use std::sync::Arc;
use swimlane_core::ApiError;

pub async fn dispatch(state: &Arc<AppState>, method: &str, _params: Value) -> Result<Value, RouteError> {
    match method {
        "getTree" => get_tree(state).await,
        _ => Err(RouteError::NotFound),
    }
}

async fn get_tree(state: &Arc<AppState>) -> Result<Value, RouteError> {
    let tree = state.driver.get_tree(true).await.map_err(ApiError::from)?;
    Ok(json!(tree))
}
