// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fanout.*` (spec §6/§7): broadcasting one prompt across several agents
//! at once. Declared but not implemented in this scope.

use crate::rpc::RouteError;
use crate::state::AppState;
use serde_json::Value;
use std::sync::Arc;
use swimlane_core::ApiError;

pub async fn dispatch(_state: &Arc<AppState>, method: &str, _params: Value) -> Result<Value, RouteError> {
    match method {
        "run" => Err(ApiError::Unimplemented("fanout.run").into()),
        _ => Err(RouteError::NotFound),
    }
}
