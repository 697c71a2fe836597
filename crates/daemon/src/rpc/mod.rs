// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The JSON-RPC 2.0 router (spec §4.9, §4.10): one dispatch table shared
//! by all three transports (Unix socket, `POST /rpc`, and indirectly
//! `GET /events`/`GET /health`). Grounded on the teacher's
//! `ConnectionError`-wraps-every-handler-error shape in
//! `daemon/src/listener/mod.rs`, generalized from the teacher's bespoke
//! line-protocol commands to a full JSON-RPC 2.0 envelope.

pub mod agent;
pub mod ai;
pub mod backend;
pub mod daemon_ns;
pub mod db;
pub mod fanout;
pub mod kanban;
pub mod pipeline;
pub mod role;
pub mod runtime;
pub mod task;
pub mod team;
pub mod tmux;

use crate::state::AppState;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use swimlane_core::ApiError;

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const APPLICATION_ERROR: i64 = -32000;

#[derive(Debug, Clone, Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
    #[serde(default)]
    pub id: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    fn ok(id: Option<serde_json::Value>, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn err(id: Option<serde_json::Value>, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(RpcError { code, message: message.into() }),
        }
    }
}

/// Parses one line/body of raw JSON-RPC input. A malformed envelope never
/// panics the caller — it returns a `-32700`/`-32600` response to send
/// back instead.
pub fn parse_request(raw: &str) -> Result<RpcRequest, RpcResponse> {
    let value: serde_json::Value = serde_json::from_str(raw).map_err(|err| RpcResponse::err(None, PARSE_ERROR, err.to_string()))?;
    if !value.is_object() {
        return Err(RpcResponse::err(None, INVALID_REQUEST, "request must be a JSON object"));
    }
    serde_json::from_value(value.clone())
        .map_err(|_| RpcResponse::err(value.get("id").cloned(), INVALID_REQUEST, "missing or malformed 'method' field"))
}

fn api_error_to_response(id: Option<serde_json::Value>, err: ApiError) -> RpcResponse {
    RpcResponse::err(id, APPLICATION_ERROR, err.to_string())
}

/// Dispatches one already-parsed request to its handler and returns the
/// response to send back. `None` means the request was a notification
/// (no `id`) and produces no response (spec §6 "Notifications ... produce
/// no response").
pub async fn dispatch(state: &Arc<AppState>, request: RpcRequest) -> Option<RpcResponse> {
    let id = request.id.clone();
    let result = route(state, &request.method, request.params).await;
    if id.is_none() {
        return None;
    }
    Some(match result {
        Ok(value) => RpcResponse::ok(id, value),
        Err(RouteError::NotFound) => RpcResponse::err(id, METHOD_NOT_FOUND, format!("method not found: {}", request.method)),
        Err(RouteError::Api(err)) => api_error_to_response(id, err),
    })
}

pub enum RouteError {
    NotFound,
    Api(ApiError),
}

impl From<ApiError> for RouteError {
    fn from(err: ApiError) -> Self {
        RouteError::Api(err)
    }
}

async fn route(state: &Arc<AppState>, method: &str, params: serde_json::Value) -> Result<serde_json::Value, RouteError> {
    let (namespace, rest) = method.split_once('.').ok_or(RouteError::NotFound)?;
    match namespace {
        "agent" => agent::dispatch(state, rest, params).await,
        "task" => task::dispatch(state, rest, params).await,
        "ai" => ai::dispatch(state, rest, params).await,
        "team" => team::dispatch(state, rest, params).await,
        "pipeline" => pipeline::dispatch(state, rest, params).await,
        "kanban" => kanban::dispatch(state, rest, params).await,
        "runtime" => runtime::dispatch(state, rest, params).await,
        "daemon" => daemon_ns::dispatch(state, rest, params).await,
        "role" => role::dispatch(state, rest, params).await,
        "backend" => backend::dispatch(state, rest, params).await,
        "tmux" => tmux::dispatch(state, rest, params).await,
        "db" => db::dispatch(state, rest, params).await,
        "fanout" => fanout::dispatch(state, rest, params).await,
        _ => Err(RouteError::NotFound),
    }
}

/// Shared param-parsing helper: most handlers accept a single JSON object
/// of named fields.
pub(crate) fn parse_params<T: serde::de::DeserializeOwned>(params: serde_json::Value) -> Result<T, RouteError> {
    serde_json::from_value(params).map_err(|err| RouteError::Api(ApiError::validation(format!("invalid params: {err}"))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_request_rejects_malformed_json() {
        let err = parse_request("not json").unwrap_err();
        assert_eq!(err.error.unwrap().code, PARSE_ERROR);
    }

    #[test]
    fn parse_request_rejects_non_object() {
        let err = parse_request("42").unwrap_err();
        assert_eq!(err.error.unwrap().code, INVALID_REQUEST);
    }

    #[test]
    fn parse_request_accepts_well_formed_envelope() {
        let req = parse_request(r#"{"jsonrpc":"2.0","id":1,"method":"daemon.health","params":{}}"#).unwrap();
        assert_eq!(req.method, "daemon.health");
    }
}
