// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backend mapping entity (spec §6 `backend` namespace) — external issue
//! trackers or similar systems a lane/task can sync against, plus their
//! sync-error log.

use crate::define_id;
use crate::id::random_id;
use serde::{Deserialize, Serialize};

define_id! {
    /// Opaque unique backend-mapping identifier.
    pub struct BackendId;
}

impl BackendId {
    pub fn generate() -> Self {
        Self(random_id("backend-"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Github,
    Gitlab,
    Jira,
    Linear,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendMapping {
    pub id: BackendId,
    pub kind: BackendKind,
    pub name: String,
    pub enabled: bool,
    pub config: serde_json::Value,
    pub created_at: u64,
    pub last_synced_at: Option<u64>,
}

impl BackendMapping {
    pub fn new(kind: BackendKind, name: impl Into<String>, created_at: u64) -> Self {
        Self {
            id: BackendId::generate(),
            kind,
            name: name.into(),
            enabled: false,
            config: serde_json::Value::Null,
            created_at,
            last_synced_at: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncError {
    pub backend_id: BackendId,
    pub message: String,
    pub occurred_at: u64,
}
