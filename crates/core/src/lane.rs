// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Swim lane entity (spec §3).

use crate::id::random_id;
use crate::provider::Provider;
use crate::toggle::LaneToggleDefaults;
use crate::define_id;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

define_id! {
    /// Opaque unique lane identifier.
    pub struct LaneId;
}

impl LaneId {
    pub fn generate() -> Self {
        Self(random_id("lane-"))
    }
}

/// A persistent named workspace owning one multiplexer session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lane {
    pub id: LaneId,
    pub name: String,
    pub server_id: String,
    pub working_directory: PathBuf,
    pub session_name: String,
    pub created_at: u64,
    /// Owned exclusively by session-sync; clients must not mutate directly.
    pub session_active: bool,
    pub ai_provider: Option<Provider>,
    pub ai_model: Option<String>,
    pub context_instructions: Option<String>,
    pub default_toggles: LaneToggleDefaults,
    pub memory_file_id: Option<String>,
    pub memory_path: Option<PathBuf>,
}

impl Lane {
    pub fn new(
        name: impl Into<String>,
        server_id: impl Into<String>,
        working_directory: PathBuf,
        session_name: impl Into<String>,
        created_at: u64,
    ) -> Self {
        Self {
            id: LaneId::generate(),
            name: name.into(),
            server_id: server_id.into(),
            working_directory,
            session_name: session_name.into(),
            created_at,
            session_active: false,
            ai_provider: None,
            ai_model: None,
            context_instructions: None,
            default_toggles: LaneToggleDefaults::default(),
            memory_file_id: None,
            memory_path: None,
        }
    }
}
