// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Team entity — peripheral bookkeeping surfaced through the `team` RPC
//! namespace (spec §6). Membership drives `orchestrator::getAgentsByTeam`.

use crate::agent::AgentId;
use crate::define_id;
use crate::id::random_id;
use serde::{Deserialize, Serialize};

define_id! {
    /// Opaque unique team identifier.
    pub struct TeamId;
}

impl TeamId {
    pub fn generate() -> Self {
        Self(random_id("team-"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub members: Vec<AgentId>,
    pub created_at: u64,
}

impl Team {
    pub fn new(name: impl Into<String>, created_at: u64) -> Self {
        Self {
            id: TeamId::generate(),
            name: name.into(),
            members: Vec::new(),
            created_at,
        }
    }
}
