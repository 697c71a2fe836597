// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent entity (spec §3).

use crate::define_id;
use crate::id::random_id;
use crate::provider::Provider;
use crate::task::TaskId;
use crate::team::TeamId;
use serde::{Deserialize, Serialize};

define_id! {
    /// Opaque unique agent identifier.
    pub struct AgentId;
}

impl AgentId {
    pub fn generate() -> Self {
        Self(random_id("agent-"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    Spawning,
    Idle,
    Working,
    Error,
    Completed,
    Terminated,
}

/// Where an agent's multiplexer window currently lives.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentLocation {
    pub server_id: Option<String>,
    pub session_name: Option<String>,
    pub window_index: Option<u32>,
    pub pane_index: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillLevel {
    Junior,
    Mid,
    Senior,
    Principal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTolerance {
    Conservative,
    Balanced,
    Aggressive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    pub personality: String,
    pub communication_style: String,
    pub expertise: Vec<String>,
    pub skill_level: SkillLevel,
    pub risk_tolerance: RiskTolerance,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: AgentId,
    pub template_id: Option<String>,
    pub name: String,
    pub role: String,
    pub ai_provider: Provider,
    pub state: AgentState,
    pub location: AgentLocation,
    pub team_id: Option<TeamId>,
    pub current_task_id: Option<TaskId>,
    pub created_at: u64,
    pub last_activity_at: u64,
    pub error_message: Option<String>,
    pub persona: Option<Persona>,
}

impl Agent {
    pub fn new(name: impl Into<String>, role: impl Into<String>, ai_provider: Provider, created_at: u64) -> Self {
        Self {
            id: AgentId::generate(),
            template_id: None,
            name: name.into(),
            role: role.into(),
            ai_provider,
            state: AgentState::Spawning,
            location: AgentLocation::default(),
            team_id: None,
            current_task_id: None,
            created_at,
            last_activity_at: created_at,
            error_message: None,
            persona: None,
        }
    }
}
