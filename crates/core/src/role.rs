// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Custom role entity (spec §6 `role` namespace). Roles are free-form labels
//! tasks target via `targetRole` and agents carry as `role`; this type only
//! backs the CRUD surface, it does not constrain either field.

use crate::define_id;
use crate::id::random_id;
use serde::{Deserialize, Serialize};

define_id! {
    /// Opaque unique role identifier.
    pub struct RoleId;
}

impl RoleId {
    pub fn generate() -> Self {
        Self(random_id("role-"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: u64,
}

impl Role {
    pub fn new(name: impl Into<String>, created_at: u64) -> Self {
        Self {
            id: RoleId::generate(),
            name: name.into(),
            description: None,
            created_at,
        }
    }
}
