// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution-runtime entity (spec §6 `runtime` namespace, `[[runtimes]]`
//! config array): the multiplexer execution target a lane or task binds to
//! (`local-tmux`, `docker`, `k8s`, `ssh`), as opposed to `BackendMapping`
//! which is an external issue-tracker sync target.

use crate::define_id;
use crate::id::random_id;
use serde::{Deserialize, Serialize};

define_id! {
    /// Opaque unique runtime identifier.
    pub struct RuntimeId;
}

impl RuntimeId {
    pub fn generate() -> Self {
        Self(random_id("runtime-"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuntimeKind {
    LocalTmux,
    Docker,
    K8s,
    Ssh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Runtime {
    pub id: RuntimeId,
    pub kind: RuntimeKind,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub config_file: Option<String>,
    pub context: Option<String>,
}

impl Runtime {
    pub fn new(kind: RuntimeKind) -> Self {
        Self {
            id: RuntimeId::generate(),
            kind,
            host: None,
            port: None,
            user: None,
            config_file: None,
            context: None,
        }
    }

    pub fn local() -> Self {
        Self::new(RuntimeKind::LocalTmux)
    }

    pub fn is_local(&self) -> bool {
        matches!(self.kind, RuntimeKind::LocalTmux)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_constructor_is_local() {
        assert!(Runtime::local().is_local());
    }

    #[test]
    fn non_local_kind_is_not_local() {
        assert!(!Runtime::new(RuntimeKind::Ssh).is_local());
    }
}
