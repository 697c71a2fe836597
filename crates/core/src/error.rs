// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared error taxonomy (spec §7).
//!
//! Categories are documentation-only — every variant ultimately surfaces to
//! RPC callers as `error.message` wrapped in a `-32000` application-error
//! envelope (see `swimlane-daemon::rpc`).

use thiserror::Error;

/// The kind of entity a `NotFound` error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Task,
    Lane,
    Agent,
    Pipeline,
    PipelineRun,
    Runtime,
    Provider,
    Role,
    Backend,
    Team,
    Decision,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EntityKind::Task => "task",
            EntityKind::Lane => "lane",
            EntityKind::Agent => "agent",
            EntityKind::Pipeline => "pipeline",
            EntityKind::PipelineRun => "pipeline run",
            EntityKind::Runtime => "runtime",
            EntityKind::Provider => "provider",
            EntityKind::Role => "role",
            EntityKind::Backend => "backend",
            EntityKind::Team => "team",
            EntityKind::Decision => "decision",
        };
        write!(f, "{s}")
    }
}

/// Top-level application error taxonomy (spec §7).
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("multiplexer error: {0}")]
    Multiplexer(#[from] MultiplexerErrorKind),

    #[error("provider error: {0}")]
    Provider(#[from] ProviderErrorKind),

    #[error("{0} is not implemented in this scope")]
    Unimplemented(&'static str),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        ApiError::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        ApiError::Conflict(msg.into())
    }
}

/// Multiplexer operation failures (spec §4.2).
#[derive(Debug, Clone, Error)]
pub enum MultiplexerErrorKind {
    #[error("multiplexer binary not installed")]
    NotInstalled,
    #[error("connection refused")]
    ConnectionRefused,
    #[error("authentication failed")]
    AuthFailed,
    #[error("timed out")]
    TimedOut,
    #[error("session not found: {0}")]
    SessionNotFound(String),
    #[error("window not found: {0}")]
    WindowNotFound(String),
    #[error("pane not found: {0}")]
    PaneNotFound(String),
    #[error("duplicate session: {0}")]
    DuplicateSession(String),
    #[error("{0}")]
    Generic(String),
}

/// AI-provider CLI failures (spec §7).
#[derive(Debug, Clone, Error)]
pub enum ProviderErrorKind {
    #[error("provider binary missing from PATH: {0}")]
    BinaryMissing(String),
    #[error("provider process timed out")]
    TimedOut,
    #[error("provider produced unparseable output")]
    Unparseable,
    #[error("unknown provider: {0}")]
    Unknown(String),
}

pub type ApiResult<T> = Result<T, ApiError>;
