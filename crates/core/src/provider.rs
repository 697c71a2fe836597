// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The closed set of AI-provider identifiers (spec §3, §4.3).
//!
//! `Provider` is the identifier; `ProviderConfig` (built by
//! `swimlane-adapters::provider`) carries the per-provider CLI invocation
//! shape. Both live conceptually together but the config depends on
//! adapter-layer spawn types, so only the identifier lives here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Claude,
    Gemini,
    Codex,
    Opencode,
    Cursor,
    Copilot,
    Aider,
    Amp,
    Cline,
    Kiro,
}

impl Provider {
    pub const ALL: [Provider; 10] = [
        Provider::Claude,
        Provider::Gemini,
        Provider::Codex,
        Provider::Opencode,
        Provider::Cursor,
        Provider::Copilot,
        Provider::Aider,
        Provider::Amp,
        Provider::Cline,
        Provider::Kiro,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Claude => "claude",
            Provider::Gemini => "gemini",
            Provider::Codex => "codex",
            Provider::Opencode => "opencode",
            Provider::Cursor => "cursor",
            Provider::Copilot => "copilot",
            Provider::Aider => "aider",
            Provider::Amp => "amp",
            Provider::Cline => "cline",
            Provider::Kiro => "kiro",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Provider {
    type Err = crate::error::ProviderErrorKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "claude" => Ok(Provider::Claude),
            "gemini" => Ok(Provider::Gemini),
            "codex" => Ok(Provider::Codex),
            "opencode" => Ok(Provider::Opencode),
            "cursor" => Ok(Provider::Cursor),
            "copilot" => Ok(Provider::Copilot),
            "aider" => Ok(Provider::Aider),
            "amp" => Ok(Provider::Amp),
            "cline" => Ok(Provider::Cline),
            "kiro" => Ok(Provider::Kiro),
            other => Err(crate::error::ProviderErrorKind::Unknown(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        for p in Provider::ALL {
            assert_eq!(Provider::from_str(p.as_str()).unwrap(), p);
        }
    }

    #[test]
    fn unknown_provider_is_rejected() {
        assert!(Provider::from_str("bard").is_err());
    }
}
