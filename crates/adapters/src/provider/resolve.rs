// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `resolveProvider`/`resolveModel` priority chains and deprecated-model
//! alias resolution (spec §4.3, §8 scenario S6).

use std::str::FromStr;
use swimlane_core::{Provider, ProviderErrorKind};

/// `explicit > laneDefault > systemDefault`, validated against the closed
/// provider set (spec §4.3).
pub fn resolve_provider(
    explicit: Option<&str>,
    lane_default: Option<&str>,
    system_default: Provider,
) -> Result<Provider, ProviderErrorKind> {
    if let Some(explicit) = explicit {
        return Provider::from_str(explicit);
    }
    if let Some(lane_default) = lane_default {
        return Provider::from_str(lane_default);
    }
    Ok(system_default)
}

/// Deprecated model identifier → current identifier. Every alias maps to a
/// value that is itself present in the current model list — no transitive
/// aliases (spec §8 scenario 6).
const DEPRECATED_MODEL_ALIASES: &[(&str, &str)] = &[
    ("gpt-5.2", "gpt-4.1"),
    ("gemini-3-pro-preview", "gemini-2.5-pro"),
    ("claude-3-opus", "claude-opus-4"),
    ("claude-3.5-sonnet", "sonnet-4"),
];

/// Resolves a deprecated model alias to its current identifier, or returns
/// the input unchanged if it isn't a known alias.
pub fn deprecated_model_alias(model: &str) -> &str {
    DEPRECATED_MODEL_ALIASES
        .iter()
        .find(|(old, _)| *old == model)
        .map(|(_, new)| *new)
        .unwrap_or(model)
}

/// `taskModel > laneModel`, then alias resolution (spec §4.3).
pub fn resolve_model<'a>(task_model: Option<&'a str>, lane_model: Option<&'a str>) -> Option<String> {
    task_model
        .or(lane_model)
        .map(deprecated_model_alias)
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_provider_wins_over_lane_default() {
        let resolved =
            resolve_provider(Some("gemini"), Some("codex"), Provider::Claude).unwrap();
        assert_eq!(resolved, Provider::Gemini);
    }

    #[test]
    fn lane_default_wins_over_system_default() {
        let resolved = resolve_provider(None, Some("codex"), Provider::Claude).unwrap();
        assert_eq!(resolved, Provider::Codex);
    }

    #[test]
    fn falls_back_to_system_default() {
        let resolved = resolve_provider(None, None, Provider::Claude).unwrap();
        assert_eq!(resolved, Provider::Claude);
    }

    #[test]
    fn rejects_unknown_explicit_provider() {
        assert!(resolve_provider(Some("bard"), None, Provider::Claude).is_err());
    }

    #[test]
    fn resolves_deprecated_model_alias() {
        assert_eq!(resolve_model(Some("gpt-5.2"), None), Some("gpt-4.1".to_string()));
    }

    #[test]
    fn leaves_current_model_unchanged() {
        assert_eq!(resolve_model(Some("gpt-4.1"), None), Some("gpt-4.1".to_string()));
    }

    #[test]
    fn task_model_wins_over_lane_model() {
        assert_eq!(
            resolve_model(Some("sonnet-4"), Some("gpt-4.1")),
            Some("sonnet-4".to_string())
        );
    }

    #[test]
    fn falls_back_to_lane_model() {
        assert_eq!(resolve_model(None, Some("gpt-4.1")), Some("gpt-4.1".to_string()));
    }
}
