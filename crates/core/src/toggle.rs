// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tri-state toggle overrides and lane-level defaults (spec §3, §4.6).

use serde::{Deserialize, Serialize};

/// A boolean override that distinguishes "never set" from "explicitly false".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Toggle {
    #[default]
    Unset,
    True,
    False,
}

impl Toggle {
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Toggle::Unset => None,
            Toggle::True => Some(true),
            Toggle::False => Some(false),
        }
    }

    pub fn is_set(self) -> bool {
        !matches!(self, Toggle::Unset)
    }
}

impl From<bool> for Toggle {
    fn from(b: bool) -> Self {
        if b {
            Toggle::True
        } else {
            Toggle::False
        }
    }
}

/// The five toggle keys a task or lane can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ToggleKey {
    AutoStart,
    AutoPilot,
    AutoClose,
    UseWorktree,
    UseMemory,
}

/// The four toggle overrides a task carries, plus `useMemory`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskToggles {
    pub auto_start: Toggle,
    pub auto_pilot: Toggle,
    pub auto_close: Toggle,
    pub use_worktree: Toggle,
    pub use_memory: Toggle,
}

impl TaskToggles {
    pub fn get(&self, key: ToggleKey) -> Toggle {
        match key {
            ToggleKey::AutoStart => self.auto_start,
            ToggleKey::AutoPilot => self.auto_pilot,
            ToggleKey::AutoClose => self.auto_close,
            ToggleKey::UseWorktree => self.use_worktree,
            ToggleKey::UseMemory => self.use_memory,
        }
    }
}

/// Lane-level default toggles; any key may be absent (spec: "mapping ... boolean").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaneToggleDefaults {
    pub auto_start: Option<bool>,
    pub auto_pilot: Option<bool>,
    pub auto_close: Option<bool>,
    pub use_worktree: Option<bool>,
    pub use_memory: Option<bool>,
}

impl LaneToggleDefaults {
    pub fn get(&self, key: ToggleKey) -> Option<bool> {
        match key {
            ToggleKey::AutoStart => self.auto_start,
            ToggleKey::AutoPilot => self.auto_pilot,
            ToggleKey::AutoClose => self.auto_close,
            ToggleKey::UseWorktree => self.use_worktree,
            ToggleKey::UseMemory => self.use_memory,
        }
    }
}

/// `effective(task, key) = task[key] if set else lane.defaultToggles[key] if present else false`.
pub fn effective(task: &TaskToggles, lane: Option<&LaneToggleDefaults>, key: ToggleKey) -> bool {
    if let Some(b) = task.get(key).as_bool() {
        return b;
    }
    lane.and_then(|l| l.get(key)).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_override_wins_over_lane_default() {
        let mut t = TaskToggles::default();
        t.auto_start = Toggle::False;
        let lane = LaneToggleDefaults {
            auto_start: Some(true),
            ..Default::default()
        };
        assert!(!effective(&t, Some(&lane), ToggleKey::AutoStart));
    }

    #[test]
    fn lane_default_used_when_task_unset() {
        let t = TaskToggles::default();
        let lane = LaneToggleDefaults {
            auto_close: Some(true),
            ..Default::default()
        };
        assert!(effective(&t, Some(&lane), ToggleKey::AutoClose));
    }

    #[test]
    fn false_when_neither_set() {
        let t = TaskToggles::default();
        assert!(!effective(&t, None, ToggleKey::UseMemory));
    }
}
