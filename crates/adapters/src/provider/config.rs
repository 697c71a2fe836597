// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-provider CLI invocation shapes (spec §4.3), generalized from the
//! teacher's single hardcoded `ClaudeAgentAdapter` command templating
//! (`crates/adapters/src/agent/claude.rs`) to the closed set of ten
//! providers.

use std::collections::HashMap;
use swimlane_core::Provider;

/// How a provider accepts its model identifier on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFlagStyle {
    /// `--model <id>`
    LongFlag,
    /// `-m <id>`
    ShortFlag,
    /// Model is not selectable via CLI flag (agent mode / provider settings).
    None,
}

/// A single shell string safe to paste via the multiplexer (spec §4.3
/// `getInteractiveLaunchCommand`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand(pub String);

/// A `(binary, argv, env)` triple suitable for spawning with stdin piping
/// (spec §4.3 `getSpawnConfig`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnConfig {
    pub binary: String,
    pub argv: Vec<String>,
    pub env: HashMap<String, String>,
}

/// The bespoke CLI shape for one provider.
pub struct ProviderConfig {
    pub binary: &'static str,
    pub model_flag: ModelFlagStyle,
    /// Extra flags always present (e.g. `cursor`'s `-p --output-format text`).
    pub base_flags: &'static [&'static str],
    /// Flags appended when the caller requests interactive auto-approve
    /// (spec §4.3 "the provider's configured auto-approve flags").
    pub auto_pilot_flags: &'static [&'static str],
}

fn config_for(provider: Provider) -> ProviderConfig {
    use ModelFlagStyle::*;
    match provider {
        Provider::Claude => ProviderConfig {
            binary: "claude",
            model_flag: LongFlag,
            base_flags: &[],
            auto_pilot_flags: &["--dangerously-skip-permissions"],
        },
        Provider::Gemini => ProviderConfig {
            binary: "gemini",
            model_flag: LongFlag,
            base_flags: &[],
            auto_pilot_flags: &["--yolo"],
        },
        Provider::Codex => ProviderConfig {
            binary: "codex",
            model_flag: LongFlag,
            base_flags: &[],
            auto_pilot_flags: &["--dangerously-bypass-approvals-and-sandbox"],
        },
        Provider::Opencode => ProviderConfig {
            binary: "opencode",
            model_flag: ShortFlag,
            base_flags: &[],
            auto_pilot_flags: &[],
        },
        Provider::Cursor => ProviderConfig {
            binary: "cursor-agent",
            model_flag: LongFlag,
            base_flags: &["-p", "--output-format", "text"],
            auto_pilot_flags: &["--force"],
        },
        Provider::Copilot => ProviderConfig {
            binary: "copilot",
            model_flag: LongFlag,
            base_flags: &["-p", "-s"],
            auto_pilot_flags: &["--allow-all-tools"],
        },
        Provider::Aider => ProviderConfig {
            binary: "aider",
            model_flag: LongFlag,
            base_flags: &["--yes"],
            auto_pilot_flags: &[],
        },
        Provider::Amp => ProviderConfig {
            binary: "amp",
            model_flag: None,
            base_flags: &[],
            auto_pilot_flags: &["--dangerously-allow-all"],
        },
        Provider::Cline => ProviderConfig {
            binary: "cline",
            model_flag: ShortFlag,
            base_flags: &[],
            auto_pilot_flags: &["--yolo"],
        },
        Provider::Kiro => ProviderConfig {
            binary: "kiro",
            model_flag: None,
            base_flags: &["chat", "--no-interactive", "--trust-all-tools"],
            auto_pilot_flags: &[],
        },
    }
}

impl ProviderConfig {
    pub fn for_provider(provider: Provider) -> Self {
        config_for(provider)
    }

    fn argv(&self, model: Option<&str>, auto_pilot: bool) -> Vec<String> {
        let mut argv: Vec<String> = self.base_flags.iter().map(|s| s.to_string()).collect();
        if let Some(model) = model {
            match self.model_flag {
                ModelFlagStyle::LongFlag => {
                    argv.push("--model".to_string());
                    argv.push(model.to_string());
                }
                ModelFlagStyle::ShortFlag => {
                    argv.push("-m".to_string());
                    argv.push(model.to_string());
                }
                ModelFlagStyle::None => {}
            }
        }
        if auto_pilot {
            argv.extend(self.auto_pilot_flags.iter().map(|s| s.to_string()));
        }
        argv
    }
}

/// Shell-quotes `binary` and `argv` into a single pasteable command string
/// (spec §4.3 `getInteractiveLaunchCommand`).
pub fn get_interactive_launch_command(
    provider: Provider,
    model: Option<&str>,
    auto_pilot: bool,
) -> LaunchCommand {
    let config = ProviderConfig::for_provider(provider);
    let argv = config.argv(model, auto_pilot);
    let mut parts = vec![config.binary.to_string()];
    parts.extend(argv.into_iter().map(|a| crate::mux::quote_shell_arg(&a)));
    LaunchCommand(parts.join(" "))
}

/// Builds a `(binary, argv, env)` triple suitable for `spawn_blocking`-free
/// process spawning (spec §4.3 `getSpawnConfig`).
pub fn get_spawn_config(provider: Provider, model: Option<&str>) -> SpawnConfig {
    let config = ProviderConfig::for_provider(provider);
    SpawnConfig {
        binary: config.binary.to_string(),
        argv: config.argv(model, false),
        env: HashMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claude_uses_long_model_flag() {
        let cmd = get_interactive_launch_command(Provider::Claude, Some("sonnet-4"), false);
        assert!(cmd.0.contains("--model"));
        assert!(cmd.0.contains("sonnet-4"));
    }

    #[test]
    fn opencode_uses_short_model_flag() {
        let cmd = get_interactive_launch_command(Provider::Opencode, Some("gpt-4.1"), false);
        assert!(cmd.0.contains("-m"));
        assert!(!cmd.0.contains("--model"));
    }

    #[test]
    fn amp_ignores_model_flag() {
        let cmd = get_interactive_launch_command(Provider::Amp, Some("anything"), false);
        assert!(!cmd.0.contains("anything"));
    }

    #[test]
    fn cursor_has_base_flags() {
        let cmd = get_interactive_launch_command(Provider::Cursor, None, false);
        assert!(cmd.0.contains("--output-format"));
    }

    #[test]
    fn auto_pilot_appends_configured_flags() {
        let cmd = get_interactive_launch_command(Provider::Claude, None, true);
        assert!(cmd.0.contains("--dangerously-skip-permissions"));
        let without = get_interactive_launch_command(Provider::Claude, None, false);
        assert!(!without.0.contains("--dangerously-skip-permissions"));
    }

    #[test]
    fn spawn_config_carries_argv_without_shell_quoting() {
        let spawn = get_spawn_config(Provider::Gemini, Some("gemini-2.5-pro"));
        assert_eq!(spawn.binary, "gemini");
        assert!(spawn.argv.contains(&"gemini-2.5-pro".to_string()));
    }
}
