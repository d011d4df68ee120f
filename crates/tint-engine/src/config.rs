use std::env;
use std::time::Duration;

use tint_contracts::interpret::MatchPolicy;

pub const DEFAULT_API_BASE: &str = "https://api.anthropic.com";
pub const DEFAULT_TEXT_MODEL: &str = "claude-3-haiku-20240307";
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Settings for the remote language-model path, read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteConfig {
    pub enabled: bool,
    pub api_base: String,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    /// `None` keeps the transport default.
    pub timeout: Option<Duration>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: None,
            model: DEFAULT_TEXT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: None,
        }
    }
}

impl RemoteConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(non_empty_env)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let enabled = lookup("TINT_REMOTE")
            .map(|value| {
                !matches!(
                    value.to_ascii_lowercase().as_str(),
                    "0" | "off" | "false" | "no"
                )
            })
            .unwrap_or(defaults.enabled);
        Self {
            enabled,
            api_base: lookup("ANTHROPIC_API_BASE")
                .map(|value| value.trim_end_matches('/').to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or(defaults.api_base),
            api_key: lookup("ANTHROPIC_API_KEY"),
            model: lookup("TINT_TEXT_MODEL").unwrap_or(defaults.model),
            max_tokens: lookup("TINT_MAX_TOKENS")
                .and_then(|value| value.parse::<u32>().ok())
                .filter(|value| *value > 0)
                .unwrap_or(defaults.max_tokens),
            timeout: lookup("TINT_REMOTE_TIMEOUT_S")
                .and_then(|value| value.parse::<f64>().ok())
                .filter(|value| *value > 0.0)
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok()),
        }
    }

    /// Enabled and carrying a key.
    pub fn is_usable(&self) -> bool {
        self.enabled && self.api_key.is_some()
    }
}

/// Unset or unparsable values fall back to best-guess matching.
pub fn match_policy_from_env() -> MatchPolicy {
    non_empty_env("TINT_MATCH_POLICY")
        .and_then(|value| value.parse().ok())
        .unwrap_or_default()
}

pub(crate) fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
