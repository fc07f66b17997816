//! Config load, env overrides, validation.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Root config: slack tokens, posting enablement, resolution hardening.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub slack: Option<SlackConfig>,
    /// Posting enablement: absent = disabled, "true"/"1" = every channel,
    /// otherwise a comma-separated channel-id allow-list.
    pub post_messages: Option<String>,
    /// When true, a raw channel id absent from the cache is rejected instead
    /// of passed through to Slack.
    pub strict_channel_ids: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SlackConfig {
    /// Bot token (xoxb-...); used for everything except message search.
    pub bot_token: Option<String>,
    /// User token (xoxp-...); required for search.messages.
    pub user_token: Option<String>,
    /// API base override for tests (defaults to https://slack.com/api).
    pub api_base: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config read: {0}")]
    Io(String),
    #[error("config parse: {0}")]
    Parse(String),
    #[error("config invalid: {0}")]
    Validation(String),
}

/// `$SLACKGATE_CONFIG` or `~/.slackgate/config.toml`.
pub fn default_config_path() -> PathBuf {
    if let Ok(p) = std::env::var("SLACKGATE_CONFIG") {
        return PathBuf::from(p);
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".slackgate").join("config.toml")
}

/// Load config from `path` (a missing file yields the default config, since
/// env-only deployments are common for protocol servers), apply env
/// overrides, validate.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let mut cfg = if path.exists() {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        toml::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))?
    } else {
        Config::default()
    };
    apply_env_overrides(&mut cfg);
    validate(&cfg)?;
    Ok(cfg)
}

/// Env wins over file: SLACK_BOT_TOKEN, SLACK_USER_TOKEN, SLACK_POST_MESSAGES.
fn apply_env_overrides(cfg: &mut Config) {
    let slack = cfg.slack.get_or_insert_with(SlackConfig::default);
    if let Ok(v) = std::env::var("SLACK_BOT_TOKEN")
        && !v.is_empty()
    {
        slack.bot_token = Some(v);
    }
    if let Ok(v) = std::env::var("SLACK_USER_TOKEN")
        && !v.is_empty()
    {
        slack.user_token = Some(v);
    }
    if let Ok(v) = std::env::var("SLACK_POST_MESSAGES")
        && !v.is_empty()
    {
        cfg.post_messages = Some(v);
    }
}

fn validate(cfg: &Config) -> Result<(), ConfigError> {
    let slack = cfg
        .slack
        .as_ref()
        .ok_or_else(|| ConfigError::Validation("missing [slack] section or token env vars".into()))?;
    let has_bot = slack.bot_token.as_deref().is_some_and(|t| !t.is_empty());
    let has_user = slack.user_token.as_deref().is_some_and(|t| !t.is_empty());
    if !has_bot && !has_user {
        return Err(ConfigError::Validation(
            "at least one of slack.bot-token / slack.user-token is required".into(),
        ));
    }
    Ok(())
}

/// Posting enablement, parsed once at startup. An allow-list alone enables
/// posting for its listed channels; it is never combined with the boolean
/// form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostPolicy {
    Disabled,
    All,
    Allowlist(HashSet<String>),
}

impl PostPolicy {
    pub fn parse(raw: Option<&str>) -> Self {
        let raw = match raw.map(str::trim) {
            None | Some("") => return PostPolicy::Disabled,
            Some(r) => r,
        };
        if raw.eq_ignore_ascii_case("true") || raw == "1" {
            return PostPolicy::All;
        }
        let ids: HashSet<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if ids.is_empty() {
            PostPolicy::Disabled
        } else {
            PostPolicy::Allowlist(ids)
        }
    }

    pub fn allows(&self, channel_id: &str) -> bool {
        match self {
            PostPolicy::Disabled => false,
            PostPolicy::All => true,
            PostPolicy::Allowlist(ids) => ids.contains(channel_id),
        }
    }
}

impl Config {
    pub fn post_policy(&self) -> PostPolicy {
        PostPolicy::parse(self.post_messages.as_deref())
    }

    pub fn strict_channel_ids(&self) -> bool {
        self.strict_channel_ids.unwrap_or(false)
    }
}
