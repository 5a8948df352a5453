use std::fmt;

use crate::error::ApiError;

/// Configuration keys enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    GithubToken,
    AdminUsername,
    AdminPassword,
    GithubApiBase,
}

impl ConfigKey {
    /// Name of the environment variable backing this key.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKey::GithubToken => "GITHUB_TOKEN",
            ConfigKey::AdminUsername => "ADMIN_USERNAME",
            ConfigKey::AdminPassword => "ADMIN_PASSWORD",
            ConfigKey::GithubApiBase => "GITHUB_API_BASE",
        }
    }

    /// Keys that must be present for every route to work.
    pub fn secrets() -> &'static [ConfigKey] {
        &[
            ConfigKey::GithubToken,
            ConfigKey::AdminUsername,
            ConfigKey::AdminPassword,
        ]
    }
}

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Process-wide settings, loaded once at startup and handed to every handler.
///
/// Secrets are kept optional: a missing one only fails the routes that need
/// it, at request time.
#[derive(Clone, Default)]
pub struct Config {
    github_token: Option<String>,
    admin_username: Option<String>,
    admin_password: Option<String>,
    api_base: Option<String>,
}

impl Config {
    /// Builds a configuration from a key lookup.
    ///
    /// - `lookup` receives the environment variable name of each key.
    /// - Values are trimmed; empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: ConfigKey| {
            lookup(key.as_str())
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        Config {
            github_token: read(ConfigKey::GithubToken),
            admin_username: read(ConfigKey::AdminUsername),
            admin_password: read(ConfigKey::AdminPassword),
            api_base: read(ConfigKey::GithubApiBase),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Returns the value for `key`, or a configuration error naming it.
    pub fn require(&self, key: ConfigKey) -> Result<&str, ApiError> {
        self.get(key).ok_or(ApiError::MissingConfig(key.as_str()))
    }

    pub fn get(&self, key: ConfigKey) -> Option<&str> {
        match key {
            ConfigKey::GithubToken => self.github_token.as_deref(),
            ConfigKey::AdminUsername => self.admin_username.as_deref(),
            ConfigKey::AdminPassword => self.admin_password.as_deref(),
            ConfigKey::GithubApiBase => self.api_base.as_deref(),
        }
    }

    pub fn api_base(&self) -> &str {
        self.api_base
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE)
            .trim_end_matches('/')
    }

    /// Secrets that are not configured, in declaration order.
    pub fn missing_secrets(&self) -> Vec<ConfigKey> {
        ConfigKey::secrets()
            .iter()
            .copied()
            .filter(|key| self.get(*key).is_none())
            .collect()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |value: &Option<String>| value.as_ref().map(|_| "<redacted>");
        f.debug_struct("Config")
            .field("github_token", &redact(&self.github_token))
            .field("admin_username", &redact(&self.admin_username))
            .field("admin_password", &redact(&self.admin_password))
            .field("api_base", &self.api_base())
            .finish()
    }
}
