//! Editor configuration parsed from environment variables.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const DEFAULT_ANNOUNCE_BUFFER: usize = 64;

pub const ENV_EDITABLE: &str = "CANVAS_EDITABLE";
pub const ENV_DUPLICATE_TYPE_POLICY: &str = "CANVAS_DUPLICATE_TYPE_POLICY";
pub const ENV_ANNOUNCE_BUFFER: &str = "CANVAS_ANNOUNCE_BUFFER";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {var}: '{value}' (expected {expected})")]
    Invalid { var: &'static str, value: String, expected: &'static str },
}

/// What happens when a second worker announces a type that is already routable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateTypePolicy {
    /// Keyed overwrite: the latest announcement becomes the route for the type.
    #[default]
    Replace,
    /// The later announcer stays untyped and the announcement is reported as an error.
    Reject,
}

impl FromStr for DuplicateTypePolicy {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "replace" => Ok(Self::Replace),
            "reject" => Ok(Self::Reject),
            _ => Err(ConfigError::Invalid {
                var: ENV_DUPLICATE_TYPE_POLICY,
                value: raw.to_owned(),
                expected: "'replace' or 'reject'",
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Whether pointer and wheel input drive the viewport.
    pub editable: bool,
    pub duplicate_policy: DuplicateTypePolicy,
    /// Items held per type while workers have not announced yet. 0 disables buffering.
    pub announce_buffer: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self { editable: true, duplicate_policy: DuplicateTypePolicy::Replace, announce_buffer: DEFAULT_ANNOUNCE_BUFFER }
    }
}

impl EditorConfig {
    /// Build config from environment variables. Unset variables keep their defaults.
    ///
    /// - `CANVAS_EDITABLE`: `true` (default) / `false`, also `1` / `0`
    /// - `CANVAS_DUPLICATE_TYPE_POLICY`: `replace` (default) or `reject`
    /// - `CANVAS_ANNOUNCE_BUFFER`: default 64
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for values that do not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from any key lookup (environment, a map in tests).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for values that do not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let editable = match lookup(ENV_EDITABLE) {
            Some(raw) => parse_bool(ENV_EDITABLE, &raw)?,
            None => defaults.editable,
        };
        let duplicate_policy = match lookup(ENV_DUPLICATE_TYPE_POLICY) {
            Some(raw) => raw.parse()?,
            None => defaults.duplicate_policy,
        };
        let announce_buffer = match lookup(ENV_ANNOUNCE_BUFFER) {
            Some(raw) => raw.trim().parse::<usize>().map_err(|_| ConfigError::Invalid {
                var: ENV_ANNOUNCE_BUFFER,
                value: raw.clone(),
                expected: "a non-negative integer",
            })?,
            None => defaults.announce_buffer,
        };
        Ok(Self { editable, duplicate_policy, announce_buffer })
    }
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::Invalid { var, value: raw.to_owned(), expected: "true or false" }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
