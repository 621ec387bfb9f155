//! Runtime configuration loaded from the environment

use std::env;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONTEXT_VAR: &str = "ERROR_NORMALIZER_DEFAULT_CONTEXT";
pub const NOTIFY_CONTEXT_VAR: &str = "ERROR_NORMALIZER_NOTIFY_CONTEXT";
pub const WRAP_CONTEXT_VAR: &str = "ERROR_NORMALIZER_WRAP_CONTEXT";
pub const CAPTURE_LOCATION_VAR: &str = "ERROR_NORMALIZER_CAPTURE_LOCATION";

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// Labels and switches shared by every reporter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizerConfig {
    /// Context used by `report` when the caller passes none
    pub default_context: String,
    /// Context used by `notify` when the caller passes none
    pub notify_context: String,
    /// Context used by wrapped operations when the caller passes none
    pub wrap_context: String,
    /// Whether log records carry the constructing call site
    pub capture_location: bool,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            default_context: "Application".to_string(),
            notify_context: "Notification".to_string(),
            wrap_context: "AsyncOperation".to_string(),
            capture_location: true,
        }
    }
}

impl NormalizerConfig {
    /// Load from the process environment, after `.env` if one exists
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env is fine.
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an arbitrary key lookup; unset or blank keys keep their defaults
    pub fn from_lookup<L>(lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let read = |key: &str| lookup(key).map(|value| value.trim().to_string()).filter(|value| !value.is_empty());

        let capture_location = match read(CAPTURE_LOCATION_VAR) {
            Some(value) => parse_bool(CAPTURE_LOCATION_VAR, &value)?,
            None => defaults.capture_location,
        };

        let config = Self {
            default_context: read(DEFAULT_CONTEXT_VAR).unwrap_or(defaults.default_context),
            notify_context: read(NOTIFY_CONTEXT_VAR).unwrap_or(defaults.notify_context),
            wrap_context: read(WRAP_CONTEXT_VAR).unwrap_or(defaults.wrap_context),
            capture_location,
        };

        tracing::debug!(
            default_context = %config.default_context,
            notify_context = %config.notify_context,
            wrap_context = %config.wrap_context,
            capture_location = config.capture_location,
            "Loaded normalizer configuration"
        );

        Ok(config)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}
