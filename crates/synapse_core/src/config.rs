//! Editor session configuration.
//!
//! # Responsibility
//! - Parse session settings from JSON with per-field defaults.
//! - Reject settings that would disable required behavior.
//!
//! # Invariants
//! - A validated config has a non-zero save debounce and rule look-back.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

pub const DEFAULT_SAVE_DEBOUNCE_MS: u64 = 1000;
pub const DEFAULT_INPUT_RULE_LOOKBACK: usize = 500;

/// Settings for one editor session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Delay between the last edit and the automatic save.
    pub save_debounce_ms: u64,
    /// Characters before the cursor considered by input rules.
    pub input_rule_lookback: usize,
    pub search_case_sensitive: bool,
    /// Whether block handles are shown when a session starts.
    pub block_handles: bool,
    /// Whether the outline panel is shown when a session starts.
    pub outline: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            save_debounce_ms: DEFAULT_SAVE_DEBOUNCE_MS,
            input_rule_lookback: DEFAULT_INPUT_RULE_LOOKBACK,
            search_case_sensitive: false,
            block_handles: true,
            outline: true,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    ZeroDebounce,
    ZeroLookback,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid editor config: {err}"),
            Self::ZeroDebounce => write!(f, "save_debounce_ms must be greater than zero"),
            Self::ZeroLookback => write!(f, "input_rule_lookback must be greater than zero"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::ZeroDebounce | Self::ZeroLookback => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

impl EditorConfig {
    /// Parses and validates a JSON config; missing fields take defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.save_debounce_ms == 0 {
            return Err(ConfigError::ZeroDebounce);
        }
        if self.input_rule_lookback == 0 {
            return Err(ConfigError::ZeroLookback);
        }
        Ok(())
    }

    pub fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }
}
