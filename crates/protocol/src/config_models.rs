//! Global configuration models for `.gprompt/config.toml`.
//!
//! Every table and field is optional; missing values fall back to the
//! defaults below.
//!
//! # Example
//!
//! ```toml
//! # .gprompt/config.toml
//! [endpoint]
//! base_url = "http://localhost:8080"
//! timeout_secs = 120
//!
//! [defaults]
//! language = "en"
//!
//! [logging]
//! level = "debug"
//! format = "json"
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::stage_models::{Language, PromptType};

/// Represents global settings from `.gprompt/config.toml`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default, TS)]
pub struct GlobalConfig {
    #[serde(default)]
    pub endpoint: EndpointConfig,

    #[serde(default)]
    pub defaults: RunDefaults,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the generation service lives and how long to wait for it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct EndpointConfig {
    /// Base URL of the service; API paths are appended to it.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Whole-request timeout. Streaming requests are not subject to it.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// Values applied to every new run unless overridden on the command line.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default, TS)]
pub struct RunDefaults {
    #[serde(default)]
    pub language: Language,

    #[serde(default)]
    pub prompt_type: PromptType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Log output format.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging settings. The `GPROMPT_LOG` environment variable overrides `level`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct LoggingConfig {
    /// trace, debug, info, warn, error or off; any `EnvFilter` directive works.
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,

    /// ANSI colors for text output.
    #[serde(default = "default_true")]
    pub color: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            color: default_true(),
        }
    }
}
