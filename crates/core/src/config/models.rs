//! Configuration models that aggregate all settings.
//!
//! `AppConfig` pairs the parsed `config.toml` with the project root it was
//! loaded from, so callers can derive every project path from one value.

use crate::config::{CONFIG_FILE, GPROMPT_DIR, RECORDS_DIR};
use gp_protocol::config_models::GlobalConfig;
use std::path::{Path, PathBuf};

/// Application configuration loaded from the `.gprompt/` directory.
///
/// # Example
///
/// ```rust,no_run
/// use gp_core::config::loader::load_config;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new(".")).await?;
/// println!("Service at {}", config.global.endpoint.base_url);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Directory containing `.gprompt/`.
    pub root: PathBuf,

    /// Settings from `config.toml`, or defaults if it does not exist.
    pub global: GlobalConfig,
}

impl AppConfig {
    /// Default settings for a project at `root`.
    pub fn with_defaults(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            global: GlobalConfig::default(),
        }
    }

    pub fn gprompt_dir(&self) -> PathBuf {
        self.root.join(GPROMPT_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.gprompt_dir().join(CONFIG_FILE)
    }

    pub fn records_dir(&self) -> PathBuf {
        records_dir(&self.root)
    }
}

/// Where saved prompts go for a project at `root`.
pub fn records_dir(root: &Path) -> PathBuf {
    root.join(GPROMPT_DIR).join(RECORDS_DIR)
}
