//! Configuration file loader for the `.gprompt/` directory.

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::models::AppConfig;
use crate::config::{CONFIG_FILE, GPROMPT_DIR};
use gp_protocol::config_models::GlobalConfig;
use std::path::Path;
use tracing::debug;

/// Loads configuration from `<root>/.gprompt/config.toml`.
///
/// # Arguments
///
/// * `root` - Directory containing the `.gprompt/` folder
///
/// # Returns
///
/// An `AppConfig` for `root`. A missing `.gprompt/` directory or a missing
/// `config.toml` yields the default configuration rather than an error.
///
/// # Errors
///
/// Returns `ConfigError` if:
/// - The file exists but cannot be read
/// - The file is not valid TOML for `GlobalConfig`
/// - A value is unusable (empty base URL, zero timeout, unknown log level)
pub async fn load_config(root: &Path) -> ConfigResult<AppConfig> {
    let gp_dir = root.join(GPROMPT_DIR);

    if !gp_dir.exists() {
        debug!(root = %root.display(), "no .gprompt directory, using defaults");
        return Ok(AppConfig::with_defaults(root));
    }

    let global = load_global_config(&gp_dir)?;

    Ok(AppConfig {
        root: root.to_path_buf(),
        global,
    })
}

/// Loads global configuration from `config.toml`.
fn load_global_config(gp_dir: &Path) -> ConfigResult<GlobalConfig> {
    let config_path = gp_dir.join(CONFIG_FILE);

    if !config_path.exists() {
        return Ok(GlobalConfig::default());
    }

    let content =
        std::fs::read_to_string(&config_path).map_err(|source| ConfigError::FileRead {
            path: config_path.clone(),
            source,
        })?;

    let config: GlobalConfig =
        toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
            path: config_path.clone(),
            source,
        })?;

    validate(&config).map_err(|reason| ConfigError::InvalidConfig {
        path: config_path,
        reason,
    })?;

    Ok(config)
}

fn validate(config: &GlobalConfig) -> Result<(), String> {
    if config.endpoint.base_url.trim().is_empty() {
        return Err("endpoint.base_url must not be empty".to_string());
    }
    if config.endpoint.timeout_secs == 0 {
        return Err("endpoint.timeout_secs must be greater than zero".to_string());
    }
    if config.endpoint.connect_timeout_secs == 0 {
        return Err("endpoint.connect_timeout_secs must be greater than zero".to_string());
    }
    if tracing_subscriber::EnvFilter::try_new(&config.logging.level).is_err() {
        return Err(format!("logging.level '{}' is not a valid filter", config.logging.level));
    }
    Ok(())
}
