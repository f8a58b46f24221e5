//! Creates the `.gprompt/` directory for a project.

use super::error::{InitError, InitResult};
use super::templates::get_template;
use crate::config::{CONFIG_FILE, GPROMPT_DIR, RECORDS_DIR};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone)]
pub struct InitOptions {
    /// Project root; `.gprompt/` is created inside it.
    pub root: PathBuf,

    /// Overwrite an existing `config.toml`. Saved records are never touched.
    pub force: bool,
}

impl InitOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            force: false,
        }
    }
}

/// Generate the project layout:
///
/// ```text
/// .gprompt/
/// ├── config.toml
/// └── records/
/// ```
///
/// # Returns
///
/// The path of the written `config.toml`.
///
/// # Errors
///
/// - `AlreadyInitialized` if `config.toml` exists and `force` is false
/// - `DirectoryCreate` / `FileWrite` if the filesystem refuses
pub async fn init_project(options: InitOptions) -> InitResult<PathBuf> {
    let gp_dir = options.root.join(GPROMPT_DIR);
    let config_path = gp_dir.join(CONFIG_FILE);

    if config_path.exists() && !options.force {
        return Err(InitError::AlreadyInitialized(config_path));
    }

    create_dir(&gp_dir.join(RECORDS_DIR))?;
    write_template_file(&gp_dir, CONFIG_FILE)?;

    info!(path = %config_path.display(), "project initialized");
    Ok(config_path)
}

fn create_dir(path: &Path) -> InitResult<()> {
    fs::create_dir_all(path).map_err(|source| InitError::DirectoryCreate {
        path: path.to_path_buf(),
        source,
    })
}

fn write_template_file(gp_dir: &Path, template_path: &str) -> InitResult<()> {
    let content = get_template(template_path)
        .ok_or_else(|| InitError::TemplateNotFound(template_path.to_string()))?;

    let target_path = gp_dir.join(template_path);
    fs::write(&target_path, content).map_err(|source| InitError::FileWrite {
        path: target_path,
        source,
    })
}
