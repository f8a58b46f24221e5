//! Configuration loading and management.
//!
//! This module loads `.gprompt/config.toml` and exposes the project paths
//! derived from the project root.

pub mod error;
pub mod loader;
pub mod models;

/// Name of the per-project directory.
pub const GPROMPT_DIR: &str = ".gprompt";

/// Config file name inside [`GPROMPT_DIR`].
pub const CONFIG_FILE: &str = "config.toml";

/// Directory inside [`GPROMPT_DIR`] where saved prompts are written.
pub const RECORDS_DIR: &str = "records";
