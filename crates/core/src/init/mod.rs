//! Project initialization.
//!
//! `gprompt init` writes a commented `config.toml` with every default spelled
//! out and creates the directory saved prompts go to.
//!
//! # Example
//!
//! ```no_run
//! use gp_core::init::{init_project, InitOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config_path = init_project(InitOptions::new(".")).await?;
//! println!("Wrote {}", config_path.display());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod generator;
pub mod templates;

pub use error::{InitError, InitResult};
pub use generator::{init_project, InitOptions};
pub use templates::get_template;
