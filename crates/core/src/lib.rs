//! # gp-core
//!
//! Core engine for gprompt, a four-stage prompt generation pipeline.
//!
//! A run turns a free-text task description into a finished prompt:
//!
//! 1. thinking points (list)
//! 2. initial prompt (text)
//! 3. optimization advice (list)
//! 4. final prompt (text)
//!
//! Each stage is produced by a remote service from the output of the stage
//! before it. A single-shot streaming mode produces stages 1, 2 and 4 in
//! one NDJSON response.
//!
//! ## Modules
//!
//! - [`client`]: Remote service trait, HTTP client and mock client
//! - [`stream`]: NDJSON framing and last-frame-wins consumption
//! - [`engine`]: Stage sequencing, cascades and streaming generation
//! - [`state`]: Run state transitions, per-run store and run registry
//! - [`record`]: Finished-prompt records and persistence
//! - [`config`]: `.gprompt/config.toml` loading
//! - [`init`]: Project initialization
//! - [`logging`]: Tracing subscriber setup

pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod init;
pub mod logging;
pub mod record;
pub mod state;
pub mod stream;

pub use engine::PipelineEngine;
pub use error::{InputError, PipelineError};
pub use state::manager::RunManager;
pub use state::run::RunSettings;
pub use state::store::RunStore;
