//! # gp-protocol
//!
//! Core protocol definitions and data models for gprompt.
//!
//! This crate defines all shared data structures used for:
//! - The four pipeline stages and their outputs
//! - Runtime run state
//! - Request/response payloads of the remote generation service
//! - The finished-prompt record handed to persistence
//! - Configuration file parsing (TOML config)
//! - Channel communication between a front-end and the core
//!
//! ## Modules
//!
//! - [`stage_models`]: Stage identifiers, outputs, language and prompt type
//! - [`run_models`]: Pipeline run state
//! - [`api_models`]: Service requests, response envelope and stream frames
//! - [`record_models`]: Finished-prompt record
//! - [`config_models`]: Global configuration from config.toml
//! - [`ipc`]: Operations and Events for front-end/core communication
//!
//! ## Design Principles
//!
//! - Minimal dependencies: Only serde, ts-rs, uuid and chrono
//! - TypeScript generation: All types derive `TS` for client compatibility
//! - Independent compilation: No dependencies on other gprompt crates

pub mod api_models;
pub mod config_models;
pub mod ipc;
pub mod record_models;
pub mod run_models;
pub mod stage_models;

// Re-export all public types for convenience
pub use api_models::*;
pub use config_models::*;
pub use ipc::*;
pub use record_models::*;
pub use run_models::*;
pub use stage_models::*;
