//! State management for pipeline runs.
//!
//! This module provides:
//! - Pure state transitions on a `PipelineRun`
//! - `RunStore`, the lock-guarded owner of one run
//! - `RunManager` for coordinating multiple runs

pub mod manager;
pub mod run;
pub mod store;
