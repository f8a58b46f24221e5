//! Remote stage client abstraction.
//!
//! Provides the `StageClient` trait and its implementations:
//! - `HttpStageClient` talks to the generation service over HTTP
//! - `MockStageClient` answers in-process, for tests and `--mock` runs

pub mod base;
pub mod http;
pub mod list;
pub mod mock;

pub use base::{ChunkStream, ClientError, StageClient, StageRequest};
pub use http::HttpStageClient;
pub use mock::MockStageClient;
