//! Streaming response assembly.
//!
//! - [`ndjson`]: chunk-to-record line framing
//! - [`consumer`]: last-frame-wins interpretation of decoded frames

pub mod consumer;
pub mod ndjson;

pub use consumer::{LatestFrame, StreamStatusError};
pub use ndjson::{decode_stream, FrameDecodeError, FrameStream, NdjsonAssembler, ParseOutcome};
