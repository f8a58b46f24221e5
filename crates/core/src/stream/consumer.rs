//! Interpretation of decoded stream frames.
//!
//! The generation service sends a growing result: every frame carries the
//! whole result so far, so the newest good frame replaces the previous one.

use crate::stream::ndjson::ParseOutcome;
use gp_protocol::api_models::{GeneratedPrompt, StreamFrame};
use thiserror::Error;
use tracing::warn;

/// A frame whose status code is not success. Ends the stream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Stream reported code {code}: {message}")]
pub struct StreamStatusError {
    pub code: i64,
    pub message: String,
}

/// Last-frame-wins holder for the displayed streaming result.
#[derive(Debug, Default)]
pub struct LatestFrame {
    current: Option<GeneratedPrompt>,
    accepted: usize,
    skipped: usize,
}

impl LatestFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one decode outcome.
    ///
    /// Returns `Ok(true)` when the displayed result was replaced and
    /// `Ok(false)` when the frame was ignored (malformed line, or a success
    /// frame without data).
    ///
    /// # Errors
    ///
    /// Returns `StreamStatusError` for a frame with a non-success code. The
    /// caller must stop consuming the stream.
    pub fn accept(&mut self, outcome: ParseOutcome<StreamFrame>) -> Result<bool, StreamStatusError> {
        let frame = match outcome {
            Ok(frame) => frame,
            Err(e) => {
                warn!(line = %e.line, error = %e.message, "skipping malformed stream frame");
                self.skipped += 1;
                return Ok(false);
            }
        };

        if !frame.is_success() {
            return Err(StreamStatusError {
                code: frame.code,
                message: frame.error_message(),
            });
        }

        match frame.data {
            Some(data) => {
                self.current = Some(data);
                self.accepted += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn current(&self) -> Option<&GeneratedPrompt> {
        self.current.as_ref()
    }

    /// Number of frames that replaced the result.
    pub fn accepted(&self) -> usize {
        self.accepted
    }

    /// Number of malformed lines skipped.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn into_result(self) -> Option<GeneratedPrompt> {
        self.current
    }
}
