//! Line framing for newline-delimited JSON.
//!
//! `NdjsonAssembler` turns arbitrarily split text chunks back into complete
//! lines and decodes each one. Between calls it holds at most one partial
//! line: after `feed` returns, the buffer never contains a newline.

use crate::client::base::{ChunkStream, ClientError};
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::pin::Pin;
use thiserror::Error;
use tokio_stream::{Stream, StreamExt};

/// A line that is not valid JSON for the expected record type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Malformed NDJSON line: {message}")]
pub struct FrameDecodeError {
    /// The offending line, without its terminator.
    pub line: String,
    pub message: String,
}

/// Result of decoding one complete line.
pub type ParseOutcome<T> = Result<T, FrameDecodeError>;

/// Decoded records of a streaming response. A transport error is yielded
/// once and ends the stream.
pub type FrameStream<T> = Pin<Box<dyn Stream<Item = Result<ParseOutcome<T>, ClientError>> + Send>>;

/// Reassembles NDJSON records from text chunks.
#[derive(Debug)]
pub struct NdjsonAssembler<T> {
    buffer: String,
    _record: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Default for NdjsonAssembler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned> NdjsonAssembler<T> {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            _record: PhantomData,
        }
    }

    /// Append a chunk and decode every line it completes, in the order
    /// their newlines appear.
    pub fn feed(&mut self, chunk: &str) -> Vec<ParseOutcome<T>> {
        self.buffer.push_str(chunk);

        let Some(last_newline) = self.buffer.rfind('\n') else {
            return Vec::new();
        };

        let partial = self.buffer.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.buffer, partial);
        complete.split('\n').filter_map(decode_line).collect()
    }

    /// Decode whatever is left once the source is exhausted. A
    /// whitespace-only residue yields nothing.
    pub fn finish(self) -> Vec<ParseOutcome<T>> {
        decode_line(&self.buffer).into_iter().collect()
    }

    /// The held-back partial line.
    pub fn pending(&self) -> &str {
        &self.buffer
    }
}

fn decode_line<T: DeserializeOwned>(line: &str) -> Option<ParseOutcome<T>> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    if line.trim().is_empty() {
        return None;
    }

    Some(serde_json::from_str(line).map_err(|e| FrameDecodeError {
        line: line.to_string(),
        message: e.to_string(),
    }))
}

/// Decode a chunk stream into a stream of records.
///
/// Malformed lines come through as `Ok(Err(_))` so the consumer decides
/// what to do with them; a transport error comes through as `Err(_)` and
/// is the last item.
pub fn decode_stream<T>(mut chunks: ChunkStream) -> FrameStream<T>
where
    T: DeserializeOwned + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut assembler = NdjsonAssembler::<T>::new();

        while let Some(chunk) = chunks.next().await {
            match chunk {
                Ok(text) => {
                    for outcome in assembler.feed(&text) {
                        yield Ok(outcome);
                    }
                }
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }

        for outcome in assembler.finish() {
            yield Ok(outcome);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gp_protocol::api_models::ApiResponse;

    type Record = ApiResponse<String>;

    const TWO_RECORDS: &str = "{\"code\":200,\"data\":\"a\"}\n{\"code\":200,\"data\":\"b\"}\n";

    fn data(outcomes: Vec<ParseOutcome<Record>>) -> Vec<String> {
        outcomes
            .into_iter()
            .map(|o| o.unwrap().data.unwrap())
            .collect()
    }

    #[test]
    fn test_every_split_point_yields_both_records_once() {
        for split in 0..=TWO_RECORDS.len() {
            let mut assembler = NdjsonAssembler::<Record>::new();
            let mut outcomes = assembler.feed(&TWO_RECORDS[..split]);
            outcomes.extend(assembler.feed(&TWO_RECORDS[split..]));
            outcomes.extend(assembler.finish());

            assert_eq!(data(outcomes), vec!["a", "b"], "split at {split}");
        }
    }

    #[test]
    fn test_mid_line_split_holds_partial() {
        let mut assembler = NdjsonAssembler::<Record>::new();

        let first = assembler.feed("{\"code\":200,\"da");
        assert!(first.is_empty());
        assert_eq!(assembler.pending(), "{\"code\":200,\"da");

        let second = assembler.feed("ta\":\"a\"}\n{\"code\"");
        assert_eq!(data(second), vec!["a"]);
        assert_eq!(assembler.pending(), "{\"code\"");
    }

    #[test]
    fn test_buffer_never_holds_a_newline_after_feed() {
        let mut assembler = NdjsonAssembler::<Record>::new();
        for chunk in ["{\"code\":200,", "\"data\":\"x\"}\n\n", "{\"co", "de\":200}\n{"] {
            assembler.feed(chunk);
            assert!(!assembler.pending().contains('\n'));
        }
        assert_eq!(assembler.pending(), "{");
    }

    #[test]
    fn test_finish_decodes_unterminated_line() {
        let mut assembler = NdjsonAssembler::<Record>::new();
        assert!(assembler.feed("{\"code\":200,\"data\":\"tail\"}").is_empty());
        assert_eq!(data(assembler.finish()), vec!["tail"]);
    }

    #[test]
    fn test_finish_on_whitespace_residue_yields_nothing() {
        let mut assembler = NdjsonAssembler::<Record>::new();
        assembler.feed(TWO_RECORDS);
        assembler.feed("  \t");
        assert!(assembler.finish().is_empty());
    }

    #[test]
    fn test_blank_and_crlf_lines() {
        let mut assembler = NdjsonAssembler::<Record>::new();
        let outcomes = assembler.feed("\r\n\n{\"code\":200,\"data\":\"a\"}\r\n");
        assert_eq!(data(outcomes), vec!["a"]);
    }

    #[test]
    fn test_malformed_line_is_reported_and_does_not_stop_decoding() {
        let mut assembler = NdjsonAssembler::<Record>::new();
        let outcomes = assembler.feed("{\"code\":200,\"data\":\"a\"}\nnot json\n{\"code\":200,\"data\":\"b\"}\n");

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].is_ok());
        let err = outcomes[1].as_ref().unwrap_err();
        assert_eq!(err.line, "not json");
        assert!(outcomes[2].is_ok());
    }

    #[test]
    fn test_multibyte_text_across_chunks() {
        let body = "{\"code\":200,\"data\":\"情感分析\"}\n";
        let split = body.find('分').unwrap();
        let mut assembler = NdjsonAssembler::<Record>::new();
        let mut outcomes = assembler.feed(&body[..split]);
        outcomes.extend(assembler.feed(&body[split..]));
        assert_eq!(data(outcomes), vec!["情感分析"]);
    }

    #[tokio::test]
    async fn test_decode_stream_passes_transport_error_and_stops() {
        let chunks: ChunkStream = Box::pin(tokio_stream::iter(vec![
            Ok("{\"code\":200,\"data\":\"a\"}\n{\"code\":".to_string()),
            Err(ClientError::Transport("connection reset".to_string())),
            Ok("200,\"data\":\"b\"}\n".to_string()),
        ]));

        let items: Vec<_> = decode_stream::<Record>(chunks).collect().await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].clone().unwrap().unwrap().data.as_deref(), Some("a"));
        assert!(matches!(items[1], Err(ClientError::Transport(_))));
    }

    #[tokio::test]
    async fn test_decode_stream_flushes_residue() {
        let chunks: ChunkStream = Box::pin(tokio_stream::iter(vec![
            Ok("{\"code\":200,\"data\":\"a\"}\n{\"code\":200,".to_string()),
            Ok("\"data\":\"b\"}".to_string()),
        ]));

        let items: Vec<_> = decode_stream::<Record>(chunks).collect().await;
        let data: Vec<String> = items
            .into_iter()
            .map(|item| item.unwrap().unwrap().data.unwrap())
            .collect();
        assert_eq!(data, vec!["a", "b"]);
    }
}
