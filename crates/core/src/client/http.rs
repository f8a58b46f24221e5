//! HTTP implementation of the StageClient.
//!
//! Every stage endpoint accepts a JSON body and answers with the
//! `{code, message, data}` envelope. The streaming endpoint answers with
//! newline-delimited JSON frames of the same envelope shape.

use crate::client::base::{ChunkStream, ClientError, StageClient};
use crate::client::list::normalize_list;
use async_trait::async_trait;
use gp_protocol::api_models::{
    ApiResponse, ApplyOptimizationRequest, OptimizationAdviceRequest, StreamGenerateRequest,
    SystemPromptRequest, ThinkingPointsRequest,
};
use gp_protocol::config_models::EndpointConfig;
use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tokio_stream::StreamExt;
use tracing::{debug, warn};

const THINKING_POINTS_PATH: &str = "/api/prompt/generate/thinking-points";
const SYSTEM_PROMPT_PATH: &str = "/api/prompt/generate/system-prompt";
const OPTIMIZATION_ADVICE_PATH: &str = "/api/prompt/generate/optimization-advice";
const APPLY_OPTIMIZATION_PATH: &str = "/api/prompt/generate/apply-optimization";
const STREAM_PATH: &str = "/api/prompt/generate/complete/stream";

/// StageClient talking to the generation service over HTTP.
pub struct HttpStageClient {
    base_url: String,

    /// Client for request/response calls, bounded by the request timeout.
    client: Client,

    /// Client for the streaming call. Only the connect timeout applies, a
    /// generation may keep the body open for minutes.
    stream_client: Client,
}

impl HttpStageClient {
    /// Build a client from the `[endpoint]` config table.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Config` if the base URL is empty or the
    /// underlying HTTP client cannot be constructed.
    pub fn new(config: &EndpointConfig) -> Result<Self, ClientError> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ClientError::Config("base_url is empty".to_string()));
        }

        let connect_timeout = Duration::from_secs(config.connect_timeout_secs);
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to create HTTP client: {e}")))?;
        let stream_client = Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url,
            client,
            stream_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST a JSON body and unwrap the `data` of a successful envelope.
    async fn post_envelope<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<Value, ClientError> {
        let url = self.url(path);
        debug!(%url, "POST");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(map_transport_error)?;
        let response = check_status(response).await?;

        let text = response.text().await.map_err(map_transport_error)?;
        let envelope: ApiResponse<Value> =
            serde_json::from_str(&text).map_err(|e| ClientError::Decode(e.to_string()))?;

        if !envelope.is_success() {
            return Err(ClientError::Api {
                code: envelope.code,
                message: envelope.error_message(),
            });
        }

        Ok(envelope.data.unwrap_or(Value::Null))
    }

    async fn post_list<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<Vec<String>, ClientError> {
        let data = self.post_envelope(path, body).await?;
        normalize_list(&data)
            .ok_or_else(|| ClientError::Decode(format!("expected a list, got {data}")))
    }

    async fn post_text<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<String, ClientError> {
        match self.post_envelope(path, body).await? {
            Value::String(text) => Ok(text),
            Value::Null => Ok(String::new()),
            other => Err(ClientError::Decode(format!("expected a string, got {other}"))),
        }
    }
}

#[async_trait]
impl StageClient for HttpStageClient {
    async fn thinking_points(&self, request: &ThinkingPointsRequest) -> Result<Vec<String>, ClientError> {
        self.post_list(THINKING_POINTS_PATH, request).await
    }

    async fn system_prompt(&self, request: &SystemPromptRequest) -> Result<String, ClientError> {
        self.post_text(SYSTEM_PROMPT_PATH, request).await
    }

    async fn optimization_advice(
        &self,
        request: &OptimizationAdviceRequest,
    ) -> Result<Vec<String>, ClientError> {
        self.post_list(OPTIMIZATION_ADVICE_PATH, request).await
    }

    async fn apply_optimization(&self, request: &ApplyOptimizationRequest) -> Result<String, ClientError> {
        self.post_text(APPLY_OPTIMIZATION_PATH, request).await
    }

    async fn stream_generate(&self, request: &StreamGenerateRequest) -> Result<ChunkStream, ClientError> {
        let url = self.url(STREAM_PATH);
        debug!(%url, "POST (streaming)");

        let response = self
            .stream_client
            .post(&url)
            .header(reqwest::header::ACCEPT, "application/x-ndjson")
            .json(request)
            .send()
            .await
            .map_err(map_transport_error)?;
        let response = check_status(response).await?;

        let mut bytes = Box::pin(response.bytes_stream());
        let stream = async_stream::stream! {
            let mut carry = Utf8Carry::default();
            while let Some(chunk) = bytes.next().await {
                match chunk {
                    Ok(chunk) => {
                        let text = carry.push(&chunk);
                        if !text.is_empty() {
                            yield Ok(text);
                        }
                    }
                    Err(e) => {
                        yield Err(map_transport_error(e));
                        return;
                    }
                }
            }
            let rest = carry.finish();
            if !rest.is_empty() {
                yield Ok(rest);
            }
        };

        Ok(Box::pin(stream))
    }
}

/// Turn a non-2xx response into `ClientError::Status`, keeping the body.
async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    warn!(status = status.as_u16(), "generation service returned an error status");
    Err(ClientError::Status {
        status: status.as_u16(),
        body,
    })
}

fn map_transport_error(error: reqwest::Error) -> ClientError {
    if error.is_timeout() {
        ClientError::Transport(format!("request timed out: {error}"))
    } else if error.is_decode() {
        ClientError::Decode(error.to_string())
    } else {
        ClientError::Transport(error.to_string())
    }
}

/// Incremental UTF-8 decoder for network chunks.
///
/// A multi-byte character split across two chunks is held back until the
/// rest of it arrives. Invalid sequences are replaced with U+FFFD.
#[derive(Debug, Default)]
struct Utf8Carry {
    pending: Vec<u8>,
}

impl Utf8Carry {
    fn push(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);

        let mut text = String::new();
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(valid) => {
                    text.push_str(valid);
                    self.pending.clear();
                    break;
                }
                Err(e) => {
                    let valid_up_to = e.valid_up_to();
                    let Some(invalid) = e.error_len() else {
                        // Incomplete sequence at the end: keep it for the next chunk.
                        text.push_str(&String::from_utf8_lossy(&self.pending[..valid_up_to]));
                        self.pending.drain(..valid_up_to);
                        break;
                    };
                    let split = valid_up_to + invalid;
                    text.push_str(&String::from_utf8_lossy(&self.pending[..split]));
                    self.pending.drain(..split);
                }
            }
        }
        text
    }

    fn finish(self) -> String {
        String::from_utf8_lossy(&self.pending).into_owned()
    }
}
