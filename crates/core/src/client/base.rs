//! Base StageClient trait and supporting types.

use async_trait::async_trait;
use gp_protocol::api_models::{
    ApplyOptimizationRequest, OptimizationAdviceRequest, StreamGenerateRequest,
    SystemPromptRequest, ThinkingPointsRequest,
};
use gp_protocol::stage_models::{StageKind, StageOutput};
use std::pin::Pin;
use thiserror::Error;
use tokio_stream::Stream;

/// Text chunks of a streaming response, in arrival order.
///
/// Chunk boundaries are arbitrary; a JSON line may be split across any
/// number of chunks.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String, ClientError>> + Send>>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Service error {code}: {message}")]
    Api { code: i64, message: String },
    #[error("Failed to decode response: {0}")]
    Decode(String),
    #[error("Client configuration error: {0}")]
    Config(String),
}

/// A fully-built request for one of the four stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageRequest {
    ThinkingPoints(ThinkingPointsRequest),
    SystemPrompt(SystemPromptRequest),
    OptimizationAdvice(OptimizationAdviceRequest),
    ApplyOptimization(ApplyOptimizationRequest),
}

impl StageRequest {
    /// The stage this request belongs to.
    pub fn stage(&self) -> StageKind {
        match self {
            StageRequest::ThinkingPoints(_) => StageKind::ThinkingPoints,
            StageRequest::SystemPrompt(_) => StageKind::InitialPrompt,
            StageRequest::OptimizationAdvice(_) => StageKind::OptimizationAdvice,
            StageRequest::ApplyOptimization(_) => StageKind::FinalPrompt,
        }
    }
}

/// The remote generation service, one operation per stage plus the
/// single-shot streaming variant.
#[async_trait]
pub trait StageClient: Send + Sync {
    async fn thinking_points(&self, request: &ThinkingPointsRequest) -> Result<Vec<String>, ClientError>;

    async fn system_prompt(&self, request: &SystemPromptRequest) -> Result<String, ClientError>;

    async fn optimization_advice(
        &self,
        request: &OptimizationAdviceRequest,
    ) -> Result<Vec<String>, ClientError>;

    async fn apply_optimization(&self, request: &ApplyOptimizationRequest) -> Result<String, ClientError>;

    async fn stream_generate(&self, request: &StreamGenerateRequest) -> Result<ChunkStream, ClientError>;

    /// Dispatch a stage request to the matching operation and wrap the
    /// result in the output shape of that stage.
    async fn invoke(&self, request: &StageRequest) -> Result<StageOutput, ClientError> {
        match request {
            StageRequest::ThinkingPoints(r) => self.thinking_points(r).await.map(StageOutput::List),
            StageRequest::SystemPrompt(r) => self.system_prompt(r).await.map(StageOutput::Text),
            StageRequest::OptimizationAdvice(r) => {
                self.optimization_advice(r).await.map(StageOutput::List)
            }
            StageRequest::ApplyOptimization(r) => {
                self.apply_optimization(r).await.map(StageOutput::Text)
            }
        }
    }
}
