//! Mock StageClient implementation for testing and offline use.

use crate::client::base::{ChunkStream, ClientError, StageClient, StageRequest};
use async_trait::async_trait;
use gp_protocol::api_models::{
    ApiResponse, ApplyOptimizationRequest, GeneratedPrompt, OptimizationAdviceRequest,
    StreamGenerateRequest, SystemPromptRequest, ThinkingPointsRequest,
};
use gp_protocol::stage_models::{StageKind, StageOutput};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Deterministic in-process client.
///
/// Without overrides the text stages echo their inputs, so a test can
/// check which upstream output a request was built from.
#[derive(Clone, Default)]
pub struct MockStageClient {
    overrides: [Option<StageOutput>; 4],
    failure: Option<(StageKind, ClientError)>,
    stream_failure: Option<ClientError>,
    stream_chunks: Option<Vec<Result<String, ClientError>>>,
    delay: Option<Duration>,
    requests: Arc<Mutex<Vec<StageRequest>>>,
    stream_requests: Arc<Mutex<Vec<StreamGenerateRequest>>>,
}

impl MockStageClient {
    pub fn success() -> Self {
        Self::default()
    }

    /// A client whose call for `stage` fails with a service error.
    pub fn failing_at(stage: StageKind) -> Self {
        Self::default().with_failure(
            stage,
            ClientError::Api {
                code: 500,
                message: format!("mock failure at stage {}", stage.id()),
            },
        )
    }

    pub fn with_failure(mut self, stage: StageKind, error: ClientError) -> Self {
        self.failure = Some((stage, error));
        self
    }

    /// Return `output` for `stage` instead of the echoed default.
    pub fn with_output(mut self, stage: StageKind, output: StageOutput) -> Self {
        self.overrides[stage.index()] = Some(output);
        self
    }

    /// Sleep before answering every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Chunks the streaming call yields, verbatim.
    pub fn with_stream_chunks(mut self, chunks: Vec<Result<String, ClientError>>) -> Self {
        self.stream_chunks = Some(chunks);
        self
    }

    pub fn with_stream_failure(mut self, error: ClientError) -> Self {
        self.stream_failure = Some(error);
        self
    }

    /// Every stage request received so far, in call order.
    pub fn requests(&self) -> Vec<StageRequest> {
        self.requests.lock().clone()
    }

    pub fn stream_requests(&self) -> Vec<StreamGenerateRequest> {
        self.stream_requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// The NDJSON body the default streaming call produces for `description`:
    /// three frames with a growing result, cut into uneven chunks.
    pub fn default_stream_chunks(description: &str) -> Vec<String> {
        let frames = [
            GeneratedPrompt {
                key_intent: Some(format!("Understand: {description}")),
                initial_prompt: None,
                final_prompt: None,
            },
            GeneratedPrompt {
                key_intent: Some(format!("Understand: {description}")),
                initial_prompt: Some(format!("You are an assistant for: {description}")),
                final_prompt: None,
            },
            GeneratedPrompt {
                key_intent: Some(format!("Understand: {description}")),
                initial_prompt: Some(format!("You are an assistant for: {description}")),
                final_prompt: Some(format!("You are an expert assistant for: {description}")),
            },
        ];

        let body: String = frames
            .into_iter()
            .filter_map(|frame| serde_json::to_string(&ApiResponse::success(frame)).ok())
            .map(|line| line + "\n")
            .collect();

        // Cut on char boundaries, never on line boundaries.
        let chars: Vec<char> = body.chars().collect();
        chars
            .chunks(37)
            .map(|chunk| chunk.iter().collect())
            .collect()
    }

    async fn answer(&self, request: StageRequest) -> Result<StageOutput, ClientError> {
        let stage = request.stage();
        let fallback = echo_output(&request);
        self.requests.lock().push(request);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some((failing, error)) = &self.failure {
            if *failing == stage {
                return Err(error.clone());
            }
        }

        Ok(self.overrides[stage.index()].clone().unwrap_or(fallback))
    }
}

fn echo_output(request: &StageRequest) -> StageOutput {
    match request {
        StageRequest::ThinkingPoints(r) => StageOutput::List(vec![
            format!("Clarify the goal of: {}", r.description),
            "Define the expected output format".to_string(),
        ]),
        StageRequest::SystemPrompt(r) => StageOutput::Text(format!(
            "You are an assistant for: {}\n{}",
            r.description,
            r.thinking_points.join("\n")
        )),
        StageRequest::OptimizationAdvice(r) => StageOutput::List(vec![
            format!("Tighten the wording of a {}-character prompt", r.prompt_to_analyze.chars().count()),
            "Add an example".to_string(),
        ]),
        StageRequest::ApplyOptimization(r) => StageOutput::Text(format!(
            "{}\n\nApplied:\n{}",
            r.original_prompt,
            r.advice.join("\n")
        )),
    }
}

fn expect_list(output: StageOutput) -> Result<Vec<String>, ClientError> {
    match output {
        StageOutput::List(items) => Ok(items),
        StageOutput::Text(_) => Err(ClientError::Decode("expected a list, got text".to_string())),
    }
}

fn expect_text(output: StageOutput) -> Result<String, ClientError> {
    match output {
        StageOutput::Text(text) => Ok(text),
        StageOutput::List(_) => Err(ClientError::Decode("expected text, got a list".to_string())),
    }
}

#[async_trait]
impl StageClient for MockStageClient {
    async fn thinking_points(&self, request: &ThinkingPointsRequest) -> Result<Vec<String>, ClientError> {
        expect_list(self.answer(StageRequest::ThinkingPoints(request.clone())).await?)
    }

    async fn system_prompt(&self, request: &SystemPromptRequest) -> Result<String, ClientError> {
        expect_text(self.answer(StageRequest::SystemPrompt(request.clone())).await?)
    }

    async fn optimization_advice(
        &self,
        request: &OptimizationAdviceRequest,
    ) -> Result<Vec<String>, ClientError> {
        expect_list(self.answer(StageRequest::OptimizationAdvice(request.clone())).await?)
    }

    async fn apply_optimization(&self, request: &ApplyOptimizationRequest) -> Result<String, ClientError> {
        expect_text(self.answer(StageRequest::ApplyOptimization(request.clone())).await?)
    }

    async fn stream_generate(&self, request: &StreamGenerateRequest) -> Result<ChunkStream, ClientError> {
        self.stream_requests.lock().push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = &self.stream_failure {
            return Err(error.clone());
        }

        let chunks = match &self.stream_chunks {
            Some(chunks) => chunks.clone(),
            None => Self::default_stream_chunks(&request.input_prompt)
                .into_iter()
                .map(Ok)
                .collect(),
        };
        Ok(Box::pin(tokio_stream::iter(chunks)))
    }
}
