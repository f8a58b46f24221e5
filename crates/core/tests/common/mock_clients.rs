//! Clients that let a test hold a remote call open.

use async_trait::async_trait;
use gp_core::client::{ChunkStream, ClientError, MockStageClient, StageClient};
use gp_protocol::api_models::{
    ApplyOptimizationRequest, OptimizationAdviceRequest, StreamGenerateRequest, SystemPromptRequest,
    ThinkingPointsRequest,
};
use std::sync::Arc;
use tokio::sync::{Notify, Semaphore};

/// Wraps a `MockStageClient` so every call blocks until the test opens the gate.
///
/// `entered` is notified as soon as a call starts, which is the point where
/// the run is known to be in flight.
#[derive(Clone)]
pub struct GatedClient {
    inner: MockStageClient,
    gate: Arc<Semaphore>,
    entered: Arc<Notify>,
}

impl GatedClient {
    pub fn new(inner: MockStageClient) -> Self {
        Self {
            inner,
            gate: Arc::new(Semaphore::new(0)),
            entered: Arc::new(Notify::new()),
        }
    }

    /// Wait until a call is blocked on the gate.
    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    /// Let `n` blocked or future calls through.
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    pub fn inner(&self) -> &MockStageClient {
        &self.inner
    }

    async fn pass(&self) {
        self.entered.notify_one();
        if let Ok(permit) = self.gate.acquire().await {
            permit.forget();
        }
    }
}

#[async_trait]
impl StageClient for GatedClient {
    async fn thinking_points(&self, request: &ThinkingPointsRequest) -> Result<Vec<String>, ClientError> {
        self.pass().await;
        self.inner.thinking_points(request).await
    }

    async fn system_prompt(&self, request: &SystemPromptRequest) -> Result<String, ClientError> {
        self.pass().await;
        self.inner.system_prompt(request).await
    }

    async fn optimization_advice(
        &self,
        request: &OptimizationAdviceRequest,
    ) -> Result<Vec<String>, ClientError> {
        self.pass().await;
        self.inner.optimization_advice(request).await
    }

    async fn apply_optimization(&self, request: &ApplyOptimizationRequest) -> Result<String, ClientError> {
        self.pass().await;
        self.inner.apply_optimization(request).await
    }

    async fn stream_generate(&self, request: &StreamGenerateRequest) -> Result<ChunkStream, ClientError> {
        self.pass().await;
        self.inner.stream_generate(request).await
    }
}
