//! Pipeline execution engine.
//!
//! The PipelineEngine sequences the four dependent stages of a run, feeds
//! each stage the current output of the stage before it, and converts every
//! remote failure into the run's `last_error` without touching the stages
//! that already succeeded.

use crate::client::base::{ClientError, StageClient, StageRequest};
use crate::client::list::parse_list_text;
use crate::error::{InputError, PipelineError};
use crate::state::store::{InFlight, RunStore};
use crate::stream::consumer::LatestFrame;
use crate::stream::ndjson::decode_stream;
use gp_protocol::api_models::{
    ApplyOptimizationRequest, GeneratedPrompt, OptimizationAdviceRequest, StreamFrame,
    StreamGenerateRequest, SystemPromptRequest, ThinkingPointsRequest,
};
use gp_protocol::ipc::Event;
use gp_protocol::run_models::{PipelineRun, RunState};
use gp_protocol::stage_models::{StageKind, StageOutput};
use std::sync::Arc;
use tokio::sync::mpsc::Sender;
use tokio_stream::StreamExt;
use tracing::{info, warn};

/// The main pipeline execution engine.
///
/// One engine can drive any number of runs; the single-flight rule is
/// enforced per run by `RunStore::begin`.
pub struct PipelineEngine {
    client: Arc<dyn StageClient>,
    events_tx: Sender<Event>,
}

impl PipelineEngine {
    /// Create a new PipelineEngine.
    ///
    /// # Arguments
    ///
    /// * `client` - The remote generation service
    /// * `events_tx` - Channel for progress events. Events are dropped if the
    ///   receiver is gone.
    pub fn new(client: Arc<dyn StageClient>, events_tx: Sender<Event>) -> Self {
        Self { client, events_tx }
    }

    /// Execute exactly one stage using the current slot contents.
    ///
    /// On success the output is stored, the stage is marked completed and
    /// becomes the active stage.
    ///
    /// # Errors
    ///
    /// - `PipelineError::Input` if the description or the upstream stage is
    ///   empty. Nothing is changed. Inputs are checked first, so a busy run
    ///   with an empty upstream slot reports `Input` rather than `Busy`.
    /// - `PipelineError::Busy` if another call is in flight for this run.
    /// - `PipelineError::Remote` / `EmptyOutput` if the call fails. The
    ///   message is stored in `last_error`; other stages are untouched.
    pub async fn run_stage(&self, store: &RunStore, stage: StageKind) -> Result<StageOutput, PipelineError> {
        let request = store.read(|run| build_request(run, stage))?;
        let _guard = store.begin(RunState::Running(stage))?;

        self.execute(store, request).await
    }

    /// Execute `stage` and cascade into every following stage.
    ///
    /// Each stage's request is captured the moment the previous stage
    /// resolves. The cascade stops at the first failure; stages that already
    /// completed keep their outputs.
    ///
    /// # Returns
    ///
    /// The run as it stands after the last successful stage.
    ///
    /// # Errors
    ///
    /// Same as [`PipelineEngine::run_stage`], for the first stage that fails.
    pub async fn run_from(&self, store: &RunStore, stage: StageKind) -> Result<PipelineRun, PipelineError> {
        let request = store.read(|run| build_request(run, stage))?;
        let guard = store.begin(RunState::Running(stage))?;

        self.cascade(store, &guard, request).await?;
        drop(guard);
        Ok(store.snapshot())
    }

    /// Reset the run and execute all four stages from scratch.
    ///
    /// # Errors
    ///
    /// Same as [`PipelineEngine::run_stage`]. A busy run is rejected before
    /// it is reset.
    pub async fn run_all(&self, store: &RunStore) -> Result<PipelineRun, PipelineError> {
        require_description(store)?;
        let guard = store.begin(RunState::Running(StageKind::ThinkingPoints))?;
        self.reset(store).await;

        let request = store.read(|run| build_request(run, StageKind::ThinkingPoints))?;
        self.cascade(store, &guard, request).await?;
        drop(guard);
        Ok(store.snapshot())
    }

    /// Reset the run and extract thinking points only.
    ///
    /// The user is expected to review the points before moving on.
    ///
    /// # Errors
    ///
    /// Same as [`PipelineEngine::run_stage`].
    pub async fn extract_thinking_points(&self, store: &RunStore) -> Result<Vec<String>, PipelineError> {
        require_description(store)?;
        let _guard = store.begin(RunState::Running(StageKind::ThinkingPoints))?;
        self.reset(store).await;

        let request = store.read(|run| build_request(run, StageKind::ThinkingPoints))?;
        let output = self.execute(store, request).await?;
        Ok(output.as_list().map(<[String]>::to_vec).unwrap_or_default())
    }

    /// Run the single-shot streaming generation.
    ///
    /// Every accepted frame replaces the displayed result and is announced
    /// with `StreamResultUpdated`. When the stream ends, the last result is
    /// committed: `keyIntent` into stage 1 (one item per line),
    /// `initialPrompt` into stage 2 and `finalPrompt` into stage 4. Only
    /// non-blank fields are committed and marked completed.
    ///
    /// # Errors
    ///
    /// - `PipelineError::Input` / `Busy` as for the other operations.
    /// - `PipelineError::Remote` if the request or the transport fails.
    /// - `PipelineError::StreamStatus` if a frame carries an error code.
    /// - `PipelineError::StreamEmpty` if no usable frame arrived.
    ///
    /// On any of the last three, nothing is committed and the message is
    /// stored in `last_error`.
    pub async fn generate_streaming(&self, store: &RunStore) -> Result<GeneratedPrompt, PipelineError> {
        let description = require_description(store)?;
        let _guard = store.begin(RunState::Streaming)?;
        let run_id = store.id();
        info!(%run_id, "streaming generation started");

        let request = StreamGenerateRequest {
            input_prompt: description,
        };
        let chunks = match self.client.stream_generate(&request).await {
            Ok(chunks) => chunks,
            Err(source) => {
                return Err(self.fail_stream(store, remote(None, source)).await);
            }
        };

        let mut frames = decode_stream::<StreamFrame>(chunks);
        let mut latest = LatestFrame::new();

        while let Some(item) = frames.next().await {
            let outcome = match item {
                Ok(outcome) => outcome,
                Err(source) => return Err(self.fail_stream(store, remote(None, source)).await),
            };

            match latest.accept(outcome) {
                Ok(true) => {
                    if let Some(result) = latest.current() {
                        self.emit(Event::StreamResultUpdated {
                            run_id,
                            result: result.clone(),
                        })
                        .await;
                    }
                }
                Ok(false) => {}
                Err(status) => return Err(self.fail_stream(store, status.into()).await),
            }
        }

        if latest.skipped() > 0 {
            warn!(%run_id, skipped = latest.skipped(), "malformed stream lines were skipped");
        }

        let result = match latest.into_result() {
            Some(result) if !result.is_blank() => result,
            _ => return Err(self.fail_stream(store, PipelineError::StreamEmpty).await),
        };

        for (stage, output) in streamed_outputs(&result) {
            store.set_stage_output(stage, output.clone())?;
            self.emit(Event::StageCompleted { run_id, stage, output }).await;
        }

        info!(%run_id, "streaming generation finished");
        Ok(result)
    }

    async fn reset(&self, store: &RunStore) {
        store.reset();
        self.emit(Event::RunReset { run_id: store.id() }).await;
    }

    /// Run stages in ascending order starting with the one `request` is for,
    /// holding the run busy throughout.
    async fn cascade(
        &self,
        store: &RunStore,
        guard: &InFlight,
        mut request: StageRequest,
    ) -> Result<(), PipelineError> {
        loop {
            let stage = request.stage();
            guard.advance(stage);
            self.emit(Event::AutomationProgress {
                run_id: store.id(),
                stage,
                total: StageKind::COUNT,
            })
            .await;

            self.execute(store, request).await?;

            let Some(next) = stage.next() else {
                return Ok(());
            };
            request = store.read(|run| build_request(run, next))?;
        }
    }

    /// Issue one remote call and commit or record its outcome.
    async fn execute(&self, store: &RunStore, request: StageRequest) -> Result<StageOutput, PipelineError> {
        let run_id = store.id();
        let stage = request.stage();

        info!(%run_id, stage = stage.id(), "stage started");
        self.emit(Event::StageStarted { run_id, stage }).await;

        let output = match self.client.invoke(&request).await {
            Ok(output) if output.is_blank() => {
                return Err(self.fail_stage(store, stage, PipelineError::EmptyOutput(stage)).await);
            }
            Ok(output) => output,
            Err(source) => {
                return Err(self.fail_stage(store, stage, remote(Some(stage), source)).await);
            }
        };

        store.set_stage_output(stage, output.clone())?;
        info!(%run_id, stage = stage.id(), "stage completed");
        self.emit(Event::StageCompleted {
            run_id,
            stage,
            output: output.clone(),
        })
        .await;

        if stage == StageKind::FinalPrompt && store.read(PipelineRun::is_finished) {
            self.emit(Event::RunCompleted { run_id }).await;
        }

        Ok(output)
    }

    async fn fail_stage(&self, store: &RunStore, stage: StageKind, error: PipelineError) -> PipelineError {
        let run_id = store.id();
        let message = error.to_string();
        warn!(%run_id, stage = stage.id(), error = %message, "stage failed");

        store.record_error(message.clone());
        self.emit(Event::StageFailed {
            run_id,
            stage,
            error: message,
        })
        .await;
        error
    }

    async fn fail_stream(&self, store: &RunStore, error: PipelineError) -> PipelineError {
        let run_id = store.id();
        let message = error.to_string();
        warn!(%run_id, error = %message, "streaming generation failed");

        store.record_error(message.clone());
        self.emit(Event::StreamFailed {
            run_id,
            error: message,
        })
        .await;
        error
    }

    async fn emit(&self, event: Event) {
        let _ = self.events_tx.send(event).await;
    }
}

fn remote(stage: Option<StageKind>, source: ClientError) -> PipelineError {
    PipelineError::Remote { stage, source }
}

fn require_description(store: &RunStore) -> Result<String, InputError> {
    let description = store.read(|run| run.description.trim().to_string());
    if description.is_empty() {
        return Err(InputError::EmptyDescription);
    }
    Ok(description)
}

/// Non-blank list items, trimmed.
fn filled_items(output: &StageOutput) -> Vec<String> {
    output
        .as_list()
        .unwrap_or_default()
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn filled_text(output: &StageOutput) -> Option<String> {
    output
        .as_text()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Build the request for `stage` from the run's current slot contents.
///
/// | Stage | Consumes |
/// |---|---|
/// | 1 | description |
/// | 2 | description, stage 1 |
/// | 3 | stage 2 (as the prompt to analyze) |
/// | 4 | stage 2 (as the original prompt), stage 3 (as the advice) |
///
/// # Errors
///
/// Returns `InputError` if a consumed value is empty.
pub fn build_request(run: &PipelineRun, stage: StageKind) -> Result<StageRequest, InputError> {
    let description = run.description.trim();
    let missing = |required: StageKind| InputError::MissingUpstream { stage, required };

    let request = match stage {
        StageKind::ThinkingPoints => {
            if description.is_empty() {
                return Err(InputError::EmptyDescription);
            }
            StageRequest::ThinkingPoints(ThinkingPointsRequest {
                description: description.to_string(),
                language: run.language,
                model: run.model.clone(),
                variables: run.variables.clone(),
            })
        }
        StageKind::InitialPrompt => {
            if description.is_empty() {
                return Err(InputError::EmptyDescription);
            }
            let thinking_points = filled_items(run.output(StageKind::ThinkingPoints));
            if thinking_points.is_empty() {
                return Err(missing(StageKind::ThinkingPoints));
            }
            StageRequest::SystemPrompt(SystemPromptRequest {
                description: description.to_string(),
                language: run.language,
                model: run.model.clone(),
                variables: run.variables.clone(),
                thinking_points,
            })
        }
        StageKind::OptimizationAdvice => {
            let prompt_to_analyze = filled_text(run.output(StageKind::InitialPrompt))
                .ok_or_else(|| missing(StageKind::InitialPrompt))?;
            StageRequest::OptimizationAdvice(OptimizationAdviceRequest {
                prompt_to_analyze,
                prompt_type: run.prompt_type,
                language: run.language,
                model: run.model.clone(),
                variables: run.variables.clone(),
            })
        }
        StageKind::FinalPrompt => {
            let original_prompt = filled_text(run.output(StageKind::InitialPrompt))
                .ok_or_else(|| missing(StageKind::InitialPrompt))?;
            let advice = filled_items(run.output(StageKind::OptimizationAdvice));
            if advice.is_empty() {
                return Err(missing(StageKind::OptimizationAdvice));
            }
            StageRequest::ApplyOptimization(ApplyOptimizationRequest {
                original_prompt,
                advice,
                prompt_type: run.prompt_type,
                language: run.language,
                model: run.model.clone(),
                variables: run.variables.clone(),
            })
        }
    };

    Ok(request)
}

/// Stage outputs carried by a streamed result, non-blank fields only.
fn streamed_outputs(result: &GeneratedPrompt) -> Vec<(StageKind, StageOutput)> {
    let text = |field: &Option<String>| {
        field
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
    };

    let mut outputs = Vec::new();
    if let Some(key_intent) = text(&result.key_intent) {
        outputs.push((StageKind::ThinkingPoints, StageOutput::List(parse_list_text(&key_intent))));
    }
    if let Some(initial) = text(&result.initial_prompt) {
        outputs.push((StageKind::InitialPrompt, StageOutput::Text(initial)));
    }
    if let Some(final_prompt) = text(&result.final_prompt) {
        outputs.push((StageKind::FinalPrompt, StageOutput::Text(final_prompt)));
    }
    outputs
}
