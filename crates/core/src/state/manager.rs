//! Run manager for coordinating multiple pipeline runs.
//!
//! The RunManager keeps a registry of open runs (one per tab or session)
//! and dispatches front-end operations to the engine or the run store.

use crate::client::base::StageClient;
use crate::engine::PipelineEngine;
use crate::error::PipelineError;
use crate::record::{build_prompt_record, PromptSink};
use crate::state::run::{create_run, RunSettings};
use crate::state::store::RunStore;
use gp_protocol::ipc::{Event, Op};
use gp_protocol::run_models::PipelineRun;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

/// Manages all open pipeline runs.
///
/// Runs are independent: each has its own single-flight guard, so two runs
/// may have calls in flight at the same time.
#[derive(Clone)]
pub struct RunManager {
    /// Registry of open runs, indexed by run id.
    runs: Arc<Mutex<HashMap<Uuid, RunStore>>>,

    engine: Arc<PipelineEngine>,

    sink: Arc<dyn PromptSink>,

    events_tx: mpsc::Sender<Event>,
}

impl RunManager {
    /// Create a new RunManager.
    ///
    /// # Arguments
    ///
    /// * `client` - The remote generation service
    /// * `sink` - Where `SavePrompt` stores finished prompts
    /// * `events_tx` - Channel for sending events to the front-end
    pub fn new(client: Arc<dyn StageClient>, sink: Arc<dyn PromptSink>, events_tx: mpsc::Sender<Event>) -> Self {
        let engine = Arc::new(PipelineEngine::new(client, events_tx.clone()));

        Self {
            runs: Arc::new(Mutex::new(HashMap::new())),
            engine,
            sink,
            events_tx,
        }
    }

    /// Open a new run and return its id.
    pub fn open(&self, settings: RunSettings) -> Uuid {
        self.insert(create_run(settings))
    }

    /// Register an existing run, e.g. one loaded from disk.
    pub fn insert(&self, run: PipelineRun) -> Uuid {
        let store = RunStore::new(run);
        let id = store.id();
        self.runs.lock().insert(id, store);
        id
    }

    pub fn store(&self, run_id: Uuid) -> Option<RunStore> {
        self.runs.lock().get(&run_id).cloned()
    }

    /// A copy of the run's current state.
    pub fn get_run(&self, run_id: Uuid) -> Option<PipelineRun> {
        self.store(run_id).map(|store| store.snapshot())
    }

    /// Snapshots of all open runs, oldest first.
    pub fn list_runs(&self) -> Vec<PipelineRun> {
        let mut runs: Vec<PipelineRun> = self.runs.lock().values().map(RunStore::snapshot).collect();
        runs.sort_by_key(|run| run.started_at);
        runs
    }

    /// Close a run. An in-flight call for it still finishes, but its result
    /// is no longer reachable through the manager.
    pub fn close(&self, run_id: Uuid) -> Option<PipelineRun> {
        self.runs.lock().remove(&run_id).map(|store| store.snapshot())
    }

    /// Discard a run and open a fresh one with a new description but the
    /// same language, prompt type, model and variables.
    ///
    /// # Errors
    ///
    /// Returns `UnknownRun` if the run does not exist and `Busy` if a call
    /// is in flight for it.
    pub fn restart(&self, run_id: Uuid, description: impl Into<String>) -> Result<Uuid, PipelineError> {
        let old = self.lookup(run_id)?.snapshot();
        if old.is_busy() {
            return Err(PipelineError::Busy(old.state));
        }

        let settings = RunSettings::new(description)
            .with_language(old.language)
            .with_prompt_type(old.prompt_type)
            .with_model(old.model)
            .with_variables(old.variables);

        self.runs.lock().remove(&run_id);
        Ok(self.open(settings))
    }

    /// Execute an operation against a run and wait for it to finish.
    ///
    /// # Errors
    ///
    /// Returns `UnknownRun` for an unknown id, otherwise whatever the
    /// operation itself returns.
    pub async fn submit(&self, run_id: Uuid, op: Op) -> Result<(), PipelineError> {
        let store = self.lookup(run_id)?;
        info!(%run_id, ?op, "dispatching operation");

        match op {
            Op::ExtractThinkingPoints => {
                self.engine.extract_thinking_points(&store).await?;
            }
            Op::RunStage { stage } => {
                self.engine.run_stage(&store, stage).await?;
            }
            Op::RunFrom { stage } => {
                self.engine.run_from(&store, stage).await?;
            }
            Op::RunAll => {
                self.engine.run_all(&store).await?;
            }
            Op::GenerateStreaming => {
                self.engine.generate_streaming(&store).await?;
            }
            Op::EditStage { stage, output } => store.edit_stage_output(stage, output)?,
            Op::AddListItem { stage } => {
                store.append_list_item(stage)?;
            }
            Op::UpdateListItem { stage, index, value } => store.update_list_item(stage, index, value)?,
            Op::ToggleStage { stage } => {
                store.toggle_active(stage);
            }
            Op::Reset => {
                let state = store.state();
                if !state.is_idle() {
                    return Err(PipelineError::Busy(state));
                }
                store.reset();
                let _ = self.events_tx.send(Event::RunReset { run_id }).await;
            }
            Op::SavePrompt => {
                self.save(run_id).await?;
            }
        }

        Ok(())
    }

    /// Execute an operation in the background.
    ///
    /// Progress is reported through the events channel; the handle yields
    /// the operation's result.
    pub fn spawn(&self, run_id: Uuid, op: Op) -> JoinHandle<Result<(), PipelineError>> {
        let manager = self.clone();
        tokio::spawn(async move {
            let result = manager.submit(run_id, op).await;
            if let Err(e) = &result {
                warn!(%run_id, error = %e, "operation failed");
            }
            result
        })
    }

    /// Assemble the run's finished prompt and hand it to the sink.
    ///
    /// # Returns
    ///
    /// The location reported by the sink.
    ///
    /// # Errors
    ///
    /// - `Input(NothingToSave)` if the final prompt is empty. Nothing is
    ///   recorded.
    /// - `Sink` if the sink fails. The message is stored in `last_error`.
    pub async fn save(&self, run_id: Uuid) -> Result<String, PipelineError> {
        let store = self.lookup(run_id)?;
        let record = store.read(build_prompt_record)?;

        match self.sink.save(&record).await {
            Ok(location) => {
                let _ = self
                    .events_tx
                    .send(Event::PromptSaved {
                        run_id,
                        title: record.title,
                    })
                    .await;
                Ok(location)
            }
            Err(e) => {
                let error = PipelineError::Sink(e);
                store.record_error(error.to_string());
                Err(error)
            }
        }
    }

    fn lookup(&self, run_id: Uuid) -> Result<RunStore, PipelineError> {
        self.store(run_id).ok_or(PipelineError::UnknownRun(run_id))
    }
}
