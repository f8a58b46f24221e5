//! Fixtures for building runs and engines.

use gp_core::client::StageClient;
use gp_core::state::run::{commit_stage, create_run};
use gp_core::{PipelineEngine, RunSettings, RunStore};
use gp_protocol::ipc::Event;
use gp_protocol::run_models::PipelineRun;
use gp_protocol::stage_models::{Language, StageKind, StageOutput};
use std::sync::Arc;
use tokio::sync::mpsc;

/// The description used by the end-to-end scenario.
pub const SENTIMENT_TASK: &str = "写一个情感分析助手";

/// An engine over `client` and the receiving end of its event channel.
pub fn engine_with(client: Arc<dyn StageClient>) -> (PipelineEngine, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(256);
    (PipelineEngine::new(client, tx), rx)
}

/// A fresh store for `description` in Chinese.
pub fn store_for(description: &str) -> RunStore {
    RunStore::new(create_run(RunSettings::new(description).with_language(Language::Zh)))
}

/// A run whose first `upto` stages are completed with recognizable outputs.
#[allow(dead_code)]
pub fn run_completed_through(description: &str, upto: StageKind) -> PipelineRun {
    let mut run = create_run(RunSettings::new(description));
    for stage in StageKind::ALL.into_iter().take_while(|s| *s <= upto) {
        commit_stage(&mut run, stage, sample_output(stage)).unwrap();
    }
    run
}

/// A non-blank output of the right shape for `stage`.
pub fn sample_output(stage: StageKind) -> StageOutput {
    if stage.is_list() {
        StageOutput::List(vec![format!("sample item for stage {}", stage.id())])
    } else {
        StageOutput::Text(format!("sample text for stage {}", stage.id()))
    }
}
