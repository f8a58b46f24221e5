//! Channel protocol between a front-end and the core.
//!
//! The protocol follows an Operation/Event pattern:
//! - `Op`: commands sent from the front-end to the core
//! - `Event`: progress and state changes sent from the core to the front-end
//!
//! Both use tagged enum serialization for TypeScript compatibility:
//! ```json
//! {
//!   "type": "stageCompleted",
//!   "payload": {
//!     "run_id": "uuid-here",
//!     "stage": "INITIAL_PROMPT",
//!     "output": { "kind": "text", "value": "You are..." }
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::api_models::GeneratedPrompt;
use crate::stage_models::{StageKind, StageOutput};

/// Operations sent from the front-end to the core for a given run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Op {
    /// Reset the run and extract thinking points (stage 1 only).
    ExtractThinkingPoints,

    /// Run exactly one stage using the current slot contents.
    RunStage { stage: StageKind },

    /// Run a stage and cascade through the following ones.
    RunFrom { stage: StageKind },

    /// Reset the run and execute all four stages.
    RunAll,

    /// Run the single-shot streaming generation.
    GenerateStreaming,

    /// Replace a stage's output with user-edited content.
    EditStage { stage: StageKind, output: StageOutput },

    /// Append an empty item to a list stage.
    AddListItem { stage: StageKind },

    /// Replace one item of a list stage.
    UpdateListItem {
        stage: StageKind,
        index: usize,
        value: String,
    },

    /// Expand or collapse a stage panel.
    ToggleStage { stage: StageKind },

    /// Discard all stage outputs of the run.
    Reset,

    /// Assemble and persist the finished prompt.
    SavePrompt,
}

/// Events sent from the core to the front-end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Event {
    /// All stage outputs of the run were cleared.
    RunReset {
        #[ts(type = "string")]
        run_id: Uuid,
    },

    /// An automated run moved on to the next stage ("step 2/4").
    AutomationProgress {
        #[ts(type = "string")]
        run_id: Uuid,
        stage: StageKind,
        total: usize,
    },

    /// A stage's remote call has been issued.
    StageStarted {
        #[ts(type = "string")]
        run_id: Uuid,
        stage: StageKind,
    },

    /// A stage's remote call succeeded and its output was stored.
    StageCompleted {
        #[ts(type = "string")]
        run_id: Uuid,
        stage: StageKind,
        output: StageOutput,
    },

    /// A stage's remote call failed; earlier stages are untouched.
    StageFailed {
        #[ts(type = "string")]
        run_id: Uuid,
        stage: StageKind,
        error: String,
    },

    /// A streaming frame replaced the displayed result.
    StreamResultUpdated {
        #[ts(type = "string")]
        run_id: Uuid,
        result: GeneratedPrompt,
    },

    /// The streaming generation failed.
    StreamFailed {
        #[ts(type = "string")]
        run_id: Uuid,
        error: String,
    },

    /// Every stage of the run has completed.
    RunCompleted {
        #[ts(type = "string")]
        run_id: Uuid,
    },

    /// The finished prompt was persisted.
    PromptSaved {
        #[ts(type = "string")]
        run_id: Uuid,
        title: String,
    },
}
