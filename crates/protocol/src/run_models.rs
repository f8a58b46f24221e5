//! Runtime state of a single prompt generation run.
//!
//! A `PipelineRun` is created when the user first triggers a generation
//! action and is discarded (replaced by a fresh one) when the description
//! changes or the user explicitly resets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use ts_rs::TS;
use uuid::Uuid;

use crate::stage_models::{Language, PromptType, StageKind, StageOutput};

/// What the run is currently waiting on.
///
/// At most one remote call is in flight per run, so a single variant is
/// enough to describe it.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
#[serde(tag = "state", content = "stage", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    /// No call in flight.
    #[default]
    Idle,

    /// The remote call for this stage is in flight.
    Running(StageKind),

    /// The single-shot streaming generation is in flight.
    Streaming,
}

impl RunState {
    pub fn is_idle(&self) -> bool {
        matches!(self, RunState::Idle)
    }

    /// The stage currently in flight, if the run is executing a single stage.
    pub fn running_stage(&self) -> Option<StageKind> {
        match self {
            RunState::Running(stage) => Some(*stage),
            _ => None,
        }
    }
}

/// Output holder for one stage.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct StageSlot {
    pub kind: StageKind,

    /// Latest output, either from a successful call or a user edit.
    pub output: StageOutput,
}

impl StageSlot {
    pub fn empty(kind: StageKind) -> Self {
        Self {
            kind,
            output: kind.empty_output(),
        }
    }
}

/// One end-to-end attempt at generating a prompt.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct PipelineRun {
    #[ts(type = "string")]
    pub id: Uuid,

    /// The user's free-text role/task description. Fixed for the lifetime
    /// of the run; a new description means a new run.
    pub description: String,

    pub language: Language,

    pub prompt_type: PromptType,

    /// Optional model override forwarded to the generation service.
    #[serde(default)]
    pub model: Option<String>,

    /// Template variables forwarded to the generation service.
    #[serde(default)]
    pub variables: Vec<String>,

    /// Exactly four slots, indexed by `StageKind::index()`.
    pub stages: [StageSlot; 4],

    /// Stages that have been populated by a successful call at least once.
    /// User edits never remove membership.
    #[serde(default)]
    pub completed: BTreeSet<StageKind>,

    /// Stage whose panel is expanded, if any.
    #[serde(default)]
    pub active: Option<StageKind>,

    #[serde(default)]
    pub state: RunState,

    /// Message of the last failure; cleared when a new attempt starts.
    #[serde(default)]
    pub last_error: Option<String>,

    pub started_at: DateTime<Utc>,
}

impl PipelineRun {
    pub fn slot(&self, stage: StageKind) -> &StageSlot {
        &self.stages[stage.index()]
    }

    pub fn slot_mut(&mut self, stage: StageKind) -> &mut StageSlot {
        &mut self.stages[stage.index()]
    }

    pub fn output(&self, stage: StageKind) -> &StageOutput {
        &self.slot(stage).output
    }

    pub fn is_completed(&self, stage: StageKind) -> bool {
        self.completed.contains(&stage)
    }

    /// True once all four stages have completed at least once.
    pub fn is_finished(&self) -> bool {
        self.completed.len() == StageKind::COUNT
    }

    pub fn is_busy(&self) -> bool {
        !self.state.is_idle()
    }
}
