//! Error types for pipeline operations.

use crate::client::base::ClientError;
use crate::record::SinkError;
use crate::stream::consumer::StreamStatusError;
use gp_protocol::run_models::RunState;
use gp_protocol::stage_models::StageKind;
use thiserror::Error;
use uuid::Uuid;

/// A required input is missing or has the wrong shape.
///
/// Always raised before any remote call, and never changes run state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("Description is empty")]
    EmptyDescription,

    #[error("Stage {stage} needs the output of stage {required}, which is empty")]
    MissingUpstream { stage: StageKind, required: StageKind },

    #[error("Stage {stage} holds {expected} output")]
    OutputShape {
        stage: StageKind,
        expected: &'static str,
    },

    #[error("Stage {0} does not hold a list")]
    NotAList(StageKind),

    #[error("Stage {stage} has no item {index} (length {len})")]
    ItemOutOfRange {
        stage: StageKind,
        index: usize,
        len: usize,
    },

    #[error("Nothing to save: the final prompt is empty")]
    NothingToSave,
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error("Run is busy ({0:?})")]
    Busy(RunState),

    #[error("Remote call failed{}: {source}", stage_suffix(.stage))]
    Remote {
        stage: Option<StageKind>,
        #[source]
        source: ClientError,
    },

    #[error("Stage {0} returned no content")]
    EmptyOutput(StageKind),

    #[error(transparent)]
    StreamStatus(#[from] StreamStatusError),

    #[error("Stream ended without a result")]
    StreamEmpty,

    #[error("Run {0} not found")]
    UnknownRun(Uuid),

    #[error("Failed to save prompt: {0}")]
    Sink(#[from] SinkError),
}

fn stage_suffix(stage: &Option<StageKind>) -> String {
    stage
        .map(|stage| format!(" at stage {stage}"))
        .unwrap_or_default()
}

impl PipelineError {
    /// Whether the error was recorded as the run's `last_error`.
    ///
    /// Remote, stream and save failures are recorded; input, busy and
    /// lookup errors are rejected before touching the run.
    pub fn is_recorded(&self) -> bool {
        matches!(
            self,
            PipelineError::Remote { .. }
                | PipelineError::EmptyOutput(_)
                | PipelineError::StreamStatus(_)
                | PipelineError::StreamEmpty
                | PipelineError::Sink(_)
        )
    }
}
