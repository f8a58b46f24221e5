//! Shared handle to one PipelineRun.
//!
//! The engine and the user both mutate a run: the engine when a remote call
//! succeeds or fails, the user by editing stage outputs, possibly while a
//! call is in flight. `RunStore` serializes those writes behind a short
//! lock that is never held across an await.

use crate::error::{InputError, PipelineError};
use crate::state::run::{
    append_list_item, commit_stage, edit_stage, fail_run, reset_run, toggle_active, update_list_item,
};
use gp_protocol::run_models::{PipelineRun, RunState};
use gp_protocol::stage_models::{StageKind, StageOutput};
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

/// Cloneable handle to a run. Clones share the same run.
#[derive(Debug, Clone)]
pub struct RunStore {
    id: Uuid,
    inner: Arc<Mutex<PipelineRun>>,
}

impl RunStore {
    /// Wrap a run. A run deserialized mid-call is brought back to `Idle`,
    /// since nothing can be in flight for it anymore.
    pub fn new(mut run: PipelineRun) -> Self {
        run.state = RunState::Idle;
        Self {
            id: run.id,
            inner: Arc::new(Mutex::new(run)),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// A copy of the current run.
    pub fn snapshot(&self) -> PipelineRun {
        self.inner.lock().clone()
    }

    /// Run `f` against the current run under the lock.
    pub fn read<R>(&self, f: impl FnOnce(&PipelineRun) -> R) -> R {
        f(&self.inner.lock())
    }

    pub fn state(&self) -> RunState {
        self.inner.lock().state
    }

    /// Mark the run as busy for the lifetime of the returned guard.
    ///
    /// Clears `last_error`, since a new attempt is starting.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Busy` if another call is already in flight.
    pub fn begin(&self, mode: RunState) -> Result<InFlight, PipelineError> {
        let mut run = self.inner.lock();
        if !run.state.is_idle() {
            return Err(PipelineError::Busy(run.state));
        }
        run.state = mode;
        run.last_error = None;

        Ok(InFlight { store: self.clone() })
    }

    /// Overwrite one stage's output as the result of a successful call.
    ///
    /// # Errors
    ///
    /// Returns `InputError::OutputShape` if the output does not fit the stage.
    pub fn set_stage_output(&self, stage: StageKind, output: StageOutput) -> Result<(), InputError> {
        commit_stage(&mut self.inner.lock(), stage, output)
    }

    /// Apply a user edit to one stage. Allowed while a call is in flight.
    ///
    /// # Errors
    ///
    /// Returns `InputError::OutputShape` if the output does not fit the stage.
    pub fn edit_stage_output(&self, stage: StageKind, output: StageOutput) -> Result<(), InputError> {
        edit_stage(&mut self.inner.lock(), stage, output)
    }

    /// # Errors
    ///
    /// Returns `InputError::NotAList` for text stages.
    pub fn append_list_item(&self, stage: StageKind) -> Result<usize, InputError> {
        append_list_item(&mut self.inner.lock(), stage)
    }

    /// # Errors
    ///
    /// Returns `InputError::NotAList` or `InputError::ItemOutOfRange`.
    pub fn update_list_item(&self, stage: StageKind, index: usize, value: String) -> Result<(), InputError> {
        update_list_item(&mut self.inner.lock(), stage, index, value)
    }

    /// Atomically replace the set of completed stages.
    pub fn replace_completed(&self, completed: BTreeSet<StageKind>) {
        self.inner.lock().completed = completed;
    }

    pub fn toggle_active(&self, stage: StageKind) -> Option<StageKind> {
        toggle_active(&mut self.inner.lock(), stage)
    }

    pub fn record_error(&self, error: String) {
        fail_run(&mut self.inner.lock(), error);
    }

    /// Erase all stage outputs and completion flags.
    pub fn reset(&self) {
        reset_run(&mut self.inner.lock());
    }
}

/// Guard for an in-flight call. Dropping it returns the run to `Idle`,
/// whether the call succeeded, failed or was abandoned.
#[derive(Debug)]
pub struct InFlight {
    store: RunStore,
}

impl InFlight {
    /// Move a cascade on to its next stage without releasing the run.
    pub fn advance(&self, stage: StageKind) {
        self.store.inner.lock().state = RunState::Running(stage);
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.store.inner.lock().state = RunState::Idle;
    }
}
