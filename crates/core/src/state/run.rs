//! Run state transitions.
//!
//! This module provides functions for creating a PipelineRun and applying
//! the mutations the engine and the user perform on it. None of them touch
//! `RunState`; the in-flight marker is owned by `RunStore::begin`.

use crate::error::InputError;
use chrono::Utc;
use gp_protocol::config_models::RunDefaults;
use gp_protocol::run_models::{PipelineRun, RunState, StageSlot};
use gp_protocol::stage_models::{Language, PromptType, StageKind, StageOutput};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Everything fixed for the lifetime of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub description: String,
    pub language: Language,
    pub prompt_type: PromptType,
    pub model: Option<String>,
    pub variables: Vec<String>,
}

impl RunSettings {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            language: Language::default(),
            prompt_type: PromptType::default(),
            model: None,
            variables: Vec::new(),
        }
    }

    /// Settings seeded from the `[defaults]` config table.
    pub fn from_defaults(description: impl Into<String>, defaults: &RunDefaults) -> Self {
        Self {
            language: defaults.language,
            prompt_type: defaults.prompt_type,
            model: defaults.model.clone(),
            ..Self::new(description)
        }
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn with_prompt_type(mut self, prompt_type: PromptType) -> Self {
        self.prompt_type = prompt_type;
        self
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    pub fn with_variables(mut self, variables: Vec<String>) -> Self {
        self.variables = variables;
        self
    }
}

/// Create a new idle run with four empty stage slots.
pub fn create_run(settings: RunSettings) -> PipelineRun {
    PipelineRun {
        id: Uuid::new_v4(),
        description: settings.description,
        language: settings.language,
        prompt_type: settings.prompt_type,
        model: settings.model,
        variables: settings.variables,
        stages: StageKind::ALL.map(StageSlot::empty),
        completed: BTreeSet::new(),
        active: None,
        state: RunState::Idle,
        last_error: None,
        started_at: Utc::now(),
    }
}

/// Erase every stage output and completion flag.
///
/// Identity and settings are kept, as is the in-flight marker.
pub fn reset_run(run: &mut PipelineRun) {
    run.stages = StageKind::ALL.map(StageSlot::empty);
    run.completed.clear();
    run.active = None;
    run.last_error = None;
}

fn check_shape(stage: StageKind, output: &StageOutput) -> Result<(), InputError> {
    if output.fits(stage) {
        Ok(())
    } else {
        Err(InputError::OutputShape {
            stage,
            expected: if stage.is_list() { "list" } else { "text" },
        })
    }
}

/// Store the result of a successful remote call.
///
/// The stage becomes completed and active.
///
/// # Errors
///
/// Returns `InputError::OutputShape` if `output` does not fit the stage.
pub fn commit_stage(run: &mut PipelineRun, stage: StageKind, output: StageOutput) -> Result<(), InputError> {
    check_shape(stage, &output)?;
    run.slot_mut(stage).output = output;
    run.completed.insert(stage);
    run.active = Some(stage);
    Ok(())
}

/// Record a failure. Stage outputs and completion flags are untouched.
pub fn fail_run(run: &mut PipelineRun, error: String) {
    run.last_error = Some(error);
}

/// Replace a stage's output with user-edited content.
///
/// Completion flags are not touched, and downstream stages keep their
/// outputs even if they were computed from the previous value.
///
/// # Errors
///
/// Returns `InputError::OutputShape` if `output` does not fit the stage.
pub fn edit_stage(run: &mut PipelineRun, stage: StageKind, output: StageOutput) -> Result<(), InputError> {
    check_shape(stage, &output)?;
    run.slot_mut(stage).output = output;
    Ok(())
}

/// Append an empty item to a list stage and return its index.
///
/// # Errors
///
/// Returns `InputError::NotAList` for text stages.
pub fn append_list_item(run: &mut PipelineRun, stage: StageKind) -> Result<usize, InputError> {
    match &mut run.slot_mut(stage).output {
        StageOutput::List(items) => {
            items.push(String::new());
            Ok(items.len() - 1)
        }
        StageOutput::Text(_) => Err(InputError::NotAList(stage)),
    }
}

/// Replace one item of a list stage.
///
/// # Errors
///
/// Returns `InputError::NotAList` for text stages and
/// `InputError::ItemOutOfRange` for a bad index.
pub fn update_list_item(
    run: &mut PipelineRun,
    stage: StageKind,
    index: usize,
    value: String,
) -> Result<(), InputError> {
    match &mut run.slot_mut(stage).output {
        StageOutput::List(items) => {
            let len = items.len();
            let item = items
                .get_mut(index)
                .ok_or(InputError::ItemOutOfRange { stage, index, len })?;
            *item = value;
            Ok(())
        }
        StageOutput::Text(_) => Err(InputError::NotAList(stage)),
    }
}

/// Expand `stage`, or collapse it if it is already expanded.
pub fn toggle_active(run: &mut PipelineRun, stage: StageKind) -> Option<StageKind> {
    run.active = if run.active == Some(stage) { None } else { Some(stage) };
    run.active
}
