//! Finished-prompt records and where they are saved.

use crate::error::InputError;
use async_trait::async_trait;
use chrono::Utc;
use gp_protocol::record_models::PromptRecord;
use gp_protocol::run_models::PipelineRun;
use gp_protocol::stage_models::StageKind;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

const TITLE_PREFIX: &str = "提示词_";
const TITLE_CHARS: usize = 20;
const RECORD_FORMAT: &str = "markdown";

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Prompt store rejected the record: {0}")]
    Rejected(String),
}

/// Assemble the record for a run's finished prompt.
///
/// The title is `提示词_` followed by the first 20 characters of the
/// description, with `...` appended when the description is longer.
///
/// # Errors
///
/// Returns `InputError::NothingToSave` if the final prompt is blank.
pub fn build_prompt_record(run: &PipelineRun) -> Result<PromptRecord, InputError> {
    let final_prompt = run
        .output(StageKind::FinalPrompt)
        .as_text()
        .filter(|text| !text.trim().is_empty())
        .ok_or(InputError::NothingToSave)?;

    let list = |stage: StageKind| run.output(stage).as_list().unwrap_or_default().to_vec();
    let text = |stage: StageKind| run.output(stage).as_text().unwrap_or_default().to_string();

    Ok(PromptRecord {
        title: record_title(&run.description),
        description: run.description.clone(),
        requirement_report: run.description.clone(),
        thinking_points: list(StageKind::ThinkingPoints),
        initial_prompt: text(StageKind::InitialPrompt),
        advice: list(StageKind::OptimizationAdvice),
        final_prompt: final_prompt.to_string(),
        language: run.language,
        format: RECORD_FORMAT.to_string(),
        tags: Vec::new(),
    })
}

fn record_title(description: &str) -> String {
    let head: String = description.chars().take(TITLE_CHARS).collect();
    let ellipsis = if description.chars().count() > TITLE_CHARS { "..." } else { "" };
    format!("{TITLE_PREFIX}{head}{ellipsis}")
}

/// Persistence collaborator for finished prompts.
#[async_trait]
pub trait PromptSink: Send + Sync {
    /// Store the record and return where it went.
    async fn save(&self, record: &PromptRecord) -> Result<String, SinkError>;
}

/// Writes each record as a pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    dir: PathBuf,
}

impl JsonFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }
}

#[async_trait]
impl PromptSink for JsonFileSink {
    async fn save(&self, record: &PromptRecord) -> Result<String, SinkError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| SinkError::CreateDir {
                path: self.dir.clone(),
                source,
            })?;

        let id = Uuid::new_v4().simple().to_string();
        let file_name = format!("{}-{}.json", Utc::now().format("%Y%m%d-%H%M%S"), &id[..8]);
        let path = self.dir.join(file_name);

        let json = serde_json::to_string_pretty(record)?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|source| SinkError::Write {
                path: path.clone(),
                source,
            })?;

        info!(path = %path.display(), title = %record.title, "prompt saved");
        Ok(path.display().to_string())
    }
}
