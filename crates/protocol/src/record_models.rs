//! Finished-prompt record handed to the persistence layer.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::stage_models::Language;

/// A finished prompt together with the intermediate results that led to it.
///
/// Field names are snake_case on the wire, matching the prompt store.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct PromptRecord {
    pub title: String,
    pub description: String,
    pub requirement_report: String,
    pub thinking_points: Vec<String>,
    pub initial_prompt: String,
    pub advice: Vec<String>,
    pub final_prompt: String,
    pub language: Language,
    pub format: String,
    #[serde(default)]
    pub tags: Vec<String>,
}
