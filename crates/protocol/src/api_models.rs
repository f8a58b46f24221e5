//! Wire models for the remote generation service.
//!
//! Request payloads are serialized in camelCase, matching the HTTP API:
//!
//! ```json
//! {
//!   "promptToAnalyze": "You are a sentiment analysis assistant...",
//!   "promptType": "system",
//!   "language": "zh",
//!   "variables": []
//! }
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::stage_models::{Language, PromptType};

/// Status code the service uses for success, both in response envelopes
/// and in stream frames.
pub const SUCCESS_CODE: i64 = 200;

/// Stage 1 request: extract key instructions from a description.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingPointsRequest {
    pub description: String,
    pub language: Language,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub variables: Vec<String>,
}

/// Stage 2 request: draft a system prompt from the description and the
/// thinking points.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
pub struct SystemPromptRequest {
    pub description: String,
    pub language: Language,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub variables: Vec<String>,
    pub thinking_points: Vec<String>,
}

/// Stage 3 request: ask for advice on improving a prompt.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationAdviceRequest {
    pub prompt_to_analyze: String,
    pub prompt_type: PromptType,
    pub language: Language,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub variables: Vec<String>,
}

/// Stage 4 request: apply advice to the original prompt.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
pub struct ApplyOptimizationRequest {
    pub original_prompt: String,
    pub advice: Vec<String>,
    pub prompt_type: PromptType,
    pub language: Language,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub variables: Vec<String>,
}

/// Request for the single-shot streaming generation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
pub struct StreamGenerateRequest {
    pub input_prompt: String,
}

/// Response envelope wrapping every service reply.
///
/// `code == 200` means success; anything else carries an error `message`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct ApiResponse<T> {
    pub code: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }

    pub fn success(data: T) -> Self {
        Self {
            code: SUCCESS_CODE,
            message: None,
            data: Some(data),
        }
    }

    pub fn error(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: Some(message.into()),
            data: None,
        }
    }

    /// The error message, falling back to a generic one mentioning the code.
    pub fn error_message(&self) -> String {
        self.message
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("service returned code {}", self.code))
    }
}

/// Payload of a streaming generation frame.
///
/// The server emits a growing result: each frame supersedes the previous
/// one rather than appending to it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPrompt {
    #[serde(default)]
    pub key_intent: Option<String>,
    #[serde(default)]
    pub initial_prompt: Option<String>,
    #[serde(default)]
    pub final_prompt: Option<String>,
}

impl GeneratedPrompt {
    /// True when none of the fields carry non-whitespace text.
    pub fn is_blank(&self) -> bool {
        [&self.key_intent, &self.initial_prompt, &self.final_prompt]
            .iter()
            .all(|field| field.as_deref().map_or(true, |s| s.trim().is_empty()))
    }
}

/// One decoded NDJSON record from the streaming endpoint:
/// `{"code": 200, "message": "...", "data": {...}}`.
pub type StreamFrame = ApiResponse<GeneratedPrompt>;
