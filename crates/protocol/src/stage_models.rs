//! Stage definitions for the four-step prompt generation pipeline.
//!
//! The pipeline always has exactly four stages, executed in ascending order:
//!
//! 1. Thinking points (key instructions extracted from the description)
//! 2. Initial prompt (drafted from the description and the thinking points)
//! 3. Optimization advice (suggestions for improving the initial prompt)
//! 4. Final prompt (the initial prompt with the advice applied)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

/// Identifies one of the four pipeline stages.
///
/// The variant doubles as the stage id: `id()` returns 1..=4 and
/// `from_id` is its inverse. Ordering follows execution order.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageKind {
    /// Stage 1: key instructions extracted from the description.
    ThinkingPoints,

    /// Stage 2: first draft of the system prompt.
    InitialPrompt,

    /// Stage 3: improvement suggestions for the initial prompt.
    OptimizationAdvice,

    /// Stage 4: the initial prompt with the advice applied.
    FinalPrompt,
}

impl StageKind {
    /// All stages in execution order.
    pub const ALL: [StageKind; 4] = [
        StageKind::ThinkingPoints,
        StageKind::InitialPrompt,
        StageKind::OptimizationAdvice,
        StageKind::FinalPrompt,
    ];

    /// Number of stages in every pipeline run.
    pub const COUNT: usize = 4;

    /// 1-based stage id.
    pub fn id(self) -> u8 {
        match self {
            StageKind::ThinkingPoints => 1,
            StageKind::InitialPrompt => 2,
            StageKind::OptimizationAdvice => 3,
            StageKind::FinalPrompt => 4,
        }
    }

    /// Look up a stage by its 1-based id.
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(StageKind::ThinkingPoints),
            2 => Some(StageKind::InitialPrompt),
            3 => Some(StageKind::OptimizationAdvice),
            4 => Some(StageKind::FinalPrompt),
            _ => None,
        }
    }

    /// Zero-based position inside a run's stage array.
    pub fn index(self) -> usize {
        usize::from(self.id() - 1)
    }

    /// The stage that runs after this one, if any.
    pub fn next(self) -> Option<Self> {
        Self::from_id(self.id() + 1)
    }

    /// The stage whose output this stage consumes, if any.
    pub fn previous(self) -> Option<Self> {
        self.id().checked_sub(1).and_then(Self::from_id)
    }

    /// Whether the stage produces an ordered list of strings rather than a
    /// single block of text.
    pub fn is_list(self) -> bool {
        matches!(self, StageKind::ThinkingPoints | StageKind::OptimizationAdvice)
    }

    /// An empty output of the right shape for this stage.
    pub fn empty_output(self) -> StageOutput {
        if self.is_list() {
            StageOutput::List(Vec::new())
        } else {
            StageOutput::Text(String::new())
        }
    }

    /// Short human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            StageKind::ThinkingPoints => "thinking points",
            StageKind::InitialPrompt => "initial prompt",
            StageKind::OptimizationAdvice => "optimization advice",
            StageKind::FinalPrompt => "final prompt",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id(), self.label())
    }
}

/// The content held by a stage slot.
///
/// Stages 1 and 3 hold a list, stages 2 and 4 hold a single text.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum StageOutput {
    List(Vec<String>),
    Text(String),
}

impl StageOutput {
    /// True when there is nothing usable in the output: a whitespace-only
    /// text, an empty list, or a list whose items are all whitespace-only.
    pub fn is_blank(&self) -> bool {
        match self {
            StageOutput::List(items) => items.iter().all(|item| item.trim().is_empty()),
            StageOutput::Text(text) => text.trim().is_empty(),
        }
    }

    /// Whether this output has the shape the given stage expects.
    pub fn fits(&self, stage: StageKind) -> bool {
        matches!(self, StageOutput::List(_)) == stage.is_list()
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            StageOutput::List(items) => Some(items),
            StageOutput::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            StageOutput::Text(text) => Some(text),
            StageOutput::List(_) => None,
        }
    }

    /// Render the output as plain text, one list item per line.
    pub fn to_plain_text(&self) -> String {
        match self {
            StageOutput::List(items) => items.join("\n"),
            StageOutput::Text(text) => text.clone(),
        }
    }
}

/// Output language requested from the generation service.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Zh,
    En,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::Zh => "zh",
            Language::En => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zh" => Ok(Language::Zh),
            "en" => Ok(Language::En),
            other => Err(format!("unsupported language '{other}', expected zh or en")),
        }
    }
}

/// Kind of prompt being analysed or optimized in stages 3 and 4.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "lowercase")]
pub enum PromptType {
    #[default]
    System,
    User,
}

impl fmt::Display for PromptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptType::System => f.write_str("system"),
            PromptType::User => f.write_str("user"),
        }
    }
}

impl FromStr for PromptType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "system" => Ok(PromptType::System),
            "user" => Ok(PromptType::User),
            other => Err(format!("unsupported prompt type '{other}', expected system or user")),
        }
    }
}
