//! Terminal rendering of core events.

use colored::Colorize;
use gp_protocol::api_models::GeneratedPrompt;
use gp_protocol::ipc::Event;
use gp_protocol::stage_models::StageOutput;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Info,
    Success,
    Failure,
    Muted,
}

/// One plain-text line for an event.
pub fn describe(event: &Event) -> (Tone, String) {
    match event {
        Event::RunReset { .. } => (Tone::Muted, "run reset".to_string()),
        Event::AutomationProgress { stage, total, .. } => (
            Tone::Info,
            format!("step {}/{total}: {}", stage.id(), stage.label()),
        ),
        Event::StageStarted { stage, .. } => (Tone::Muted, format!("stage {stage} started")),
        Event::StageCompleted { stage, output, .. } => {
            (Tone::Success, format!("✓ stage {stage}: {}", summarize(output)))
        }
        Event::StageFailed { stage, error, .. } => (Tone::Failure, format!("✗ stage {stage}: {error}")),
        Event::StreamResultUpdated { result, .. } => {
            (Tone::Muted, format!("stream: {}", received_fields(result)))
        }
        Event::StreamFailed { error, .. } => (Tone::Failure, format!("✗ stream: {error}")),
        Event::RunCompleted { .. } => (Tone::Success, "run completed".to_string()),
        Event::PromptSaved { title, .. } => (Tone::Success, format!("saved \"{title}\"")),
    }
}

fn summarize(output: &StageOutput) -> String {
    match output {
        StageOutput::List(items) => format!("{} items", items.len()),
        StageOutput::Text(text) => format!("{} chars", text.chars().count()),
    }
}

fn received_fields(result: &GeneratedPrompt) -> String {
    let fields: Vec<&str> = [
        ("keyIntent", &result.key_intent),
        ("initialPrompt", &result.initial_prompt),
        ("finalPrompt", &result.final_prompt),
    ]
    .into_iter()
    .filter(|(_, value)| value.as_deref().is_some_and(|v| !v.trim().is_empty()))
    .map(|(name, _)| name)
    .collect();

    if fields.is_empty() {
        "nothing yet".to_string()
    } else {
        fields.join(", ")
    }
}

/// Print events to stderr until every sender is gone.
pub async fn print_events(mut rx: mpsc::Receiver<Event>) {
    while let Some(event) = rx.recv().await {
        let (tone, line) = describe(&event);
        let line = match tone {
            Tone::Info => line.cyan(),
            Tone::Success => line.green(),
            Tone::Failure => line.red().bold(),
            Tone::Muted => line.dimmed(),
        };
        eprintln!("{line}");
    }
}
