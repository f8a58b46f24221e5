use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, WrapErr};
use gp_core::client::{HttpStageClient, MockStageClient, StageClient};
use gp_core::config::loader::load_config;
use gp_core::config::models::AppConfig;
use gp_core::init::{init_project, InitOptions};
use gp_core::logging::init_logging;
use gp_core::record::JsonFileSink;
use gp_core::{PipelineError, RunManager, RunSettings};
use gp_protocol::config_models::LoggingConfig;
use gp_protocol::ipc::Op;
use gp_protocol::run_models::PipelineRun;
use gp_protocol::stage_models::{Language, StageKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

mod render;

#[derive(Parser)]
#[command(name = "gprompt")]
#[command(version, about = "Generate prompts through a four-stage pipeline")]
struct Cli {
    /// Project root containing `.gprompt/` (defaults to the current directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Use the built-in offline client instead of the configured service
    #[arg(long, global = true)]
    mock: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create `.gprompt/config.toml` and the records directory
    Init {
        /// Overwrite an existing config.toml
        #[arg(long)]
        force: bool,
    },
    /// Run all four stages for a description
    Auto {
        description: String,

        /// zh or en (defaults to the configured language)
        #[arg(short, long)]
        language: Option<Language>,

        /// Write the finished run as JSON
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Save the final prompt into `.gprompt/records/`
        #[arg(long)]
        save: bool,
    },
    /// Extract thinking points only and write the run for review
    Points {
        description: String,

        #[arg(short, long)]
        language: Option<Language>,

        #[arg(short, long)]
        out: PathBuf,
    },
    /// Run one stage of a saved run, using its current slot contents
    Step {
        /// Run JSON written by `points`, `auto --out` or an earlier `step`
        #[arg(long)]
        run: PathBuf,

        /// Stage id, 1 to 4
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=4))]
        stage: u8,

        /// Continue through the following stages
        #[arg(long)]
        cascade: bool,
    },
    /// Generate in one streaming call
    Stream {
        description: String,

        #[arg(short, long)]
        out: Option<PathBuf>,

        #[arg(long)]
        save: bool,
    },
    /// Save the final prompt of a run into `.gprompt/records/`
    Save {
        #[arg(long)]
        run: PathBuf,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir().wrap_err("Failed to resolve the current directory")?,
    };

    if let Commands::Init { force } = cli.command {
        init_logging(&LoggingConfig::default())?;
        let config_path = init_project(InitOptions { root, force }).await?;
        println!("Initialized {}", config_path.display());
        return Ok(());
    }

    let config = load_config(&root).await?;
    init_logging(&config.global.logging)?;

    let client: Arc<dyn StageClient> = if cli.mock {
        Arc::new(MockStageClient::success())
    } else {
        Arc::new(HttpStageClient::new(&config.global.endpoint)?)
    };
    let sink = Arc::new(JsonFileSink::new(config.records_dir()));

    let (events_tx, events_rx) = mpsc::channel(256);
    let printer = tokio::spawn(render::print_events(events_rx));
    let manager = RunManager::new(client, sink, events_tx);

    let result = execute(&manager, &config, cli.command).await;

    // Dropping the manager closes the channel so the printer can finish.
    drop(manager);
    printer.await?;
    result
}

async fn execute(manager: &RunManager, config: &AppConfig, command: Commands) -> color_eyre::Result<()> {
    match command {
        Commands::Init { .. } => Ok(()),
        Commands::Auto {
            description,
            language,
            out,
            save,
        } => {
            let run_id = manager.open(settings(config, description, language));
            let result = manager.submit(run_id, Op::RunAll).await;
            let run = finish(manager, run_id, out.as_deref(), result).await?;

            print_stage(&run, StageKind::FinalPrompt);
            if save {
                save_run(manager, run_id).await?;
            }
            Ok(())
        }
        Commands::Points {
            description,
            language,
            out,
        } => {
            let run_id = manager.open(settings(config, description, language));
            let result = manager.submit(run_id, Op::ExtractThinkingPoints).await;
            let run = finish(manager, run_id, Some(out.as_path()), result).await?;

            print_stage(&run, StageKind::ThinkingPoints);
            Ok(())
        }
        Commands::Step { run, stage, cascade } => {
            let stage = StageKind::from_id(stage).ok_or_else(|| eyre!("Unknown stage {stage}"))?;
            let run_id = manager.insert(read_run(&run).await?);

            let op = if cascade {
                Op::RunFrom { stage }
            } else {
                Op::RunStage { stage }
            };
            let result = manager.submit(run_id, op).await;
            let updated = finish(manager, run_id, Some(run.as_path()), result).await?;

            let shown = if cascade { StageKind::FinalPrompt } else { stage };
            print_stage(&updated, shown);
            Ok(())
        }
        Commands::Stream {
            description,
            out,
            save,
        } => {
            let run_id = manager.open(settings(config, description, None));
            let result = manager.submit(run_id, Op::GenerateStreaming).await;
            let run = finish(manager, run_id, out.as_deref(), result).await?;

            print_stage(&run, StageKind::FinalPrompt);
            if save {
                save_run(manager, run_id).await?;
            }
            Ok(())
        }
        Commands::Save { run } => {
            let run_id = manager.insert(read_run(&run).await?);
            save_run(manager, run_id).await
        }
    }
}

fn settings(config: &AppConfig, description: String, language: Option<Language>) -> RunSettings {
    let settings = RunSettings::from_defaults(description, &config.global.defaults);
    match language {
        Some(language) => settings.with_language(language),
        None => settings,
    }
}

/// Write the run out (when asked) whether or not the operation succeeded,
/// so completed stages survive a failure further down the pipeline.
async fn finish(
    manager: &RunManager,
    run_id: Uuid,
    out: Option<&Path>,
    result: Result<(), PipelineError>,
) -> color_eyre::Result<PipelineRun> {
    let run = manager
        .get_run(run_id)
        .ok_or_else(|| eyre!("Run {run_id} disappeared"))?;

    if let Some(path) = out {
        write_run(path, &run).await?;
    }

    result?;
    Ok(run)
}

async fn save_run(manager: &RunManager, run_id: Uuid) -> color_eyre::Result<()> {
    let location = manager.save(run_id).await?;
    println!("Saved to {location}");
    Ok(())
}

async fn read_run(path: &Path) -> color_eyre::Result<PipelineRun> {
    let content = tokio::fs::read_to_string(path)
        .await
        .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).wrap_err_with(|| format!("{} is not a run file", path.display()))
}

async fn write_run(path: &Path, run: &PipelineRun) -> color_eyre::Result<()> {
    let json = serde_json::to_string_pretty(run)?;
    tokio::fs::write(path, json)
        .await
        .wrap_err_with(|| format!("Failed to write {}", path.display()))
}

fn print_stage(run: &PipelineRun, stage: StageKind) {
    println!("{}", run.output(stage).to_plain_text());
}
