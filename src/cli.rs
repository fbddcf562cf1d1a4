//! Command-line interface for avalon-arena.
//!
//! One command: run a full game from a YAML config (or quick-start flags)
//! and write the event log and transcripts for downstream narration tooling.

use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use crate::config::GameConfig;
use crate::orchestrator::GameOrchestrator;

/// LLM-vs-LLM games of The Resistance: Avalon.
#[derive(Parser)]
#[command(name = "avalon-arena")]
#[command(about = "Run games of Avalon between language-model players")]
#[command(version)]
#[command(
    long_about = "avalon-arena orchestrates full games of The Resistance: Avalon where every \
seat is played by a language model, then writes a replayable JSON event log and per-seat \
transcripts.\n\nExample usage:\n  avalon-arena run --players 5 --model mock --seed 42\n  \
avalon-arena run --config game.yaml --output ./games"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Run one full game and write its artifacts.
    Run(RunArgs),
}

/// Arguments for `avalon-arena run`.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// YAML config file mapping seats to models. Overrides the quick-start
    /// flags below.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of players when no config file is given (5-10).
    #[arg(short = 'n', long, default_value = "5")]
    pub players: usize,

    /// Model id for every seat when no config file is given. `mock` runs
    /// fully offline.
    #[arg(short, long, default_value = "mock", env = "AVALON_MODEL")]
    pub model: String,

    /// Seed for reproducible role shuffles. Overrides the config file.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output directory for the event log and transcripts.
    #[arg(short, long, default_value = "./games")]
    pub output: PathBuf,
}

/// Parse CLI arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Parse arguments and run the selected command.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Run the selected command with pre-parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Run(args) => run_game(args).await,
    }
}

async fn run_game(args: RunArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => GameConfig::from_yaml_file(path)?,
        None => GameConfig::uniform(&args.model, args.players),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config.validate()?;
    let output = config.output_dir.clone().unwrap_or(args.output);

    let mut orchestrator = GameOrchestrator::from_config(config)?;
    info!(game_id = orchestrator.game_id(), "starting game");

    let outcome = orchestrator.run().await?;
    orchestrator.write_artifacts(&output).await?;

    let report = orchestrator.cost_report();
    println!("Game {} finished: {}", orchestrator.game_id(), outcome.summary());
    if let Some(mvp) = outcome.mvp {
        println!("MVP: Player {} ({} votes)", mvp.mvp, mvp.votes);
    }
    println!("Artifacts written to {}", output.display());
    println!("Total LLM spend: ${:.4}", report.total);
    for (seat, dollars) in report.by_seat {
        println!("  seat {seat}: ${dollars:.4}");
    }

    Ok(())
}
