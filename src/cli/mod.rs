use crate::errors::AppResult;
use clap::{Parser, Subcommand};
use tracing_subscriber;

pub mod commands;

/// Chain Lens: a Bitcoin wire-format analysis engine.
#[derive(Parser)]
#[command(name = "chain-lens")]
#[command(about = "Bitcoin wire-format analysis engine")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a single transaction against caller-supplied prevouts
    AnalyzeTx(commands::analyze_tx::AnalyzeTxCommand),
    /// Analyze a block file / undo file / XOR key triple
    AnalyzeBlock(commands::analyze_block::AnalyzeBlockCommand),
    /// Start the HTTP transport
    Serve(commands::serve::ServeCommand),
}

pub async fn run() -> AppResult<()> {
    // Initialise tracing subscriber to capture info!() macros
    // Uses RUST_LOG environment variable (defaults to "error" if not set)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("error")),
        )
        .try_init();

    let cli = Cli::parse();

    match cli.command {
        Commands::AnalyzeTx(command) => command.run(),
        Commands::AnalyzeBlock(command) => command.run(),
        Commands::Serve(command) => command.run().await,
    }
}
