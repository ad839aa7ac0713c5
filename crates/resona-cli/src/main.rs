//! Resona CLI - loudspeaker measurement sessions and response analysis.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "resona")]
#[command(author, version, about = "Resona measurement CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Post-process a measured response (calibrate, smooth, normalize)
    Analyze(commands::analyze::AnalyzeArgs),

    /// Create, inspect and validate capture configurations
    Config(commands::config::ConfigArgs),

    /// Capture every channel of a setup and archive the results
    Session(commands::session::SessionArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze(args) => commands::analyze::run(args),
        Commands::Config(args) => commands::config::run(args),
        Commands::Session(args) => commands::session::run(args),
    }
}
