//! Lattice CLI
//!
//! Command-line interface for validating pipeline definitions and launching
//! runs on the execution engine.

mod commands;
mod config;
mod id_resolver;
mod types;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "lattice")]
#[command(about = "Lattice pipeline CLI", long_about = None)]
struct Cli {
    /// Execution engine URL
    #[arg(
        long,
        global = true,
        env = "LATTICE_ENGINE_URL",
        default_value = "http://localhost:8080"
    )]
    engine_url: String,

    /// Directory holding project descriptors (<dir>/<uses>/project.yaml)
    #[arg(long, global = true, env = "LATTICE_PROJECTS_DIR")]
    projects: Option<PathBuf>,

    /// Project registry URL, used when no projects directory is given
    #[arg(long, global = true, env = "LATTICE_REGISTRY_URL")]
    registry_url: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let config = Config {
        engine_url: cli.engine_url,
        projects_dir: cli.projects,
        registry_url: cli.registry_url,
    };
    config.validate()?;

    handle_command(cli.command, &config).await
}

/// Log to stderr so stdout stays machine readable
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "lattice_cli=debug,lattice_flow=debug,lattice_client=debug"
    } else {
        "lattice_cli=info,lattice_flow=info,lattice_client=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
