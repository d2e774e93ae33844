//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod pipeline;
mod run;
mod types;

pub use pipeline::PipelineCommands;
pub use run::RunCommands;
pub use types::TypeCommands;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Validate, inspect and run pipeline definitions
    Pipeline {
        #[command(subcommand)]
        command: PipelineCommands,
    },
    /// Inspect type descriptors
    Type {
        #[command(subcommand)]
        command: TypeCommands,
    },
    /// Query runs on the execution engine
    Run {
        #[command(subcommand)]
        command: RunCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Pipeline { command } => pipeline::handle_pipeline_command(command, config).await,
        Commands::Type { command } => types::handle_type_command(command),
        Commands::Run { command } => run::handle_run_command(command, config).await,
    }
}
