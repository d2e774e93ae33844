//! Run command handlers
//!
//! Lists runs and shows run details from the execution engine.

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use lattice_client::{EngineClient, Run, RunStatus};

use crate::config::Config;
use crate::id_resolver::resolve_run_id;
use crate::types::IdOrPrefix;

/// Run subcommands
#[derive(Subcommand)]
pub enum RunCommands {
    /// List all runs
    List,
    /// Get run details
    Get {
        /// Run ID or unambiguous prefix
        id: String,
    },
}

pub async fn handle_run_command(command: RunCommands, config: &Config) -> Result<()> {
    let client = config.engine_client();

    match command {
        RunCommands::List => list_runs(&client).await,
        RunCommands::Get { id } => get_run(&client, &id).await,
    }
}

async fn list_runs(client: &EngineClient) -> Result<()> {
    let runs = client.list_runs().await?;

    if runs.is_empty() {
        println!("{}", "No runs found.".yellow());
    } else {
        println!("{}", format!("Found {} run(s):", runs.len()).bold());
        println!();
        for run in runs {
            print_run_summary(&run);
        }
    }

    Ok(())
}

async fn get_run(client: &EngineClient, id: &str) -> Result<()> {
    let id_or_prefix = IdOrPrefix::parse(id);
    let uuid = resolve_run_id(client, &id_or_prefix).await?;

    let run = client.get_run(uuid).await?;
    print_run_details(&run);

    Ok(())
}

fn print_run_summary(run: &Run) {
    println!(
        "  {} {} {}",
        run.id.to_string()[..8].cyan(),
        colored_status(run.status),
        run.pipeline.bold()
    );
}

pub(crate) fn print_run_details(run: &Run) {
    println!("{}", format!("Run {}", run.id).bold());
    println!("  Pipeline:  {}", run.pipeline);
    println!("  Status:    {}", colored_status(run.status));
    println!("  Created:   {}", run.created_at.to_rfc3339().dimmed());
    if let Some(completed) = run.completed_at {
        println!("  Completed: {}", completed.to_rfc3339().dimmed());
    }
    if let Some(dir) = &run.results_dir {
        println!("  Results:   {}", dir);
    }
}

fn colored_status(status: RunStatus) -> ColoredString {
    let text = status.to_string();
    match status {
        RunStatus::Queued => text.yellow(),
        RunStatus::Running => text.blue(),
        RunStatus::Succeeded => text.green(),
        RunStatus::Failed => text.red(),
        RunStatus::Cancelled => text.dimmed(),
    }
}
