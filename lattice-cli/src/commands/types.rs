//! Type descriptor command handlers

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use lattice_core::domain::types::{BASE_TYPES, TypeDescriptor, is_primitive};

/// Type subcommands
#[derive(Subcommand)]
pub enum TypeCommands {
    /// Parse a type string and show its structure
    Inspect {
        /// Type text, e.g. "List[Map[String, File]]?"
        text: String,
    },
    /// List the base type vocabulary
    List,
}

pub fn handle_type_command(command: TypeCommands) -> Result<()> {
    match command {
        TypeCommands::Inspect { text } => {
            inspect_type(&text);
            Ok(())
        }
        TypeCommands::List => {
            list_types();
            Ok(())
        }
    }
}

fn inspect_type(text: &str) {
    let ty = TypeDescriptor::parse(text);

    println!("{}", ty.to_string().bold());
    println!("  Base:      {}", ty.base().cyan());
    println!("  List:      {}", yes_no(ty.is_list()));
    println!("  Map:       {}", yes_no(ty.is_map()));
    println!("  Optional:  {}", yes_no(ty.is_optional()));

    if let Some(choices) = ty.enum_choices() {
        println!("  Choices:   {}", choices.join(", "));
    }

    if !is_primitive(ty.base()) {
        println!(
            "{}",
            "⚠ Nested or malformed type: compatibility checks are skipped".yellow()
        );
    }
}

fn list_types() {
    println!("{}", "Base types:".bold());
    for base in BASE_TYPES {
        println!("  - {}", base.cyan());
    }
    println!();
    println!(
        "{}",
        "Wrap as List[T], Map[String, T], and append ? for optional.".dimmed()
    );
}

fn yes_no(value: bool) -> ColoredString {
    if value { "yes".green() } else { "no".dimmed() }
}
