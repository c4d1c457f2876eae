//! CLI argument parsing

use clap::{Parser, Subcommand};

use crate::commands::{extract::ExtractCommand, validate::ValidateCommands};
use crate::output::OutputFormat;

/// Rater Lab CLI
///
/// A command-line tool for validating automated creativity coding against
/// manual rater coding.
#[derive(Parser, Debug)]
#[command(name = "rater-lab")]
#[command(author = "Rater Lab Team")]
#[command(version)]
#[command(about = "Rater-agreement analysis for creativity coding", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (table, json, yaml)
    #[arg(short, long, global = true, default_value = "table", env = "RATER_LAB_OUTPUT")]
    pub output: OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate automated coding against manual coding
    #[command(alias = "val")]
    Validate(ValidateCommands),

    /// Flatten coded JSON files into a metrics summary
    #[command(alias = "ext")]
    Extract(ExtractCommand),
}
