//! Rater Lab CLI
//!
//! Command-line interface for validating automated creativity coding against
//! manual rater coding and for extracting coded metrics summaries.

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod context;
mod output;

use cli::{Cli, Commands};
use context::Context;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rater_lab_core=info".parse()?)
                .add_directive("rater_lab_cli=info".parse()?)
                .add_directive("warn".parse()?),
        )
        .with_target(false)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Create context
    let ctx = Context::new(&cli)?;

    // Execute command
    match cli.command {
        Commands::Validate(cmd) => commands::validate::execute(&ctx, cmd).await,
        Commands::Extract(cmd) => commands::extract::execute(&ctx, cmd).await,
    }
}
