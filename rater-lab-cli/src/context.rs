//! Command execution context

use anyhow::Result;

use crate::cli::Cli;
use crate::output::OutputPrinter;

/// Shared state passed into every command.
pub struct Context {
    /// Status and progress output.
    pub output: OutputPrinter,

    /// Whether verbose output was requested.
    pub verbose: bool,
}

impl Context {
    /// Build the context from parsed arguments.
    pub fn new(cli: &Cli) -> Result<Self> {
        if cli.no_color {
            colored::control::set_override(false);
        }

        Ok(Self {
            output: OutputPrinter::new(cli.output, cli.verbose),
            verbose: cli.verbose,
        })
    }
}
