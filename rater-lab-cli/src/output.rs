//! Terminal output helpers

use clap::ValueEnum;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::time::Duration;

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable tables
    Table,
    /// Pretty-printed JSON
    Json,
    /// YAML
    Yaml,
}

/// Printer for status lines and progress, honoring format and color flags.
#[derive(Debug, Clone)]
pub struct OutputPrinter {
    format: OutputFormat,
    verbose: bool,
}

impl OutputPrinter {
    /// Create a printer.
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self { format, verbose }
    }

    /// The selected output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Print a success status line to stderr.
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green().bold(), message);
    }

    /// Print a warning status line to stderr.
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "!".yellow().bold(), message);
    }

    /// Print an informational line to stderr when verbose is enabled.
    pub fn info(&self, message: &str) {
        if self.verbose {
            eprintln!("{} {}", "-".dimmed(), message);
        }
    }

    /// Start a spinner, if the terminal supports one and the output format
    /// is human-readable.
    pub fn spinner(&self, message: &str) -> Option<ProgressBar> {
        if self.format != OutputFormat::Table || !std::io::stderr().is_terminal() {
            return None;
        }
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));
        Some(bar)
    }
}

/// Print a section heading.
pub fn print_section(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "-".repeat(title.len()));
}

/// Print a labeled field.
pub fn print_field(label: &str, value: &str) {
    println!("  {}: {}", label.dimmed(), value);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_suppressed_for_machine_formats() {
        let printer = OutputPrinter::new(OutputFormat::Json, false);
        assert!(printer.spinner("working").is_none());
    }
}
