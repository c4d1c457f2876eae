//! Validation commands
//!
//! ```bash
//! # Full run with artifacts
//! rater-lab validate run --coded-dir data/coded --manual data/manual.csv --out results/
//!
//! # Statistics only, machine-readable
//! rater-lab validate stats --coded-dir data/coded --manual data/manual.csv --output json
//! ```

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use std::path::PathBuf;

use rater_lab_core::contracts::{
    AgreementSummary, AlignmentReport, AnalysisConfig, Dimension, DimensionAgreement,
    DiscrepancyFlag, OverallConclusion, RunWarning,
};
use rater_lab_core::pipeline::ValidationPipeline;

use crate::context::Context;
use crate::output::{print_field, print_section, OutputFormat};

/// Validation commands
#[derive(Debug, Args)]
pub struct ValidateCommands {
    #[command(subcommand)]
    pub command: ValidateSubcommand,
}

/// Input and configuration arguments shared by the validate subcommands.
#[derive(Debug, Args)]
pub struct InputArgs {
    /// Directory containing *_coded.json files
    #[arg(long, value_name = "DIR")]
    pub coded_dir: PathBuf,

    /// Manual coding CSV file
    #[arg(long, value_name = "FILE")]
    pub manual: PathBuf,

    /// Discrepancy threshold (|manual - automated| >= threshold is flagged)
    #[arg(long, default_value_t = 2.0)]
    pub threshold: f64,

    /// Also score elaboration density
    #[arg(long)]
    pub include_elab_density: bool,

    /// Keep subject ids as-is instead of truncating at the first underscore
    #[arg(long)]
    pub no_normalize_ids: bool,

    /// Decimal places for reported statistics
    #[arg(long, default_value_t = 3)]
    pub precision: u32,
}

impl InputArgs {
    fn config(&self) -> AnalysisConfig {
        let mut config = AnalysisConfig::default();
        config.discrepancy_threshold = self.threshold;
        config.precision = self.precision;
        if self.include_elab_density {
            config.dimensions = Dimension::all();
        }
        if self.no_normalize_ids {
            config.id_delimiter = None;
        }
        config
    }
}

#[derive(Debug, Subcommand)]
pub enum ValidateSubcommand {
    /// Run the full pipeline and write artifacts
    Run {
        #[command(flatten)]
        inputs: InputArgs,

        /// Output directory for run artifacts
        #[arg(long, value_name = "DIR", default_value = "validation_results")]
        out: PathBuf,
    },

    /// Compute and print statistics without writing artifacts
    Stats {
        #[command(flatten)]
        inputs: InputArgs,
    },
}

/// Execute validate commands
pub async fn execute(ctx: &Context, cmd: ValidateCommands) -> Result<()> {
    match cmd.command {
        ValidateSubcommand::Run { inputs, out } => run(ctx, inputs, out).await,
        ValidateSubcommand::Stats { inputs } => stats(ctx, inputs).await,
    }
}

async fn run(ctx: &Context, inputs: InputArgs, out: PathBuf) -> Result<()> {
    let pipeline = ValidationPipeline::new(inputs.config())
        .context("Invalid analysis configuration")?;

    let spinner = ctx.output.spinner("Running validation pipeline...");
    let outcome = pipeline
        .run(&inputs.coded_dir, &inputs.manual, &out)
        .await
        .context("Validation run failed")?;
    if let Some(s) = spinner {
        s.finish_and_clear();
    }

    for warning in &outcome.run_summary.warnings {
        ctx.output.warn(&warning.to_string());
    }
    ctx.output.success(&format!(
        "Validated {} subjects, {} discrepancy flag(s)",
        outcome.run_summary.subjects_aligned,
        outcome.run_summary.discrepancy_count
    ));
    for artifact in &outcome.artifacts {
        ctx.output.info(&format!("wrote {}", artifact.display()));
    }

    render(
        ctx,
        &outcome.alignment,
        &outcome.agreement,
        &outcome.flags,
        outcome.run_summary.average_correlation,
        outcome.run_summary.average_mae,
        outcome.run_summary.conclusion,
        &outcome.run_summary.warnings,
    )
}

async fn stats(ctx: &Context, inputs: InputArgs) -> Result<()> {
    let pipeline = ValidationPipeline::new(inputs.config())
        .context("Invalid analysis configuration")?;

    let spinner = ctx.output.spinner("Computing statistics...");
    let stats = pipeline
        .quick_stats(&inputs.coded_dir, &inputs.manual)
        .await
        .context("Statistics computation failed")?;
    if let Some(s) = spinner {
        s.finish_and_clear();
    }

    for warning in &stats.warnings {
        ctx.output.warn(&warning.to_string());
    }

    render(
        ctx,
        &stats.alignment,
        &stats.agreement,
        &[],
        stats.average_correlation,
        stats.average_mae,
        stats.conclusion,
        &stats.warnings,
    )
}

#[allow(clippy::too_many_arguments)]
fn render(
    ctx: &Context,
    alignment: &AlignmentReport,
    agreement: &AgreementSummary,
    flags: &[DiscrepancyFlag],
    average_correlation: Option<f64>,
    average_mae: Option<f64>,
    conclusion: OverallConclusion,
    warnings: &[RunWarning],
) -> Result<()> {
    match ctx.output.format() {
        OutputFormat::Table => {
            render_table(alignment, agreement, flags, average_correlation, average_mae, conclusion)
        }
        OutputFormat::Json => {
            let value = machine_view(
                alignment, agreement, flags, average_correlation, average_mae, conclusion, warnings,
            );
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        OutputFormat::Yaml => {
            let value = machine_view(
                alignment, agreement, flags, average_correlation, average_mae, conclusion, warnings,
            );
            println!("{}", serde_yaml::to_string(&value)?);
            Ok(())
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn machine_view(
    alignment: &AlignmentReport,
    agreement: &AgreementSummary,
    flags: &[DiscrepancyFlag],
    average_correlation: Option<f64>,
    average_mae: Option<f64>,
    conclusion: OverallConclusion,
    warnings: &[RunWarning],
) -> serde_json::Value {
    serde_json::json!({
        "alignment": alignment,
        "agreement": agreement,
        "discrepancies": flags,
        "average_correlation": average_correlation,
        "average_mae": average_mae,
        "conclusion": conclusion,
        "warnings": warnings,
    })
}

fn fmt_opt(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.3}"),
        None => "n/a".to_string(),
    }
}

fn render_table(
    alignment: &AlignmentReport,
    agreement: &AgreementSummary,
    flags: &[DiscrepancyFlag],
    average_correlation: Option<f64>,
    average_mae: Option<f64>,
    conclusion: OverallConclusion,
) -> Result<()> {
    print_section("Alignment");
    print_field("Aligned subjects", &alignment.aligned_count.to_string());
    if !alignment.manual_only.is_empty() {
        let ids: Vec<_> = alignment.manual_only.iter().cloned().collect();
        print_field("Manual only", &ids.join(", "));
    }
    if !alignment.automated_only.is_empty() {
        let ids: Vec<_> = alignment.automated_only.iter().cloned().collect();
        print_field("Automated only", &ids.join(", "));
    }

    print_section("Agreement");
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        "Dimension", "n", "r", "p", "Tier", "MAE", "Mean diff", "SD diff", "ICC(2,1)",
    ]);
    for (dimension, entry) in agreement {
        match entry {
            DimensionAgreement::NoValidData => {
                table.add_row(vec![
                    Cell::new(dimension.to_string()),
                    Cell::new("0"),
                    Cell::new("no valid data"),
                    Cell::new("-"),
                    Cell::new("-"),
                    Cell::new("-"),
                    Cell::new("-"),
                    Cell::new("-"),
                    Cell::new("-"),
                ]);
            }
            DimensionAgreement::Computed(result) => {
                let tier = result
                    .correlation_tier()
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "-".to_string());
                table.add_row(vec![
                    Cell::new(dimension.to_string()),
                    Cell::new(result.n.to_string()),
                    Cell::new(fmt_opt(result.correlation)),
                    Cell::new(fmt_opt(result.p_value)),
                    Cell::new(tier),
                    Cell::new(format!("{:.3}", result.mae)),
                    Cell::new(format!("{:.3}", result.mean_difference)),
                    Cell::new(fmt_opt(result.std_difference)),
                    Cell::new(fmt_opt(result.icc)),
                ]);
            }
        }
    }
    println!("{table}");

    if !flags.is_empty() {
        print_section("Discrepancies");
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["Subject", "Dimension", "Manual", "Automated", "Diff"]);
        for flag in flags {
            table.add_row(vec![
                Cell::new(&flag.subject_id),
                Cell::new(flag.dimension.to_string()),
                Cell::new(flag.manual_value.to_string()),
                Cell::new(flag.automated_value.to_string()),
                Cell::new(flag.difference.to_string()),
            ]);
        }
        println!("{table}");
    }

    print_section("Conclusion");
    print_field("Average r", &fmt_opt(average_correlation));
    print_field("Average MAE", &fmt_opt(average_mae));
    print_field("Verdict", conclusion.conclusion_text());
    print_field("Recommendation", conclusion.recommendation_text());

    Ok(())
}
