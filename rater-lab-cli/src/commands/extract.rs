//! Metrics extraction command
//!
//! ```bash
//! rater-lab extract --coded-dir data/coded --out data/summaries
//! ```

use anyhow::{Context as _, Result};
use clap::Args;
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use std::fs;
use std::path::PathBuf;

use rater_lab_core::extract::{collect_metrics, write_csv_summary, write_json_summary};

use crate::context::Context;
use crate::output::{print_section, OutputFormat};

/// Flatten coded JSON files into a metrics summary
#[derive(Debug, Args)]
pub struct ExtractCommand {
    /// Directory containing *_coded.json files
    #[arg(long, value_name = "DIR")]
    pub coded_dir: PathBuf,

    /// Directory the summary files are written into
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub out: PathBuf,
}

/// Execute the extract command
pub async fn execute(ctx: &Context, cmd: ExtractCommand) -> Result<()> {
    let spinner = ctx.output.spinner("Extracting creativity metrics...");
    let summary = collect_metrics(&cmd.coded_dir).context("Metrics extraction failed")?;
    if let Some(s) = spinner {
        s.finish_and_clear();
    }

    for warning in &summary.warnings {
        ctx.output.warn(&warning.to_string());
    }

    fs::create_dir_all(&cmd.out)
        .with_context(|| format!("Failed to create {}", cmd.out.display()))?;
    let json_path = cmd.out.join("creativity_metrics_summary.json");
    let csv_path = cmd.out.join("creativity_metrics_summary.csv");
    write_json_summary(&summary.rows, &json_path)
        .with_context(|| format!("Failed to write {}", json_path.display()))?;
    write_csv_summary(&summary.rows, &csv_path)
        .with_context(|| format!("Failed to write {}", csv_path.display()))?;

    ctx.output.success(&format!(
        "Extracted {} file(s), skipped {}",
        summary.rows.len(),
        summary.warnings.len()
    ));
    ctx.output.info(&format!("wrote {}", json_path.display()));
    ctx.output.info(&format!("wrote {}", csv_path.display()));

    match ctx.output.format() {
        OutputFormat::Table => {
            print_section("Extracted Metrics");
            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec![
                "Transcript", "Fluency", "Flexibility", "Elaboration", "Density", "New elabs",
            ]);
            for row in &summary.rows {
                table.add_row(vec![
                    Cell::new(&row.transcript_id),
                    Cell::new(fmt_opt(row.fluency)),
                    Cell::new(fmt_opt(row.flexibility)),
                    Cell::new(fmt_opt(row.elaboration_total)),
                    Cell::new(fmt_opt(row.elaboration_density)),
                    Cell::new(row.new_elaborations_count.to_string()),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&summary.rows)?);
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(&summary.rows)?);
        }
    }

    Ok(())
}

fn fmt_opt(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v}"),
        None => "-".to_string(),
    }
}
