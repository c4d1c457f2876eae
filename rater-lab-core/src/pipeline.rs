//! Validation Pipeline
//!
//! Orchestrates the full run: load both rater sources, align them, compute
//! agreement statistics, flag discrepancies and write the run artifacts.
//! Stages communicate only through contract types and each stage emits one
//! telemetry event.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::analysis::{
    AgreementEngine, AgreementError, AgreementOutcome, AgreementRequest, AlignerError,
    Analyzer, DiscrepancyDetector, DiscrepancyError, DiscrepancyRequest, LoaderError,
    RecordLoader, SubjectAligner,
};
use crate::contracts::{
    aligned_table_digest, AgreementSummary, AlignedTable, AlignmentReport, AnalysisConfig,
    DiscrepancyFlag, OverallConclusion, RunSummary, RunWarning,
};
use crate::report::{
    render_validation_report, write_merged_csv, write_plot_files, MergedTableError, PlotError,
    ReportContext,
};
use crate::telemetry::StageTelemetry;

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The configuration failed validation.
    #[error("invalid analysis configuration: {0}")]
    InvalidConfig(#[from] validator::ValidationErrors),

    /// A rater source could not be loaded.
    #[error(transparent)]
    Loader(#[from] LoaderError),

    /// Alignment failed.
    #[error(transparent)]
    Aligner(#[from] AlignerError),

    /// Agreement computation failed.
    #[error(transparent)]
    Agreement(#[from] AgreementError),

    /// Discrepancy detection failed.
    #[error(transparent)]
    Discrepancy(#[from] DiscrepancyError),

    /// The merged table could not be written.
    #[error(transparent)]
    MergedTable(#[from] MergedTableError),

    /// Plot data could not be written.
    #[error(transparent)]
    Plots(#[from] PlotError),

    /// An artifact could not be written.
    #[error("cannot write artifact {path}: {source}")]
    Artifact {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The run summary failed to serialize.
    #[error("cannot serialize run summary: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Statistics-only output, no artifacts written.
#[derive(Debug, Clone)]
pub struct QuickStats {
    /// Alignment counts and set differences.
    pub alignment: AlignmentReport,
    /// Per-dimension agreement statistics.
    pub agreement: AgreementSummary,
    /// Average correlation across dimensions that yielded one.
    pub average_correlation: Option<f64>,
    /// Average MAE across dimensions with valid pairs.
    pub average_mae: Option<f64>,
    /// Overall verdict.
    pub conclusion: OverallConclusion,
    /// Accumulated warnings.
    pub warnings: Vec<RunWarning>,
}

/// Full-run output.
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    /// The machine-readable run record, also written to disk.
    pub run_summary: RunSummary,
    /// Alignment counts and set differences.
    pub alignment: AlignmentReport,
    /// Per-dimension agreement statistics.
    pub agreement: AgreementSummary,
    /// Discrepancy flags, in subject order.
    pub flags: Vec<DiscrepancyFlag>,
    /// The rendered text report.
    pub report_text: String,
    /// Every artifact written, in write order.
    pub artifacts: Vec<PathBuf>,
}

struct AnalysisState {
    table: AlignedTable,
    alignment: AlignmentReport,
    agreement: AgreementOutcome,
    warnings: Vec<RunWarning>,
}

/// Runs the validation pipeline for one configuration.
#[derive(Debug, Clone)]
pub struct ValidationPipeline {
    config: AnalysisConfig,
}

impl ValidationPipeline {
    /// Create a pipeline, validating the configuration first.
    pub fn new(config: AnalysisConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration this pipeline runs with.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Load, align and compute agreement. Shared by both entry points.
    async fn analyze(
        &self,
        coded_dir: &Path,
        manual_csv: &Path,
        telemetry: &StageTelemetry,
    ) -> Result<AnalysisState, PipelineError> {
        let loader = RecordLoader::new(self.config.clone());
        let mut warnings = Vec::new();

        let started = Instant::now();
        let automated = loader.load_automated(coded_dir)?;
        let manual = loader.load_manual(manual_csv)?;
        warnings.extend(automated.warnings);
        warnings.extend(manual.warnings);
        telemetry.stage_completed(
            "loader",
            started,
            serde_json::json!({
                "automated_subjects": automated.table.len(),
                "manual_subjects": manual.table.len(),
            }),
        );

        let started = Instant::now();
        let aligned = SubjectAligner.align(&manual.table, &automated.table)?;
        warnings.extend(aligned.warnings);
        telemetry.stage_completed(
            "aligner",
            started,
            serde_json::json!({ "aligned": aligned.report.aligned_count }),
        );

        let started = Instant::now();
        let engine = AgreementEngine;
        let agreement = engine
            .invoke(AgreementRequest {
                table: aligned.table.clone(),
                dimensions: self.config.dimensions.clone(),
            })
            .await?;
        warnings.extend(agreement.warnings.clone());
        telemetry.stage_completed(
            engine.name(),
            started,
            serde_json::json!({ "dimensions": agreement.summary.len() }),
        );

        Ok(AnalysisState {
            table: aligned.table,
            alignment: aligned.report,
            agreement,
            warnings,
        })
    }

    /// Run load, align and agreement without writing any artifacts.
    #[instrument(skip(self), fields(coded_dir = %coded_dir.display(), manual_csv = %manual_csv.display()))]
    pub async fn quick_stats(
        &self,
        coded_dir: &Path,
        manual_csv: &Path,
    ) -> Result<QuickStats, PipelineError> {
        let telemetry = StageTelemetry::new(Uuid::new_v4());
        let state = self.analyze(coded_dir, manual_csv, &telemetry).await?;

        let average_correlation = state.agreement.average_correlation();
        let average_mae = state.agreement.average_mae();
        let conclusion = OverallConclusion::from_averages(average_correlation, average_mae);

        Ok(QuickStats {
            alignment: state.alignment,
            agreement: state.agreement.summary,
            average_correlation,
            average_mae,
            conclusion,
            warnings: state.warnings,
        })
    }

    /// Run the full pipeline and write all artifacts under `out_dir`.
    #[instrument(skip(self), fields(coded_dir = %coded_dir.display(), manual_csv = %manual_csv.display(), out_dir = %out_dir.display()))]
    pub async fn run(
        &self,
        coded_dir: &Path,
        manual_csv: &Path,
        out_dir: &Path,
    ) -> Result<ValidationOutcome, PipelineError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let run_started = Instant::now();
        let telemetry = StageTelemetry::new(run_id);

        let mut state = self.analyze(coded_dir, manual_csv, &telemetry).await?;

        let started = Instant::now();
        let detector = DiscrepancyDetector;
        let flags = detector
            .invoke(DiscrepancyRequest {
                table: state.table.clone(),
                dimensions: self.config.dimensions.clone(),
                threshold: self.config.discrepancy_threshold,
            })
            .await?;
        telemetry.stage_completed(
            detector.name(),
            started,
            serde_json::json!({ "flags": flags.len() }),
        );

        let average_correlation = state.agreement.average_correlation();
        let average_mae = state.agreement.average_mae();
        let conclusion = OverallConclusion::from_averages(average_correlation, average_mae);

        fs::create_dir_all(out_dir).map_err(|source| PipelineError::Artifact {
            path: out_dir.to_path_buf(),
            source,
        })?;
        let mut artifacts = Vec::new();

        let merged_path = out_dir.join("merged_comparison.csv");
        write_merged_csv(&state.table, &merged_path)?;
        artifacts.push(merged_path);

        let results: Vec<_> = state
            .agreement
            .summary
            .values()
            .filter_map(|d| d.result())
            .collect();
        artifacts.extend(write_plot_files(&state.table, &results, out_dir)?);

        let report_text = render_validation_report(&ReportContext {
            alignment: &state.alignment,
            summary: &state.agreement.summary,
            flags: &flags,
            conclusion,
            discrepancy_threshold: self.config.discrepancy_threshold,
            warnings: &state.warnings,
            precision: self.config.precision,
        });
        let report_path = out_dir.join("validation_report.txt");
        fs::write(&report_path, &report_text).map_err(|source| PipelineError::Artifact {
            path: report_path.clone(),
            source,
        })?;
        artifacts.push(report_path);

        let run_summary = RunSummary {
            run_id,
            started_at,
            finished_at: Utc::now(),
            inputs_hash: aligned_table_digest(&state.table)?,
            subjects_aligned: state.alignment.aligned_count,
            manual_only_count: state.alignment.manual_only.len(),
            automated_only_count: state.alignment.automated_only.len(),
            average_correlation,
            average_mae,
            discrepancy_count: flags.len(),
            conclusion,
            warnings: std::mem::take(&mut state.warnings),
        };

        let summary_path = out_dir.join("run_summary.json");
        let summary_json = serde_json::to_string_pretty(&run_summary)?;
        fs::write(&summary_path, summary_json).map_err(|source| PipelineError::Artifact {
            path: summary_path.clone(),
            source,
        })?;
        artifacts.push(summary_path);

        telemetry.run_completed(
            run_started,
            serde_json::json!({
                "aligned": run_summary.subjects_aligned,
                "flags": run_summary.discrepancy_count,
                "conclusion": run_summary.conclusion,
            }),
        );
        info!(
            run_id = %run_id,
            aligned = run_summary.subjects_aligned,
            flags = run_summary.discrepancy_count,
            "validation run complete"
        );

        Ok(ValidationOutcome {
            run_summary,
            alignment: state.alignment,
            agreement: state.agreement.summary,
            flags,
            report_text,
            artifacts,
        })
    }
}
