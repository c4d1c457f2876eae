//! Rater-Lab Core
//!
//! Library for validating automated creativity coding against manual rater
//! coding. It loads the two sources, inner-joins them on subject id, computes
//! per-dimension agreement statistics and renders the run artifacts.
//!
//! # Pipeline
//!
//! Loader -> Aligner -> Agreement Engine -> Discrepancy Detector -> Reporter.
//! The pipeline is strictly batch: no cycles, no shared mutable state, and
//! every stage is deterministic for the same input.
//!
//! # Guarantees
//!
//! - Missing scores stay missing; they are never conflated with zero.
//! - Duplicate subject ids within a source are rejected, never overwritten.
//! - Subjects present in only one source are reported in both directions.
//! - Unavailable statistics are explicit (`None`), never `NaN`.
//! - Recoverable problems accumulate as warnings; only missing inputs abort.
//!
//! # Usage
//!
//! ## Programmatic
//!
//! ```rust,ignore
//! use rater_lab_core::contracts::AnalysisConfig;
//! use rater_lab_core::pipeline::ValidationPipeline;
//!
//! let pipeline = ValidationPipeline::new(AnalysisConfig::default())?;
//! let outcome = pipeline.run(coded_dir, manual_csv, out_dir).await?;
//! println!("{}", outcome.report_text);
//! ```
//!
//! ## CLI
//!
//! ```bash
//! # Full run with artifacts
//! rater-lab validate run --coded-dir data/coded --manual data/manual.csv --out results/
//!
//! # Statistics only
//! rater-lab validate stats --coded-dir data/coded --manual data/manual.csv
//!
//! # Flatten coded files into a metrics summary
//! rater-lab extract --coded-dir data/coded --out data/summaries
//! ```
//!
//! # Modules
//!
//! - [`contracts`]: Data model shared by every stage
//! - [`analysis`]: Loader, aligner, agreement engine, discrepancy detector
//! - [`report`]: Merged CSV, text report and plot-data rendering
//! - [`extract`]: Coded-file metrics extraction
//! - [`pipeline`]: Run orchestration
//! - [`telemetry`]: Per-stage telemetry events

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod analysis;
pub mod contracts;
pub mod extract;
pub mod pipeline;
pub mod report;
pub mod telemetry;

// Re-export commonly used types
pub use analysis::{
    AgreementEngine, AlignmentOutcome, Analyzer, DiscrepancyDetector, RecordLoader,
    SubjectAligner,
};
pub use contracts::{
    AgreementResult, AgreementSummary, AlignedTable, AlignmentReport, AnalysisConfig,
    DimensionAgreement, Dimension, DiscrepancyFlag, OverallConclusion, RunSummary, RunWarning,
    SubjectRecord, SubjectTable,
};
pub use extract::{collect_metrics, ExtractionSummary, MetricsRow};
pub use pipeline::{PipelineError, QuickStats, ValidationOutcome, ValidationPipeline};
pub use telemetry::{StageEvent, StageTelemetry};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
