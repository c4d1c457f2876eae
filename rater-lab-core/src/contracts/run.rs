//! Run Contracts
//!
//! The analysis configuration and the per-run summary record. Every pipeline
//! run emits exactly one [`RunSummary`], carrying a SHA-256 hash of the
//! aligned table so that re-runs over the same inputs can be verified as
//! deterministic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;
use validator::Validate;

use super::aligned::AlignedTable;
use super::common::{Dimension, RunWarning};

/// Default glob suffix for automated coding files.
pub const DEFAULT_CODED_SUFFIX: &str = "_coded.json";

/// Default discrepancy threshold: |manual - automated| >= 2 is flagged.
pub const DEFAULT_DISCREPANCY_THRESHOLD: f64 = 2.0;

/// Configuration for one validation run.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AnalysisConfig {
    /// Dimensions to score. Defaults to [`Dimension::core`].
    #[validate(length(min = 1, message = "at least one scored dimension is required"))]
    pub dimensions: Vec<Dimension>,

    /// Absolute-difference threshold for discrepancy flagging.
    #[validate(range(min = 0.0, message = "threshold must be non-negative"))]
    pub discrepancy_threshold: f64,

    /// Delimiter used to normalize subject ids (everything after the first
    /// occurrence is stripped). `None` disables normalization.
    pub id_delimiter: Option<char>,

    /// Filename suffix identifying automated coding files.
    pub coded_suffix: String,

    /// Decimal places used for reported statistics.
    pub precision: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            dimensions: Dimension::core(),
            discrepancy_threshold: DEFAULT_DISCREPANCY_THRESHOLD,
            id_delimiter: Some('_'),
            coded_suffix: DEFAULT_CODED_SUFFIX.to_string(),
            precision: 3,
        }
    }
}

impl AnalysisConfig {
    /// A config identical to this one but with a different threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.discrepancy_threshold = threshold;
        self
    }
}

/// Overall verdict on whether the automated coder can replace manual coding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OverallConclusion {
    /// avg r >= 0.85 and avg MAE < 1.5.
    Excellent,
    /// avg r >= 0.70 and avg MAE < 2.5.
    Moderate,
    /// Anything weaker.
    Poor,
}

impl OverallConclusion {
    /// Derive the conclusion from averaged statistics.
    ///
    /// `avg_correlation` is `None` when no dimension yielded a correlation;
    /// that degrades straight to [`OverallConclusion::Poor`].
    pub fn from_averages(avg_correlation: Option<f64>, avg_mae: Option<f64>) -> Self {
        match (avg_correlation, avg_mae) {
            (Some(r), Some(mae)) if r >= 0.85 && mae < 1.5 => OverallConclusion::Excellent,
            (Some(r), Some(mae)) if r >= 0.70 && mae < 2.5 => OverallConclusion::Moderate,
            _ => OverallConclusion::Poor,
        }
    }

    /// One-line conclusion text.
    pub fn conclusion_text(&self) -> &'static str {
        match self {
            OverallConclusion::Excellent => {
                "Excellent agreement between manual and automated coding."
            }
            OverallConclusion::Moderate => {
                "Good to moderate agreement between manual and automated coding."
            }
            OverallConclusion::Poor => {
                "Poor agreement between manual and automated coding."
            }
        }
    }

    /// One-line recommendation text.
    pub fn recommendation_text(&self) -> &'static str {
        match self {
            OverallConclusion::Excellent => {
                "Automated system is appropriate for coding remaining transcripts."
            }
            OverallConclusion::Moderate => {
                "Consider using automated system with manual review of flagged cases."
            }
            OverallConclusion::Poor => {
                "Manual coding required for all transcripts, or refine automated system."
            }
        }
    }
}

/// Machine-readable record of one validation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Unique run identifier.
    pub run_id: Uuid,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run finished.
    pub finished_at: DateTime<Utc>,

    /// SHA-256 hex digest of the aligned table, for determinism checks.
    pub inputs_hash: String,

    /// Subjects present in both sources.
    pub subjects_aligned: usize,

    /// Subjects present only in the manual source.
    pub manual_only_count: usize,

    /// Subjects present only in the automated source.
    pub automated_only_count: usize,

    /// Average correlation across dimensions that yielded one.
    pub average_correlation: Option<f64>,

    /// Average MAE across dimensions with at least one valid pair.
    pub average_mae: Option<f64>,

    /// Number of discrepancy flags emitted.
    pub discrepancy_count: usize,

    /// Overall verdict.
    pub conclusion: OverallConclusion,

    /// Every non-fatal warning accumulated during the run.
    pub warnings: Vec<RunWarning>,
}

/// SHA-256 hex digest of an aligned table's canonical JSON form.
///
/// Subject identity, not load order, determines the digest: the table is
/// already sorted by subject id.
pub fn aligned_table_digest(table: &AlignedTable) -> Result<String, serde_json::Error> {
    let canonical = serde_json::to_vec(table)?;
    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_study_protocol() {
        let config = AnalysisConfig::default();
        assert_eq!(config.dimensions, Dimension::core());
        assert_eq!(config.discrepancy_threshold, 2.0);
        assert_eq!(config.id_delimiter, Some('_'));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_negative_threshold_rejected() {
        let config = AnalysisConfig::default().with_threshold(-1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_conclusion_thresholds() {
        use OverallConclusion::*;
        assert_eq!(OverallConclusion::from_averages(Some(0.95), Some(0.5)), Excellent);
        assert_eq!(OverallConclusion::from_averages(Some(0.85), Some(1.49)), Excellent);
        assert_eq!(OverallConclusion::from_averages(Some(0.85), Some(1.5)), Moderate);
        assert_eq!(OverallConclusion::from_averages(Some(0.70), Some(2.49)), Moderate);
        assert_eq!(OverallConclusion::from_averages(Some(0.69), Some(0.1)), Poor);
        assert_eq!(OverallConclusion::from_averages(None, None), Poor);
    }

    #[test]
    fn test_digest_is_stable_for_equal_tables() {
        let table = AlignedTable::default();
        let a = aligned_table_digest(&table).unwrap();
        let b = aligned_table_digest(&table).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }
}
