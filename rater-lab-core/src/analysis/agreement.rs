//! Agreement Engine
//!
//! Computes per-dimension agreement statistics over the aligned table:
//! Pearson correlation with a two-sided p-value, mean absolute error, the
//! signed-difference distribution and ICC(2,1). Statistics use valid pairs
//! only; a dimension with no valid pairs is reported explicitly rather than
//! skipped.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::analysis::stats;
use crate::analysis::traits::Analyzer;
use crate::contracts::{
    AgreementResult, AgreementSummary, AlignedTable, Dimension, DimensionAgreement, RunWarning,
    WarningKind,
};

/// Errors that abort agreement computation.
///
/// An empty aligned table is not an error: every dimension then reports
/// no valid data and the run degrades rather than aborting.
#[derive(Debug, Error)]
pub enum AgreementError {
    /// No dimensions were requested.
    #[error("agreement requested for an empty dimension set")]
    NoDimensions,
}

/// Input to the agreement engine.
#[derive(Debug, Clone)]
pub struct AgreementRequest {
    /// The aligned table to analyze.
    pub table: AlignedTable,
    /// Dimensions to score.
    pub dimensions: Vec<Dimension>,
}

/// Output of the agreement engine.
#[derive(Debug, Clone)]
pub struct AgreementOutcome {
    /// Per-dimension statistics, keyed by dimension.
    pub summary: AgreementSummary,
    /// Degeneracy warnings (too few pairs, zero variance).
    pub warnings: Vec<RunWarning>,
}

impl AgreementOutcome {
    /// Average correlation across dimensions that yielded one.
    pub fn average_correlation(&self) -> Option<f64> {
        let rs: Vec<f64> = self
            .summary
            .values()
            .filter_map(|d| d.result())
            .filter_map(|r| r.correlation)
            .collect();
        stats::mean(&rs)
    }

    /// Average MAE across dimensions with at least one valid pair.
    pub fn average_mae(&self) -> Option<f64> {
        let maes: Vec<f64> = self
            .summary
            .values()
            .filter_map(|d| d.result())
            .map(|r| r.mae)
            .collect();
        stats::mean(&maes)
    }
}

/// Computes agreement statistics for every requested dimension.
#[derive(Debug, Clone, Default)]
pub struct AgreementEngine;

impl AgreementEngine {
    fn analyze_dimension(
        &self,
        table: &AlignedTable,
        dimension: Dimension,
        warnings: &mut Vec<RunWarning>,
    ) -> DimensionAgreement {
        let pairs = table.valid_pairs(dimension);
        let n = pairs.len();
        if n == 0 {
            warnings.push(RunWarning::new(
                WarningKind::StatisticalDegeneracy,
                format!("{dimension}: no valid pairs, statistics unavailable"),
            ));
            return DimensionAgreement::NoValidData;
        }

        let correlation = stats::pearson(&pairs);
        if correlation.is_none() {
            let reason = if n < 2 { "fewer than two pairs" } else { "zero variance" };
            warnings.push(RunWarning::new(
                WarningKind::StatisticalDegeneracy,
                format!("{dimension}: correlation undefined ({reason})"),
            ));
        }
        let p_value = correlation.and_then(|r| stats::pearson_p_value(r, n));

        let differences: Vec<f64> = pairs.iter().map(|(m, a)| m - a).collect();
        let mean_difference = stats::mean(&differences).unwrap_or_default();
        let std_difference = stats::sample_std(&differences);
        let mae = stats::mean_absolute_error(&pairs).unwrap_or_default();

        let icc = stats::icc_2_1(&pairs);
        if icc.is_none() {
            warnings.push(RunWarning::new(
                WarningKind::StatisticalDegeneracy,
                format!("{dimension}: ICC(2,1) undefined for this sample"),
            ));
        }

        debug!(%dimension, n, ?correlation, mae, "computed dimension agreement");

        DimensionAgreement::Computed(AgreementResult {
            dimension,
            n,
            correlation,
            p_value,
            mae,
            mean_difference,
            std_difference,
            icc,
        })
    }
}

#[async_trait]
impl Analyzer for AgreementEngine {
    type Input = AgreementRequest;
    type Output = AgreementOutcome;
    type Error = AgreementError;

    fn name(&self) -> &'static str {
        "agreement-engine"
    }

    fn validate_input(&self, input: &Self::Input) -> Result<(), Self::Error> {
        if input.dimensions.is_empty() {
            return Err(AgreementError::NoDimensions);
        }
        Ok(())
    }

    #[instrument(skip_all, fields(rows = input.table.len(), dimensions = input.dimensions.len()))]
    async fn execute(&self, input: Self::Input) -> Result<Self::Output, Self::Error> {
        let mut summary = AgreementSummary::new();
        let mut warnings = Vec::new();

        for dimension in &input.dimensions {
            let agreement = self.analyze_dimension(&input.table, *dimension, &mut warnings);
            summary.insert(*dimension, agreement);
        }

        Ok(AgreementOutcome { summary, warnings })
    }
}
