//! Discrepancy Detector
//!
//! Scans the aligned table for subject/dimension pairs whose manual and
//! automated values disagree by at least the configured threshold. Pairs
//! with a missing value on either side are never flagged.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::analysis::traits::Analyzer;
use crate::contracts::{AlignedTable, Dimension, DiscrepancyFlag};

/// Errors that abort discrepancy detection.
#[derive(Debug, Error)]
pub enum DiscrepancyError {
    /// The threshold must be non-negative.
    #[error("discrepancy threshold {0} is negative")]
    NegativeThreshold(f64),
}

/// Input to the discrepancy detector.
#[derive(Debug, Clone)]
pub struct DiscrepancyRequest {
    /// The aligned table to scan.
    pub table: AlignedTable,
    /// Dimensions to scan.
    pub dimensions: Vec<Dimension>,
    /// Flag iff `abs(manual - automated) >= threshold`.
    pub threshold: f64,
}

/// Flags subject/dimension pairs that disagree beyond a threshold.
#[derive(Debug, Clone, Default)]
pub struct DiscrepancyDetector;

#[async_trait]
impl Analyzer for DiscrepancyDetector {
    type Input = DiscrepancyRequest;
    type Output = Vec<DiscrepancyFlag>;
    type Error = DiscrepancyError;

    fn name(&self) -> &'static str {
        "discrepancy-detector"
    }

    fn validate_input(&self, input: &Self::Input) -> Result<(), Self::Error> {
        if input.threshold < 0.0 {
            return Err(DiscrepancyError::NegativeThreshold(input.threshold));
        }
        Ok(())
    }

    #[instrument(skip_all, fields(rows = input.table.len(), threshold = input.threshold))]
    async fn execute(&self, input: Self::Input) -> Result<Self::Output, Self::Error> {
        let mut flags = Vec::new();

        for row in &input.table.rows {
            for dimension in &input.dimensions {
                let pair = row.pair(*dimension);
                let (Some(manual), Some(automated)) = (pair.manual, pair.automated) else {
                    continue;
                };
                let difference = manual - automated;
                if difference.abs() >= input.threshold {
                    flags.push(DiscrepancyFlag {
                        subject_id: row.subject_id.clone(),
                        dimension: *dimension,
                        manual_value: manual,
                        automated_value: automated,
                        difference,
                    });
                }
            }
        }

        debug!(flags = flags.len(), "scanned for discrepancies");
        Ok(flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::{AlignedRow, PairedScore};
    use std::collections::BTreeMap;

    fn table() -> AlignedTable {
        let mut a = BTreeMap::new();
        a.insert(
            Dimension::Fluency,
            PairedScore { manual: Some(8.0), automated: Some(5.0) },
        );
        a.insert(
            Dimension::Flexibility,
            PairedScore { manual: Some(4.0), automated: Some(3.0) },
        );

        let mut b = BTreeMap::new();
        b.insert(
            Dimension::Fluency,
            PairedScore { manual: Some(6.0), automated: None },
        );
        b.insert(
            Dimension::Flexibility,
            PairedScore { manual: Some(2.0), automated: Some(6.0) },
        );

        AlignedTable {
            rows: vec![
                AlignedRow { subject_id: "P01".into(), scores: a },
                AlignedRow { subject_id: "P02".into(), scores: b },
            ],
        }
    }

    fn request(threshold: f64) -> DiscrepancyRequest {
        DiscrepancyRequest {
            table: table(),
            dimensions: vec![Dimension::Fluency, Dimension::Flexibility],
            threshold,
        }
    }

    #[tokio::test]
    async fn test_flags_at_or_beyond_threshold() {
        let flags = DiscrepancyDetector.invoke(request(2.0)).await.unwrap();
        assert_eq!(flags.len(), 2);
        assert_eq!(flags[0].subject_id, "P01");
        assert_eq!(flags[0].dimension, Dimension::Fluency);
        assert_eq!(flags[0].difference, 3.0);
        assert_eq!(flags[1].subject_id, "P02");
        assert_eq!(flags[1].difference, -4.0);
    }

    #[tokio::test]
    async fn test_missing_side_is_never_flagged() {
        // P02 Fluency lacks an automated value even at threshold zero.
        let flags = DiscrepancyDetector.invoke(request(0.0)).await.unwrap();
        assert!(!flags
            .iter()
            .any(|f| f.subject_id == "P02" && f.dimension == Dimension::Fluency));
    }

    #[tokio::test]
    async fn test_threshold_is_inclusive() {
        // P01 Fluency differs by exactly 3.
        let flags = DiscrepancyDetector.invoke(request(3.0)).await.unwrap();
        assert!(flags
            .iter()
            .any(|f| f.subject_id == "P01" && f.dimension == Dimension::Fluency));
    }

    #[tokio::test]
    async fn test_raising_threshold_never_adds_flags() {
        let low = DiscrepancyDetector.invoke(request(1.0)).await.unwrap();
        let high = DiscrepancyDetector.invoke(request(4.0)).await.unwrap();
        assert!(high.len() <= low.len());
        for flag in &high {
            assert!(low.contains(flag));
        }
    }

    #[tokio::test]
    async fn test_negative_threshold_rejected() {
        let err = DiscrepancyDetector.invoke(request(-1.0)).await.unwrap_err();
        assert!(matches!(err, DiscrepancyError::NegativeThreshold(_)));
    }
}
