//! Aligned Table Contracts
//!
//! Output of the aligner: one row per subject present in both sources,
//! pairing manual and automated values per dimension. Differences are
//! derived, recomputed deterministically from the paired values and never
//! stored authoritatively.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::common::Dimension;

/// A manual/automated value pair for one subject and dimension.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct PairedScore {
    /// Human-rater value, if present.
    pub manual: Option<f64>,

    /// Automated value, if present.
    pub automated: Option<f64>,
}

impl PairedScore {
    /// Both values present.
    pub fn is_valid_pair(&self) -> bool {
        self.manual.is_some() && self.automated.is_some()
    }

    /// Signed difference (manual - automated), when both values are present.
    pub fn difference(&self) -> Option<f64> {
        Some(self.manual? - self.automated?)
    }

    /// Absolute difference, when both values are present.
    pub fn abs_difference(&self) -> Option<f64> {
        self.difference().map(f64::abs)
    }

    /// Midpoint of the two values (Bland-Altman x-axis).
    pub fn mean(&self) -> Option<f64> {
        Some((self.manual? + self.automated?) / 2.0)
    }
}

/// One subject's paired scores from both sources.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlignedRow {
    /// Subject identifier (present in both sources by construction).
    pub subject_id: String,

    /// Paired values per dimension.
    pub scores: BTreeMap<Dimension, PairedScore>,
}

impl AlignedRow {
    /// The pair for a dimension. Absent dimensions read as an empty pair.
    pub fn pair(&self, dimension: Dimension) -> PairedScore {
        self.scores.get(&dimension).copied().unwrap_or_default()
    }
}

/// All aligned rows, in subject-id order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AlignedTable {
    /// Rows, sorted by subject id.
    pub rows: Vec<AlignedRow>,
}

impl AlignedTable {
    /// Number of aligned subjects.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Valid (manual, automated) pairs for one dimension, in row order.
    ///
    /// A missing value in either source excludes that subject for this
    /// dimension only.
    pub fn valid_pairs(&self, dimension: Dimension) -> Vec<(f64, f64)> {
        self.rows
            .iter()
            .filter_map(|row| {
                let pair = row.pair(dimension);
                Some((pair.manual?, pair.automated?))
            })
            .collect()
    }
}

/// Alignment outcome: how many subjects matched and which did not.
///
/// The set differences are reported in both directions, never silently
/// dropped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlignmentReport {
    /// Subjects present in both sources.
    pub aligned_count: usize,

    /// Subjects present only in the manual table.
    pub manual_only: BTreeSet<String>,

    /// Subjects present only in the automated table.
    pub automated_only: BTreeSet<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paired_score_difference_is_manual_minus_automated() {
        let pair = PairedScore { manual: Some(4.0), automated: Some(6.0) };
        assert_eq!(pair.difference(), Some(-2.0));
        assert_eq!(pair.abs_difference(), Some(2.0));
        assert_eq!(pair.mean(), Some(5.0));
    }

    #[test]
    fn test_incomplete_pair_has_no_difference() {
        let pair = PairedScore { manual: Some(4.0), automated: None };
        assert!(!pair.is_valid_pair());
        assert_eq!(pair.difference(), None);
    }

    #[test]
    fn test_valid_pairs_skip_missing_per_dimension() {
        let mut scores_a = BTreeMap::new();
        scores_a.insert(Dimension::Fluency, PairedScore { manual: Some(5.0), automated: Some(5.0) });
        scores_a.insert(Dimension::Flexibility, PairedScore { manual: Some(3.0), automated: None });

        let mut scores_b = BTreeMap::new();
        scores_b.insert(Dimension::Fluency, PairedScore { manual: Some(3.0), automated: Some(4.0) });
        scores_b.insert(Dimension::Flexibility, PairedScore { manual: Some(2.0), automated: Some(2.0) });

        let table = AlignedTable {
            rows: vec![
                AlignedRow { subject_id: "P01".into(), scores: scores_a },
                AlignedRow { subject_id: "P02".into(), scores: scores_b },
            ],
        };

        assert_eq!(table.valid_pairs(Dimension::Fluency).len(), 2);
        // P01 lacks an automated Flexibility value; excluded for that
        // dimension only.
        assert_eq!(table.valid_pairs(Dimension::Flexibility), vec![(2.0, 2.0)]);
    }
}
