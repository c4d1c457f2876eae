//! Discrepancy Contracts

use serde::{Deserialize, Serialize};

use super::common::Dimension;

/// A subject/dimension pair whose sources disagree beyond threshold.
///
/// Emitted iff both values are present and `abs(difference) >= threshold`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscrepancyFlag {
    /// Subject whose scores disagree.
    pub subject_id: String,

    /// Dimension the disagreement is on.
    pub dimension: Dimension,

    /// Human-rater value.
    pub manual_value: f64,

    /// Automated value.
    pub automated_value: f64,

    /// Signed difference (manual - automated).
    pub difference: f64,
}
