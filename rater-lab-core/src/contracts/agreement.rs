//! Agreement Statistics Contracts
//!
//! Per-dimension summary statistics comparing the two sources, plus the
//! qualitative tiers the study protocol attaches to them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::common::Dimension;

/// Qualitative interpretation of a Pearson correlation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AgreementTier {
    /// r >= 0.90
    Excellent,
    /// 0.80 <= r < 0.90
    Good,
    /// 0.70 <= r < 0.80
    Acceptable,
    /// r < 0.70
    Poor,
}

impl AgreementTier {
    /// Classify a correlation coefficient.
    pub fn from_correlation(r: f64) -> Self {
        if r >= 0.90 {
            AgreementTier::Excellent
        } else if r >= 0.80 {
            AgreementTier::Good
        } else if r >= 0.70 {
            AgreementTier::Acceptable
        } else {
            AgreementTier::Poor
        }
    }
}

impl std::fmt::Display for AgreementTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgreementTier::Excellent => write!(f, "Excellent agreement"),
            AgreementTier::Good => write!(f, "Good agreement"),
            AgreementTier::Acceptable => write!(f, "Acceptable agreement"),
            AgreementTier::Poor => write!(f, "Poor agreement"),
        }
    }
}

/// Qualitative interpretation of an intraclass correlation coefficient.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReliabilityTier {
    /// ICC >= 0.90
    Excellent,
    /// 0.75 <= ICC < 0.90
    Good,
    /// 0.50 <= ICC < 0.75
    Moderate,
    /// ICC < 0.50
    Poor,
}

impl ReliabilityTier {
    /// Classify an ICC value.
    pub fn from_icc(icc: f64) -> Self {
        if icc >= 0.90 {
            ReliabilityTier::Excellent
        } else if icc >= 0.75 {
            ReliabilityTier::Good
        } else if icc >= 0.50 {
            ReliabilityTier::Moderate
        } else {
            ReliabilityTier::Poor
        }
    }
}

impl std::fmt::Display for ReliabilityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReliabilityTier::Excellent => write!(f, "Excellent reliability"),
            ReliabilityTier::Good => write!(f, "Good reliability"),
            ReliabilityTier::Moderate => write!(f, "Moderate reliability"),
            ReliabilityTier::Poor => write!(f, "Poor reliability"),
        }
    }
}

/// One dimension's agreement statistics over its valid pairs.
///
/// `correlation`, `p_value`, `std_difference` and `icc` are `None` when the
/// sample is too small or degenerate for that statistic; unavailable is
/// always explicit, never `NaN` and never a silent zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgreementResult {
    /// Dimension these statistics describe.
    pub dimension: Dimension,

    /// Number of valid pairs used.
    pub n: usize,

    /// Pearson r; `None` when n < 2 or either side has zero variance.
    pub correlation: Option<f64>,

    /// Two-sided p-value for the correlation; `None` when n < 3 or the
    /// correlation itself is unavailable.
    pub p_value: Option<f64>,

    /// Mean absolute error over valid pairs.
    pub mae: f64,

    /// Mean signed difference (manual - automated).
    pub mean_difference: f64,

    /// Sample standard deviation of the signed differences; `None` when
    /// n < 2.
    pub std_difference: Option<f64>,

    /// ICC(2,1): two-way random effects, absolute agreement, single rater.
    /// `None` when the computation is degenerate.
    pub icc: Option<f64>,
}

impl AgreementResult {
    /// Qualitative tier for the correlation, when available.
    pub fn correlation_tier(&self) -> Option<AgreementTier> {
        self.correlation.map(AgreementTier::from_correlation)
    }

    /// Qualitative tier for the ICC, when available.
    pub fn icc_tier(&self) -> Option<ReliabilityTier> {
        self.icc.map(ReliabilityTier::from_icc)
    }

    /// Bland-Altman limits of agreement: `mean_difference ± 1.96·std`.
    pub fn limits_of_agreement(&self) -> Option<(f64, f64)> {
        let std = self.std_difference?;
        Some((self.mean_difference - 1.96 * std, self.mean_difference + 1.96 * std))
    }
}

/// Outcome for one dimension: statistics, or an explicit no-data marker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DimensionAgreement {
    /// No subject had both values present for this dimension.
    NoValidData,
    /// Statistics computed over at least one valid pair.
    Computed(AgreementResult),
}

impl DimensionAgreement {
    /// The computed result, if any.
    pub fn result(&self) -> Option<&AgreementResult> {
        match self {
            DimensionAgreement::Computed(result) => Some(result),
            DimensionAgreement::NoValidData => None,
        }
    }
}

/// Agreement outcomes for every scored dimension.
pub type AgreementSummary = BTreeMap<Dimension, DimensionAgreement>;
