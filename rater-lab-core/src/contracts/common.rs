//! Common Contract Types
//!
//! Shared types used across the rater-agreement contracts.

use serde::{Deserialize, Serialize};

/// A scored creativity dimension.
///
/// The default scored set is [`Dimension::core`]; `ElabDensity` is carried
/// through loading and the merged table and may be opted into the scored set
/// via [`crate::contracts::AnalysisConfig`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Dimension {
    /// Number of distinct story elements produced.
    Fluency,
    /// Number of distinct element categories used.
    Flexibility,
    /// Total elaborations added to story elements.
    Elaboration,
    /// Elaborations per story element.
    ElabDensity,
}

impl Dimension {
    /// The dimensions scored by default, matching the study's statistics set.
    pub fn core() -> Vec<Dimension> {
        vec![Dimension::Fluency, Dimension::Flexibility, Dimension::Elaboration]
    }

    /// Every dimension the loader understands.
    pub fn all() -> Vec<Dimension> {
        vec![
            Dimension::Fluency,
            Dimension::Flexibility,
            Dimension::Elaboration,
            Dimension::ElabDensity,
        ]
    }

    /// Column header used by the manual-coding table.
    pub fn manual_header(&self) -> &'static str {
        match self {
            Dimension::Fluency => "Fluency",
            Dimension::Flexibility => "Flexibility",
            Dimension::Elaboration => "Elaboration",
            Dimension::ElabDensity => "ElabDensity",
        }
    }

    /// Merged-table column name for one rater's value of this dimension.
    pub fn column_for(&self, rater: Rater) -> String {
        format!("{}_{}", self.manual_header(), rater.column_suffix())
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.manual_header())
    }
}

/// One of the two coding sources compared by the analyzer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Rater {
    /// Human rater (ELAN manual coding).
    Manual,
    /// Automated coding pipeline.
    Automated,
}

impl Rater {
    /// Column suffix used in the merged table.
    pub fn column_suffix(&self) -> &'static str {
        match self {
            Rater::Manual => "Manual",
            Rater::Automated => "Auto",
        }
    }
}

impl std::fmt::Display for Rater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rater::Manual => write!(f, "manual"),
            Rater::Automated => write!(f, "automated"),
        }
    }
}

/// Category of a non-fatal problem encountered during a run.
///
/// Warnings accumulate across the pipeline and are surfaced in the report
/// and the run summary; none of them aborts the run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// A source record failed to parse and was excluded from the table.
    ParseError,
    /// A subject was present in only one source.
    AlignmentMismatch,
    /// A subject id appeared more than once within one source.
    DuplicateId,
    /// Too few valid pairs to compute a statistic.
    StatisticalDegeneracy,
}

/// A structured, non-fatal warning attached to a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunWarning {
    /// Warning category.
    pub kind: WarningKind,

    /// Human-readable description.
    pub message: String,
}

impl RunWarning {
    /// Create a warning.
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }
}

impl std::fmt::Display for RunWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.kind, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_dimensions_exclude_density() {
        let core = Dimension::core();
        assert_eq!(core.len(), 3);
        assert!(!core.contains(&Dimension::ElabDensity));
    }

    #[test]
    fn test_merged_column_names() {
        assert_eq!(Dimension::Fluency.column_for(Rater::Manual), "Fluency_Manual");
        assert_eq!(Dimension::ElabDensity.column_for(Rater::Automated), "ElabDensity_Auto");
    }
}
