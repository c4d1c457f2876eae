//! Source Record Contracts
//!
//! Schemas for the two inputs the analyzer consumes: the automated coding
//! output (one `*_coded.json` per subject, produced upstream by the
//! language-model coding stage) and the normalized in-memory tables both
//! sources are reduced to before alignment.
//!
//! The analyzer depends only on the `creativity_metrics` sub-schema of the
//! automated record; quality flags, the repetition check and any unknown
//! fields are carried opaquely.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::common::{Dimension, Rater};

/// Nested creativity metrics emitted by the upstream coding stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreativityMetrics {
    /// Fluency score.
    pub fluency: Option<f64>,

    /// Flexibility score.
    pub flexibility: Option<f64>,

    /// Total elaboration count.
    pub elaboration_total: Option<f64>,

    /// Elaborations per story element.
    pub elaboration_density: Option<f64>,

    /// Element categories used in the story.
    #[serde(default)]
    pub categories_used: Vec<String>,
}

/// Quality flags attached by the upstream coder. Passed through unused.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QualityFlags {
    /// Audio was partly unintelligible.
    pub unclear_audio: Option<bool>,

    /// Story shorter than the coding protocol expects.
    pub very_short_story: Option<bool>,

    /// Story longer than the coding protocol expects.
    pub very_long_story: Option<bool>,

    /// Story structure deviated from the prompt.
    pub unusual_structure: Option<bool>,

    /// Free-text coder notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Repetition check comparing stage-1 context against the stage-2 story.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepetitionCheck {
    /// Descriptors already present in the stage-1 context.
    #[serde(default)]
    pub descriptors_in_stage_1: Vec<String>,

    /// Stage-1 descriptors repeated in stage 2 (not counted as new).
    #[serde(default)]
    pub descriptors_repeated_in_stage_2: Vec<String>,

    /// Genuinely new elaborations in stage 2.
    #[serde(default)]
    pub new_elaborations_in_stage_2: Vec<String>,
}

/// One automated coding output file, as written by the upstream producer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodedRecord {
    /// Subject identifier, when the coder carried it through.
    pub participant_id: Option<String>,

    /// Transcript identifier; fallback when `participant_id` is absent.
    pub transcript_id: Option<String>,

    /// The metrics sub-schema the analyzer consumes.
    #[serde(default)]
    pub creativity_metrics: CreativityMetrics,

    /// Coder quality flags (opaque passthrough).
    pub quality_flags: Option<QualityFlags>,

    /// Repetition check (opaque passthrough).
    pub repetition_check: Option<RepetitionCheck>,

    /// Any further fields the upstream stage emitted, preserved as-is.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl CodedRecord {
    /// The metric value for a dimension, if present.
    pub fn score(&self, dimension: Dimension) -> Option<f64> {
        match dimension {
            Dimension::Fluency => self.creativity_metrics.fluency,
            Dimension::Flexibility => self.creativity_metrics.flexibility,
            Dimension::Elaboration => self.creativity_metrics.elaboration_total,
            Dimension::ElabDensity => self.creativity_metrics.elaboration_density,
        }
    }
}

/// One subject's scores from one source, normalized.
///
/// A dimension absent from `scores` is missing, never conflated with a
/// true zero score. Immutable after construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubjectRecord {
    /// Normalized subject identifier.
    pub subject_id: String,

    /// Present scores per dimension; absence means missing.
    pub scores: BTreeMap<Dimension, f64>,

    /// Comma-joined element categories, when the source carried them.
    pub categories: Option<String>,
}

impl SubjectRecord {
    /// Build a record from explicit per-dimension values.
    pub fn new(subject_id: impl Into<String>, scores: BTreeMap<Dimension, f64>) -> Self {
        Self { subject_id: subject_id.into(), scores, categories: None }
    }

    /// The score for a dimension, or `None` when missing.
    pub fn score(&self, dimension: Dimension) -> Option<f64> {
        self.scores.get(&dimension).copied()
    }
}

/// Error raised when a table's subject-id uniqueness invariant is violated.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("duplicate subject id '{subject_id}' in {rater} table")]
pub struct DuplicateIdError {
    /// The offending id.
    pub subject_id: String,
    /// Which source table rejected it.
    pub rater: Rater,
}

/// All of one source's subject records, keyed by subject id.
///
/// Insertion enforces the uniqueness invariant: a second record with the
/// same id is rejected, never silently overwritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectTable {
    /// Which source this table came from.
    pub source: Rater,

    records: BTreeMap<String, SubjectRecord>,
}

impl SubjectTable {
    /// Create an empty table for one source.
    pub fn new(source: Rater) -> Self {
        Self { source, records: BTreeMap::new() }
    }

    /// Insert a record, rejecting duplicate subject ids.
    pub fn insert(&mut self, record: SubjectRecord) -> Result<(), DuplicateIdError> {
        if self.records.contains_key(&record.subject_id) {
            return Err(DuplicateIdError {
                subject_id: record.subject_id,
                rater: self.source,
            });
        }
        self.records.insert(record.subject_id.clone(), record);
        Ok(())
    }

    /// Number of subjects in the table.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up one subject.
    pub fn get(&self, subject_id: &str) -> Option<&SubjectRecord> {
        self.records.get(subject_id)
    }

    /// Subject ids, in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// Records in subject-id order.
    pub fn iter(&self) -> impl Iterator<Item = &SubjectRecord> {
        self.records.values()
    }
}
