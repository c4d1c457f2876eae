//! Data Contracts
//!
//! Every type that crosses a stage boundary in the validation pipeline lives
//! here: subject records, the aligned table, agreement results, discrepancy
//! flags, and the run summary. Stages communicate only through these types.

pub mod agreement;
pub mod aligned;
pub mod common;
pub mod discrepancy;
pub mod records;
pub mod run;

pub use agreement::{
    AgreementResult, AgreementSummary, AgreementTier, DimensionAgreement, ReliabilityTier,
};
pub use aligned::{AlignedRow, AlignedTable, AlignmentReport, PairedScore};
pub use common::{Dimension, Rater, RunWarning, WarningKind};
pub use discrepancy::DiscrepancyFlag;
pub use records::{
    CodedRecord, CreativityMetrics, DuplicateIdError, QualityFlags, RepetitionCheck,
    SubjectRecord, SubjectTable,
};
pub use run::{
    aligned_table_digest, AnalysisConfig, OverallConclusion, RunSummary,
    DEFAULT_CODED_SUFFIX, DEFAULT_DISCREPANCY_THRESHOLD,
};
