//! Analysis Stages
//!
//! The pipeline's computational stages: loading both rater sources, aligning
//! them on subject id, computing agreement statistics and flagging
//! discrepancies. Stages are pure over their inputs; all file I/O lives in
//! the loader.

pub mod agreement;
pub mod aligner;
pub mod discrepancy;
pub mod loader;
pub mod stats;
pub mod traits;

pub use agreement::{AgreementEngine, AgreementError, AgreementOutcome, AgreementRequest};
pub use aligner::{AlignerError, AlignmentOutcome, SubjectAligner};
pub use discrepancy::{DiscrepancyDetector, DiscrepancyError, DiscrepancyRequest};
pub use loader::{LoadOutcome, LoaderError, RecordLoader};
pub use traits::Analyzer;
