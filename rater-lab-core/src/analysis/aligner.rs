//! Subject Aligner
//!
//! Inner-joins the manual and automated subject tables on exact normalized
//! subject id. Subjects present in only one source are excluded from the
//! aligned table but reported in both directions. Fully disjoint sources
//! yield an empty aligned table, not an error, so the run can still report
//! both set differences.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::contracts::{
    AlignedRow, AlignedTable, AlignmentReport, Dimension, PairedScore, Rater, RunWarning,
    SubjectTable, WarningKind,
};

/// Errors that abort alignment.
#[derive(Debug, Error)]
pub enum AlignerError {
    /// A table was labeled with the wrong rater source.
    #[error("expected a {expected} table, got {actual}")]
    WrongSource {
        /// Source the aligner expected.
        expected: Rater,
        /// Source the table carried.
        actual: Rater,
    },
}

/// Output of one alignment pass.
#[derive(Debug, Clone)]
pub struct AlignmentOutcome {
    /// Rows for subjects present in both sources.
    pub table: AlignedTable,
    /// Match counts and both set differences.
    pub report: AlignmentReport,
    /// One warning per unmatched subject id.
    pub warnings: Vec<RunWarning>,
}

/// Joins two subject tables into an aligned table.
#[derive(Debug, Clone, Default)]
pub struct SubjectAligner;

impl SubjectAligner {
    /// Align the two tables on exact subject id.
    ///
    /// Row order is subject-id order, inherited from the tables' sorted
    /// iteration, so the output is deterministic regardless of load order.
    #[instrument(skip_all, fields(manual = manual.len(), automated = automated.len()))]
    pub fn align(
        &self,
        manual: &SubjectTable,
        automated: &SubjectTable,
    ) -> Result<AlignmentOutcome, AlignerError> {
        self.check_source(manual, Rater::Manual)?;
        self.check_source(automated, Rater::Automated)?;

        let manual_ids: BTreeSet<String> = manual.ids().map(str::to_string).collect();
        let automated_ids: BTreeSet<String> = automated.ids().map(str::to_string).collect();

        let manual_only: BTreeSet<String> =
            manual_ids.difference(&automated_ids).cloned().collect();
        let automated_only: BTreeSet<String> =
            automated_ids.difference(&manual_ids).cloned().collect();

        let mut rows = Vec::new();
        for id in manual_ids.intersection(&automated_ids) {
            let manual_record = manual.get(id);
            let automated_record = automated.get(id);

            let mut scores = BTreeMap::new();
            for dimension in Dimension::all() {
                let pair = PairedScore {
                    manual: manual_record.and_then(|r| r.score(dimension)),
                    automated: automated_record.and_then(|r| r.score(dimension)),
                };
                scores.insert(dimension, pair);
            }
            rows.push(AlignedRow { subject_id: id.clone(), scores });
        }

        if rows.is_empty() {
            warn!("manual and automated sources share no subject ids");
        }

        let mut warnings = Vec::new();
        for id in &manual_only {
            warn!(subject_id = %id, "manually coded subject has no automated coding");
            warnings.push(RunWarning::new(
                WarningKind::AlignmentMismatch,
                format!("subject {id} is in the manual source only"),
            ));
        }
        for id in &automated_only {
            warn!(subject_id = %id, "automated coding has no manual counterpart");
            warnings.push(RunWarning::new(
                WarningKind::AlignmentMismatch,
                format!("subject {id} is in the automated source only"),
            ));
        }

        let report = AlignmentReport {
            aligned_count: rows.len(),
            manual_only,
            automated_only,
        };

        info!(
            aligned = report.aligned_count,
            manual_only = report.manual_only.len(),
            automated_only = report.automated_only.len(),
            "aligned subject tables"
        );

        Ok(AlignmentOutcome { table: AlignedTable { rows }, report, warnings })
    }

    fn check_source(&self, table: &SubjectTable, expected: Rater) -> Result<(), AlignerError> {
        if table.source == expected {
            Ok(())
        } else {
            Err(AlignerError::WrongSource {
                expected,
                actual: table.source,
            })
        }
    }
}
