//! Record Loader
//!
//! Reads the two rater sources: a directory of automated coding JSON files
//! and a manual coding CSV export. Per-record problems (malformed JSON,
//! unparsable cells, duplicate ids) become warnings and the record is
//! skipped; only a missing, unreadable or entirely empty input aborts the
//! load.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::contracts::{
    AnalysisConfig, CodedRecord, Dimension, Rater, RunWarning, SubjectRecord, SubjectTable,
    WarningKind,
};

/// Errors that abort a load.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// The automated coding directory does not exist or cannot be read.
    #[error("cannot read coded directory {path}: {source}")]
    CodedDirUnreadable {
        /// Directory that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The manual coding CSV does not exist or cannot be read.
    #[error("cannot read manual coding file {path}: {source}")]
    ManualFileUnreadable {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The manual CSV has no usable header row.
    #[error("manual coding file {path} is missing required column {column}")]
    MissingColumn {
        /// File that failed.
        path: PathBuf,
        /// Column that was expected.
        column: String,
    },

    /// The manual CSV could not be parsed at all.
    #[error("manual coding file {path} is not valid CSV: {source}")]
    InvalidCsv {
        /// File that failed.
        path: PathBuf,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// A source input contained no records at all.
    #[error("no {rater} records found in {path}")]
    NoRecords {
        /// Which rater source was empty.
        rater: Rater,
        /// Input that was scanned.
        path: PathBuf,
    },
}

/// Result of loading one rater source.
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    /// The loaded subject table.
    pub table: SubjectTable,
    /// Non-fatal problems encountered while loading.
    pub warnings: Vec<RunWarning>,
}

/// Loads both rater sources according to an [`AnalysisConfig`].
#[derive(Debug, Clone)]
pub struct RecordLoader {
    config: AnalysisConfig,
}

impl RecordLoader {
    /// Create a loader for the given configuration.
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Truncate a raw subject id at the first delimiter occurrence.
    fn normalize_id(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        match self.config.id_delimiter {
            Some(delim) => trimmed
                .split(delim)
                .next()
                .unwrap_or(trimmed)
                .to_string(),
            None => trimmed.to_string(),
        }
    }

    /// Subject id for a coded file: the record's `participant_id`, falling
    /// back to the filename with the coded suffix stripped.
    fn coded_subject_id(&self, record: &CodedRecord, path: &Path) -> String {
        if let Some(id) = record.participant_id.as_deref() {
            if !id.trim().is_empty() {
                return self.normalize_id(id);
            }
        }
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = file_name
            .strip_suffix(&self.config.coded_suffix)
            .unwrap_or(&file_name);
        self.normalize_id(stem)
    }

    /// Scan a directory of `*_coded.json` files into a subject table.
    ///
    /// Files are visited in lexicographic order so duplicate resolution is
    /// deterministic: the first file for a subject id wins.
    #[instrument(skip(self), fields(dir = %dir.display()))]
    pub fn load_automated(&self, dir: &Path) -> Result<LoadOutcome, LoaderError> {
        let entries = fs::read_dir(dir).map_err(|source| LoaderError::CodedDirUnreadable {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.file_name()
                    .map(|n| n.to_string_lossy().ends_with(&self.config.coded_suffix))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        // A directory with no coded files at all is fatal. Files that fail
        // to parse are only warnings, even when every one of them fails.
        if paths.is_empty() {
            return Err(LoaderError::NoRecords {
                rater: Rater::Automated,
                path: dir.to_path_buf(),
            });
        }

        let mut table = SubjectTable::new(Rater::Automated);
        let mut warnings = Vec::new();

        for path in &paths {
            let record = match self.read_coded_file(path) {
                Ok(record) => record,
                Err(message) => {
                    warn!(file = %path.display(), %message, "skipping unreadable coded file");
                    warnings.push(RunWarning::new(WarningKind::ParseError, message));
                    continue;
                }
            };

            let subject_id = self.coded_subject_id(&record, path);
            let mut scores = BTreeMap::new();
            for dimension in Dimension::all() {
                if let Some(value) = record.score(dimension) {
                    scores.insert(dimension, value);
                }
            }
            let categories = if record.creativity_metrics.categories_used.is_empty() {
                None
            } else {
                Some(record.creativity_metrics.categories_used.join(", "))
            };

            let mut subject = SubjectRecord::new(subject_id, scores);
            subject.categories = categories;

            if let Err(err) = table.insert(subject) {
                warn!(file = %path.display(), %err, "duplicate subject id in coded files");
                warnings.push(RunWarning::new(WarningKind::DuplicateId, err.to_string()));
            }
        }

        debug!(subjects = table.len(), files = paths.len(), "loaded automated records");
        Ok(LoadOutcome { table, warnings })
    }

    fn read_coded_file(&self, path: &Path) -> Result<CodedRecord, String> {
        let raw = fs::read_to_string(path)
            .map_err(|e| format!("{}: {e}", path.display()))?;
        serde_json::from_str(&raw).map_err(|e| format!("{}: {e}", path.display()))
    }

    /// Read the manual coding CSV into a subject table.
    ///
    /// Empty cells are missing values. Unparsable numeric cells produce a
    /// warning and are treated as missing. Rows without a subject id are
    /// skipped with a warning.
    #[instrument(skip(self), fields(file = %path.display()))]
    pub fn load_manual(&self, path: &Path) -> Result<LoadOutcome, LoaderError> {
        fs::metadata(path).map_err(|source| LoaderError::ManualFileUnreadable {
            path: path.to_path_buf(),
            source,
        })?;

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|source| LoaderError::InvalidCsv {
                path: path.to_path_buf(),
                source,
            })?;

        let headers = reader
            .headers()
            .map_err(|source| LoaderError::InvalidCsv {
                path: path.to_path_buf(),
                source,
            })?
            .clone();

        let id_index = headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case("ParticipantID"))
            .ok_or_else(|| LoaderError::MissingColumn {
                path: path.to_path_buf(),
                column: "ParticipantID".to_string(),
            })?;

        let dim_indices: Vec<(Dimension, usize)> = Dimension::all()
            .into_iter()
            .filter_map(|dim| {
                headers
                    .iter()
                    .position(|h| h.eq_ignore_ascii_case(dim.manual_header()))
                    .map(|idx| (dim, idx))
            })
            .collect();

        let mut table = SubjectTable::new(Rater::Manual);
        let mut warnings = Vec::new();
        let mut rows_seen = 0usize;

        for (row_number, result) in reader.records().enumerate() {
            let line = row_number + 2;
            rows_seen += 1;
            let record = match result {
                Ok(record) => record,
                Err(err) => {
                    warnings.push(RunWarning::new(
                        WarningKind::ParseError,
                        format!("{} line {line}: {err}", path.display()),
                    ));
                    continue;
                }
            };

            let raw_id = record.get(id_index).unwrap_or("");
            if raw_id.is_empty() {
                warnings.push(RunWarning::new(
                    WarningKind::ParseError,
                    format!("{} line {line}: row has no ParticipantID", path.display()),
                ));
                continue;
            }
            let subject_id = self.normalize_id(raw_id);

            let mut scores = BTreeMap::new();
            for (dimension, index) in &dim_indices {
                let cell = record.get(*index).unwrap_or("");
                if cell.is_empty() {
                    continue;
                }
                match cell.parse::<f64>() {
                    Ok(value) => {
                        scores.insert(*dimension, value);
                    }
                    Err(_) => {
                        warnings.push(RunWarning::new(
                            WarningKind::ParseError,
                            format!(
                                "{} line {line}: {dimension} value {cell:?} is not a number",
                                path.display()
                            ),
                        ));
                    }
                }
            }

            if let Err(err) = table.insert(SubjectRecord::new(subject_id, scores)) {
                warnings.push(RunWarning::new(WarningKind::DuplicateId, err.to_string()));
            }
        }

        // A file with no data rows at all is fatal. Rows skipped for bad
        // cells or missing ids are only warnings, even when every row fails.
        if rows_seen == 0 {
            return Err(LoaderError::NoRecords {
                rater: Rater::Manual,
                path: path.to_path_buf(),
            });
        }

        debug!(subjects = table.len(), "loaded manual records");
        Ok(LoadOutcome { table, warnings })
    }
}
