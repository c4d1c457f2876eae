//! Metrics Extraction
//!
//! Flattens a folder of automated coding JSON files into one summary row per
//! file: creativity metrics, quality flags and repetition-check counts.
//! Per-file parse failures are logged and skipped; the scan never aborts on
//! a bad file. Results are written as a JSON array and a CSV table.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::contracts::{CodedRecord, RunWarning, WarningKind, DEFAULT_CODED_SUFFIX};

/// Errors that abort an extraction.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The input directory does not exist or cannot be read.
    #[error("cannot read coded directory {path}: {source}")]
    DirUnreadable {
        /// Directory that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// No file in the directory could be extracted.
    #[error("no extractable coded files in {path}")]
    NoRows {
        /// Directory that was scanned.
        path: PathBuf,
    },

    /// An output file could not be written.
    #[error("cannot write {path}: {source}")]
    Write {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Output serialization failed.
    #[error("cannot serialize extraction summary: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The CSV output could not be written.
    #[error("cannot write CSV summary: {0}")]
    Csv(#[from] csv::Error),
}

/// One flattened summary row per coded file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsRow {
    /// Transcript id from the record, or `"unknown"`.
    pub transcript_id: String,

    /// Name of the file the row came from.
    pub file_name: String,

    /// Fluency score.
    pub fluency: Option<f64>,

    /// Flexibility score.
    pub flexibility: Option<f64>,

    /// Total elaboration count.
    pub elaboration_total: Option<f64>,

    /// Elaborations per story element.
    pub elaboration_density: Option<f64>,

    /// Comma-joined element categories.
    pub categories_used: String,

    /// Audio quality flag.
    pub unclear_audio: Option<bool>,

    /// Short-story flag.
    pub very_short_story: Option<bool>,

    /// Long-story flag.
    pub very_long_story: Option<bool>,

    /// Structure flag.
    pub unusual_structure: Option<bool>,

    /// Free-text coder notes.
    pub quality_notes: String,

    /// Descriptors already present in the stage-1 context.
    pub descriptors_in_stage_1_count: usize,

    /// Stage-1 descriptors repeated in stage 2.
    pub descriptors_repeated_in_stage_2_count: usize,

    /// Comma-joined new stage-2 elaborations.
    pub new_elaborations_in_stage_2: String,

    /// Count of new stage-2 elaborations.
    pub new_elaborations_count: usize,
}

impl MetricsRow {
    fn from_record(record: &CodedRecord, file_name: &str) -> Self {
        let metrics = &record.creativity_metrics;
        let flags = record.quality_flags.clone().unwrap_or_default();
        let repetition = record.repetition_check.clone().unwrap_or_default();

        Self {
            transcript_id: record
                .transcript_id
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            file_name: file_name.to_string(),
            fluency: metrics.fluency,
            flexibility: metrics.flexibility,
            elaboration_total: metrics.elaboration_total,
            elaboration_density: metrics.elaboration_density,
            categories_used: metrics.categories_used.join(", "),
            unclear_audio: flags.unclear_audio,
            very_short_story: flags.very_short_story,
            very_long_story: flags.very_long_story,
            unusual_structure: flags.unusual_structure,
            quality_notes: flags.notes.unwrap_or_default(),
            descriptors_in_stage_1_count: repetition.descriptors_in_stage_1.len(),
            descriptors_repeated_in_stage_2_count: repetition
                .descriptors_repeated_in_stage_2
                .len(),
            new_elaborations_in_stage_2: repetition.new_elaborations_in_stage_2.join(", "),
            new_elaborations_count: repetition.new_elaborations_in_stage_2.len(),
        }
    }
}

/// Result of one extraction scan.
#[derive(Debug, Clone)]
pub struct ExtractionSummary {
    /// One row per successfully parsed file, in filename order.
    pub rows: Vec<MetricsRow>,
    /// Files that were found but could not be parsed.
    pub warnings: Vec<RunWarning>,
}

/// Scan a directory of coded JSON files into summary rows.
#[instrument(fields(dir = %dir.display()))]
pub fn collect_metrics(dir: &Path) -> Result<ExtractionSummary, ExtractError> {
    let entries = fs::read_dir(dir).map_err(|source| ExtractError::DirUnreadable {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .map(|n| n.to_string_lossy().ends_with(DEFAULT_CODED_SUFFIX))
                .unwrap_or(false)
        })
        .collect();
    paths.sort();

    let mut rows = Vec::new();
    let mut warnings = Vec::new();

    for path in &paths {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let parsed: Result<CodedRecord, String> = fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|raw| serde_json::from_str(&raw).map_err(|e| e.to_string()));

        match parsed {
            Ok(record) => rows.push(MetricsRow::from_record(&record, &file_name)),
            Err(message) => {
                warn!(file = %file_name, %message, "skipping unparsable coded file");
                warnings.push(RunWarning::new(
                    WarningKind::ParseError,
                    format!("{file_name}: {message}"),
                ));
            }
        }
    }

    if rows.is_empty() {
        return Err(ExtractError::NoRows { path: dir.to_path_buf() });
    }

    info!(rows = rows.len(), skipped = warnings.len(), "collected metrics");
    Ok(ExtractionSummary { rows, warnings })
}

/// Write the summary rows as a pretty-printed JSON array.
pub fn write_json_summary(rows: &[MetricsRow], path: &Path) -> Result<(), ExtractError> {
    let json = serde_json::to_string_pretty(rows)?;
    fs::write(path, json).map_err(|source| ExtractError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Write the summary rows as CSV, one column per flattened field.
pub fn write_csv_summary(rows: &[MetricsRow], path: &Path) -> Result<(), ExtractError> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush().map_err(|source| ExtractError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_file(dir: &Path, name: &str, contents: &str) {
        fs::write(dir.join(name), contents).unwrap();
    }

    #[test]
    fn test_collect_flattens_all_sections() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "P01_coded.json",
            r#"{
                "transcript_id": "P01_story",
                "creativity_metrics": {
                    "fluency": 11,
                    "flexibility": 5,
                    "elaboration_total": 7,
                    "elaboration_density": 0.64,
                    "categories_used": ["animals", "objects"]
                },
                "quality_flags": {"unclear_audio": false, "notes": "clean recording"},
                "repetition_check": {
                    "descriptors_in_stage_1": ["red", "big"],
                    "descriptors_repeated_in_stage_2": ["red"],
                    "new_elaborations_in_stage_2": ["sparkly", "ancient", "tiny"]
                }
            }"#,
        );

        let summary = collect_metrics(dir.path()).unwrap();
        assert_eq!(summary.rows.len(), 1);
        let row = &summary.rows[0];
        assert_eq!(row.transcript_id, "P01_story");
        assert_eq!(row.fluency, Some(11.0));
        assert_eq!(row.categories_used, "animals, objects");
        assert_eq!(row.unclear_audio, Some(false));
        assert_eq!(row.quality_notes, "clean recording");
        assert_eq!(row.descriptors_in_stage_1_count, 2);
        assert_eq!(row.descriptors_repeated_in_stage_2_count, 1);
        assert_eq!(row.new_elaborations_count, 3);
    }

    #[test]
    fn test_bad_file_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "P01_coded.json", "{ broken");
        write_file(
            dir.path(),
            "P02_coded.json",
            r#"{"transcript_id": "P02", "creativity_metrics": {"fluency": 4}}"#,
        );

        let summary = collect_metrics(dir.path()).unwrap();
        assert_eq!(summary.rows.len(), 1);
        assert_eq!(summary.warnings.len(), 1);
        assert_eq!(summary.rows[0].transcript_id, "P02");
    }

    #[test]
    fn test_missing_sections_default() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "P03_coded.json", r#"{"creativity_metrics": {}}"#);

        let summary = collect_metrics(dir.path()).unwrap();
        let row = &summary.rows[0];
        assert_eq!(row.transcript_id, "unknown");
        assert_eq!(row.fluency, None);
        assert_eq!(row.categories_used, "");
        assert_eq!(row.new_elaborations_count, 0);
    }

    #[test]
    fn test_empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = collect_metrics(dir.path()).unwrap_err();
        assert!(matches!(err, ExtractError::NoRows { .. }));
    }

    #[test]
    fn test_write_summaries() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "P01_coded.json",
            r#"{"transcript_id": "P01", "creativity_metrics": {"fluency": 3}}"#,
        );
        let summary = collect_metrics(dir.path()).unwrap();

        let json_path = dir.path().join("creativity_metrics_summary.json");
        let csv_path = dir.path().join("creativity_metrics_summary.csv");
        write_json_summary(&summary.rows, &json_path).unwrap();
        write_csv_summary(&summary.rows, &csv_path).unwrap();

        let reloaded: Vec<MetricsRow> =
            serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(reloaded.len(), 1);

        let csv_text = fs::read_to_string(&csv_path).unwrap();
        assert!(csv_text.starts_with("transcript_id,file_name"));
        assert!(csv_text.contains("P01_coded.json"));
    }
}
