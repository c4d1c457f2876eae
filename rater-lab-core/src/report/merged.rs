//! Merged Comparison Table
//!
//! Writes the aligned table as `merged_comparison.csv`, one row per aligned
//! subject with manual, automated, signed-difference and absolute-difference
//! columns per dimension. Difference columns are derived on write and
//! ignored on read; re-loading reproduces the manual and automated values
//! exactly.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, instrument};

use crate::contracts::{AlignedRow, AlignedTable, Dimension, PairedScore};

/// Errors while writing or reading the merged table.
#[derive(Debug, Error)]
pub enum MergedTableError {
    /// The CSV could not be written or read.
    #[error("merged table {path}: {source}")]
    Csv {
        /// File that failed.
        path: PathBuf,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// A header the reader requires is missing.
    #[error("merged table {path} is missing column {column}")]
    MissingColumn {
        /// File that failed.
        path: PathBuf,
        /// Column that was expected.
        column: String,
    },

    /// A numeric cell failed to parse.
    #[error("merged table {path} line {line}: bad value {value:?} for {column}")]
    BadValue {
        /// File that failed.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// Column the value was in.
        column: String,
        /// The offending cell text.
        value: String,
    },
}

fn csv_err(path: &Path) -> impl FnOnce(csv::Error) -> MergedTableError + '_ {
    move |source| MergedTableError::Csv { path: path.to_path_buf(), source }
}

fn format_cell(value: Option<f64>) -> String {
    // f64 Display is shortest round-trip, so re-parsing is lossless.
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Write the aligned table to `path` as CSV.
///
/// Every dimension is written, scored or not, so the merged table is a
/// complete record of what was loaded.
#[instrument(skip(table), fields(path = %path.display(), rows = table.len()))]
pub fn write_merged_csv(table: &AlignedTable, path: &Path) -> Result<(), MergedTableError> {
    let mut writer = csv::Writer::from_path(path).map_err(csv_err(path))?;

    let mut header = vec!["ParticipantID".to_string()];
    for dimension in Dimension::all() {
        for suffix in ["Manual", "Auto", "Diff", "AbsDiff"] {
            header.push(format!("{dimension}_{suffix}"));
        }
    }
    writer.write_record(&header).map_err(csv_err(path))?;

    for row in &table.rows {
        let mut record = vec![row.subject_id.clone()];
        for dimension in Dimension::all() {
            let pair = row.pair(dimension);
            record.push(format_cell(pair.manual));
            record.push(format_cell(pair.automated));
            record.push(format_cell(pair.difference()));
            record.push(format_cell(pair.abs_difference()));
        }
        writer.write_record(&record).map_err(csv_err(path))?;
    }

    writer.flush().map_err(|source| MergedTableError::Csv {
        path: path.to_path_buf(),
        source: csv::Error::from(source),
    })?;
    debug!("wrote merged comparison table");
    Ok(())
}

/// Read a merged table back from `path`.
///
/// Only the `_Manual` and `_Auto` columns are authoritative; difference
/// columns are recomputed from them.
#[instrument(fields(path = %path.display()))]
pub fn read_merged_csv(path: &Path) -> Result<AlignedTable, MergedTableError> {
    let mut reader = csv::Reader::from_path(path).map_err(csv_err(path))?;
    let headers = reader.headers().map_err(csv_err(path))?.clone();

    let position = |column: &str| -> Result<usize, MergedTableError> {
        headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| MergedTableError::MissingColumn {
                path: path.to_path_buf(),
                column: column.to_string(),
            })
    };

    let id_index = position("ParticipantID")?;
    let mut dim_indices = Vec::new();
    for dimension in Dimension::all() {
        let manual = position(&format!("{dimension}_Manual"))?;
        let auto = position(&format!("{dimension}_Auto"))?;
        dim_indices.push((dimension, manual, auto));
    }

    let parse_cell = |cell: &str, column: &str, line: usize| -> Result<Option<f64>, MergedTableError> {
        if cell.is_empty() {
            return Ok(None);
        }
        cell.parse::<f64>().map(Some).map_err(|_| MergedTableError::BadValue {
            path: path.to_path_buf(),
            line,
            column: column.to_string(),
            value: cell.to_string(),
        })
    };

    let mut rows = Vec::new();
    for (row_number, result) in reader.records().enumerate() {
        let line = row_number + 2;
        let record = result.map_err(csv_err(path))?;
        let subject_id = record.get(id_index).unwrap_or("").to_string();

        let mut scores = BTreeMap::new();
        for (dimension, manual_idx, auto_idx) in &dim_indices {
            let manual = parse_cell(
                record.get(*manual_idx).unwrap_or(""),
                &format!("{dimension}_Manual"),
                line,
            )?;
            let automated = parse_cell(
                record.get(*auto_idx).unwrap_or(""),
                &format!("{dimension}_Auto"),
                line,
            )?;
            scores.insert(*dimension, PairedScore { manual, automated });
        }
        rows.push(AlignedRow { subject_id, scores });
    }

    Ok(AlignedTable { rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> AlignedTable {
        let mut a = BTreeMap::new();
        a.insert(
            Dimension::Fluency,
            PairedScore { manual: Some(10.0), automated: Some(12.0) },
        );
        a.insert(
            Dimension::Flexibility,
            PairedScore { manual: Some(4.5), automated: None },
        );
        a.insert(
            Dimension::ElabDensity,
            PairedScore { manual: Some(0.7142857142857143), automated: Some(0.75) },
        );

        AlignedTable {
            rows: vec![AlignedRow { subject_id: "P01".into(), scores: a }],
        }
    }

    #[test]
    fn test_round_trip_preserves_values_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("merged_comparison.csv");

        let table = sample_table();
        write_merged_csv(&table, &path).unwrap();
        let reloaded = read_merged_csv(&path).unwrap();

        assert_eq!(reloaded.len(), 1);
        let row = &reloaded.rows[0];
        assert_eq!(row.subject_id, "P01");
        assert_eq!(row.pair(Dimension::Fluency).manual, Some(10.0));
        assert_eq!(row.pair(Dimension::Fluency).automated, Some(12.0));
        assert_eq!(row.pair(Dimension::Flexibility).automated, None);
        assert_eq!(
            row.pair(Dimension::ElabDensity).manual,
            Some(0.7142857142857143)
        );
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("merged.csv");
        std::fs::write(&path, "ParticipantID,Fluency_Manual\nP01,3\n").unwrap();

        let err = read_merged_csv(&path).unwrap_err();
        assert!(matches!(err, MergedTableError::MissingColumn { .. }));
    }

    #[test]
    fn test_bad_cell_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("merged_comparison.csv");
        write_merged_csv(&sample_table(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let corrupted = text.replace("12", "twelve");
        std::fs::write(&path, corrupted).unwrap();

        let err = read_merged_csv(&path).unwrap_err();
        assert!(matches!(err, MergedTableError::BadValue { .. }));
    }
}
