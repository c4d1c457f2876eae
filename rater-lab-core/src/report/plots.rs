//! Plot Data
//!
//! Emits the data behind the comparison plots as JSON, one file per
//! dimension under `plots/`. Each file carries a scatter panel (manual vs
//! automated with an identity-line range) and a Bland-Altman panel (pair
//! midpoint vs signed difference with the mean and ±1.96·SD limits).
//! Rendering images from this data is an external concern.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::contracts::{AgreementResult, AlignedTable, Dimension};

/// Errors while writing plot data.
#[derive(Debug, Error)]
pub enum PlotError {
    /// The plots directory could not be created.
    #[error("cannot create plots directory {path}: {source}")]
    CreateDir {
        /// Directory that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A plot file could not be written.
    #[error("cannot write plot file {path}: {source}")]
    Write {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Plot data failed to serialize.
    #[error("cannot serialize plot data: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// One point on the manual-vs-automated scatter panel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScatterPoint {
    /// Subject's manual value (x-axis).
    pub manual: f64,
    /// Subject's automated value (y-axis).
    pub automated: f64,
}

/// One point on the Bland-Altman panel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BlandAltmanPoint {
    /// Midpoint of the two values (x-axis).
    pub mean: f64,
    /// Signed difference, manual minus automated (y-axis).
    pub difference: f64,
}

/// Plot data for one dimension.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotData {
    /// Dimension the panels describe.
    pub dimension: Dimension,

    /// Scatter points, one per valid pair, in subject order.
    pub scatter: Vec<ScatterPoint>,

    /// Identity-line range covering both axes: (min, max) over all values.
    pub identity_range: (f64, f64),

    /// Bland-Altman points, one per valid pair, in subject order.
    pub bland_altman: Vec<BlandAltmanPoint>,

    /// Mean signed difference (the Bland-Altman center line).
    pub mean_difference: f64,

    /// ±1.96·SD limits of agreement, when the sample supports them.
    pub limits_of_agreement: Option<(f64, f64)>,
}

/// Build plot data for one dimension over its valid pairs.
///
/// `None` when the dimension has no valid pairs.
pub fn build_plot_data(
    table: &AlignedTable,
    result: &AgreementResult,
) -> Option<PlotData> {
    let pairs = table.valid_pairs(result.dimension);
    if pairs.is_empty() {
        return None;
    }

    let scatter: Vec<ScatterPoint> = pairs
        .iter()
        .map(|(manual, automated)| ScatterPoint { manual: *manual, automated: *automated })
        .collect();

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for (m, a) in &pairs {
        min = min.min(*m).min(*a);
        max = max.max(*m).max(*a);
    }

    let bland_altman: Vec<BlandAltmanPoint> = pairs
        .iter()
        .map(|(m, a)| BlandAltmanPoint { mean: (m + a) / 2.0, difference: m - a })
        .collect();

    Some(PlotData {
        dimension: result.dimension,
        scatter,
        identity_range: (min, max),
        bland_altman,
        mean_difference: result.mean_difference,
        limits_of_agreement: result.limits_of_agreement(),
    })
}

/// Write one `{Dimension}_comparison.json` per computed dimension into
/// `plots/` under the output directory. Returns the paths written.
#[instrument(skip(table, results), fields(out_dir = %out_dir.display()))]
pub fn write_plot_files(
    table: &AlignedTable,
    results: &[&AgreementResult],
    out_dir: &Path,
) -> Result<Vec<PathBuf>, PlotError> {
    let plots_dir = out_dir.join("plots");
    fs::create_dir_all(&plots_dir).map_err(|source| PlotError::CreateDir {
        path: plots_dir.clone(),
        source,
    })?;

    let mut written = Vec::new();
    for result in results {
        let Some(data) = build_plot_data(table, result) else {
            continue;
        };
        let path = plots_dir.join(format!("{}_comparison.json", result.dimension));
        let json = serde_json::to_string_pretty(&data)?;
        fs::write(&path, json).map_err(|source| PlotError::Write {
            path: path.clone(),
            source,
        })?;
        written.push(path);
    }

    debug!(files = written.len(), "wrote plot data");
    Ok(written)
}
