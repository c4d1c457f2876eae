//! Report Rendering
//!
//! Turns pipeline outputs into run artifacts: the merged comparison CSV,
//! the text validation report and per-dimension plot data.

pub mod merged;
pub mod plots;
pub mod text;

pub use merged::{read_merged_csv, write_merged_csv, MergedTableError};
pub use plots::{build_plot_data, write_plot_files, BlandAltmanPoint, PlotData, PlotError, ScatterPoint};
pub use text::{render_validation_report, ReportContext};
