//! Text Report
//!
//! Renders the human-readable `validation_report.txt`: agreement statistics
//! per dimension, interpretation tiers, discrepancies, alignment mismatches
//! and the overall conclusion.

use std::fmt::Write as _;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use crate::contracts::{
    AgreementSummary, AlignmentReport, DimensionAgreement, DiscrepancyFlag, OverallConclusion,
    RunWarning,
};

const RULE_HEAVY: &str = "======================================================================";
const RULE_LIGHT: &str = "----------------------------------------------------------------------";

/// Everything the text report needs, already computed.
#[derive(Debug, Clone)]
pub struct ReportContext<'a> {
    /// Alignment counts and set differences.
    pub alignment: &'a AlignmentReport,
    /// Per-dimension agreement statistics.
    pub summary: &'a AgreementSummary,
    /// Discrepancy flags, in subject order.
    pub flags: &'a [DiscrepancyFlag],
    /// Overall verdict.
    pub conclusion: OverallConclusion,
    /// Threshold the flags were computed with.
    pub discrepancy_threshold: f64,
    /// Accumulated run warnings.
    pub warnings: &'a [RunWarning],
    /// Decimal places for reported statistics.
    pub precision: u32,
}

/// Round a value for display. Falls back to plain formatting if the value
/// is outside Decimal range.
fn rounded(value: f64, precision: u32) -> String {
    match Decimal::from_f64(value) {
        Some(d) => d.round_dp(precision).normalize().to_string(),
        None => format!("{value}"),
    }
}

fn opt(value: Option<f64>, precision: u32) -> String {
    match value {
        Some(v) => rounded(v, precision),
        None => "n/a".to_string(),
    }
}

/// Render the full validation report as a string.
pub fn render_validation_report(ctx: &ReportContext<'_>) -> String {
    let mut out = String::new();
    let p = ctx.precision;

    let _ = writeln!(out, "{RULE_HEAVY}");
    let _ = writeln!(out, "VALIDATION REPORT: Manual vs Automated Coding");
    let _ = writeln!(out, "{RULE_HEAVY}");
    let _ = writeln!(out);
    let _ = writeln!(out, "Sample Size: {} participants", ctx.alignment.aligned_count);
    if !ctx.alignment.manual_only.is_empty() {
        let _ = writeln!(
            out,
            "Manual only (no automated coding): {}",
            join_ids(&ctx.alignment.manual_only)
        );
    }
    if !ctx.alignment.automated_only.is_empty() {
        let _ = writeln!(
            out,
            "Automated only (no manual coding): {}",
            join_ids(&ctx.alignment.automated_only)
        );
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "{RULE_LIGHT}");
    let _ = writeln!(out, "AGREEMENT STATISTICS");
    let _ = writeln!(out, "{RULE_LIGHT}");
    let _ = writeln!(out);

    for (dimension, agreement) in ctx.summary {
        let _ = writeln!(out, "{dimension}:");
        match agreement {
            DimensionAgreement::NoValidData => {
                let _ = writeln!(out, "  No valid pairs; statistics unavailable.");
            }
            DimensionAgreement::Computed(result) => {
                let r = opt(result.correlation, p);
                let p_text = match result.p_value {
                    Some(pv) => format!(" (p = {})", rounded(pv, 4)),
                    None => String::new(),
                };
                let _ = writeln!(out, "  Pearson correlation: r = {r}{p_text}");
                if let Some(tier) = result.correlation_tier() {
                    let _ = writeln!(out, "  Interpretation: {tier}");
                }
                let _ = writeln!(out, "  ICC(2,1): {}", opt(result.icc, p));
                if let Some(tier) = result.icc_tier() {
                    let _ = writeln!(out, "  Reliability: {tier}");
                }
                let _ = writeln!(out, "  Mean Absolute Error: {}", rounded(result.mae, p));
                let _ = writeln!(
                    out,
                    "  Mean Difference: {} ± {}",
                    rounded(result.mean_difference, p),
                    opt(result.std_difference, p)
                );
                if let Some((lower, upper)) = result.limits_of_agreement() {
                    let _ = writeln!(
                        out,
                        "  Limits of Agreement: [{}, {}]",
                        rounded(lower, p),
                        rounded(upper, p)
                    );
                }
                let _ = writeln!(out, "  Sample size: n = {}", result.n);
            }
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "{RULE_LIGHT}");
    let _ = writeln!(
        out,
        "DISCREPANCIES (|manual - automated| >= {})",
        rounded(ctx.discrepancy_threshold, p)
    );
    let _ = writeln!(out, "{RULE_LIGHT}");
    let _ = writeln!(out);
    if ctx.flags.is_empty() {
        let _ = writeln!(out, "No discrepancies at this threshold.");
    } else {
        for flag in ctx.flags {
            let _ = writeln!(
                out,
                "  {} {}: manual = {}, automated = {} (diff = {})",
                flag.subject_id,
                flag.dimension,
                rounded(flag.manual_value, p),
                rounded(flag.automated_value, p),
                rounded(flag.difference, p)
            );
        }
    }
    let _ = writeln!(out);

    if !ctx.warnings.is_empty() {
        let _ = writeln!(out, "{RULE_LIGHT}");
        let _ = writeln!(out, "WARNINGS");
        let _ = writeln!(out, "{RULE_LIGHT}");
        let _ = writeln!(out);
        for warning in ctx.warnings {
            let _ = writeln!(out, "  {warning}");
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "{RULE_LIGHT}");
    let _ = writeln!(out, "INTERPRETATION");
    let _ = writeln!(out, "{RULE_LIGHT}");
    let _ = writeln!(out);
    let _ = writeln!(out, "CONCLUSION: {}", ctx.conclusion.conclusion_text());
    let _ = writeln!(out, "Recommendation: {}", ctx.conclusion.recommendation_text());

    out
}

fn join_ids(ids: &std::collections::BTreeSet<String>) -> String {
    ids.iter().cloned().collect::<Vec<_>>().join(", ")
}
