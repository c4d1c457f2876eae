//! Statistical Primitives
//!
//! Hand-computed descriptive and inferential statistics over paired rater
//! scores. Every function returns `None` instead of NaN or infinity when the
//! sample is too small or degenerate for the statistic.

use statrs::distribution::{ContinuousCDF, StudentsT};

/// Tolerance below which a variance term is treated as zero.
const EPSILON: f64 = 1e-12;

/// Arithmetic mean. `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator). `None` for fewer than two
/// values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Mean absolute error over paired values. `None` for an empty slice.
pub fn mean_absolute_error(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.is_empty() {
        return None;
    }
    let total: f64 = pairs.iter().map(|(a, b)| (a - b).abs()).sum();
    Some(total / pairs.len() as f64)
}

/// Pearson product-moment correlation.
///
/// `None` for fewer than two pairs or when either side has zero variance.
pub fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    let n = pairs.len();
    if n < 2 {
        return None;
    }
    let xs: Vec<f64> = pairs.iter().map(|(x, _)| *x).collect();
    let ys: Vec<f64> = pairs.iter().map(|(_, y)| *y).collect();
    let mx = mean(&xs)?;
    let my = mean(&ys)?;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in pairs {
        let dx = x - mx;
        let dy = y - my;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x < EPSILON || var_y < EPSILON {
        return None;
    }
    let r = cov / (var_x.sqrt() * var_y.sqrt());
    // Floating-point roundoff can push |r| microscopically past 1.
    Some(r.clamp(-1.0, 1.0))
}

/// Two-sided p-value for a Pearson correlation under the null of r = 0.
///
/// Uses the exact t transform t = r * sqrt((n - 2) / (1 - r^2)) with n - 2
/// degrees of freedom. `None` for fewer than three pairs; a perfect
/// correlation yields p = 0.
pub fn pearson_p_value(r: f64, n: usize) -> Option<f64> {
    if n < 3 {
        return None;
    }
    let df = (n - 2) as f64;
    let denom = 1.0 - r * r;
    if denom < EPSILON {
        return Some(0.0);
    }
    let t = r * (df / denom).sqrt();
    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    let p = 2.0 * (1.0 - dist.cdf(t.abs()));
    Some(p.clamp(0.0, 1.0))
}

/// Intraclass correlation coefficient ICC(2,1), two-way random effects,
/// absolute agreement, single rater.
///
/// Computed from the two-way ANOVA decomposition with k = 2 raters. `None`
/// for fewer than two subjects or when the variance decomposition is
/// degenerate.
pub fn icc_2_1(pairs: &[(f64, f64)]) -> Option<f64> {
    let n = pairs.len();
    if n < 2 {
        return None;
    }
    let k = 2.0;
    let nf = n as f64;

    let grand = pairs.iter().map(|(a, b)| a + b).sum::<f64>() / (k * nf);
    let col_a = pairs.iter().map(|(a, _)| *a).sum::<f64>() / nf;
    let col_b = pairs.iter().map(|(_, b)| *b).sum::<f64>() / nf;

    let ss_rows: f64 = pairs
        .iter()
        .map(|(a, b)| {
            let row_mean = (a + b) / k;
            k * (row_mean - grand).powi(2)
        })
        .sum();
    let ss_cols = nf * ((col_a - grand).powi(2) + (col_b - grand).powi(2));
    let ss_total: f64 = pairs
        .iter()
        .flat_map(|(a, b)| [a, b])
        .map(|v| (v - grand).powi(2))
        .sum();
    let ss_error = (ss_total - ss_rows - ss_cols).max(0.0);

    let ms_rows = ss_rows / (nf - 1.0);
    let ms_cols = ss_cols / (k - 1.0);
    let ms_error = ss_error / ((nf - 1.0) * (k - 1.0));

    let denominator = ms_rows + (k - 1.0) * ms_error + k * (ms_cols - ms_error) / nf;
    if denominator.abs() < EPSILON {
        return None;
    }
    let icc = (ms_rows - ms_error) / denominator;
    if icc.is_finite() {
        Some(icc)
    } else {
        None
    }
}
