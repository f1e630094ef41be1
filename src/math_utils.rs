// src/math_utils.rs
use nalgebra::{DMatrix, DVector};
use statrs::function::erf;
use std::f64::consts::SQRT_2;

pub fn norm_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf::erf(x / SQRT_2))
}

/// Inverse standard normal CDF via Acklam's rational approximation.
///
/// Accurate to about 1.15e-9 absolute error over (0, 1). Used by the GBM
/// quantile function instead of any runtime statistical-fitting call.
pub fn inv_norm_cdf(p: f64) -> f64 {
    if !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];

    const P_LOW: f64 = 0.02425;
    let p_high = 1.0 - P_LOW;

    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= p_high {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -(((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    }
}

/// Linear-interpolation percentile, matching Excel's PERCENTILE.INC / NumPy's
/// default `np.percentile`. `pct` in `[0, 100]`.
pub fn percentile(sorted: &[f64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let pct = pct.clamp(0.0, 100.0);
    let rank = (pct / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let frac = rank - lo as f64;
    sorted[lo] + frac * (sorted[hi] - sorted[lo])
}

/// Compute several percentiles at once against a single sorted copy.
pub fn compute_quantiles(values: &[f64], pcts: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    pcts.iter().map(|p| percentile(&sorted, *p)).collect()
}

/// Running maximum drawdown series: `(running_max - equity) / running_max`,
/// zero wherever `running_max` is ~0.
pub fn compute_drawdown(equity: &[f64]) -> Vec<f64> {
    let mut running_max = f64::NEG_INFINITY;
    equity
        .iter()
        .map(|&v| {
            running_max = running_max.max(v);
            if running_max.abs() < 1e-10 {
                0.0
            } else {
                (running_max - v) / running_max
            }
        })
        .collect()
}

pub fn safe_divide(numerator: f64, denominator: f64, default: f64) -> f64 {
    if denominator.abs() < 1e-10 {
        default
    } else {
        numerator / denominator
    }
}

pub fn weighted_average(values: &[f64], weights: &[f64]) -> f64 {
    let total_weight: f64 = weights.iter().sum();
    let weighted_sum: f64 = values.iter().zip(weights).map(|(v, w)| v * w).sum();
    safe_divide(weighted_sum, total_weight, 0.0)
}

/// Empirical CDF evaluated at `x`: fraction of `values` that are `<= x`.
pub fn empirical_cdf(values: &[f64], x: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let count = values.iter().filter(|&&v| v <= x).count();
    count as f64 / values.len() as f64
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64], mean_val: f64) -> f64 {
    let variance =
        values.iter().map(|v| (v - mean_val).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Pearson correlation coefficient, returning `(r, two_sided_p_value)`.
/// The p-value uses the standard t-distribution approximation for the
/// test statistic `t = r * sqrt((n-2)/(1-r^2))`.
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> (f64, f64) {
    assert_eq!(x.len(), y.len(), "pearson_correlation requires equal-length inputs");
    let n = x.len();
    if n < 3 {
        return (0.0, 1.0);
    }
    let mx = mean(x);
    let my = mean(y);
    let sx = std_dev(x, mx);
    let sy = std_dev(y, my);
    if sx < 1e-10 || sy < 1e-10 {
        return (0.0, 1.0);
    }
    let cov: f64 = x.iter().zip(y).map(|(a, b)| (a - mx) * (b - my)).sum::<f64>() / n as f64;
    let r = (cov / (sx * sy)).clamp(-1.0, 1.0);
    let p = t_test_p_value_for_correlation(r, n);
    (r, p)
}

fn t_test_p_value_for_correlation(r: f64, n: usize) -> f64 {
    if n <= 2 || (1.0 - r * r).abs() < 1e-12 {
        return 0.0;
    }
    let df = (n - 2) as f64;
    let t = r * (df / (1.0 - r * r)).sqrt();
    2.0 * (1.0 - student_t_cdf(t.abs(), df))
}

/// Approximate Student's t CDF via the normal approximation with a
/// variance-stabilizing correction, adequate for the significance flags
/// sensitivity analytics reports (not a substitute for an exact solver).
fn student_t_cdf(t: f64, df: f64) -> f64 {
    let x = t / (1.0 + t * t / (4.0 * df)).sqrt();
    norm_cdf(x)
}

fn rank_values(values: &[f64]) -> Vec<f64> {
    let mut indexed: Vec<(usize, f64)> = values.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < indexed.len() {
        let mut j = i;
        while j + 1 < indexed.len() && (indexed[j + 1].1 - indexed[i].1).abs() < 1e-12 {
            j += 1;
        }
        let avg_rank = ((i + j) as f64 / 2.0) + 1.0;
        for k in indexed.iter().take(j + 1).skip(i) {
            ranks[k.0] = avg_rank;
        }
        i = j + 1;
    }
    ranks
}

/// Spearman rank correlation, returning `(rho, two_sided_p_value)`.
pub fn spearman_correlation(x: &[f64], y: &[f64]) -> (f64, f64) {
    let rx = rank_values(x);
    let ry = rank_values(y);
    pearson_correlation(&rx, &ry)
}

/// Ordinary least squares with an intercept column, returning
/// `(coefficients, r_squared)`. `coefficients[0]` is the intercept.
pub fn ols_regression(features: &[Vec<f64>], target: &[f64]) -> (Vec<f64>, f64) {
    let n = target.len();
    let k = features.len();
    assert!(n > 0 && k > 0, "ols_regression requires at least one feature and one sample");

    let mut x = DMatrix::<f64>::from_element(n, k + 1, 1.0);
    for (j, col) in features.iter().enumerate() {
        for i in 0..n {
            x[(i, j + 1)] = col[i];
        }
    }
    let y = DVector::from_row_slice(target);

    let xt = x.transpose();
    let xtx = &xt * &x;
    let xty = &xt * &y;

    let coeffs = match xtx.clone().lu().solve(&xty) {
        Some(sol) => sol,
        None => xtx.svd(true, true).solve(&xty, 1e-10).unwrap_or_else(|_| DVector::zeros(k + 1)),
    };

    let y_mean = mean(target);
    let predicted = &x * &coeffs;
    let ss_res: f64 = (0..n).map(|i| (y[i] - predicted[i]).powi(2)).sum();
    let ss_tot: f64 = (0..n).map(|i| (y[i] - y_mean).powi(2)).sum();
    let r_squared = safe_divide(ss_tot - ss_res, ss_tot, 0.0).clamp(0.0, 1.0);

    (coeffs.iter().copied().collect(), r_squared)
}

pub struct Timer {
    start_time: std::time::Instant,
}

impl Timer {
    pub fn new() -> Timer {
        Timer {
            start_time: std::time::Instant::now(),
        }
    }

    pub fn start(&mut self) {
        self.start_time = std::time::Instant::now();
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64() * 1000.0
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_norm_cdf_standard_points() {
        assert_relative_eq!(norm_cdf(0.0), 0.5, epsilon = 1e-9);
        assert_relative_eq!(norm_cdf(1.959964), 0.975, epsilon = 1e-4);
    }

    #[test]
    fn test_inv_norm_cdf_roundtrip() {
        for p in [0.001, 0.01, 0.1, 0.25, 0.5, 0.75, 0.9, 0.99, 0.999] {
            let z = inv_norm_cdf(p);
            assert_relative_eq!(norm_cdf(z), p, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_inv_norm_cdf_median_is_zero() {
        assert_relative_eq!(inv_norm_cdf(0.5), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_percentile_matches_known_values() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(percentile(&data, 0.0), 1.0);
        assert_relative_eq!(percentile(&data, 50.0), 3.0);
        assert_relative_eq!(percentile(&data, 100.0), 5.0);
        assert_relative_eq!(percentile(&data, 25.0), 2.0);
    }

    #[test]
    fn test_compute_drawdown() {
        let equity = vec![100.0, 120.0, 90.0, 95.0, 150.0, 130.0];
        let dd = compute_drawdown(&equity);
        assert_relative_eq!(dd[0], 0.0);
        assert_relative_eq!(dd[1], 0.0);
        assert_relative_eq!(dd[2], 0.25, epsilon = 1e-9);
        assert_relative_eq!(dd[4], 0.0);
        assert_relative_eq!(dd[5], (150.0 - 130.0) / 150.0, epsilon = 1e-9);
    }

    #[test]
    fn test_safe_divide_guards_zero() {
        assert_relative_eq!(safe_divide(10.0, 0.0, -1.0), -1.0);
        assert_relative_eq!(safe_divide(10.0, 2.0, -1.0), 5.0);
    }

    #[test]
    fn test_empirical_cdf() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(empirical_cdf(&values, 3.0), 0.6);
        assert_relative_eq!(empirical_cdf(&values, 0.0), 0.0);
        assert_relative_eq!(empirical_cdf(&values, 5.0), 1.0);
    }

    #[test]
    fn test_pearson_perfect_correlation() {
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let y = vec![2.0, 4.0, 6.0, 8.0, 10.0];
        let (r, _) = pearson_correlation(&x, &y);
        assert_relative_eq!(r, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_ols_recovers_linear_relationship() {
        let x1: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let y: Vec<f64> = x1.iter().map(|v| 3.0 + 2.0 * v).collect();
        let (coeffs, r2) = ols_regression(&[x1], &y);
        assert_relative_eq!(coeffs[0], 3.0, epsilon = 1e-6);
        assert_relative_eq!(coeffs[1], 2.0, epsilon = 1e-6);
        assert_relative_eq!(r2, 1.0, epsilon = 1e-6);
    }
}
