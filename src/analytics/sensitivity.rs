// src/analytics/sensitivity.rs
//! Sensitivity analytics: which realized parameters drive outcome
//! variation, by correlation, variance decomposition, and tornado swing.

use crate::error::{SimError, SimResult};
use crate::math_utils::{compute_quantiles, ols_regression, pearson_correlation, spearman_correlation};
use crate::simulation::PathResult;
use serde::{Deserialize, Serialize};

const PARAMETER_NAMES: [(&str, &str); 7] = [
    ("initial_capital", "Initial Capital"),
    ("dev_duration", "Dev Duration"),
    ("dev_burn", "Monthly Burn Rate"),
    ("leads_per_month", "Leads per Month"),
    ("win_rate_bumn", "BUMN Win Rate"),
    ("win_rate_open", "Open Win Rate"),
    ("annual_churn_rate", "Annual Churn Rate"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputMetric {
    Return,
    FinalCapital,
    MaxDrawdown,
    IsProfitable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TornadoItem {
    pub parameter: String,
    pub display_name: String,
    pub low_value: f64,
    pub base_value: f64,
    pub high_value: f64,
    pub output_at_low: f64,
    pub output_at_base: f64,
    pub output_at_high: f64,
    pub swing: f64,
    pub asymmetry: f64,
}

impl TornadoItem {
    pub fn downside_impact(&self) -> f64 {
        self.output_at_low - self.output_at_base
    }

    pub fn upside_impact(&self) -> f64 {
        self.output_at_high - self.output_at_base
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub parameter: String,
    pub output_metric: String,
    pub pearson_corr: f64,
    pub pearson_pvalue: f64,
    pub spearman_corr: f64,
    pub spearman_pvalue: f64,
}

impl CorrelationResult {
    pub fn is_significant(&self) -> bool {
        self.spearman_pvalue < 0.05
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarianceContribution {
    pub parameter: String,
    pub marginal_r2: f64,
    pub contribution_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityResult {
    pub tornado: Vec<TornadoItem>,
    pub correlations: Vec<CorrelationResult>,
    pub variance_contributions: Vec<VarianceContribution>,
    pub top_positive_drivers: Vec<String>,
    pub top_negative_drivers: Vec<String>,
    pub total_r2: f64,
}

/// Computes sensitivity of one output metric to the realized input
/// parameters, purely from the correlation structure of a completed
/// path corpus (no re-simulation).
pub struct SensitivityAnalyzer {
    outputs: Vec<f64>,
    inputs: Vec<(&'static str, &'static str, Vec<f64>)>,
    output_metric: OutputMetric,
    output_metric_name: String,
}

impl SensitivityAnalyzer {
    pub fn new(paths: &[PathResult], output_metric: OutputMetric) -> SimResult<Self> {
        if paths.is_empty() {
            return Err(SimError::EmptyCorpus {
                analysis: "sensitivity".to_string(),
            });
        }

        let outputs: Vec<f64> = paths
            .iter()
            .map(|p| match output_metric {
                OutputMetric::Return => p.total_return,
                OutputMetric::FinalCapital => p.final_capital,
                OutputMetric::MaxDrawdown => p.max_drawdown,
                OutputMetric::IsProfitable => {
                    if p.total_return > 0.0 {
                        1.0
                    } else {
                        0.0
                    }
                }
            })
            .collect();

        let inputs = PARAMETER_NAMES
            .iter()
            .map(|&(key, display)| {
                let values: Vec<f64> = paths
                    .iter()
                    .map(|p| *p.realized_params.as_map().get(key).unwrap_or(&0.0))
                    .collect();
                (key, display, values)
            })
            .collect();

        let output_metric_name = match output_metric {
            OutputMetric::Return => "return",
            OutputMetric::FinalCapital => "final_capital",
            OutputMetric::MaxDrawdown => "max_drawdown",
            OutputMetric::IsProfitable => "is_profitable",
        }
        .to_string();

        Ok(Self {
            outputs,
            inputs,
            output_metric,
            output_metric_name,
        })
    }

    fn has_variation(x: &[f64]) -> bool {
        std_dev(x) >= 1e-10
    }

    pub fn compute_correlations(&self) -> Vec<CorrelationResult> {
        let mut results: Vec<CorrelationResult> = self
            .inputs
            .iter()
            .filter(|(_, _, x)| Self::has_variation(x))
            .map(|(key, _, x)| {
                let (pearson_corr, pearson_pvalue) = pearson_correlation(x, &self.outputs);
                let (spearman_corr, spearman_pvalue) = spearman_correlation(x, &self.outputs);
                CorrelationResult {
                    parameter: key.to_string(),
                    output_metric: self.output_metric_name.clone(),
                    pearson_corr,
                    pearson_pvalue,
                    spearman_corr,
                    spearman_pvalue,
                }
            })
            .collect();

        results.sort_by(|a, b| {
            b.spearman_corr
                .abs()
                .partial_cmp(&a.spearman_corr.abs())
                .unwrap()
        });
        results
    }

    pub fn compute_variance_contributions(&self) -> (Vec<VarianceContribution>, f64) {
        let total_var = variance(&self.outputs);
        if total_var < 1e-10 {
            return (Vec::new(), 0.0);
        }

        let varying: Vec<&(&str, &str, Vec<f64>)> = self
            .inputs
            .iter()
            .filter(|(_, _, x)| Self::has_variation(x))
            .collect();

        let mut contributions: Vec<VarianceContribution> = varying
            .iter()
            .map(|(key, _, x)| {
                let (_, r2) = ols_regression(std::slice::from_ref(x), &self.outputs);
                VarianceContribution {
                    parameter: key.to_string(),
                    marginal_r2: r2,
                    contribution_pct: r2 * 100.0,
                }
            })
            .collect();

        contributions.sort_by(|a, b| b.marginal_r2.partial_cmp(&a.marginal_r2).unwrap());

        let total_r2 = if varying.is_empty() {
            0.0
        } else {
            let feature_cols: Vec<Vec<f64>> = varying.iter().map(|(_, _, x)| x.clone()).collect();
            let (_, r2) = ols_regression(&feature_cols, &self.outputs);
            r2
        };

        (contributions, total_r2)
    }

    pub fn compute_tornado(&self) -> Vec<TornadoItem> {
        let mut items: Vec<TornadoItem> = self
            .inputs
            .iter()
            .filter(|(_, _, x)| Self::has_variation(x))
            .map(|(key, display, x)| {
                let (coeffs, _) = ols_regression(std::slice::from_ref(x), &self.outputs);
                let intercept = coeffs[0];
                let slope = coeffs[1];

                let sorted_x = sorted_copy(x);
                let base_value = compute_quantiles(&sorted_x, &[50.0])[0];
                let low_value = compute_quantiles(&sorted_x, &[10.0])[0];
                let high_value = compute_quantiles(&sorted_x, &[90.0])[0];

                let output_at_low = intercept + slope * low_value;
                let output_at_high = intercept + slope * high_value;
                let output_at_base = intercept + slope * base_value;

                let swing = (output_at_high - output_at_low).abs();
                let upside = output_at_high - output_at_base;
                let downside = output_at_base - output_at_low;
                let asymmetry = (upside - downside) / (swing + 1e-10);

                TornadoItem {
                    parameter: key.to_string(),
                    display_name: display.to_string(),
                    low_value,
                    base_value,
                    high_value,
                    output_at_low,
                    output_at_base,
                    output_at_high,
                    swing,
                    asymmetry,
                }
            })
            .collect();

        items.sort_by(|a, b| b.swing.partial_cmp(&a.swing).unwrap());
        items
    }

    pub fn analyze(&self) -> SensitivityResult {
        let correlations = self.compute_correlations();
        let (variance_contributions, total_r2) = self.compute_variance_contributions();
        let tornado = self.compute_tornado();

        let top_positive_drivers = correlations
            .iter()
            .filter(|c| c.spearman_corr > 0.0 && c.is_significant())
            .take(3)
            .map(|c| c.parameter.clone())
            .collect();

        let top_negative_drivers = correlations
            .iter()
            .filter(|c| c.spearman_corr < 0.0 && c.is_significant())
            .take(3)
            .map(|c| c.parameter.clone())
            .collect();

        SensitivityResult {
            tornado,
            correlations,
            variance_contributions,
            top_positive_drivers,
            top_negative_drivers,
            total_r2,
        }
    }
}

fn sorted_copy(xs: &[f64]) -> Vec<f64> {
    let mut v = xs.to_vec();
    v.sort_by(|a, b| a.partial_cmp(b).unwrap());
    v
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn variance(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processes::Regime;
    use crate::simulation::RealizedParams;

    fn make_path(win_rate_bumn: f64, total_return: f64) -> PathResult {
        PathResult {
            initial_capital: 1_000_000.0,
            final_capital: 1_000_000.0 * (1.0 + total_return / 100.0),
            total_return,
            max_drawdown: 5.0,
            breakeven_month: -1,
            is_ruin: false,
            monthly_pnl: vec![0.0; 3],
            customer_series: vec![0; 4],
            equity_curve: vec![1_000_000.0; 4],
            regime_path: vec![Regime::Normal],
            months_in_stress: 0,
            total_shocks: 0,
            shock_timeline: Vec::new(),
            realized_params: RealizedParams {
                initial_capital: 1_000_000.0,
                dev_duration: 6.0,
                dev_burn: 100.0,
                leads_per_month: 5.0,
                win_rate_bumn,
                win_rate_open: 0.3,
                annual_churn_rate: 0.1,
            },
        }
    }

    fn sample_corpus() -> Vec<PathResult> {
        vec![
            make_path(0.2, -10.0),
            make_path(0.4, 20.0),
            make_path(0.6, 60.0),
            make_path(0.8, 90.0),
        ]
    }

    #[test]
    fn test_rejects_empty_corpus() {
        assert!(SensitivityAnalyzer::new(&[], OutputMetric::Return).is_err());
    }

    #[test]
    fn test_correlation_detects_strong_positive_driver() {
        let paths = sample_corpus();
        let analyzer = SensitivityAnalyzer::new(&paths, OutputMetric::Return).unwrap();
        let correlations = analyzer.compute_correlations();
        let win_rate = correlations
            .iter()
            .find(|c| c.parameter == "win_rate_bumn")
            .unwrap();
        assert!(win_rate.spearman_corr > 0.9);
    }

    #[test]
    fn test_variance_contributions_sorted_descending() {
        let paths = sample_corpus();
        let analyzer = SensitivityAnalyzer::new(&paths, OutputMetric::Return).unwrap();
        let (contributions, _) = analyzer.compute_variance_contributions();
        for w in contributions.windows(2) {
            assert!(w[0].marginal_r2 >= w[1].marginal_r2);
        }
    }

    #[test]
    fn test_tornado_sorted_by_swing_descending() {
        let paths = sample_corpus();
        let analyzer = SensitivityAnalyzer::new(&paths, OutputMetric::Return).unwrap();
        let tornado = analyzer.compute_tornado();
        for w in tornado.windows(2) {
            assert!(w[0].swing >= w[1].swing);
        }
    }

    #[test]
    fn test_analyze_identifies_top_positive_driver() {
        let paths = sample_corpus();
        let analyzer = SensitivityAnalyzer::new(&paths, OutputMetric::Return).unwrap();
        let result = analyzer.analyze();
        assert!(result.top_positive_drivers.contains(&"win_rate_bumn".to_string()));
    }
}
