// src/analytics/risk.rs
//! Risk analytics over a completed path corpus: VaR/CVaR, drawdown,
//! survival, underwater time, and tail decomposition.

use crate::error::{SimError, SimResult};
use crate::math_utils::percentile;
use crate::simulation::PathResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarResult {
    pub confidence_level: f64,
    pub var_absolute: f64,
    pub var_relative: f64,
    pub threshold_capital: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvarResult {
    pub confidence_level: f64,
    pub cvar_absolute: f64,
    pub cvar_relative: f64,
    pub n_tail_scenarios: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawdownAnalysis {
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
    pub max_observed: f64,
    pub avg_time_to_max_dd: f64,
    /// `-1.0` when no path recovered from its own max drawdown.
    pub avg_recovery_time: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurvivalAnalysis {
    pub survival_curve: Vec<f64>,
    pub hazard_rates: Vec<f64>,
    pub median_survival_time: Option<f64>,
    pub p10_survival_time: Option<f64>,
    pub terminal_survival_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnderwaterAnalysis {
    pub mean_months_underwater: f64,
    pub median_months_underwater: f64,
    pub max_months_underwater: f64,
    pub underwater_probability_curve: Vec<f64>,
    pub mean_max_streak: f64,
    pub p95_max_streak: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TailAnalysis {
    pub tail_threshold_return: f64,
    pub n_tail_paths: usize,
    pub tail_mean_return: f64,
    pub tail_mean_final_capital: f64,
    pub tail_ruin_rate: f64,
    pub tail_parameter_means: HashMap<String, f64>,
    pub tail_vs_population_delta: HashMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAnalysisResult {
    pub var: HashMap<String, VarResult>,
    pub cvar: HashMap<String, CvarResult>,
    pub drawdown: DrawdownAnalysis,
    pub survival: SurvivalAnalysis,
    pub underwater: UnderwaterAnalysis,
    pub tail: TailAnalysis,
}

const REALIZED_PARAM_NAMES: [&str; 7] = [
    "initial_capital",
    "dev_duration",
    "dev_burn",
    "leads_per_month",
    "win_rate_bumn",
    "win_rate_open",
    "annual_churn_rate",
];

/// Computes the full risk-analytics suite over one path corpus.
pub struct RiskAnalyzer<'a> {
    paths: &'a [PathResult],
    confidence_levels: Vec<f64>,
    initial_capitals: Vec<f64>,
    final_capitals: Vec<f64>,
    returns: Vec<f64>,
    max_drawdowns: Vec<f64>,
    is_ruin: Vec<bool>,
    losses: Vec<f64>,
    time_horizon: usize,
}

impl<'a> RiskAnalyzer<'a> {
    pub fn new(paths: &'a [PathResult], confidence_levels: Option<Vec<f64>>) -> SimResult<Self> {
        if paths.is_empty() {
            return Err(SimError::EmptyCorpus {
                analysis: "risk".to_string(),
            });
        }
        let initial_capitals: Vec<f64> = paths.iter().map(|p| p.initial_capital).collect();
        let final_capitals: Vec<f64> = paths.iter().map(|p| p.final_capital).collect();
        let returns: Vec<f64> = paths.iter().map(|p| p.total_return).collect();
        let max_drawdowns: Vec<f64> = paths.iter().map(|p| p.max_drawdown).collect();
        let is_ruin: Vec<bool> = paths.iter().map(|p| p.is_ruin).collect();
        let losses: Vec<f64> = initial_capitals
            .iter()
            .zip(&final_capitals)
            .map(|(i, f)| i - f)
            .collect();
        let time_horizon = paths[0].equity_curve.len() - 1;

        Ok(Self {
            paths,
            confidence_levels: confidence_levels.unwrap_or_else(|| vec![0.90, 0.95, 0.99]),
            initial_capitals,
            final_capitals,
            returns,
            max_drawdowns,
            is_ruin,
            losses,
            time_horizon,
        })
    }

    fn avg_initial_capital(&self) -> f64 {
        self.initial_capitals.iter().sum::<f64>() / self.initial_capitals.len() as f64
    }

    pub fn compute_var(&self, confidence: f64) -> VarResult {
        let sorted = sorted_copy(&self.losses);
        let var_absolute = percentile(&sorted, confidence * 100.0);
        let avg_initial = self.avg_initial_capital();
        VarResult {
            confidence_level: confidence,
            var_absolute,
            var_relative: var_absolute / avg_initial * 100.0,
            threshold_capital: avg_initial - var_absolute,
        }
    }

    pub fn compute_cvar(&self, confidence: f64) -> CvarResult {
        let sorted = sorted_copy(&self.losses);
        let threshold = percentile(&sorted, confidence * 100.0);
        let tail: Vec<f64> = self
            .losses
            .iter()
            .copied()
            .filter(|&l| l >= threshold)
            .collect();
        let cvar_absolute = if tail.is_empty() {
            threshold
        } else {
            tail.iter().sum::<f64>() / tail.len() as f64
        };
        let avg_initial = self.avg_initial_capital();
        CvarResult {
            confidence_level: confidence,
            cvar_absolute,
            cvar_relative: cvar_absolute / avg_initial * 100.0,
            n_tail_scenarios: tail.len(),
        }
    }

    pub fn compute_drawdown_analysis(&self) -> DrawdownAnalysis {
        let dd = &self.max_drawdowns;
        let n = dd.len() as f64;
        let mean = dd.iter().sum::<f64>() / n;
        let std = (dd.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n).sqrt();
        let sorted = sorted_copy(dd);
        let max_observed = *dd.iter().fold(&f64::MIN, |a, b| if b > a { b } else { a });

        let mut time_to_max_dd = Vec::with_capacity(self.paths.len());
        let mut recovery_times = Vec::new();

        for path in self.paths {
            let curve = &path.equity_curve;
            let mut running_max = f64::NEG_INFINITY;
            let mut best_month = 0usize;
            let mut best_dd = f64::NEG_INFINITY;
            let mut running_maxes = Vec::with_capacity(curve.len());
            for (month, &v) in curve.iter().enumerate() {
                running_max = running_max.max(v);
                running_maxes.push(running_max);
                let dd_here = if running_max > 0.0 {
                    (running_max - v) / running_max
                } else {
                    0.0
                };
                if dd_here > best_dd {
                    best_dd = dd_here;
                    best_month = month;
                }
            }
            time_to_max_dd.push(best_month as f64);

            if best_month < curve.len() - 1 {
                let peak_at_max_dd = running_maxes[best_month];
                for (m, &v) in curve.iter().enumerate().skip(best_month + 1) {
                    if v >= peak_at_max_dd {
                        recovery_times.push((m - best_month) as f64);
                        break;
                    }
                }
            }
        }

        let avg_time_to_max_dd = time_to_max_dd.iter().sum::<f64>() / time_to_max_dd.len() as f64;
        let avg_recovery_time = if recovery_times.is_empty() {
            -1.0
        } else {
            recovery_times.iter().sum::<f64>() / recovery_times.len() as f64
        };

        DrawdownAnalysis {
            mean,
            median: percentile(&sorted, 50.0),
            std,
            p75: percentile(&sorted, 75.0),
            p90: percentile(&sorted, 90.0),
            p95: percentile(&sorted, 95.0),
            p99: percentile(&sorted, 99.0),
            max_observed,
            avg_time_to_max_dd,
            avg_recovery_time,
        }
    }

    pub fn compute_survival_analysis(&self) -> SurvivalAnalysis {
        let n = self.paths.len() as f64;
        let mut survival_curve = Vec::with_capacity(self.time_horizon + 1);
        for month in 0..=self.time_horizon {
            let survived = self
                .paths
                .iter()
                .filter(|p| p.equity_curve[month] > 0.0)
                .count() as f64
                / n;
            survival_curve.push(survived);
        }

        let mut hazard_rates = vec![0.0];
        for month in 1..=self.time_horizon {
            let prev = survival_curve[month - 1];
            let hazard = if prev > 0.0 {
                (prev - survival_curve[month]) / prev
            } else {
                0.0
            };
            hazard_rates.push(hazard);
        }

        let median_survival_time = survival_curve
            .iter()
            .position(|&s| s < 0.5)
            .map(|m| m as f64);
        let p10_survival_time = survival_curve
            .iter()
            .position(|&s| s < 0.9)
            .map(|m| m as f64);

        SurvivalAnalysis {
            terminal_survival_rate: *survival_curve.last().unwrap(),
            survival_curve,
            hazard_rates,
            median_survival_time,
            p10_survival_time,
        }
    }

    pub fn compute_underwater_analysis(&self) -> UnderwaterAnalysis {
        let n_paths = self.paths.len();
        let n_months = self.time_horizon + 1;

        let mut months_underwater = Vec::with_capacity(n_paths);
        let mut underwater_counts = vec![0usize; n_months];
        let mut max_streaks = Vec::with_capacity(n_paths);

        for (path, &initial) in self.paths.iter().zip(&self.initial_capitals) {
            let mut count = 0usize;
            let mut max_streak = 0usize;
            let mut current_streak = 0usize;
            for (month, &v) in path.equity_curve.iter().enumerate() {
                let underwater = v < initial;
                if underwater {
                    count += 1;
                    underwater_counts[month] += 1;
                    current_streak += 1;
                    max_streak = max_streak.max(current_streak);
                } else {
                    current_streak = 0;
                }
            }
            months_underwater.push(count as f64);
            max_streaks.push(max_streak as f64);
        }

        let underwater_probability_curve: Vec<f64> = underwater_counts
            .iter()
            .map(|&c| c as f64 / n_paths as f64)
            .collect();

        let sorted_months = sorted_copy(&months_underwater);
        let sorted_streaks = sorted_copy(&max_streaks);

        UnderwaterAnalysis {
            mean_months_underwater: months_underwater.iter().sum::<f64>() / n_paths as f64,
            median_months_underwater: percentile(&sorted_months, 50.0),
            max_months_underwater: *sorted_months.last().unwrap(),
            underwater_probability_curve,
            mean_max_streak: max_streaks.iter().sum::<f64>() / n_paths as f64,
            p95_max_streak: percentile(&sorted_streaks, 95.0),
        }
    }

    pub fn compute_tail_analysis(&self, tail_percentile: f64) -> TailAnalysis {
        let sorted_returns = sorted_copy(&self.returns);
        let tail_threshold = percentile(&sorted_returns, tail_percentile);

        let tail_indices: Vec<usize> = self
            .returns
            .iter()
            .enumerate()
            .filter(|(_, &r)| r <= tail_threshold)
            .map(|(i, _)| i)
            .collect();

        let tail_returns: Vec<f64> = tail_indices.iter().map(|&i| self.returns[i]).collect();
        let tail_finals: Vec<f64> = tail_indices.iter().map(|&i| self.final_capitals[i]).collect();
        let tail_ruin_rate = tail_indices.iter().filter(|&&i| self.is_ruin[i]).count() as f64
            / tail_indices.len().max(1) as f64;

        let mut tail_parameter_means = HashMap::new();
        let mut tail_vs_population_delta = HashMap::new();

        for &param in REALIZED_PARAM_NAMES.iter() {
            let pop_values: Vec<f64> = self
                .paths
                .iter()
                .map(|p| *p.realized_params.as_map().get(param).unwrap_or(&0.0))
                .collect();
            let pop_mean = pop_values.iter().sum::<f64>() / pop_values.len() as f64;

            let tail_values: Vec<f64> = tail_indices.iter().map(|&i| pop_values[i]).collect();
            let tail_mean = if tail_values.is_empty() {
                pop_mean
            } else {
                tail_values.iter().sum::<f64>() / tail_values.len() as f64
            };

            let delta = if pop_mean.abs() > 1e-12 {
                (tail_mean - pop_mean) / pop_mean * 100.0
            } else {
                0.0
            };

            tail_parameter_means.insert(param.to_string(), tail_mean);
            tail_vs_population_delta.insert(param.to_string(), delta);
        }

        TailAnalysis {
            tail_threshold_return: tail_threshold,
            n_tail_paths: tail_indices.len(),
            tail_mean_return: tail_returns.iter().sum::<f64>() / tail_returns.len().max(1) as f64,
            tail_mean_final_capital: tail_finals.iter().sum::<f64>() / tail_finals.len().max(1) as f64,
            tail_ruin_rate,
            tail_parameter_means,
            tail_vs_population_delta,
        }
    }

    pub fn analyze(&self) -> RiskAnalysisResult {
        let mut var = HashMap::new();
        let mut cvar = HashMap::new();
        for &conf in &self.confidence_levels {
            let key = ((conf * 100.0).round() as i64).to_string();
            var.insert(key.clone(), self.compute_var(conf));
            cvar.insert(key, self.compute_cvar(conf));
        }

        RiskAnalysisResult {
            var,
            cvar,
            drawdown: self.compute_drawdown_analysis(),
            survival: self.compute_survival_analysis(),
            underwater: self.compute_underwater_analysis(),
            tail: self.compute_tail_analysis(5.0),
        }
    }
}

fn sorted_copy(xs: &[f64]) -> Vec<f64> {
    let mut v = xs.to_vec();
    v.sort_by(|a, b| a.partial_cmp(b).unwrap());
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processes::Regime;
    use crate::simulation::RealizedParams;

    fn make_path(final_capital: f64, is_ruin: bool, equity_curve: Vec<f64>) -> PathResult {
        let initial_capital = equity_curve[0];
        PathResult {
            initial_capital,
            final_capital,
            total_return: (final_capital - initial_capital) / initial_capital * 100.0,
            max_drawdown: 10.0,
            breakeven_month: -1,
            is_ruin,
            monthly_pnl: vec![0.0; equity_curve.len() - 1],
            customer_series: vec![0; equity_curve.len()],
            equity_curve,
            regime_path: vec![Regime::Normal],
            months_in_stress: 0,
            total_shocks: 0,
            shock_timeline: Vec::new(),
            realized_params: RealizedParams {
                initial_capital,
                dev_duration: 6.0,
                dev_burn: 100.0,
                leads_per_month: 5.0,
                win_rate_bumn: 0.5,
                win_rate_open: 0.3,
                annual_churn_rate: 0.1,
            },
        }
    }

    fn sample_corpus() -> Vec<PathResult> {
        vec![
            make_path(2_000_000.0, false, vec![1_000_000.0, 900_000.0, 1_200_000.0, 2_000_000.0]),
            make_path(500_000.0, false, vec![1_000_000.0, 700_000.0, 600_000.0, 500_000.0]),
            make_path(0.0, true, vec![1_000_000.0, 500_000.0, 0.0, 0.0]),
            make_path(1_500_000.0, false, vec![1_000_000.0, 1_100_000.0, 1_300_000.0, 1_500_000.0]),
        ]
    }

    #[test]
    fn test_rejects_empty_corpus() {
        assert!(RiskAnalyzer::new(&[], None).is_err());
    }

    #[test]
    fn test_var_is_nonnegative_when_losses_exist() {
        let paths = sample_corpus();
        let analyzer = RiskAnalyzer::new(&paths, None).unwrap();
        let var95 = analyzer.compute_var(0.95);
        assert!(var95.var_absolute > 0.0);
    }

    #[test]
    fn test_cvar_at_least_var() {
        let paths = sample_corpus();
        let analyzer = RiskAnalyzer::new(&paths, None).unwrap();
        let var95 = analyzer.compute_var(0.95);
        let cvar95 = analyzer.compute_cvar(0.95);
        assert!(cvar95.cvar_absolute >= var95.var_absolute - 1e-9);
    }

    #[test]
    fn test_survival_curve_terminal_matches_non_ruin_fraction() {
        let paths = sample_corpus();
        let analyzer = RiskAnalyzer::new(&paths, None).unwrap();
        let survival = analyzer.compute_survival_analysis();
        assert!((survival.terminal_survival_rate - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_underwater_probability_curve_has_expected_length() {
        let paths = sample_corpus();
        let analyzer = RiskAnalyzer::new(&paths, None).unwrap();
        let underwater = analyzer.compute_underwater_analysis();
        assert_eq!(underwater.underwater_probability_curve.len(), 4);
    }

    #[test]
    fn test_tail_analysis_covers_requested_percentile() {
        let paths = sample_corpus();
        let analyzer = RiskAnalyzer::new(&paths, None).unwrap();
        let tail = analyzer.compute_tail_analysis(25.0);
        assert!(tail.n_tail_paths >= 1);
        assert!(tail.tail_ruin_rate >= 0.0 && tail.tail_ruin_rate <= 1.0);
    }
}
