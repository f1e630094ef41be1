// src/analytics/premortem.rs
//! Empirical failure forensics: why, when, and how paths fail, derived
//! from the simulated corpus rather than a checklist.

use crate::math_utils::percentile;
use crate::processes::Regime;
use crate::simulation::PathResult;
use serde::{Deserialize, Serialize};

const PARAMETER_DISPLAY_NAMES: [(&str, &str); 7] = [
    ("initial_capital", "Starting Capital"),
    ("dev_duration", "Development Duration"),
    ("dev_burn", "Development Burn Rate"),
    ("leads_per_month", "Lead Generation"),
    ("win_rate_bumn", "BUMN Win Rate"),
    ("win_rate_open", "Open Market Win Rate"),
    ("annual_churn_rate", "Customer Churn"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CauseDirection {
    Higher,
    Lower,
    Similar,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureCause {
    pub factor: String,
    pub display_name: String,
    pub failed_mean: f64,
    pub success_mean: f64,
    pub population_mean: f64,
    pub difference_pct: f64,
    pub cohens_d: f64,
    pub attribution_score: f64,
    pub confidence: f64,
    pub direction: CauseDirection,
    pub interpretation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriticalPeriod {
    pub start_month: usize,
    pub end_month: usize,
    pub hazard_rate: f64,
    pub cumulative_failures: f64,
    pub typical_capital_level: f64,
    pub typical_burn_rate: f64,
    pub dominant_cause: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TrajectoryType {
    SlowBleed,
    SuddenCollapse,
    RecoveryFailure,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureTrajectory {
    pub trajectory_type: TrajectoryType,
    pub prevalence: f64,
    pub months_to_failure: f64,
    pub peak_capital_reached: f64,
    pub warning_signs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimeImpact {
    pub regime: Regime,
    pub time_spent_pct: f64,
    pub conditional_failure_rate: f64,
    pub risk_multiplier: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PremortemResult {
    pub failure_definition: String,
    pub failure_rate: f64,
    pub failure_count: usize,
    pub primary_causes: Vec<FailureCause>,
    pub cause_interactions: Vec<(String, String, f64)>,
    pub critical_periods: Vec<CriticalPeriod>,
    pub failure_timing_histogram: Vec<usize>,
    pub median_failure_month: Option<f64>,
    pub failure_trajectories: Vec<FailureTrajectory>,
    pub regime_impacts: Vec<RegimeImpact>,
    pub early_warning_signals: Vec<String>,
    pub mitigation_priorities: Vec<String>,
}

/// Classifies a corpus into failed/successful paths and derives the
/// distinguishing causes, timing, trajectories, and regime exposure of
/// failure, purely from the already-simulated data.
pub struct PremortemAnalyzer<'a> {
    paths: &'a [PathResult],
    failure_threshold: f64,
    is_failed: Vec<bool>,
    n_failed: usize,
    n_success: usize,
}

impl<'a> PremortemAnalyzer<'a> {
    pub fn new(paths: &'a [PathResult], failure_threshold: f64) -> Self {
        let is_failed: Vec<bool> = paths
            .iter()
            .map(|p| p.is_ruin || p.total_return <= failure_threshold)
            .collect();
        let n_failed = is_failed.iter().filter(|&&f| f).count();
        let n_success = paths.len() - n_failed;

        Self {
            paths,
            failure_threshold,
            is_failed,
            n_failed,
            n_success,
        }
    }

    fn failed_paths(&self) -> Vec<&PathResult> {
        self.paths
            .iter()
            .zip(&self.is_failed)
            .filter(|(_, &f)| f)
            .map(|(p, _)| p)
            .collect()
    }

    fn success_paths(&self) -> Vec<&PathResult> {
        self.paths
            .iter()
            .zip(&self.is_failed)
            .filter(|(_, &f)| !f)
            .map(|(p, _)| p)
            .collect()
    }

    pub fn analyze_causes(&self) -> Vec<FailureCause> {
        if self.n_failed == 0 || self.n_success == 0 {
            return Vec::new();
        }

        let failed = self.failed_paths();
        let success = self.success_paths();

        let mut causes: Vec<FailureCause> = PARAMETER_DISPLAY_NAMES
            .iter()
            .filter_map(|&(key, display)| {
                let all_values: Vec<f64> = self
                    .paths
                    .iter()
                    .map(|p| *p.realized_params.as_map().get(key).unwrap_or(&0.0))
                    .collect();

                if std_dev(&all_values) < 1e-10 {
                    return None;
                }

                let failed_values: Vec<f64> = failed
                    .iter()
                    .map(|p| *p.realized_params.as_map().get(key).unwrap_or(&0.0))
                    .collect();
                let success_values: Vec<f64> = success
                    .iter()
                    .map(|p| *p.realized_params.as_map().get(key).unwrap_or(&0.0))
                    .collect();

                let failed_mean = mean(&failed_values);
                let success_mean = mean(&success_values);
                let pop_mean = mean(&all_values);

                let pooled_std =
                    ((variance(&failed_values) + variance(&success_values)) / 2.0).sqrt();
                let cohens_d = (failed_mean - success_mean) / (pooled_std + 1e-10);

                let diff_pct = if success_mean != 0.0 {
                    (failed_mean - success_mean) / success_mean.abs() * 100.0
                } else {
                    0.0
                };

                let p_value = welch_t_test_p_value(&failed_values, &success_values);
                let attribution = (cohens_d.abs() / 2.0).min(1.0);

                let (direction, interpretation) = if cohens_d > 0.1 {
                    (
                        CauseDirection::Higher,
                        format!("Failed paths had higher {}", display),
                    )
                } else if cohens_d < -0.1 {
                    (
                        CauseDirection::Lower,
                        format!("Failed paths had lower {}", display),
                    )
                } else {
                    (
                        CauseDirection::Similar,
                        format!("{} was similar in failed and successful paths", display),
                    )
                };

                Some(FailureCause {
                    factor: key.to_string(),
                    display_name: display.to_string(),
                    failed_mean,
                    success_mean,
                    population_mean: pop_mean,
                    difference_pct: diff_pct,
                    cohens_d,
                    attribution_score: attribution,
                    confidence: 1.0 - p_value,
                    direction,
                    interpretation,
                })
            })
            .collect();

        causes.sort_by(|a, b| b.attribution_score.partial_cmp(&a.attribution_score).unwrap());
        causes
    }

    fn identify_dominant_cause(&self, paths: &[&PathResult]) -> String {
        if paths.is_empty() {
            return "unknown".to_string();
        }

        let mut max_effect = 0.0;
        let mut dominant = "multiple_factors".to_string();

        for &(key, display) in PARAMETER_DISPLAY_NAMES.iter() {
            let all_values: Vec<f64> = self
                .paths
                .iter()
                .map(|p| *p.realized_params.as_map().get(key).unwrap_or(&0.0))
                .collect();
            if std_dev(&all_values) < 1e-10 {
                continue;
            }
            let path_values: Vec<f64> = paths
                .iter()
                .map(|p| *p.realized_params.as_map().get(key).unwrap_or(&0.0))
                .collect();
            let path_mean = mean(&path_values);
            let all_mean = mean(&all_values);
            let all_std = std_dev(&all_values);

            let effect = (path_mean - all_mean).abs() / (all_std + 1e-10);
            if effect > max_effect {
                max_effect = effect;
                dominant = display.to_string();
            }
        }

        dominant
    }

    fn avg_capital_at_month(&self, paths: &[&PathResult], month: usize) -> f64 {
        if paths.is_empty() {
            return 0.0;
        }
        let capitals: Vec<f64> = paths
            .iter()
            .map(|p| p.equity_curve.get(month).copied().unwrap_or(0.0))
            .collect();
        mean(&capitals)
    }

    fn estimate_burn_rate(&self, paths: &[&PathResult], month: usize) -> f64 {
        let burns: Vec<f64> = paths
            .iter()
            .filter(|p| month > 0 && month < p.equity_curve.len())
            .map(|p| p.equity_curve[month - 1] - p.equity_curve[month])
            .collect();
        if burns.is_empty() {
            0.0
        } else {
            mean(&burns)
        }
    }

    pub fn analyze_timing(&self) -> (Vec<CriticalPeriod>, Vec<usize>, Option<f64>) {
        if self.n_failed == 0 {
            return (Vec::new(), Vec::new(), None);
        }

        let failed = self.failed_paths();

        let failure_months: Vec<usize> = failed
            .iter()
            .map(|p| {
                p.equity_curve
                    .iter()
                    .position(|&c| c <= 0.0)
                    .unwrap_or(p.equity_curve.len() - 1)
            })
            .collect();

        let max_month = failure_months.iter().max().copied().unwrap_or(0) + 1;
        let mut histogram = vec![0usize; max_month];
        for &m in &failure_months {
            histogram[m] += 1;
        }

        let mut sorted_months: Vec<f64> = failure_months.iter().map(|&m| m as f64).collect();
        sorted_months.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let median_month = Some(percentile(&sorted_months, 50.0));

        let total_failures = failure_months.len();
        let avg_rate = if max_month > 0 {
            total_failures as f64 / max_month as f64
        } else {
            0.0
        };

        let window_size = 3usize;
        let mut periods = Vec::new();
        let mut cumulative = 0usize;
        let mut i = 0usize;
        let loop_bound = max_month.saturating_sub(window_size);

        while i < loop_bound {
            let window_failures: usize = histogram[i..i + window_size].iter().sum();
            let window_rate = window_failures as f64 / window_size as f64;

            if window_rate > avg_rate * 1.5 {
                cumulative += window_failures;

                let period_paths: Vec<&PathResult> = failed
                    .iter()
                    .zip(&failure_months)
                    .filter(|(_, &m)| m >= i && m < i + window_size)
                    .map(|(&p, _)| p)
                    .collect();
                let dominant_cause = self.identify_dominant_cause(&period_paths);

                periods.push(CriticalPeriod {
                    start_month: i,
                    end_month: i + window_size - 1,
                    hazard_rate: window_rate
                        / (self.paths.len() as i64 - cumulative as i64 + window_failures as i64)
                            .max(1) as f64,
                    cumulative_failures: cumulative as f64 / total_failures as f64,
                    typical_capital_level: self.avg_capital_at_month(&period_paths, i),
                    typical_burn_rate: self.estimate_burn_rate(&period_paths, i),
                    dominant_cause,
                });

                i += window_size;
            } else {
                i += 1;
            }
        }

        (periods, histogram, median_month)
    }

    pub fn analyze_trajectories(&self) -> Vec<FailureTrajectory> {
        if self.n_failed == 0 {
            return Vec::new();
        }

        let failed = self.failed_paths();
        let mut slow_bleed = Vec::new();
        let mut sudden_collapse = Vec::new();
        let mut recovery_failure = Vec::new();

        for &path in &failed {
            let curve = &path.equity_curve;
            let initial = curve[0];

            let (peak_idx, &peak_val) = curve
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
                .unwrap();

            let failure_idx = curve
                .iter()
                .position(|&v| v <= 0.0)
                .unwrap_or(curve.len() - 1);

            if peak_val > initial * 1.1 && peak_idx < failure_idx.saturating_sub(3) {
                recovery_failure.push(path);
            } else if failure_idx.saturating_sub(peak_idx) < 6 {
                sudden_collapse.push(path);
            } else {
                slow_bleed.push(path);
            }
        }

        let groups: [(TrajectoryType, Vec<&PathResult>); 3] = [
            (TrajectoryType::SlowBleed, slow_bleed),
            (TrajectoryType::SuddenCollapse, sudden_collapse),
            (TrajectoryType::RecoveryFailure, recovery_failure),
        ];

        let mut results = Vec::new();
        for (traj_type, paths) in groups {
            if paths.is_empty() {
                continue;
            }

            let mut months_to_fail = Vec::with_capacity(paths.len());
            let mut peaks = Vec::with_capacity(paths.len());
            for &p in &paths {
                let curve = &p.equity_curve;
                peaks.push(curve.iter().cloned().fold(f64::MIN, f64::max));
                months_to_fail.push(
                    curve
                        .iter()
                        .position(|&v| v <= 0.0)
                        .unwrap_or(curve.len() - 1) as f64,
                );
            }

            let warning_signs: Vec<String> = match traj_type {
                TrajectoryType::SlowBleed => vec![
                    "Consistent monthly losses".to_string(),
                    "Customer acquisition below target".to_string(),
                    "High burn rate relative to revenue".to_string(),
                ],
                TrajectoryType::SuddenCollapse => vec![
                    "Over-reliance on few large customers".to_string(),
                    "High customer concentration risk".to_string(),
                    "Insufficient cash buffer".to_string(),
                ],
                TrajectoryType::RecoveryFailure => vec![
                    "Premature scaling".to_string(),
                    "Unsustainable growth rate".to_string(),
                    "Market conditions changed post-recovery".to_string(),
                ],
            };

            results.push(FailureTrajectory {
                prevalence: paths.len() as f64 / self.n_failed as f64,
                months_to_failure: mean(&months_to_fail),
                peak_capital_reached: mean(&peaks),
                warning_signs,
                trajectory_type: traj_type,
            });
        }

        results.sort_by(|a, b| b.prevalence.partial_cmp(&a.prevalence).unwrap());
        results
    }

    pub fn analyze_regimes(&self) -> Vec<RegimeImpact> {
        let failed = self.failed_paths();
        let success = self.success_paths();
        let regimes = [Regime::Normal, Regime::Stress, Regime::Boom];
        let mut impacts = Vec::new();

        for regime in regimes {
            let failed_time: Vec<f64> = failed
                .iter()
                .map(|p| regime_fraction(p, regime))
                .collect();
            let success_time: Vec<f64> = success
                .iter()
                .map(|p| regime_fraction(p, regime))
                .collect();

            if failed_time.is_empty() || success_time.is_empty() {
                continue;
            }

            let failed_avg = mean(&failed_time);
            let success_avg = mean(&success_time);
            let pop_avg = (failed_avg * self.n_failed as f64 + success_avg * self.n_success as f64)
                / self.paths.len() as f64;

            let all_fractions: Vec<f64> = self.paths.iter().map(|p| regime_fraction(p, regime)).collect();
            let mut sorted_fractions = all_fractions.clone();
            sorted_fractions.sort_by(|a, b| a.partial_cmp(b).unwrap());
            let high_exposure_threshold = percentile(&sorted_fractions, 75.0);

            let high_exposure_paths: Vec<&PathResult> = self
                .paths
                .iter()
                .zip(&all_fractions)
                .filter(|(_, &frac)| frac > high_exposure_threshold)
                .map(|(p, _)| p)
                .collect();

            let conditional_failure = if !high_exposure_paths.is_empty() {
                high_exposure_paths
                    .iter()
                    .filter(|p| p.is_ruin || p.total_return <= self.failure_threshold)
                    .count() as f64
                    / high_exposure_paths.len() as f64
            } else {
                self.n_failed as f64 / self.paths.len() as f64
            };

            let baseline_failure = self.n_failed as f64 / self.paths.len() as f64;
            let risk_multiplier = if baseline_failure > 0.0 {
                conditional_failure / baseline_failure
            } else {
                1.0
            };

            impacts.push(RegimeImpact {
                regime,
                time_spent_pct: pop_avg * 100.0,
                conditional_failure_rate: conditional_failure,
                risk_multiplier,
            });
        }

        impacts.sort_by(|a, b| b.risk_multiplier.partial_cmp(&a.risk_multiplier).unwrap());
        impacts
    }

    fn find_interactions(&self, causes: &[FailureCause]) -> Vec<(String, String, f64)> {
        if self.n_failed < 10 || causes.len() < 2 {
            return Vec::new();
        }

        let failed = self.failed_paths();
        let top_causes = &causes[..causes.len().min(5)];
        let mut interactions = Vec::new();

        for i in 0..top_causes.len() {
            for cause2 in &top_causes[i + 1..] {
                let cause1 = &top_causes[i];
                let mut cooccur = 0usize;

                for &path in &failed {
                    let val1 = *path.realized_params.as_map().get(&cause1.factor).unwrap_or(&0.0);
                    let val2 = *path.realized_params.as_map().get(&cause2.factor).unwrap_or(&0.0);

                    let bad1 = (cause1.direction == CauseDirection::Lower && val1 < cause1.population_mean)
                        || (cause1.direction == CauseDirection::Higher && val1 > cause1.population_mean);
                    let bad2 = (cause2.direction == CauseDirection::Lower && val2 < cause2.population_mean)
                        || (cause2.direction == CauseDirection::Higher && val2 > cause2.population_mean);

                    if bad1 && bad2 {
                        cooccur += 1;
                    }
                }

                let cooccur_rate = cooccur as f64 / self.n_failed as f64;
                if cooccur_rate > 0.5 {
                    interactions.push((cause1.display_name.clone(), cause2.display_name.clone(), cooccur_rate));
                }
            }
        }

        interactions.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap());
        interactions.truncate(5);
        interactions
    }

    pub fn generate_insights(
        &self,
        causes: &[FailureCause],
        trajectories: &[FailureTrajectory],
    ) -> (Vec<String>, Vec<String>) {
        let mut early_warnings = Vec::new();
        let mut mitigations = Vec::new();

        for cause in causes.iter().take(3) {
            if cause.attribution_score <= 0.3 {
                continue;
            }
            let factor_lower = cause.factor.to_lowercase();
            if cause.direction == CauseDirection::Lower && factor_lower.contains("rate") {
                early_warnings.push(format!(
                    "Monitor {} closely - failed paths averaged {:.1}% vs {:.1}%",
                    cause.display_name,
                    cause.failed_mean * 100.0,
                    cause.success_mean * 100.0
                ));
                mitigations.push(format!(
                    "Improve {} through targeted interventions",
                    cause.display_name
                ));
            } else if cause.direction == CauseDirection::Higher && factor_lower.contains("churn") {
                early_warnings.push(format!(
                    "Watch for rising churn - failed paths had {:.1}% vs {:.1}%",
                    cause.failed_mean * 100.0,
                    cause.success_mean * 100.0
                ));
                mitigations.push("Invest in customer success and retention programs".to_string());
            } else if cause.direction == CauseDirection::Higher && factor_lower.contains("burn") {
                early_warnings.push(format!(
                    "Control burn rate - failed paths burned {:.0}M vs {:.0}M",
                    cause.failed_mean, cause.success_mean
                ));
                mitigations.push("Maintain strict cost discipline during development".to_string());
            }
        }

        if let Some(dominant) = trajectories.first() {
            match dominant.trajectory_type {
                TrajectoryType::SlowBleed => {
                    early_warnings.push(
                        "Set monthly revenue targets and trigger review if missed 2+ months"
                            .to_string(),
                    );
                    mitigations
                        .push("Build monthly performance dashboards with automatic alerts".to_string());
                }
                TrajectoryType::SuddenCollapse => {
                    early_warnings
                        .push("Monitor customer concentration - no single customer > 20% revenue".to_string());
                    mitigations.push("Diversify customer base and maintain cash reserves".to_string());
                }
                TrajectoryType::RecoveryFailure => {}
            }
        }

        if early_warnings.is_empty() {
            early_warnings = vec![
                "Track capital runway monthly".to_string(),
                "Monitor customer acquisition vs plan".to_string(),
                "Review burn rate against milestones".to_string(),
            ];
        }

        if mitigations.is_empty() {
            mitigations = vec![
                "Maintain 6+ months runway buffer".to_string(),
                "Set clear go/no-go decision points".to_string(),
                "Prepare contingency cost reduction plans".to_string(),
            ];
        }

        (early_warnings, mitigations)
    }

    pub fn analyze(&self) -> PremortemResult {
        let failure_definition = format!(
            "Ruin (capital <= 0) OR return <= {}%",
            self.failure_threshold
        );

        let causes = self.analyze_causes();
        let cause_interactions = self.find_interactions(&causes);
        let (critical_periods, failure_timing_histogram, median_failure_month) = self.analyze_timing();
        let failure_trajectories = self.analyze_trajectories();
        let regime_impacts = self.analyze_regimes();
        let (early_warning_signals, mitigation_priorities) =
            self.generate_insights(&causes, &failure_trajectories);

        PremortemResult {
            failure_definition,
            failure_rate: self.n_failed as f64 / self.paths.len() as f64,
            failure_count: self.n_failed,
            primary_causes: causes,
            cause_interactions,
            critical_periods,
            failure_timing_histogram,
            median_failure_month,
            failure_trajectories,
            regime_impacts,
            early_warning_signals,
            mitigation_priorities,
        }
    }
}

fn regime_fraction(path: &PathResult, regime: Regime) -> f64 {
    if path.regime_path.is_empty() {
        return 0.0;
    }
    path.regime_path.iter().filter(|&&r| r == regime).count() as f64 / path.regime_path.len() as f64
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Welch's unequal-variance t-test, returning a two-sided p-value via the
/// same normal-approximation CDF used for Pearson significance.
fn welch_t_test_p_value(a: &[f64], b: &[f64]) -> f64 {
    let na = a.len() as f64;
    let nb = b.len() as f64;
    if na < 2.0 || nb < 2.0 {
        return 1.0;
    }
    let va = variance(a);
    let vb = variance(b);
    let se = (va / na + vb / nb).sqrt();
    if se < 1e-12 {
        return 1.0;
    }
    let t = ((mean(a) - mean(b)) / se).abs();

    let df_num = (va / na + vb / nb).powi(2);
    let df_denom = (va / na).powi(2) / (na - 1.0) + (vb / nb).powi(2) / (nb - 1.0);
    let df = if df_denom > 1e-12 { df_num / df_denom } else { na + nb - 2.0 };

    let x = t / (1.0 + t * t / (4.0 * df)).sqrt();
    let cdf = crate::math_utils::norm_cdf(x);
    (2.0 * (1.0 - cdf)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::RealizedParams;

    fn make_path(is_ruin: bool, total_return: f64, equity_curve: Vec<f64>, churn: f64) -> PathResult {
        PathResult {
            initial_capital: equity_curve[0],
            final_capital: *equity_curve.last().unwrap(),
            total_return,
            max_drawdown: 10.0,
            breakeven_month: -1,
            is_ruin,
            monthly_pnl: vec![0.0; equity_curve.len() - 1],
            customer_series: vec![0; equity_curve.len()],
            equity_curve,
            regime_path: vec![Regime::Normal, Regime::Stress],
            months_in_stress: 1,
            total_shocks: 0,
            shock_timeline: Vec::new(),
            realized_params: RealizedParams {
                initial_capital: 1_000_000.0,
                dev_duration: 6.0,
                dev_burn: 100.0,
                leads_per_month: 5.0,
                win_rate_bumn: 0.5,
                win_rate_open: 0.3,
                annual_churn_rate: churn,
            },
        }
    }

    fn sample_corpus() -> Vec<PathResult> {
        vec![
            make_path(true, -100.0, vec![1_000_000.0, 500_000.0, 0.0, 0.0], 0.5),
            make_path(false, -30.0, vec![1_000_000.0, 900_000.0, 800_000.0, 700_000.0], 0.4),
            make_path(false, 50.0, vec![1_000_000.0, 1_100_000.0, 1_300_000.0, 1_500_000.0], 0.1),
            make_path(false, 80.0, vec![1_000_000.0, 1_200_000.0, 1_500_000.0, 1_800_000.0], 0.05),
        ]
    }

    #[test]
    fn test_failure_classification_matches_threshold() {
        let paths = sample_corpus();
        let analyzer = PremortemAnalyzer::new(&paths, -20.0);
        assert_eq!(analyzer.n_failed, 2);
        assert_eq!(analyzer.n_success, 2);
    }

    #[test]
    fn test_causes_sorted_by_attribution_descending() {
        let paths = sample_corpus();
        let analyzer = PremortemAnalyzer::new(&paths, -20.0);
        let causes = analyzer.analyze_causes();
        for w in causes.windows(2) {
            assert!(w[0].attribution_score >= w[1].attribution_score);
        }
    }

    #[test]
    fn test_churn_identified_as_higher_in_failures() {
        let paths = sample_corpus();
        let analyzer = PremortemAnalyzer::new(&paths, -20.0);
        let causes = analyzer.analyze_causes();
        let churn = causes.iter().find(|c| c.factor == "annual_churn_rate").unwrap();
        assert_eq!(churn.direction, CauseDirection::Higher);
    }

    #[test]
    fn test_trajectories_prevalence_sums_to_one() {
        let paths = sample_corpus();
        let analyzer = PremortemAnalyzer::new(&paths, -20.0);
        let trajectories = analyzer.analyze_trajectories();
        let total: f64 = trajectories.iter().map(|t| t.prevalence).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_analyze_returns_nonempty_insights() {
        let paths = sample_corpus();
        let analyzer = PremortemAnalyzer::new(&paths, -20.0);
        let result = analyzer.analyze();
        assert!(!result.early_warning_signals.is_empty());
        assert!(!result.mitigation_priorities.is_empty());
    }
}
