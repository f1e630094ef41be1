// src/mc/engine.rs
//! Parallel Monte Carlo engine.
//!
//! Draws one set of scalar parameters per path from the configured input
//! distributions, runs each path on its own independent RNG stream, and
//! reduces the resulting corpus into summary statistics, percentile bands,
//! sample paths, and outcome/return buckets.

use crate::distributions::{Distribution, LogNormal};
use crate::error::validation::{validate_horizon, validate_paths};
use crate::error::{SimError, SimResult};
use crate::math_utils::{compute_quantiles, percentile, Timer};
use crate::processes::RegimeSwitchingModel;
use crate::rng::StreamFactory;
use crate::simulation::{
    simulate_path, BusinessModel, PathResult, PathSimulatorInputs, RiskEventConfig,
    RiskEventManager,
};
use chrono::{DateTime, Utc};
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Scalar parameters sampled once per path from the engine's input
/// distributions; frozen onto [`crate::simulation::RealizedParams`] for
/// sensitivity analysis downstream.
#[derive(Debug, Clone)]
struct SampledParameters {
    initial_capital: f64,
    dev_duration: usize,
    dev_burn: f64,
    leads_per_month: f64,
    win_rate_bumn: f64,
    win_rate_open: f64,
    bumn_ratio: f64,
    annual_churn_rate: f64,
    contract_small: f64,
    contract_medium: f64,
    contract_large: f64,
}

/// Full configuration for a Monte Carlo run: input distributions, risk
/// events, and the switches that gate the optional regime/risk layers.
#[derive(Clone)]
pub struct EngineConfig {
    pub n_simulations: usize,
    pub time_horizon: usize,
    pub seed: Option<u64>,

    pub initial_capital_dist: Distribution,
    pub dev_duration_dist: Distribution,
    pub dev_burn_dist: Distribution,
    pub leads_per_month_dist: Distribution,
    pub win_rate_bumn_dist: Distribution,
    pub win_rate_open_dist: Distribution,
    pub bumn_ratio: f64,
    pub churn_rate_dist: Distribution,

    pub contract_small_dist: Distribution,
    pub contract_medium_dist: Distribution,
    pub contract_large_dist: Distribution,
    pub size_weights: Vec<(String, f64)>,
    pub sales_cycle_dist: Distribution,

    pub op_overhead: f64,
    pub cost_per_customer: f64,

    pub enable_regime_switching: bool,
    pub enable_risk_events: bool,
    pub risk_events: Vec<RiskEventConfig>,
}

impl EngineConfig {
    pub fn validate(&self) -> SimResult<()> {
        validate_paths(self.n_simulations)?;
        validate_horizon(self.time_horizon)?;
        Ok(())
    }
}

impl Default for EngineConfig {
    /// The "base" scenario, matching the example payload shipped with the
    /// original parameter schema.
    fn default() -> Self {
        EngineConfig {
            n_simulations: 500,
            time_horizon: 36,
            seed: None,
            initial_capital_dist: Distribution::triangular(4000.0, 5000.0, 6000.0).unwrap(),
            dev_duration_dist: Distribution::triangular(4.0, 6.0, 9.0).unwrap(),
            dev_burn_dist: Distribution::triangular(160.0, 200.0, 250.0).unwrap(),
            leads_per_month_dist: Distribution::triangular(4.0, 7.0, 12.0).unwrap(),
            win_rate_bumn_dist: Distribution::beta(14.0, 6.0).unwrap(),
            win_rate_open_dist: Distribution::beta(4.0, 14.0).unwrap(),
            bumn_ratio: 0.35,
            churn_rate_dist: Distribution::beta(2.0, 18.0).unwrap(),
            contract_small_dist: Distribution::LogNormal(
                LogNormal::from_mean_cv(180.0, 0.2).unwrap(),
            ),
            contract_medium_dist: Distribution::LogNormal(
                LogNormal::from_mean_cv(320.0, 0.15).unwrap(),
            ),
            contract_large_dist: Distribution::LogNormal(
                LogNormal::from_mean_cv(550.0, 0.1).unwrap(),
            ),
            size_weights: vec![
                ("small".to_string(), 0.5),
                ("medium".to_string(), 0.35),
                ("large".to_string(), 0.15),
            ],
            sales_cycle_dist: Distribution::gamma(6.25, 0.8).unwrap(),
            op_overhead: 120.0,
            cost_per_customer: 5.0,
            enable_regime_switching: true,
            enable_risk_events: true,
            risk_events: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationType {
    Proceed,
    Caution,
    Reassess,
    DoNotProceed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryStatistics {
    pub prob_profit: f64,
    pub prob_double: f64,
    pub prob_ruin: f64,
    pub return_mean: f64,
    pub return_median: f64,
    pub return_std: f64,
    pub return_p5: f64,
    pub return_p95: f64,
    pub var_5: f64,
    pub cvar_5: f64,
    pub max_drawdown_mean: f64,
    pub max_drawdown_p95: f64,
    pub breakeven_mean: Option<f64>,
    pub breakeven_rate: f64,
    pub recommendation: RecommendationType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathPercentile {
    pub month: usize,
    pub p5: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p95: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathData {
    pub percentiles: Vec<PathPercentile>,
    pub sample_paths: Vec<Vec<f64>>,
    pub median_path: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeDistribution {
    pub double_plus: usize,
    pub profitable: usize,
    pub loss: usize,
    pub ruin: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnBucket {
    pub range_start: i64,
    pub range_end: i64,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationMeta {
    pub n_simulations: usize,
    pub time_horizon: usize,
    pub seed: Option<u64>,
    pub computation_time_ms: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub summary: SummaryStatistics,
    pub paths: PathData,
    pub outcomes: OutcomeDistribution,
    pub return_distribution: Vec<ReturnBucket>,
    pub meta: SimulationMeta,
}

/// Owns the configuration and any process models built once for the run
/// (the regime-switching chain has no per-path state, so it is shared by
/// reference across every path instead of rebuilt). `thread_pool` is a
/// dedicated rayon pool rather than the global one, so the engine doesn't
/// contend with other rayon users embedding this crate.
pub struct SimulationEngine {
    config: EngineConfig,
    regime_model: Option<RegimeSwitchingModel>,
    thread_pool: rayon::ThreadPool,
}

impl SimulationEngine {
    pub fn new(config: EngineConfig) -> SimResult<Self> {
        config.validate()?;
        let regime_model = if config.enable_regime_switching {
            Some(RegimeSwitchingModel::create_default(0.20, 0.10, 0.85)?)
        } else {
            None
        };
        let thread_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_cpus::get())
            .build()
            .map_err(|e| SimError::InvalidConfiguration {
                field: "thread_pool".to_string(),
                reason: format!("failed to build worker pool: {e}"),
            })?;
        Ok(Self {
            config,
            regime_model,
            thread_pool,
        })
    }

    fn sample_parameters<R: Rng + ?Sized>(&self, rng: &mut R) -> SampledParameters {
        let cfg = &self.config;
        SampledParameters {
            initial_capital: cfg.initial_capital_dist.sample(rng),
            dev_duration: cfg.dev_duration_dist.sample(rng).round().max(1.0) as usize,
            dev_burn: cfg.dev_burn_dist.sample(rng),
            leads_per_month: cfg.leads_per_month_dist.sample(rng),
            win_rate_bumn: cfg.win_rate_bumn_dist.sample(rng).clamp(0.0, 1.0),
            win_rate_open: cfg.win_rate_open_dist.sample(rng).clamp(0.0, 1.0),
            bumn_ratio: cfg.bumn_ratio,
            annual_churn_rate: cfg.churn_rate_dist.sample(rng).clamp(0.0, 1.0),
            contract_small: cfg.contract_small_dist.sample(rng),
            contract_medium: cfg.contract_medium_dist.sample(rng),
            contract_large: cfg.contract_large_dist.sample(rng),
        }
    }

    /// Runs a single path to completion. Shared by `run` and `run_serial`
    /// so the two differ only in how the per-path RNGs are iterated.
    fn run_single_path<R: Rng + ?Sized>(&self, rng: &mut R) -> PathResult {
        let cfg = &self.config;
        let params = self.sample_parameters(rng);

        let mut contract_distributions = HashMap::new();
        contract_distributions.insert(
            "small".to_string(),
            Distribution::LogNormal(
                LogNormal::from_mean_cv(params.contract_small, 0.1)
                    .expect("sampled contract mean is positive"),
            ),
        );
        contract_distributions.insert(
            "medium".to_string(),
            Distribution::LogNormal(
                LogNormal::from_mean_cv(params.contract_medium, 0.1)
                    .expect("sampled contract mean is positive"),
            ),
        );
        contract_distributions.insert(
            "large".to_string(),
            Distribution::LogNormal(
                LogNormal::from_mean_cv(params.contract_large, 0.1)
                    .expect("sampled contract mean is positive"),
            ),
        );

        let business_model = BusinessModel::new(
            contract_distributions,
            &cfg.size_weights,
            cfg.sales_cycle_dist,
            cfg.op_overhead,
            cfg.cost_per_customer,
        )
        .expect("engine config was validated at construction");

        let risk_manager = if cfg.enable_risk_events && !cfg.risk_events.is_empty() {
            Some(RiskEventManager::new(cfg.risk_events.clone()))
        } else {
            None
        };

        let inputs = PathSimulatorInputs {
            business_model: &business_model,
            regime_model: self.regime_model.as_ref(),
            risk_manager,
            time_horizon: cfg.time_horizon,
        };

        simulate_path(
            inputs,
            params.initial_capital,
            params.dev_duration,
            params.dev_burn,
            params.leads_per_month,
            params.win_rate_bumn,
            params.win_rate_open,
            params.bumn_ratio,
            params.annual_churn_rate,
            rng,
        )
    }

    fn base_seed(&self) -> u64 {
        self.config.seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0)
        })
    }

    fn run_paths(&self, seed: u64, parallel: bool) -> (Vec<PathResult>, f64) {
        let timer = Timer::new();
        let factory = StreamFactory::new(seed);
        let streams = factory.spawn(self.config.n_simulations);

        let results = if parallel {
            self.thread_pool.install(|| {
                streams
                    .into_par_iter()
                    .map(|mut rng| self.run_single_path(&mut rng))
                    .collect()
            })
        } else {
            streams
                .into_iter()
                .map(|mut rng| self.run_single_path(&mut rng))
                .collect()
        };

        (results, timer.elapsed_ms())
    }

    /// Runs the full corpus across rayon's thread pool. When the config
    /// carries no seed, one is drawn from the wall clock and reported back
    /// in `meta.seed` so the run can be replayed.
    pub fn run(&self) -> SimResult<(Vec<PathResult>, SimulationResult)> {
        let seed = self.base_seed();
        let (paths, elapsed_ms) = self.run_paths(seed, true);
        let summary = self.aggregate(&paths, elapsed_ms, seed)?;
        Ok((paths, summary))
    }

    /// Runs the full corpus on the calling thread. Uses the exact same
    /// per-path code as `run`, so the two differ only in scheduling —
    /// bit-identical results for the same seed.
    pub fn run_serial(&self) -> SimResult<(Vec<PathResult>, SimulationResult)> {
        let seed = self.base_seed();
        let (paths, elapsed_ms) = self.run_paths(seed, false);
        let summary = self.aggregate(&paths, elapsed_ms, seed)?;
        Ok((paths, summary))
    }

    fn aggregate(
        &self,
        paths: &[PathResult],
        computation_time_ms: f64,
        seed: u64,
    ) -> SimResult<SimulationResult> {
        let n = paths.len();
        let time_horizon = self.config.time_horizon;

        let returns: Vec<f64> = paths.iter().map(|p| p.total_return).collect();
        let initial_capitals: Vec<f64> = paths.iter().map(|p| p.initial_capital).collect();
        let final_capitals: Vec<f64> = paths.iter().map(|p| p.final_capital).collect();
        let max_drawdowns: Vec<f64> = paths.iter().map(|p| p.max_drawdown).collect();
        let breakeven_months: Vec<i64> = paths.iter().map(|p| p.breakeven_month).collect();
        let is_ruin: Vec<bool> = paths.iter().map(|p| p.is_ruin).collect();

        let n_f = n as f64;
        let mean = |xs: &[f64]| xs.iter().sum::<f64>() / n_f;
        let std_of = |xs: &[f64], m: f64| (xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / n_f).sqrt();

        let return_mean = mean(&returns);
        let return_std = std_of(&returns, return_mean);
        let [return_median, return_p5, return_p95] = {
            let q = compute_quantiles(&returns, &[50.0, 5.0, 95.0]);
            [q[0], q[1], q[2]]
        };

        let prob_profit = returns.iter().filter(|&&r| r > 0.0).count() as f64 / n_f;
        let prob_double = returns.iter().filter(|&&r| r >= 100.0).count() as f64 / n_f;
        let prob_ruin = is_ruin.iter().filter(|&&r| r).count() as f64 / n_f;

        let losses: Vec<f64> = initial_capitals
            .iter()
            .zip(&final_capitals)
            .map(|(i, f)| i - f)
            .collect();
        let mut sorted_losses = losses.clone();
        sorted_losses.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let var_5 = percentile(&sorted_losses, 95.0);
        let cvar_5 = mean_of_tail(&losses, var_5);

        let max_dd_mean = mean(&max_drawdowns);
        let max_dd_p95 = percentile(&sorted_copy(&max_drawdowns), 95.0);

        let achieved: Vec<f64> = breakeven_months
            .iter()
            .filter(|&&m| m > 0)
            .map(|&m| m as f64)
            .collect();
        let breakeven_rate = achieved.len() as f64 / n_f;
        let breakeven_mean = if achieved.is_empty() {
            None
        } else {
            Some(achieved.iter().sum::<f64>() / achieved.len() as f64)
        };

        let recommendation = if prob_profit >= 0.80 && return_mean >= 50.0 && prob_ruin < 0.05 {
            RecommendationType::Proceed
        } else if prob_profit >= 0.60 {
            RecommendationType::Caution
        } else if prob_profit >= 0.40 {
            RecommendationType::Reassess
        } else {
            RecommendationType::DoNotProceed
        };

        let summary = SummaryStatistics {
            prob_profit,
            prob_double,
            prob_ruin,
            return_mean,
            return_median,
            return_std,
            return_p5,
            return_p95,
            var_5,
            cvar_5,
            max_drawdown_mean: max_dd_mean,
            max_drawdown_p95: max_dd_p95,
            breakeven_mean,
            breakeven_rate,
            recommendation,
        };

        // === Percentile bands + sample paths ===
        let mut percentiles = Vec::with_capacity(time_horizon + 1);
        for month in 0..=time_horizon {
            let month_values: Vec<f64> = paths.iter().map(|p| p.equity_curve[month]).collect();
            let q = compute_quantiles(&month_values, &[5.0, 25.0, 50.0, 75.0, 95.0]);
            percentiles.push(PathPercentile {
                month,
                p5: q[0],
                p25: q[1],
                p50: q[2],
                p75: q[3],
                p95: q[4],
            });
        }
        let median_path: Vec<f64> = percentiles.iter().map(|p| p.p50).collect();

        let n_sample = n.min(50);
        let mut sorted_by_return: Vec<usize> = (0..n).collect();
        sorted_by_return.sort_by(|&a, &b| returns[a].partial_cmp(&returns[b]).unwrap());
        let sample_indices = linspace_indices(n, n_sample);
        let sample_paths: Vec<Vec<f64>> = sample_indices
            .into_iter()
            .map(|i| paths[sorted_by_return[i]].equity_curve.clone())
            .collect();

        let path_data = PathData {
            percentiles,
            sample_paths,
            median_path,
        };

        // === Outcome buckets ===
        let double_plus = returns.iter().filter(|&&r| r >= 100.0).count();
        let profitable = returns.iter().filter(|&&r| r > 0.0 && r < 100.0).count();
        let loss = returns
            .iter()
            .zip(&is_ruin)
            .filter(|(&r, &ruin)| r <= 0.0 && !ruin)
            .count();
        let ruin = is_ruin.iter().filter(|&&r| r).count();

        let outcomes = OutcomeDistribution {
            double_plus,
            profitable,
            loss,
            ruin,
            total: n,
        };

        // === Return histogram ===
        let return_distribution = return_histogram(&returns, n);

        let meta = SimulationMeta {
            n_simulations: n,
            time_horizon,
            seed: Some(seed),
            computation_time_ms,
            timestamp: Utc::now(),
        };

        Ok(SimulationResult {
            summary,
            paths: path_data,
            outcomes,
            return_distribution,
            meta,
        })
    }
}

fn sorted_copy(xs: &[f64]) -> Vec<f64> {
    let mut v = xs.to_vec();
    v.sort_by(|a, b| a.partial_cmp(b).unwrap());
    v
}

/// Mean of the values at or above `threshold` — used for CVaR, where the
/// threshold is itself a percentile of the same series.
fn mean_of_tail(values: &[f64], threshold: f64) -> f64 {
    let tail: Vec<f64> = values.iter().copied().filter(|&v| v >= threshold).collect();
    if tail.is_empty() {
        threshold
    } else {
        tail.iter().sum::<f64>() / tail.len() as f64
    }
}

/// `n_sample` equispaced indices in `0..n`, matching `numpy.linspace(0, n-1,
/// n_sample, dtype=int)`.
fn linspace_indices(n: usize, n_sample: usize) -> Vec<usize> {
    if n_sample <= 1 || n <= 1 {
        return vec![0; n_sample.min(n.max(1))];
    }
    let step = (n - 1) as f64 / (n_sample - 1) as f64;
    (0..n_sample)
        .map(|i| ((i as f64) * step).round() as usize)
        .collect()
}

/// 50-percentage-point return buckets spanning
/// `[floor(min/50)*50, ceil(max/50)*50)`.
fn return_histogram(returns: &[f64], n: usize) -> Vec<ReturnBucket> {
    const BUCKET: i64 = 50;
    let min_ret = returns.iter().cloned().fold(f64::INFINITY, f64::min);
    let max_ret = returns.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if !min_ret.is_finite() || !max_ret.is_finite() {
        return Vec::new();
    }

    let lo = (min_ret / BUCKET as f64).floor() as i64 * BUCKET;
    let hi = (max_ret / BUCKET as f64).ceil() as i64 * BUCKET;

    let mut buckets = Vec::new();
    let mut start = lo;
    while start < hi {
        let end = start + BUCKET;
        let count = returns
            .iter()
            .filter(|&&r| r >= start as f64 && r < end as f64)
            .count();
        buckets.push(ReturnBucket {
            range_start: start,
            range_end: end,
            count,
            percentage: count as f64 / n as f64 * 100.0,
        });
        start = end;
    }
    buckets
}
