// src/config.rs
//! Wire-shaped input types for a simulation run.
//!
//! These are the boundary structs an adapter layer would deserialize a
//! request into; they carry no sampling logic themselves, only a
//! conversion into the numeric [`crate::mc::EngineConfig`] the core
//! actually runs against.

use crate::distributions::{Beta, Distribution, Gamma, LogNormal};
use crate::error::validation::{validate_non_negative, validate_probability, validate_range};
use crate::error::{SimError, SimResult};
use crate::mc::EngineConfig;
use crate::simulation::{Channel, RiskEventConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DistributionSpec {
    Triangular { min: f64, mode: f64, max: f64 },
    Beta { alpha: f64, beta: f64 },
    BetaMeanSampleSize { mean: f64, sample_size: f64 },
    LogNormal { mu: f64, sigma: f64 },
    LogNormalMeanCv { mean: f64, cv: f64 },
    Gamma { shape: f64, scale: f64 },
    GammaMeanCv { mean: f64, cv: f64 },
    Fixed { value: f64 },
}

impl DistributionSpec {
    pub fn to_distribution(&self) -> SimResult<Distribution> {
        match *self {
            DistributionSpec::Triangular { min, mode, max } => Distribution::triangular(min, mode, max),
            DistributionSpec::Beta { alpha, beta } => Distribution::beta(alpha, beta),
            DistributionSpec::BetaMeanSampleSize { mean, sample_size } => {
                Ok(Distribution::Beta(Beta::from_mean_sample_size(mean, sample_size)?))
            }
            DistributionSpec::LogNormal { mu, sigma } => Distribution::lognormal(mu, sigma),
            DistributionSpec::LogNormalMeanCv { mean, cv } => {
                Ok(Distribution::LogNormal(LogNormal::from_mean_cv(mean, cv)?))
            }
            DistributionSpec::Gamma { shape, scale } => Distribution::gamma(shape, scale),
            DistributionSpec::GammaMeanCv { mean, cv } => {
                Ok(Distribution::Gamma(Gamma::from_mean_cv(mean, cv)?))
            }
            DistributionSpec::Fixed { value } => Distribution::fixed(value),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactChannel {
    Adoption,
    Churn,
    Revenue,
    Cost,
}

impl From<ImpactChannel> for Channel {
    fn from(c: ImpactChannel) -> Self {
        match c {
            ImpactChannel::Adoption => Channel::Adoption,
            ImpactChannel::Churn => Channel::Churn,
            ImpactChannel::Revenue => Channel::Revenue,
            ImpactChannel::Cost => Channel::Cost,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskEventSpec {
    pub name: String,
    pub intensity: f64,
    pub impact_type: ImpactChannel,
    pub severity_min: f64,
    pub severity_mode: f64,
    pub severity_max: f64,
    pub recovery_rate: f64,
    pub start_month: usize,
    pub end_month: Option<usize>,
}

impl RiskEventSpec {
    pub fn to_risk_event_config(&self) -> SimResult<RiskEventConfig> {
        validate_non_negative("intensity", self.intensity)?;
        validate_probability("recovery_rate", self.recovery_rate)?;
        for (name, v) in [
            ("severity_min", self.severity_min),
            ("severity_mode", self.severity_mode),
            ("severity_max", self.severity_max),
        ] {
            validate_range(name, v, 0.0, 2.0)?;
        }

        let severity_dist = crate::distributions::Triangular::new(
            self.severity_min,
            self.severity_mode,
            self.severity_max,
        )?;

        RiskEventConfig::new(
            self.name.clone(),
            self.intensity,
            self.impact_type.into(),
            severity_dist,
            self.recovery_rate,
            self.start_month,
            self.end_month,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapitalDevParams {
    pub initial_capital: DistributionSpec,
    pub dev_duration: DistributionSpec,
    pub dev_burn: DistributionSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesParams {
    pub leads_per_month: DistributionSpec,
    pub win_rate_bumn: DistributionSpec,
    pub win_rate_open: DistributionSpec,
    pub bumn_ratio: f64,
    pub sales_cycle_months: DistributionSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingParams {
    pub contract_small: DistributionSpec,
    pub contract_medium: DistributionSpec,
    pub contract_large: DistributionSpec,
    pub size_distribution: Vec<(String, f64)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionCostParams {
    pub churn_rate: DistributionSpec,
    pub op_overhead: f64,
    pub cost_per_customer: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationRunConfig {
    pub n_simulations: usize,
    pub time_horizon: usize,
    pub seed: Option<u64>,
    pub enable_regime_switching: bool,
    pub enable_risk_events: bool,
}

impl Default for SimulationRunConfig {
    fn default() -> Self {
        SimulationRunConfig {
            n_simulations: 500,
            time_horizon: 36,
            seed: None,
            enable_regime_switching: true,
            enable_risk_events: true,
        }
    }
}

/// Complete, wire-shaped input specification for a simulation run.
///
/// This is the top-level document an adapter would deserialize a
/// request body into before handing the core a validated
/// [`EngineConfig`] via [`SimulationInput::to_engine_config`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationInput {
    pub capital_dev: CapitalDevParams,
    pub sales: SalesParams,
    pub pricing: PricingParams,
    pub retention_costs: RetentionCostParams,
    #[serde(default)]
    pub risk_events: Vec<RiskEventSpec>,
    #[serde(default)]
    pub config: SimulationRunConfig,
}

impl SimulationInput {
    pub fn to_engine_config(&self) -> SimResult<EngineConfig> {
        let size_weights = self.pricing.size_distribution.clone();
        if size_weights.iter().any(|(_, w)| *w < 0.0) {
            return Err(SimError::InvalidConfiguration {
                field: "pricing.size_distribution".to_string(),
                reason: "weights must be non-negative".to_string(),
            });
        }
        validate_probability("sales.bumn_ratio", self.sales.bumn_ratio)?;

        let risk_events = self
            .risk_events
            .iter()
            .map(RiskEventSpec::to_risk_event_config)
            .collect::<SimResult<Vec<_>>>()?;

        Ok(EngineConfig {
            n_simulations: self.config.n_simulations,
            time_horizon: self.config.time_horizon,
            seed: self.config.seed,
            initial_capital_dist: self.capital_dev.initial_capital.to_distribution()?,
            dev_duration_dist: self.capital_dev.dev_duration.to_distribution()?,
            dev_burn_dist: self.capital_dev.dev_burn.to_distribution()?,
            leads_per_month_dist: self.sales.leads_per_month.to_distribution()?,
            win_rate_bumn_dist: self.sales.win_rate_bumn.to_distribution()?,
            win_rate_open_dist: self.sales.win_rate_open.to_distribution()?,
            bumn_ratio: self.sales.bumn_ratio,
            churn_rate_dist: self.retention_costs.churn_rate.to_distribution()?,
            contract_small_dist: self.pricing.contract_small.to_distribution()?,
            contract_medium_dist: self.pricing.contract_medium.to_distribution()?,
            contract_large_dist: self.pricing.contract_large.to_distribution()?,
            size_weights,
            sales_cycle_dist: self.sales.sales_cycle_months.to_distribution()?,
            op_overhead: self.retention_costs.op_overhead,
            cost_per_customer: self.retention_costs.cost_per_customer,
            enable_regime_switching: self.config.enable_regime_switching,
            enable_risk_events: self.config.enable_risk_events,
            risk_events,
        })
    }

    /// The "base" scenario: moderate assumptions across the board.
    pub fn base() -> Self {
        SimulationInput {
            capital_dev: CapitalDevParams {
                initial_capital: DistributionSpec::Triangular { min: 4000.0, mode: 5000.0, max: 6000.0 },
                dev_duration: DistributionSpec::Triangular { min: 4.0, mode: 6.0, max: 9.0 },
                dev_burn: DistributionSpec::Triangular { min: 160.0, mode: 200.0, max: 250.0 },
            },
            sales: SalesParams {
                leads_per_month: DistributionSpec::Triangular { min: 4.0, mode: 7.0, max: 12.0 },
                win_rate_bumn: DistributionSpec::Beta { alpha: 14.0, beta: 6.0 },
                win_rate_open: DistributionSpec::Beta { alpha: 4.0, beta: 14.0 },
                bumn_ratio: 0.35,
                sales_cycle_months: DistributionSpec::Gamma { shape: 6.25, scale: 0.8 },
            },
            pricing: PricingParams {
                contract_small: DistributionSpec::LogNormalMeanCv { mean: 180.0, cv: 0.2 },
                contract_medium: DistributionSpec::LogNormalMeanCv { mean: 320.0, cv: 0.15 },
                contract_large: DistributionSpec::LogNormalMeanCv { mean: 550.0, cv: 0.1 },
                size_distribution: vec![
                    ("small".to_string(), 0.5),
                    ("medium".to_string(), 0.35),
                    ("large".to_string(), 0.15),
                ],
            },
            retention_costs: RetentionCostParams {
                churn_rate: DistributionSpec::Beta { alpha: 2.0, beta: 18.0 },
                op_overhead: 120.0,
                cost_per_customer: 5.0,
            },
            risk_events: Vec::new(),
            config: SimulationRunConfig::default(),
        }
    }

    /// Pessimistic scenario: slower ramp, thinner margins, tighter capital.
    pub fn conservative() -> Self {
        let mut input = Self::base();
        input.capital_dev.initial_capital =
            DistributionSpec::Triangular { min: 3000.0, mode: 3800.0, max: 4500.0 };
        input.capital_dev.dev_duration = DistributionSpec::Triangular { min: 6.0, mode: 9.0, max: 13.0 };
        input.capital_dev.dev_burn = DistributionSpec::Triangular { min: 200.0, mode: 260.0, max: 330.0 };
        input.sales.leads_per_month = DistributionSpec::Triangular { min: 2.0, mode: 4.0, max: 7.0 };
        input.sales.win_rate_bumn = DistributionSpec::Beta { alpha: 8.0, beta: 12.0 };
        input.sales.win_rate_open = DistributionSpec::Beta { alpha: 3.0, beta: 17.0 };
        input.retention_costs.churn_rate = DistributionSpec::Beta { alpha: 4.0, beta: 16.0 };
        input
    }

    /// Optimistic scenario: faster ramp, stronger win rates, lower churn.
    pub fn aggressive() -> Self {
        let mut input = Self::base();
        input.capital_dev.initial_capital =
            DistributionSpec::Triangular { min: 5000.0, mode: 6500.0, max: 8000.0 };
        input.capital_dev.dev_duration = DistributionSpec::Triangular { min: 3.0, mode: 4.5, max: 6.0 };
        input.capital_dev.dev_burn = DistributionSpec::Triangular { min: 140.0, mode: 170.0, max: 210.0 };
        input.sales.leads_per_month = DistributionSpec::Triangular { min: 6.0, mode: 10.0, max: 16.0 };
        input.sales.win_rate_bumn = DistributionSpec::Beta { alpha: 18.0, beta: 4.0 };
        input.sales.win_rate_open = DistributionSpec::Beta { alpha: 6.0, beta: 12.0 };
        input.retention_costs.churn_rate = DistributionSpec::Beta { alpha: 1.5, beta: 22.0 };
        input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_preset_converts_to_valid_engine_config() {
        let input = SimulationInput::base();
        let engine_config = input.to_engine_config().unwrap();
        assert!(engine_config.validate().is_ok());
        assert_eq!(engine_config.n_simulations, 500);
        assert_eq!(engine_config.time_horizon, 36);
    }

    #[test]
    fn test_conservative_and_aggressive_presets_are_valid() {
        assert!(SimulationInput::conservative().to_engine_config().is_ok());
        assert!(SimulationInput::aggressive().to_engine_config().is_ok());
    }

    #[test]
    fn test_distribution_spec_round_trips_into_sampleable_distribution() {
        let spec = DistributionSpec::Triangular { min: 1.0, mode: 2.0, max: 3.0 };
        let dist = spec.to_distribution().unwrap();
        let mut rng = rand::thread_rng();
        let v = dist.sample(&mut rng);
        assert!(v >= 1.0 && v <= 3.0);
    }

    #[test]
    fn test_risk_event_spec_rejects_out_of_range_severity() {
        let spec = RiskEventSpec {
            name: "bad".to_string(),
            intensity: 1.0,
            impact_type: ImpactChannel::Churn,
            severity_min: -0.5,
            severity_mode: 1.0,
            severity_max: 1.5,
            recovery_rate: 0.3,
            start_month: 1,
            end_month: None,
        };
        assert!(spec.to_risk_event_config().is_err());
    }
}
