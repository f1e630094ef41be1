// src/simulation/path.rs
use crate::processes::{Regime, RegimeMultipliers, RegimeSwitchingModel};
use crate::rng::get_poisson_draw;
use crate::simulation::business_model::{BusinessModel, BusinessState};
use crate::simulation::risk_manager::{Channel, RiskEventManager};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Realized scalar parameters for one path, frozen for sensitivity analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealizedParams {
    pub initial_capital: f64,
    pub dev_duration: f64,
    pub dev_burn: f64,
    pub leads_per_month: f64,
    pub win_rate_bumn: f64,
    pub win_rate_open: f64,
    pub annual_churn_rate: f64,
}

impl RealizedParams {
    pub fn as_map(&self) -> HashMap<String, f64> {
        let mut map = HashMap::new();
        map.insert("initial_capital".to_string(), self.initial_capital);
        map.insert("dev_duration".to_string(), self.dev_duration);
        map.insert("dev_burn".to_string(), self.dev_burn);
        map.insert("leads_per_month".to_string(), self.leads_per_month);
        map.insert("win_rate_bumn".to_string(), self.win_rate_bumn);
        map.insert("win_rate_open".to_string(), self.win_rate_open);
        map.insert("annual_churn_rate".to_string(), self.annual_churn_rate);
        map
    }
}

/// A recorded shock arrival: `(month, channel, severity)`.
pub type ShockRecord = (usize, Channel, f64);

/// The full outcome of simulating one business trajectory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathResult {
    pub initial_capital: f64,
    pub final_capital: f64,
    pub total_return: f64,
    pub max_drawdown: f64,
    pub breakeven_month: i64,
    pub is_ruin: bool,

    pub equity_curve: Vec<f64>,
    pub monthly_pnl: Vec<f64>,
    pub customer_series: Vec<u64>,

    pub regime_path: Vec<Regime>,
    pub months_in_stress: usize,

    pub total_shocks: usize,
    pub shock_timeline: Vec<ShockRecord>,

    pub realized_params: RealizedParams,
}

pub struct PathSimulatorInputs<'a> {
    pub business_model: &'a BusinessModel,
    pub regime_model: Option<&'a RegimeSwitchingModel>,
    pub risk_manager: Option<RiskEventManager>,
    pub time_horizon: usize,
}

/// Simulates one full path by composing the business model with the
/// regime-switching process and risk-event manager.
///
/// Per-month ordering: arrivals, then operations consume that month's
/// combined multipliers, then recoveries (affecting only next month's
/// multipliers), then the capital update.
pub fn simulate_path<R: Rng + ?Sized>(
    inputs: PathSimulatorInputs<'_>,
    initial_capital: f64,
    dev_duration: usize,
    dev_burn: f64,
    leads_per_month: f64,
    win_rate_bumn: f64,
    win_rate_open: f64,
    bumn_ratio: f64,
    annual_churn_rate: f64,
    rng: &mut R,
) -> PathResult {
    let PathSimulatorInputs {
        business_model,
        regime_model,
        mut risk_manager,
        time_horizon,
    } = inputs;

    let mut state = BusinessState::new(initial_capital);

    let mut equity_curve = vec![0.0; time_horizon + 1];
    equity_curve[0] = initial_capital;
    let mut monthly_pnl = vec![0.0; time_horizon];
    let mut customer_series = vec![0u64; time_horizon + 1];

    let mut current_regime = regime_model.map(|m| m.initial()).unwrap_or(Regime::Normal);
    let mut regime_path = Vec::with_capacity(time_horizon);
    let mut months_in_stress = 0usize;

    if let Some(manager) = risk_manager.as_mut() {
        manager.reset();
    }
    let mut shock_timeline = Vec::new();
    let mut total_shocks = 0usize;

    let avg_contract = business_model.compute_avg_contract_value();
    let mut is_ruin = false;

    for month in 0..time_horizon {
        // 1. Advance regime.
        let regime_mults = if let Some(model) = regime_model {
            current_regime = model.next(current_regime, rng);
            if current_regime == Regime::Stress {
                months_in_stress += 1;
            }
            RegimeMultipliers::for_regime(current_regime)
        } else {
            RegimeMultipliers::for_regime(Regime::Normal)
        };
        regime_path.push(current_regime);

        // 2. Arrivals.
        let mut risk_mults: HashMap<Channel, f64> = Channel::ALL.iter().map(|c| (*c, 1.0)).collect();
        if let Some(manager) = risk_manager.as_mut() {
            let new_shocks = manager.check_for_arrivals(month, rng, regime_mults.risk_intensity);
            for shock in &new_shocks {
                shock_timeline.push((month, shock.channel, shock.severity));
                total_shocks += 1;
            }
            risk_mults = manager.get_multipliers();
        }

        // 3. Combine multipliers.
        let combined_adoption = regime_mults.lead * risk_mults[&Channel::Adoption];
        let combined_churn = regime_mults.churn * risk_mults[&Channel::Churn];
        let combined_revenue = regime_mults.revenue * risk_mults[&Channel::Revenue];
        let combined_cost = regime_mults.cost * risk_mults[&Channel::Cost];
        let win_rate_multiplier = regime_mults.win_rate;

        let is_dev_phase = month < dev_duration;

        let (revenue, costs);
        if is_dev_phase {
            revenue = 0.0;
            costs = business_model.compute_costs(&state, true, dev_burn, combined_cost);
        } else {
            let effective_lead_rate = (leads_per_month * combined_adoption).max(0.0);
            let n_leads = get_poisson_draw(rng, effective_lead_rate);

            business_model.process_new_leads(
                &mut state,
                month,
                n_leads,
                win_rate_bumn,
                win_rate_open,
                bumn_ratio,
                win_rate_multiplier,
                rng,
            );
            business_model.process_pipeline_closings(&mut state, month);
            business_model.apply_churn(&mut state, annual_churn_rate, combined_churn, rng);

            revenue = business_model.compute_revenue(&state, avg_contract, combined_revenue);
            costs = business_model.compute_costs(&state, false, 0.0, combined_cost);
        }

        // 4. Recoveries: run after this month's operations, so a recovery
        // only affects multipliers read in a later month.
        if let Some(manager) = risk_manager.as_mut() {
            manager.process_recoveries(rng);
        }

        // 5. Capital update.
        let net_flow = revenue - costs;
        state.capital += net_flow;
        state.update_drawdown();

        if state.breakeven_month == -1 && state.capital >= initial_capital && !is_dev_phase {
            state.breakeven_month = (month + 1) as i64;
        }

        monthly_pnl[month] = net_flow;
        equity_curve[month + 1] = state.capital;
        customer_series[month + 1] = state.customers;

        if state.capital <= 0.0 {
            is_ruin = true;
            for future in (month + 2)..=time_horizon {
                equity_curve[future] = state.capital;
                customer_series[future] = 0;
            }
            for future in (month + 1)..time_horizon {
                monthly_pnl[future] = 0.0;
            }
            break;
        }
    }

    let final_capital = state.capital;
    let total_return = (final_capital - initial_capital) / initial_capital * 100.0;

    PathResult {
        initial_capital,
        final_capital,
        total_return,
        max_drawdown: state.max_drawdown * 100.0,
        breakeven_month: state.breakeven_month,
        is_ruin,
        equity_curve,
        monthly_pnl,
        customer_series,
        regime_path,
        months_in_stress,
        total_shocks,
        shock_timeline,
        realized_params: RealizedParams {
            initial_capital,
            dev_duration: dev_duration as f64,
            dev_burn,
            leads_per_month,
            win_rate_bumn,
            win_rate_open,
            annual_churn_rate,
        },
    }
}
