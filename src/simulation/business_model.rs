// src/simulation/business_model.rs
use crate::distributions::Distribution;
use crate::error::validation::validate_non_negative;
use crate::error::SimResult;
use crate::rng::{get_binomial_draw, get_categorical_draw};
use rand::Rng;
use std::collections::HashMap;

/// A deal in the sales pipeline. `will_convert` is decided at entry so a
/// deal's eventual effect on customer count is fixed before it closes.
#[derive(Debug, Clone)]
pub struct PipelineDeal {
    pub entry_month: usize,
    pub close_month: usize,
    pub will_convert: bool,
    pub contract_value: f64,
    pub is_bumn: bool,
}

/// Mutable per-path business state.
#[derive(Debug, Clone)]
pub struct BusinessState {
    pub capital: f64,
    pub customers: u64,
    pub pipeline: Vec<PipelineDeal>,
    pub peak_capital: f64,
    pub max_drawdown: f64,
    pub breakeven_month: i64,
}

impl BusinessState {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            capital: initial_capital,
            customers: 0,
            pipeline: Vec::new(),
            peak_capital: initial_capital,
            max_drawdown: 0.0,
            breakeven_month: -1,
        }
    }

    pub fn update_drawdown(&mut self) {
        if self.capital > self.peak_capital {
            self.peak_capital = self.capital;
        }
        if self.peak_capital > 0.0 {
            let current_dd = (self.peak_capital - self.capital) / self.peak_capital;
            self.max_drawdown = self.max_drawdown.max(current_dd);
        }
    }
}

/// Per-channel multipliers business operations are sensitive to.
#[derive(Debug, Clone, Copy)]
pub struct ChannelMultipliers {
    pub adoption: f64,
    pub win_rate: f64,
    pub churn: f64,
    pub revenue: f64,
    pub cost: f64,
}

impl Default for ChannelMultipliers {
    fn default() -> Self {
        Self {
            adoption: 1.0,
            win_rate: 1.0,
            churn: 1.0,
            revenue: 1.0,
            cost: 1.0,
        }
    }
}

/// Fixed (named) contract-size buckets with their own value distribution.
pub struct BusinessModel {
    pub contract_distributions: HashMap<String, Distribution>,
    pub size_names: Vec<String>,
    pub size_probs: Vec<f64>,
    pub sales_cycle_dist: Distribution,
    pub op_overhead: f64,
    pub cost_per_customer: f64,
}

impl BusinessModel {
    pub fn new(
        contract_distributions: HashMap<String, Distribution>,
        size_weights: &[(String, f64)],
        sales_cycle_dist: Distribution,
        op_overhead: f64,
        cost_per_customer: f64,
    ) -> SimResult<Self> {
        validate_non_negative("op_overhead", op_overhead)?;
        validate_non_negative("cost_per_customer", cost_per_customer)?;

        let total: f64 = size_weights.iter().map(|(_, w)| w).sum();
        let total = if total.abs() < 1e-12 { 1.0 } else { total };
        let size_names: Vec<String> = size_weights.iter().map(|(n, _)| n.clone()).collect();
        let size_probs: Vec<f64> = size_weights.iter().map(|(_, w)| w / total).collect();

        Ok(Self {
            contract_distributions,
            size_names,
            size_probs,
            sales_cycle_dist,
            op_overhead,
            cost_per_customer,
        })
    }

    pub fn sample_contract_value<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let idx = get_categorical_draw(rng, &self.size_probs);
        let size = &self.size_names[idx];
        self.contract_distributions
            .get(size)
            .map(|d| d.sample(rng))
            .unwrap_or(0.0)
    }

    /// Sales-cycle duration in months, drawn from the configured
    /// sales-cycle distribution.
    pub fn sample_sales_cycle<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let duration = self.sales_cycle_dist.sample(rng);
        duration.round().max(1.0) as usize
    }

    pub fn process_new_leads<R: Rng + ?Sized>(
        &self,
        state: &mut BusinessState,
        month: usize,
        n_leads: u64,
        win_rate_bumn: f64,
        win_rate_open: f64,
        bumn_ratio: f64,
        win_mult: f64,
        rng: &mut R,
    ) {
        for _ in 0..n_leads {
            let is_bumn = rng.gen::<f64>() < bumn_ratio;
            let base_win = if is_bumn { win_rate_bumn } else { win_rate_open };
            let effective_win = (base_win * win_mult).min(1.0);
            let will_convert = rng.gen::<f64>() < effective_win;

            let contract_value = self.sample_contract_value(rng);
            let cycle = self.sample_sales_cycle(rng);

            state.pipeline.push(PipelineDeal {
                entry_month: month,
                close_month: month + cycle,
                will_convert,
                contract_value,
                is_bumn,
            });
        }
    }

    pub fn process_pipeline_closings(&self, state: &mut BusinessState, month: usize) -> u64 {
        let mut new_customers = 0u64;
        state.pipeline.retain(|deal| {
            if deal.close_month <= month {
                if deal.will_convert {
                    new_customers += 1;
                }
                false
            } else {
                true
            }
        });
        state.customers += new_customers;
        new_customers
    }

    pub fn apply_churn<R: Rng + ?Sized>(
        &self,
        state: &mut BusinessState,
        annual_churn_rate: f64,
        churn_mult: f64,
        rng: &mut R,
    ) -> u64 {
        if state.customers == 0 {
            return 0;
        }
        let effective_annual = (annual_churn_rate * churn_mult).min(0.99);
        let monthly_churn_prob = 1.0 - (1.0 - effective_annual).powf(1.0 / 12.0);
        let churned = get_binomial_draw(rng, state.customers, monthly_churn_prob);
        state.customers = state.customers.saturating_sub(churned);
        churned
    }

    pub fn compute_revenue(&self, state: &BusinessState, avg_contract_value: f64, revenue_mult: f64) -> f64 {
        let monthly_contract = avg_contract_value / 12.0;
        state.customers as f64 * monthly_contract * revenue_mult
    }

    pub fn compute_costs(&self, state: &BusinessState, is_dev_phase: bool, dev_burn: f64, cost_mult: f64) -> f64 {
        if is_dev_phase {
            return dev_burn * cost_mult;
        }
        let fixed = self.op_overhead;
        let variable = state.customers as f64 * self.cost_per_customer;
        (fixed + variable) * cost_mult
    }

    pub fn compute_avg_contract_value(&self) -> f64 {
        self.size_names
            .iter()
            .zip(&self.size_probs)
            .map(|(name, prob)| {
                prob * self
                    .contract_distributions
                    .get(name)
                    .map(|d| d.mean())
                    .unwrap_or(0.0)
            })
            .sum()
    }
}
