// src/processes/regime.rs
use crate::error::validation::{validate_probability, validate_stochastic_matrix};
use crate::error::{SimError, SimResult};
use crate::rng::get_categorical_draw;
use nalgebra::{DMatrix, DVector};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A latent macro state governing per-channel business multipliers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Regime {
    Normal,
    Stress,
    Boom,
}

impl Regime {
    pub fn index(&self) -> usize {
        match self {
            Regime::Normal => 0,
            Regime::Stress => 1,
            Regime::Boom => 2,
        }
    }

    pub fn from_index(i: usize) -> Self {
        match i {
            0 => Regime::Normal,
            1 => Regime::Stress,
            _ => Regime::Boom,
        }
    }

    pub const ALL: [Regime; 3] = [Regime::Normal, Regime::Stress, Regime::Boom];
}

/// Per-channel multipliers a regime applies to business operations.
#[derive(Debug, Clone, Copy)]
pub struct RegimeMultipliers {
    pub lead: f64,
    pub win_rate: f64,
    pub churn: f64,
    pub revenue: f64,
    pub cost: f64,
    pub risk_intensity: f64,
}

impl RegimeMultipliers {
    pub fn for_regime(regime: Regime) -> Self {
        match regime {
            Regime::Normal => Self {
                lead: 1.0,
                win_rate: 1.0,
                churn: 1.0,
                revenue: 1.0,
                cost: 1.0,
                risk_intensity: 1.0,
            },
            Regime::Stress => Self {
                lead: 0.7,
                win_rate: 0.85,
                churn: 1.3,
                revenue: 0.95,
                cost: 1.1,
                risk_intensity: 2.0,
            },
            Regime::Boom => Self {
                lead: 1.4,
                win_rate: 1.15,
                churn: 0.8,
                revenue: 1.1,
                cost: 0.95,
                risk_intensity: 0.5,
            },
        }
    }
}

/// Markov regime-switching process with a row-stochastic transition matrix.
pub struct RegimeSwitchingModel {
    transition: Vec<Vec<f64>>,
    initial: Regime,
}

impl RegimeSwitchingModel {
    pub fn new(transition: Vec<Vec<f64>>, initial: Regime) -> SimResult<Self> {
        validate_stochastic_matrix(&transition, 1e-6)?;
        if transition.len() != Regime::ALL.len() {
            return Err(SimError::ShapeMismatch {
                expected: format!("{}x{}", Regime::ALL.len(), Regime::ALL.len()),
                actual: format!("{}x{}", transition.len(), transition.first().map_or(0, |r| r.len())),
                context: "regime transition matrix".to_string(),
            });
        }
        Ok(Self { transition, initial })
    }

    /// Builds a plausible transition matrix from target stationary
    /// probabilities for stress/boom and a diagonal persistence target.
    ///
    /// Exact construction (not a generic fit): row 0 (from Normal) splits
    /// the non-persistent mass proportionally to the target stress/boom
    /// shares; rows 1 and 2 use a fixed 80/20 split of their non-persistent
    /// mass back toward Normal vs. the other non-Normal regime. Every row
    /// is renormalized to guard the case where `p_stress + p_boom` is close
    /// to 1.
    pub fn create_default(p_stress: f64, p_boom: f64, persistence: f64) -> SimResult<Self> {
        validate_probability("p_stress", p_stress)?;
        validate_probability("p_boom", p_boom)?;
        validate_probability("persistence", persistence)?;

        let normal = (1.0 - p_stress - p_boom).max(0.0);
        let denom = normal + 1e-10;

        let row0 = vec![
            persistence,
            (1.0 - persistence) * p_stress / denom,
            (1.0 - persistence) * p_boom / denom,
        ];
        let row1 = vec![(1.0 - persistence) * 0.8, persistence, (1.0 - persistence) * 0.2];
        let row2 = vec![(1.0 - persistence) * 0.8, (1.0 - persistence) * 0.2, persistence];

        let normalize = |row: Vec<f64>| -> Vec<f64> {
            let sum: f64 = row.iter().sum();
            if sum.abs() < 1e-12 {
                vec![1.0 / row.len() as f64; row.len()]
            } else {
                row.iter().map(|v| v / sum).collect()
            }
        };

        let transition = vec![normalize(row0), normalize(row1), normalize(row2)];
        Self::new(transition, Regime::Normal)
    }

    pub fn initial(&self) -> Regime {
        self.initial
    }

    pub fn next<R: Rng + ?Sized>(&self, current: Regime, rng: &mut R) -> Regime {
        let row = &self.transition[current.index()];
        Regime::from_index(get_categorical_draw(rng, row))
    }

    /// `H` transitions starting from the initial regime. Does **not**
    /// include the initial state itself — the first element is the regime
    /// after one transition.
    pub fn path<R: Rng + ?Sized>(&self, horizon: usize, rng: &mut R) -> Vec<Regime> {
        let mut current = self.initial;
        let mut out = Vec::with_capacity(horizon);
        for _ in 0..horizon {
            current = self.next(current, rng);
            out.push(current);
        }
        out
    }

    /// Solves `πP = π, Σπ = 1` via least squares on the augmented system
    /// `[Pᵀ - I; 1ᵀ]π = [0; 1]`. Approximate for near-absorbing matrices;
    /// negative components are clipped to 0 and the result renormalized.
    pub fn stationary_distribution(&self) -> Vec<f64> {
        let k = self.transition.len();
        let mut p = DMatrix::<f64>::zeros(k, k);
        for i in 0..k {
            for j in 0..k {
                p[(i, j)] = self.transition[i][j];
            }
        }

        let mut a = DMatrix::<f64>::zeros(k + 1, k);
        let pt_minus_i = p.transpose() - DMatrix::<f64>::identity(k, k);
        a.slice_mut((0, 0), (k, k)).copy_from(&pt_minus_i);
        for j in 0..k {
            a[(k, j)] = 1.0;
        }

        let mut b = DVector::<f64>::zeros(k + 1);
        b[k] = 1.0;

        let svd = a.svd(true, true);
        let solution = svd
            .solve(&b, 1e-10)
            .unwrap_or_else(|_| DVector::from_element(k, 1.0 / k as f64));

        let clipped: Vec<f64> = solution.iter().map(|v| v.max(0.0)).collect();
        let sum: f64 = clipped.iter().sum();
        if sum.abs() < 1e-12 {
            vec![1.0 / k as f64; k]
        } else {
            clipped.iter().map(|v| v / sum).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_create_default_rows_sum_to_one() {
        let model = RegimeSwitchingModel::create_default(0.15, 0.10, 0.9).unwrap();
        for row in &model.transition {
            let sum: f64 = row.iter().sum();
            assert_relative_eq!(sum, 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_path_excludes_initial_state() {
        let model = RegimeSwitchingModel::create_default(0.1, 0.1, 0.95).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let path = model.path(10, &mut rng);
        assert_eq!(path.len(), 10);
    }

    #[test]
    fn test_stress_absorbing_stationary_is_all_stress() {
        let transition = vec![vec![0.0, 1.0, 0.0], vec![0.0, 1.0, 0.0], vec![0.0, 1.0, 0.0]];
        let model = RegimeSwitchingModel::new(transition, Regime::Normal).unwrap();
        let stationary = model.stationary_distribution();
        assert_relative_eq!(stationary[Regime::Stress.index()], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_stationary_matches_long_run_time_in_regime() {
        let model = RegimeSwitchingModel::create_default(0.15, 0.1, 0.9).unwrap();
        let stationary = model.stationary_distribution();

        let mut rng = StdRng::seed_from_u64(42);
        let horizon = 20_000;
        let path = model.path(horizon, &mut rng);
        let mut counts = [0usize; 3];
        for r in &path {
            counts[r.index()] += 1;
        }
        for i in 0..3 {
            let empirical = counts[i] as f64 / horizon as f64;
            assert!(
                (empirical - stationary[i]).abs() < 0.02,
                "regime {} empirical {} vs stationary {}",
                i,
                empirical,
                stationary[i]
            );
        }
    }

    #[test]
    fn test_invalid_matrix_rejected() {
        let bad = vec![vec![0.5, 0.6, 0.0], vec![0.3, 0.3, 0.4], vec![0.1, 0.1, 0.8]];
        assert!(RegimeSwitchingModel::new(bad, Regime::Normal).is_err());
    }
}
