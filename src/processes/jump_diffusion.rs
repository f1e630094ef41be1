// src/processes/jump_diffusion.rs
use crate::error::validation::{validate_finite, validate_non_negative};
use crate::error::SimResult;
use crate::rng::get_normal_draw;
use rand::Rng;
use rand_distr::{Distribution, Poisson};

/// Merton jump-diffusion: continuous GBM-style dynamics plus compound
/// Poisson log-jumps.
///
/// The continuous part uses a drift compensated for the jump contribution
/// so that `E[S(t)] = S0 * exp(mu * t)` holds regardless of jump
/// parameters: `mu_compensated = mu - lambda * (exp(mu_j + sigma_j^2/2) - 1)`.
#[derive(Debug, Clone, Copy)]
pub struct JumpDiffusion {
    s0: f64,
    mu: f64,
    sigma: f64,
    lambda: f64,
    mu_j: f64,
    sigma_j: f64,
}

impl JumpDiffusion {
    pub fn new(s0: f64, mu: f64, sigma: f64, lambda: f64, mu_j: f64, sigma_j: f64) -> SimResult<Self> {
        validate_non_negative("s0", s0)?;
        validate_finite("mu", mu)?;
        validate_non_negative("sigma", sigma)?;
        validate_non_negative("lambda", lambda)?;
        validate_finite("mu_j", mu_j)?;
        validate_non_negative("sigma_j", sigma_j)?;
        Ok(Self {
            s0,
            mu,
            sigma,
            lambda,
            mu_j,
            sigma_j,
        })
    }

    fn compensated_drift(&self) -> f64 {
        self.mu - self.lambda * ((self.mu_j + 0.5 * self.sigma_j * self.sigma_j).exp() - 1.0)
    }

    pub fn step<R: Rng + ?Sized>(&self, s: f64, dt: f64, rng: &mut R) -> (f64, u64) {
        if s <= 0.0 {
            return (0.0, 0);
        }
        let drift = self.compensated_drift();
        let z = get_normal_draw(rng);
        let mut next = s * ((drift - 0.5 * self.sigma * self.sigma) * dt + self.sigma * dt.sqrt() * z).exp();

        let n_jumps = Poisson::new(self.lambda * dt)
            .expect("lambda*dt validated non-negative")
            .sample(rng) as u64;
        for _ in 0..n_jumps {
            let log_jump = self.mu_j + self.sigma_j * get_normal_draw(rng);
            next *= log_jump.exp();
        }
        (next, n_jumps)
    }

    /// Full path plus a diffusion-only (no-jump) counterfactual path, and
    /// the months at which a jump occurred.
    pub fn decompose_path<R: Rng + ?Sized>(
        &self,
        n: usize,
        dt: f64,
        rng: &mut R,
    ) -> (Vec<f64>, Vec<f64>, Vec<usize>) {
        let drift = self.compensated_drift();
        let mut full = Vec::with_capacity(n + 1);
        let mut diffusion_only = Vec::with_capacity(n + 1);
        let mut jump_times = Vec::new();

        full.push(self.s0);
        diffusion_only.push(self.s0);

        let mut s_full = self.s0;
        let mut s_diff = self.s0;

        for month in 0..n {
            let z = get_normal_draw(rng);
            let diffusion_increment = (drift - 0.5 * self.sigma * self.sigma) * dt + self.sigma * dt.sqrt() * z;

            s_diff = if s_diff > 0.0 { s_diff * diffusion_increment.exp() } else { 0.0 };

            let mut s_next = if s_full > 0.0 { s_full * diffusion_increment.exp() } else { 0.0 };

            let n_jumps = Poisson::new(self.lambda * dt)
                .expect("lambda*dt validated non-negative")
                .sample(rng) as u64;
            if n_jumps > 0 {
                jump_times.push(month);
                for _ in 0..n_jumps {
                    let log_jump = self.mu_j + self.sigma_j * get_normal_draw(rng);
                    s_next *= log_jump.exp();
                }
            }

            s_full = s_next;
            full.push(s_full);
            diffusion_only.push(s_diff);
        }

        (full, diffusion_only, jump_times)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_no_jumps_matches_gbm_expectation_over_many_paths() {
        let jd = JumpDiffusion::new(100.0, 0.08, 0.2, 2.0, -0.05, 0.1).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let n_paths = 20_000;
        let horizon_years = 2.0;
        let steps = 24;
        let dt = horizon_years / steps as f64;

        let mut log_ratios = Vec::with_capacity(n_paths);
        for _ in 0..n_paths {
            let mut s = 100.0;
            for _ in 0..steps {
                let (next, _) = jd.step(s, dt, &mut rng);
                s = next;
            }
            log_ratios.push((s / 100.0).ln());
        }
        let log_expected_ratio =
            (log_ratios.iter().map(|x| x.exp()).sum::<f64>() / n_paths as f64).ln();
        let expected = 0.08 * horizon_years;
        assert!(
            (log_expected_ratio - expected).abs() < 0.05,
            "log E[S/S0] {} should be near {}",
            log_expected_ratio,
            expected
        );
    }

    #[test]
    fn test_zero_state_stays_zero() {
        let jd = JumpDiffusion::new(0.0, 0.1, 0.2, 1.0, 0.0, 0.1).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let (next, jumps) = jd.step(0.0, 1.0, &mut rng);
        assert_eq!(next, 0.0);
        assert_eq!(jumps, 0);
    }

    #[test]
    fn test_decompose_path_lengths() {
        let jd = JumpDiffusion::new(100.0, 0.05, 0.2, 1.0, -0.02, 0.1).unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        let (full, diff, _) = jd.decompose_path(36, 1.0 / 12.0, &mut rng);
        assert_eq!(full.len(), 37);
        assert_eq!(diff.len(), 37);
    }
}
