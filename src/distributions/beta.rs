// src/distributions/beta.rs
use crate::error::validation::{validate_positive, validate_range};
use crate::error::SimResult;
use rand::Rng;
use rand_distr::{Beta as RdBeta, Distribution as _};
use statrs::function::gamma::ln_gamma;

/// Beta(α, β) distribution on `(0, 1)`.
#[derive(Debug, Clone, Copy)]
pub struct Beta {
    alpha: f64,
    beta: f64,
}

impl Beta {
    pub fn new(alpha: f64, beta: f64) -> SimResult<Self> {
        validate_positive("alpha", alpha)?;
        validate_positive("beta", beta)?;
        Ok(Self { alpha, beta })
    }

    /// `α = mean·n`, `β = (1-mean)·n` for a chosen "sample size" `n`.
    pub fn from_mean_sample_size(mean: f64, n: f64) -> SimResult<Self> {
        validate_range("mean", mean, 0.0, 1.0)?;
        validate_positive("n", n)?;
        Self::new(mean * n, (1.0 - mean) * n)
    }

    /// Solves `alpha+beta` from the mean/variance relationship
    /// `Σ = mean(1-mean)/std² - 1`.
    pub fn from_mean_std(mean: f64, std: f64) -> SimResult<Self> {
        validate_range("mean", mean, 0.0, 1.0)?;
        validate_positive("std", std)?;
        let variance = std * std;
        let max_variance = mean * (1.0 - mean);
        let sum_ab = (max_variance / variance.min(max_variance * 0.999) - 1.0).max(1e-6);
        Self::from_mean_sample_size(mean, sum_ab)
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        RdBeta::new(self.alpha, self.beta)
            .expect("validated at construction")
            .sample(rng)
    }

    pub fn pdf(&self, x: f64) -> f64 {
        if !(0.0..=1.0).contains(&x) {
            return 0.0;
        }
        let log_norm = ln_gamma(self.alpha + self.beta) - ln_gamma(self.alpha) - ln_gamma(self.beta);
        let log_density = log_norm + (self.alpha - 1.0) * x.ln() + (self.beta - 1.0) * (1.0 - x).ln();
        log_density.exp()
    }

    pub fn cdf(&self, x: f64) -> f64 {
        if x <= 0.0 {
            return 0.0;
        }
        if x >= 1.0 {
            return 1.0;
        }
        statrs::function::beta::beta_reg(self.alpha, self.beta, x)
    }

    pub fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }

    pub fn std(&self) -> f64 {
        let a = self.alpha;
        let b = self.beta;
        ((a * b) / ((a + b).powi(2) * (a + b + 1.0))).sqrt()
    }

    pub fn support(&self) -> (f64, f64) {
        (0.0, 1.0)
    }

    pub fn mode(&self) -> Option<f64> {
        if self.alpha > 1.0 && self.beta > 1.0 {
            Some((self.alpha - 1.0) / (self.alpha + self.beta - 2.0))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sample_stays_in_open_unit_interval() {
        let beta = Beta::new(2.0, 5.0).unwrap();
        let mut rng = rand::thread_rng();
        for _ in 0..10_000 {
            let x = beta.sample(&mut rng);
            assert!(x > 0.0 && x < 1.0);
        }
    }

    #[test]
    fn test_empirical_mean_matches_formula() {
        let beta = Beta::new(2.0, 8.0).unwrap();
        let mut rng = rand::thread_rng();
        let n = 200_000;
        let sum: f64 = (0..n).map(|_| beta.sample(&mut rng)).sum();
        let empirical = sum / n as f64;
        assert_relative_eq!(empirical, beta.mean(), epsilon = 0.01);
    }

    #[test]
    fn test_mode_undefined_for_small_params() {
        let beta = Beta::new(0.5, 0.5).unwrap();
        assert!(beta.mode().is_none());
    }

    #[test]
    fn test_invalid_params_rejected() {
        assert!(Beta::new(0.0, 1.0).is_err());
        assert!(Beta::new(1.0, -1.0).is_err());
    }
}
