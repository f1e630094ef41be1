// src/distributions/lognormal.rs
use crate::error::validation::validate_positive;
use crate::error::SimResult;
use crate::math_utils::{inv_norm_cdf, norm_cdf};
use rand::Rng;
use rand_distr::{Distribution as _, LogNormal as RdLogNormal};

/// LogNormal(μ, σ) where `μ` is the mean of the underlying normal (log-mean).
#[derive(Debug, Clone, Copy)]
pub struct LogNormal {
    mu: f64,
    sigma: f64,
}

impl LogNormal {
    pub fn new(mu: f64, sigma: f64) -> SimResult<Self> {
        validate_positive("sigma", sigma)?;
        Ok(Self { mu, sigma })
    }

    /// `σ² = ln(1+cv²)`, `μ = ln(mean) - σ²/2`.
    pub fn from_mean_cv(mean: f64, cv: f64) -> SimResult<Self> {
        validate_positive("mean", mean)?;
        validate_positive("cv", cv)?;
        let sigma2 = (1.0 + cv * cv).ln();
        let mu = mean.ln() - sigma2 / 2.0;
        Self::new(mu, sigma2.sqrt())
    }

    pub fn from_mean_std(mean: f64, std: f64) -> SimResult<Self> {
        validate_positive("mean", mean)?;
        validate_positive("std", std)?;
        Self::from_mean_cv(mean, std / mean)
    }

    /// Fits `μ, σ` from the median and the 10th/90th percentile range,
    /// useful for expert-elicitation inputs.
    pub fn from_median_range(median: f64, p10: f64, p90: f64) -> SimResult<Self> {
        validate_positive("median", median)?;
        validate_positive("p10", p10)?;
        validate_positive("p90", p90)?;
        let mu = median.ln();
        let z90 = inv_norm_cdf(0.9);
        let sigma = ((p90.ln() - mu) / z90).abs().max(1e-9);
        Self::new(mu, sigma)
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        RdLogNormal::new(self.mu, self.sigma)
            .expect("validated at construction")
            .sample(rng)
    }

    pub fn pdf(&self, x: f64) -> f64 {
        if x <= 0.0 {
            return 0.0;
        }
        let z = (x.ln() - self.mu) / self.sigma;
        (-0.5 * z * z).exp() / (x * self.sigma * (2.0 * std::f64::consts::PI).sqrt())
    }

    pub fn cdf(&self, x: f64) -> f64 {
        if x <= 0.0 {
            return 0.0;
        }
        norm_cdf((x.ln() - self.mu) / self.sigma)
    }

    pub fn mean(&self) -> f64 {
        (self.mu + self.sigma * self.sigma / 2.0).exp()
    }

    pub fn std(&self) -> f64 {
        let var = (self.sigma * self.sigma).exp_m1() * (2.0 * self.mu + self.sigma * self.sigma).exp();
        var.max(0.0).sqrt()
    }

    pub fn support(&self) -> (f64, f64) {
        (0.0, f64::INFINITY)
    }

    pub fn median(&self) -> f64 {
        self.mu.exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_from_mean_cv_recovers_moments() {
        let dist = LogNormal::from_mean_cv(100.0, 0.3).unwrap();
        let mut rng = rand::thread_rng();
        let n = 500_000;
        let samples: Vec<f64> = (0..n).map(|_| dist.sample(&mut rng)).collect();
        let mean = samples.iter().sum::<f64>() / n as f64;
        let var = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
        let cv = var.sqrt() / mean;
        assert_relative_eq!(mean, 100.0, epsilon = 1.0);
        assert_relative_eq!(cv, 0.3, epsilon = 0.01);
    }

    #[test]
    fn test_samples_are_positive() {
        let dist = LogNormal::new(0.0, 1.0).unwrap();
        let mut rng = rand::thread_rng();
        for _ in 0..10_000 {
            assert!(dist.sample(&mut rng) > 0.0);
        }
    }

    #[test]
    fn test_invalid_sigma_rejected() {
        assert!(LogNormal::new(0.0, 0.0).is_err());
        assert!(LogNormal::new(0.0, -1.0).is_err());
    }
}
