// src/processes/gbm.rs
use crate::error::validation::{validate_finite, validate_non_negative};
use crate::error::SimResult;
use crate::math_utils::inv_norm_cdf;
use crate::rng::get_normal_draw;
use rand::Rng;

/// Geometric Brownian motion with the exact (not Euler) discretization:
/// `S_{t+dt} = S_t * exp((μ - σ²/2)dt + σ√dt·Z)`.
///
/// Quantiles use a native inverse standard-normal CDF rather than calling
/// out to a statistical-fitting dependency at runtime.
#[derive(Debug, Clone, Copy)]
pub struct Gbm {
    s0: f64,
    mu: f64,
    sigma: f64,
}

impl Gbm {
    pub fn new(s0: f64, mu: f64, sigma: f64) -> SimResult<Self> {
        validate_non_negative("s0", s0)?;
        validate_finite("mu", mu)?;
        validate_non_negative("sigma", sigma)?;
        Ok(Self { s0, mu, sigma })
    }

    pub fn exact_step<R: Rng + ?Sized>(&self, s_t: f64, dt: f64, rng: &mut R) -> f64 {
        if s_t <= 0.0 {
            return 0.0;
        }
        let z = get_normal_draw(rng);
        s_t * ((self.mu - 0.5 * self.sigma * self.sigma) * dt + self.sigma * dt.sqrt() * z).exp()
    }

    /// Draws the full path at once: all `n` innovations up front, then a
    /// single cumulative-sum exponentiation pass.
    pub fn path<R: Rng + ?Sized>(&self, n: usize, dt: f64, rng: &mut R) -> Vec<f64> {
        let drift_term = (self.mu - 0.5 * self.sigma * self.sigma) * dt;
        let vol_term = self.sigma * dt.sqrt();
        let mut out = Vec::with_capacity(n + 1);
        out.push(self.s0);
        let mut cumulative_log = 0.0;
        for _ in 0..n {
            if self.s0 <= 0.0 {
                out.push(0.0);
                continue;
            }
            let z = get_normal_draw(rng);
            cumulative_log += drift_term + vol_term * z;
            out.push(self.s0 * cumulative_log.exp());
        }
        out
    }

    pub fn expected_value(&self, t: f64) -> f64 {
        self.s0 * (self.mu * t).exp()
    }

    pub fn median(&self, t: f64) -> f64 {
        self.s0 * ((self.mu - 0.5 * self.sigma * self.sigma) * t).exp()
    }

    /// `q`-quantile of `S(t)`, `q` in `(0, 1)`.
    pub fn quantile(&self, t: f64, q: f64) -> f64 {
        if self.sigma < 1e-12 || t < 1e-12 {
            return self.expected_value(t);
        }
        let z = inv_norm_cdf(q);
        self.s0 * ((self.mu - 0.5 * self.sigma * self.sigma) * t + self.sigma * t.sqrt() * z).exp()
    }
}
