// src/processes/poisson.rs
use crate::error::validation::validate_non_negative;
use crate::error::SimResult;
use crate::rng::get_poisson_draw;
use rand::Rng;

/// A Poisson arrival process with a base rate and an optional per-step
/// multiplicative modifier (e.g. a regime's risk-intensity factor).
///
/// Effective rate at any step is `max(0, base_rate * modifier)`.
pub struct PoissonProcess {
    base_rate: f64,
}

impl PoissonProcess {
    pub fn new(base_rate: f64) -> SimResult<Self> {
        validate_non_negative("base_rate", base_rate)?;
        Ok(Self { base_rate })
    }

    pub fn effective_rate(&self, modifier: f64) -> f64 {
        (self.base_rate * modifier).max(0.0)
    }

    pub fn sample_count<R: Rng + ?Sized>(&self, rng: &mut R, modifier: f64) -> u64 {
        get_poisson_draw(rng, self.effective_rate(modifier))
    }

    /// Cumulative arrival count over `n` steps, each with its own modifier.
    pub fn cumulative_path<R: Rng + ?Sized>(&self, rng: &mut R, modifiers: &[f64]) -> Vec<u64> {
        let mut total = 0u64;
        modifiers
            .iter()
            .map(|&m| {
                total += self.sample_count(rng, m);
                total
            })
            .collect()
    }
}

/// Compound Poisson: per step, the sum of `N ~ Poisson(λ)` i.i.d. magnitudes
/// drawn from a caller-supplied sampler.
pub struct CompoundPoisson {
    process: PoissonProcess,
}

impl CompoundPoisson {
    pub fn new(base_rate: f64) -> SimResult<Self> {
        Ok(Self {
            process: PoissonProcess::new(base_rate)?,
        })
    }

    pub fn sample_step<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        modifier: f64,
        mut magnitude: impl FnMut(&mut R) -> f64,
    ) -> f64 {
        let n = self.process.sample_count(rng, modifier);
        (0..n).map(|_| magnitude(rng)).sum()
    }
}
