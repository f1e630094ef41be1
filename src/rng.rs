// src/rng.rs
//! Random Number Generation for Monte Carlo Simulations
//!
//! # Design Philosophy
//!
//! Monte Carlo simulations require high-quality random numbers with specific
//! properties:
//! 1. **Reproducibility**: Same seed → same results (critical for debugging/validation)
//! 2. **Parallel safety**: Different workers must have independent streams
//! 3. **Performance**: Fast generation for thousands of paths
//! 4. **Statistical quality**: Good distributional properties
//!
//! # Splittable Streams
//!
//! Rather than a single process-wide generator, each path gets its own
//! stream derived deterministically from a base seed and the path's index.
//! [`StreamFactory`] mixes `(base_seed, index)` through a splitmix64-style
//! avalanche before seeding a standard generator, so adjacent indices don't
//! produce correlated low-order bits the way naively adding `index` to the
//! seed would.
//!
//! # Box-Muller Transform
//!
//! [`CounterRng::normal`] converts uniform random variables to normal
//! variates:
//! ```text
//! Z₁ = √(-2ln(U₁)) * cos(2πU₂)
//! Z₂ = √(-2ln(U₁)) * sin(2πU₂)
//! ```
//! where U₁, U₂ ~ Uniform(0,1) and Z₁, Z₂ ~ N(0,1).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Beta, Binomial, Distribution, Gamma, Poisson, StandardNormal, Triangular};

/// Mixes a base seed and a stream index into a well-distributed 64-bit seed
/// via the splitmix64 avalanche (the same mixing step [`CounterRng`] uses).
fn mix_seed(base_seed: u64, index: u64) -> u64 {
    let mut z = base_seed.wrapping_add(index.wrapping_mul(0x9E3779B97F4A7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9u64);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111ebu64);
    z ^ (z >> 31)
}

/// Factory for independent, reproducible RNG streams.
///
/// `spawn(n)` hands out `n` generators that are statistically independent of
/// each other and of the parent: each is seeded from a distinct mix of
/// `(base_seed, index)`, and spawning never mutates `self`.
pub struct StreamFactory {
    base_seed: u64,
}

impl StreamFactory {
    pub fn new(base_seed: u64) -> Self {
        Self { base_seed }
    }

    /// Spawn the `index`-th independent stream. Used both for parallel
    /// replication (`index` = path id) and for serial replay of a single
    /// path without touching the other streams.
    pub fn spawn_one(&self, index: u64) -> StdRng {
        StdRng::seed_from_u64(mix_seed(self.base_seed, index))
    }

    /// Spawn `n` independent streams, indexed `0..n`.
    pub fn spawn(&self, n: usize) -> Vec<StdRng> {
        (0..n as u64).map(|i| self.spawn_one(i)).collect()
    }
}

/// Counter-based RNG for reproducible, low-level draws.
///
/// # Algorithm
///
/// Uses a splitmix64-like algorithm for fast, high-quality random numbers:
/// ```text
/// z = base_seed + counter
/// z = (z ⊕ (z >> 30)) * 0xbf58476d1ce4e5b9
/// z = (z ⊕ (z >> 27)) * 0x94d049bb133111eb
/// output = z ⊕ (z >> 31)
/// ```
///
/// The Box-Muller spare value lives on the struct rather than in shared or
/// `unsafe` static state, so a `CounterRng` is `Send` and independent of any
/// other instance without synchronization.
#[derive(Debug, Clone)]
pub struct CounterRng {
    base_seed: u64,
    counter: u64,
    spare_normal: Option<f64>,
}

impl CounterRng {
    pub fn new(base_seed: u64, counter: u64) -> Self {
        Self {
            base_seed,
            counter,
            spare_normal: None,
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.counter = self.counter.wrapping_add(1);
        let mut z = self.base_seed.wrapping_add(self.counter);
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9u64);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111ebu64);
        z ^ (z >> 31)
    }

    pub fn uniform(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / 9007199254740992.0) // 2^53
    }

    pub fn normal(&mut self) -> f64 {
        if let Some(z) = self.spare_normal.take() {
            return z;
        }

        let u1 = self.uniform().max(f64::MIN_POSITIVE);
        let u2 = self.uniform();

        let mag = (-2.0 * u1.ln()).sqrt();
        let z1 = mag * (2.0 * std::f64::consts::PI * u2).cos();
        let z2 = mag * (2.0 * std::f64::consts::PI * u2).sin();

        self.spare_normal = Some(z2);
        z1
    }
}

/// RNG factory for reproducible parallel simulations (counter-based variant).
pub struct RngFactory {
    base_seed: u64,
}

impl RngFactory {
    pub fn new(base_seed: u64) -> Self {
        Self { base_seed }
    }

    /// Create a counter RNG for a specific path/thread.
    pub fn create_counter_rng(&self, path_id: u64) -> CounterRng {
        CounterRng::new(self.base_seed, path_id)
    }

    /// Create a standard RNG for a specific path/thread.
    pub fn create_std_rng(&self, path_id: u64) -> StdRng {
        StdRng::seed_from_u64(mix_seed(self.base_seed, path_id))
    }
}

pub fn seed_rng_from_u64(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

pub fn get_normal_draw<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    StandardNormal.sample(rng)
}

pub fn get_poisson_draw<R: Rng + ?Sized>(rng: &mut R, lambda: f64) -> u64 {
    if lambda <= 0.0 {
        return 0;
    }
    Poisson::new(lambda)
        .expect("lambda must be finite and positive")
        .sample(rng) as u64
}

pub fn get_binomial_draw<R: Rng + ?Sized>(rng: &mut R, n: u64, p: f64) -> u64 {
    let p = p.clamp(0.0, 1.0);
    if n == 0 {
        return 0;
    }
    Binomial::new(n, p).expect("p must be in [0, 1]").sample(rng)
}

pub fn get_triangular_draw<R: Rng + ?Sized>(rng: &mut R, a: f64, c: f64, b: f64) -> f64 {
    if b - a < 1e-10 {
        return c;
    }
    Triangular::new(a, b, c)
        .expect("triangular bounds must be ordered")
        .sample(rng)
}

pub fn get_beta_draw<R: Rng + ?Sized>(rng: &mut R, alpha: f64, beta: f64) -> f64 {
    Beta::new(alpha, beta).expect("alpha/beta must be > 0").sample(rng)
}

pub fn get_gamma_draw<R: Rng + ?Sized>(rng: &mut R, shape: f64, scale: f64) -> f64 {
    Gamma::new(shape, scale)
        .expect("shape/scale must be > 0")
        .sample(rng)
}

/// Draw a category index from a (not necessarily normalized) weight vector.
pub fn get_categorical_draw<R: Rng + ?Sized>(rng: &mut R, weights: &[f64]) -> usize {
    let total: f64 = weights.iter().sum();
    let mut target = rng.gen::<f64>() * total;
    for (i, w) in weights.iter().enumerate() {
        if target < *w {
            return i;
        }
        target -= w;
    }
    weights.len() - 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_rng_reproducibility() {
        let factory = RngFactory::new(42);
        let mut rng1 = factory.create_counter_rng(0);
        let mut rng2 = factory.create_counter_rng(0);
        for _ in 0..100 {
            assert_eq!(rng1.next_u64(), rng2.next_u64());
        }
    }

    #[test]
    fn test_counter_rng_different_paths() {
        let factory = RngFactory::new(42);
        let mut rng1 = factory.create_counter_rng(0);
        let mut rng2 = factory.create_counter_rng(1);
        let vals1: Vec<u64> = (0..10).map(|_| rng1.next_u64()).collect();
        let vals2: Vec<u64> = (0..10).map(|_| rng2.next_u64()).collect();
        assert_ne!(vals1, vals2);
    }

    #[test]
    fn test_normal_distribution_moments() {
        let factory = RngFactory::new(42);
        let mut rng = factory.create_counter_rng(0);
        let samples: Vec<f64> = (0..10_000).map(|_| rng.normal()).collect();
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let variance =
            samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / samples.len() as f64;
        assert!(mean.abs() < 0.05, "mean should be near 0, got {}", mean);
        assert!(
            (variance - 1.0).abs() < 0.05,
            "variance should be near 1, got {}",
            variance
        );
    }

    #[test]
    fn test_stream_factory_independence() {
        let factory = StreamFactory::new(7);
        let mut streams = factory.spawn(4);
        let draws: Vec<f64> = streams.iter_mut().map(|r| r.gen::<f64>()).collect();
        for i in 0..draws.len() {
            for j in (i + 1)..draws.len() {
                assert_ne!(draws[i], draws[j]);
            }
        }
    }

    #[test]
    fn test_stream_factory_reproducible() {
        let factory = StreamFactory::new(123);
        let mut a = factory.spawn_one(5);
        let mut b = factory.spawn_one(5);
        for _ in 0..50 {
            assert_eq!(a.gen::<u64>(), b.gen::<u64>());
        }
    }

    #[test]
    fn test_parent_not_mutated_by_spawn() {
        let factory = StreamFactory::new(99);
        let before = factory.spawn_one(0).gen::<u64>();
        let _ = factory.spawn(16);
        let after = factory.spawn_one(0).gen::<u64>();
        assert_eq!(before, after);
    }

    #[test]
    fn test_categorical_draw_respects_weights() {
        let mut rng = seed_rng_from_u64(1);
        let weights = [1.0, 0.0, 0.0];
        for _ in 0..100 {
            assert_eq!(get_categorical_draw(&mut rng, &weights), 0);
        }
    }
}
