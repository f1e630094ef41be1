// src/distributions/triangular.rs
use crate::error::validation::{validate_finite, validate_non_negative};
use crate::error::{SimError, SimResult};
use rand::Rng;
use rand_distr::{Distribution as _, Triangular as RdTriangular};

/// Triangular distribution on `[min, max]` with mode `mode`.
///
/// Degenerate when `max - min < 1e-10`: every draw returns `mode` exactly,
/// matching the point-mass convention used throughout this crate for
/// near-zero-width supports.
#[derive(Debug, Clone, Copy)]
pub struct Triangular {
    min: f64,
    mode: f64,
    max: f64,
}

impl Triangular {
    pub fn new(min: f64, mode: f64, max: f64) -> SimResult<Self> {
        validate_finite("min", min)?;
        validate_finite("mode", mode)?;
        validate_finite("max", max)?;
        if !(min <= mode && mode <= max) {
            return Err(SimError::InvalidParameter {
                parameter: "mode".to_string(),
                value: mode,
                constraint: "must satisfy min <= mode <= max".to_string(),
            });
        }
        Ok(Self { min, mode, max })
    }

    fn is_degenerate(&self) -> bool {
        (self.max - self.min) < 1e-10
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.is_degenerate() {
            return self.mode;
        }
        RdTriangular::new(self.min, self.max, self.mode)
            .expect("validated at construction")
            .sample(rng)
    }

    pub fn pdf(&self, x: f64) -> f64 {
        if self.is_degenerate() {
            return if (x - self.mode).abs() < 1e-12 { f64::INFINITY } else { 0.0 };
        }
        if x < self.min || x > self.max {
            return 0.0;
        }
        let range = self.max - self.min;
        if x < self.mode {
            2.0 * (x - self.min) / (range * (self.mode - self.min).max(1e-12))
        } else if x > self.mode {
            2.0 * (self.max - x) / (range * (self.max - self.mode).max(1e-12))
        } else {
            2.0 / range
        }
    }

    pub fn cdf(&self, x: f64) -> f64 {
        if self.is_degenerate() {
            return if x < self.mode { 0.0 } else { 1.0 };
        }
        if x <= self.min {
            return 0.0;
        }
        if x >= self.max {
            return 1.0;
        }
        let range = self.max - self.min;
        if x <= self.mode {
            (x - self.min).powi(2) / (range * (self.mode - self.min).max(1e-12))
        } else {
            1.0 - (self.max - x).powi(2) / (range * (self.max - self.mode).max(1e-12))
        }
    }

    pub fn mean(&self) -> f64 {
        (self.min + self.mode + self.max) / 3.0
    }

    pub fn std(&self) -> f64 {
        let a = self.min;
        let b = self.max;
        let c = self.mode;
        let var = (a * a + b * b + c * c - a * b - a * c - b * c) / 18.0;
        var.max(0.0).sqrt()
    }

    pub fn support(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    pub fn min(&self) -> f64 {
        self.min
    }
    pub fn mode(&self) -> f64 {
        self.mode
    }
    pub fn max(&self) -> f64 {
        self.max
    }
}

/// Severity distributions on risk events live on `[0, 2]`; values `< 1` are
/// harmful, `> 1` favorable. Validates the extra non-negativity of `min`.
pub fn validate_severity_bounds(min: f64, max: f64) -> SimResult<()> {
    validate_non_negative("severity_min", min)?;
    validate_non_negative("severity_max", max)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sample_stays_in_support() {
        let tri = Triangular::new(10.0, 30.0, 100.0).unwrap();
        let mut rng = rand::thread_rng();
        for _ in 0..10_000 {
            let x = tri.sample(&mut rng);
            assert!((10.0..=100.0).contains(&x));
        }
    }

    #[test]
    fn test_degenerate_returns_point_mass() {
        let tri = Triangular::new(5.0, 5.0, 5.0).unwrap();
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            assert_relative_eq!(tri.sample(&mut rng), 5.0);
        }
    }

    #[test]
    fn test_invalid_ordering_rejected() {
        assert!(Triangular::new(10.0, 5.0, 1.0).is_err());
    }

    #[test]
    fn test_mean_formula() {
        let tri = Triangular::new(0.0, 3.0, 9.0).unwrap();
        assert_relative_eq!(tri.mean(), 4.0);
    }
}
