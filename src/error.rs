// src/error.rs
use std::fmt;

/// Error types for the simulation core.
#[derive(Debug, Clone)]
pub enum SimError {
    /// A distribution or process was constructed outside its support.
    InvalidParameter {
        parameter: String,
        value: f64,
        constraint: String,
    },

    /// A matrix did not have the expected shape, or rows did not sum to 1.
    ShapeMismatch {
        expected: String,
        actual: String,
        context: String,
    },

    /// Analytics were invoked against zero paths.
    EmptyCorpus { analysis: String },

    /// A numerical computation degenerated (zero variance, singular system).
    NumericalDegenerate { context: String, reason: String },

    /// Invalid run configuration (paths, horizon, seed range, etc).
    InvalidConfiguration { field: String, reason: String },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::InvalidParameter {
                parameter,
                value,
                constraint,
            } => write!(
                f,
                "Invalid parameter '{}' = {}: {}",
                parameter, value, constraint
            ),
            SimError::ShapeMismatch {
                expected,
                actual,
                context,
            } => write!(
                f,
                "Shape mismatch in {}: expected {}, got {}",
                context, expected, actual
            ),
            SimError::EmptyCorpus { analysis } => {
                write!(f, "Cannot run '{}' analysis on an empty path corpus", analysis)
            }
            SimError::NumericalDegenerate { context, reason } => {
                write!(f, "Numerical degeneracy in {}: {}", context, reason)
            }
            SimError::InvalidConfiguration { field, reason } => {
                write!(f, "Invalid configuration for '{}': {}", field, reason)
            }
        }
    }
}

impl std::error::Error for SimError {}

/// Result type alias for the simulation core.
pub type SimResult<T> = Result<T, SimError>;

/// Validation utilities shared by distributions, processes, and the engine.
pub mod validation {
    use super::{SimError, SimResult};

    pub fn validate_positive(name: &str, value: f64) -> SimResult<()> {
        if value <= 0.0 {
            Err(SimError::InvalidParameter {
                parameter: name.to_string(),
                value,
                constraint: "must be positive (> 0)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    pub fn validate_non_negative(name: &str, value: f64) -> SimResult<()> {
        if value < 0.0 {
            Err(SimError::InvalidParameter {
                parameter: name.to_string(),
                value,
                constraint: "must be non-negative (≥ 0)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    pub fn validate_range(name: &str, value: f64, min: f64, max: f64) -> SimResult<()> {
        if value < min || value > max {
            Err(SimError::InvalidParameter {
                parameter: name.to_string(),
                value,
                constraint: format!("must be in range [{}, {}]", min, max),
            })
        } else {
            Ok(())
        }
    }

    pub fn validate_probability(name: &str, value: f64) -> SimResult<()> {
        validate_range(name, value, 0.0, 1.0)
    }

    pub fn validate_finite(name: &str, value: f64) -> SimResult<()> {
        if !value.is_finite() {
            Err(SimError::InvalidParameter {
                parameter: name.to_string(),
                value,
                constraint: "must be finite (not NaN or infinite)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    pub fn validate_paths(paths: usize) -> SimResult<()> {
        if paths == 0 {
            Err(SimError::InvalidConfiguration {
                field: "n_simulations".to_string(),
                reason: "must be greater than 0".to_string(),
            })
        } else if paths > 10_000 {
            Err(SimError::InvalidConfiguration {
                field: "n_simulations".to_string(),
                reason: "exceeds maximum allowed (10,000)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    pub fn validate_horizon(months: usize) -> SimResult<()> {
        if !(6..=120).contains(&months) {
            Err(SimError::InvalidConfiguration {
                field: "time_horizon".to_string(),
                reason: "must be in range [6, 120] months".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// A row-stochastic square matrix: every row sums to 1 within `tol`.
    pub fn validate_stochastic_matrix(rows: &[Vec<f64>], tol: f64) -> SimResult<()> {
        let n = rows.len();
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n {
                return Err(SimError::ShapeMismatch {
                    expected: format!("{}x{}", n, n),
                    actual: format!("row {} has {} columns", i, row.len()),
                    context: "transition matrix".to_string(),
                });
            }
            let sum: f64 = row.iter().sum();
            if (sum - 1.0).abs() > tol {
                return Err(SimError::ShapeMismatch {
                    expected: "rows summing to 1".to_string(),
                    actual: format!("row {} sums to {}", i, sum),
                    context: "transition matrix".to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::validation::*;
    use super::*;

    #[test]
    fn test_validate_positive() {
        assert!(validate_positive("sigma", 0.2).is_ok());
        assert!(validate_positive("sigma", 0.0).is_err());
        assert!(validate_positive("sigma", -0.1).is_err());
    }

    #[test]
    fn test_validate_probability() {
        assert!(validate_probability("p", 0.5).is_ok());
        assert!(validate_probability("p", 0.0).is_ok());
        assert!(validate_probability("p", 1.0).is_ok());
        assert!(validate_probability("p", 1.1).is_err());
        assert!(validate_probability("p", -0.1).is_err());
    }

    #[test]
    fn test_validate_finite() {
        assert!(validate_finite("value", 1.0).is_ok());
        assert!(validate_finite("value", f64::NAN).is_err());
        assert!(validate_finite("value", f64::INFINITY).is_err());
    }

    #[test]
    fn test_stochastic_matrix() {
        let ok = vec![vec![0.5, 0.5], vec![0.2, 0.8]];
        assert!(validate_stochastic_matrix(&ok, 1e-9).is_ok());

        let bad_sum = vec![vec![0.5, 0.6], vec![0.2, 0.8]];
        assert!(validate_stochastic_matrix(&bad_sum, 1e-9).is_err());

        let bad_shape = vec![vec![0.5, 0.5], vec![1.0]];
        assert!(validate_stochastic_matrix(&bad_shape, 1e-9).is_err());
    }

    #[test]
    fn test_error_display() {
        let error = SimError::InvalidParameter {
            parameter: "sigma".to_string(),
            value: -0.1,
            constraint: "must be positive".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("sigma"));
        assert!(display.contains("-0.1"));
    }
}
