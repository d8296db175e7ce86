use serde::{Deserialize, Serialize};

use crate::error::{Result, SolverError};

/// Discount applied to successor values.
pub const DEFAULT_DISCOUNT: f64 = 0.9;
/// Fixed value of the goal cell. Never overwritten by evaluation.
pub const DEFAULT_TERMINAL_VALUE: f64 = 200.0;
/// Evaluation stops once the largest change of a sweep is at most this.
pub const DEFAULT_THETA: f64 = 1e-3;
/// Hard cap on sweeps within one evaluation pass.
pub const DEFAULT_MAX_SWEEPS: usize = 1000;
/// Hard cap on evaluate/improve rounds.
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    pub discount: f64,
    pub terminal_value: f64,
    pub theta: f64,
    pub max_sweeps: usize,
    pub max_iterations: usize,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            discount: DEFAULT_DISCOUNT,
            terminal_value: DEFAULT_TERMINAL_VALUE,
            theta: DEFAULT_THETA,
            max_sweeps: DEFAULT_MAX_SWEEPS,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl SolverSettings {
    #[must_use]
    pub fn with_discount(mut self, discount: f64) -> Self {
        self.discount = discount;
        self
    }

    #[must_use]
    pub fn with_terminal_value(mut self, terminal_value: f64) -> Self {
        self.terminal_value = terminal_value;
        self
    }

    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Checks that the settings describe a well-posed run.
    ///
    /// Negative discounts are accepted; only the magnitude is bounded.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidSettings`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if !self.discount.is_finite() || self.discount.abs() > 1.0 {
            return Err(SolverError::InvalidSettings(format!(
                "discount must lie in [-1, 1], got {}",
                self.discount
            )));
        }
        if !self.terminal_value.is_finite() {
            return Err(SolverError::InvalidSettings(
                "terminal value must be finite".into(),
            ));
        }
        if !(self.theta.is_finite() && self.theta > 0.0) {
            return Err(SolverError::InvalidSettings(format!(
                "theta must be positive, got {}",
                self.theta
            )));
        }
        if self.max_sweeps == 0 || self.max_iterations == 0 {
            return Err(SolverError::InvalidSettings(
                "sweep and iteration caps must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
