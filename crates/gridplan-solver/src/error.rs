use gridplan_core::{ConfigError, Move, Position};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SolverError {
    #[error(transparent)]
    Model(#[from] ConfigError),
    #[error("Invalid solver settings: {0}")]
    InvalidSettings(String),
    #[error("Solver used before initialise()")]
    NotInitialised,
    #[error("Policy did not converge within {iterations} iterations")]
    NotConverged { iterations: usize },
    #[error("Policy does not reach the goal: stopped at {last} after {steps} steps")]
    NoPathFound { steps: usize, last: Position },
    #[error("Invalid transition entry for {state} / {action}: {reason}")]
    InvalidTransition {
        state: Position,
        action: Move,
        reason: String,
    },
}

/// Coarse classification of [`SolverError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    DegenerateModel,
    NotConverged,
    NoPathFound,
    Internal,
}

impl SolverError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Model(e) if e.is_degenerate_model() => ErrorKind::DegenerateModel,
            Self::Model(_) | Self::InvalidSettings(_) => ErrorKind::Configuration,
            Self::InvalidTransition { .. } => ErrorKind::DegenerateModel,
            Self::NotConverged { .. } => ErrorKind::NotConverged,
            Self::NoPathFound { .. } => ErrorKind::NoPathFound,
            Self::NotInitialised => ErrorKind::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, SolverError>;
