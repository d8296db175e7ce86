use thiserror::Error;

use crate::position::Position;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read environment file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("Environment file ended before the {0} section")]
    MissingSection(&'static str),
    #[error("Line {line}: unexpected input after the last probability row")]
    TrailingInput { line: usize },
    #[error("Invalid grid dimensions {rows}x{cols}")]
    InvalidDimensions { rows: usize, cols: usize },
    #[error("{what} {position} lies outside the grid")]
    OutOfBounds {
        what: &'static str,
        position: Position,
    },
    #[error("Goal {0} is also listed as an obstacle")]
    GoalIsObstacle(Position),
    #[error("Start {0} is also listed as an obstacle")]
    StartIsObstacle(Position),
    #[error("State space is empty after removing obstacles")]
    EmptyStateSpace,
    #[error("Line {line}: probability {value} is outside [0, 1]")]
    InvalidProbability { line: usize, value: f64 },
}

impl ConfigError {
    /// True for errors that describe a well-formed file whose model is
    /// unusable (as opposed to a file that could not be read or parsed).
    #[must_use]
    pub fn is_degenerate_model(&self) -> bool {
        matches!(
            self,
            Self::GoalIsObstacle(_) | Self::StartIsObstacle(_) | Self::EmptyStateSpace
        )
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
