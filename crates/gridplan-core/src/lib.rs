//! Core types for gridplan: grid positions, the move vocabulary, the
//! deterministic grid world and its environment file format.
//!
//! Everything in this crate is immutable once built. The planning side lives
//! in `gridplan-solver` and only ever reads from an [`Environment`].

pub mod config;
pub mod environment;
pub mod error;
pub mod moves;
pub mod position;

pub use config::{EnvironmentConfig, MoveProbabilities, Placement};
pub use environment::{Environment, RewardScheme};
pub use error::{ConfigError, Result};
pub use moves::{Heading, Move};
pub use position::Position;
