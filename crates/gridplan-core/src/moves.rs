//! The move vocabulary and the optional heading carried by placements.
//!
//! Moves are absolute grid directions named from the point of view of an
//! agent facing east: `Forward` increases the column, `Right` increases the
//! row. The order of [`Move::ALL`] is significant. It is the tie-break order
//! of policy improvement and the positional key order of the probability rows
//! in the environment file.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Move {
    #[default]
    Forward,
    Backward,
    Right,
    Left,
}

impl Move {
    pub const ALL: [Move; 4] = [Move::Forward, Move::Backward, Move::Right, Move::Left];

    /// Row and column offsets of a single step.
    #[must_use]
    pub const fn delta(self) -> (isize, isize) {
        match self {
            Move::Forward => (0, 1),
            Move::Backward => (0, -1),
            Move::Right => (1, 0),
            Move::Left => (-1, 0),
        }
    }

    /// Unit cost kept for configuration compatibility. Rewards never use it.
    #[must_use]
    pub const fn base_cost(self) -> f64 {
        1.0
    }

    /// Position of this move inside [`Move::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Move::Forward => 0,
            Move::Backward => 1,
            Move::Right => 2,
            Move::Left => 3,
        }
    }

    /// Single character used by text output.
    #[must_use]
    pub const fn arrow(self) -> char {
        match self {
            Move::Forward => '>',
            Move::Backward => '<',
            Move::Right => 'v',
            Move::Left => '^',
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Move::Forward => "forward",
            Move::Backward => "backward",
            Move::Right => "right",
            Move::Left => "left",
        };
        f.write_str(name)
    }
}

/// Compass heading of a start or goal placement. Stored, never used by the
/// dynamics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Heading {
    North,
    East,
    South,
    West,
}

impl FromStr for Heading {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "0" | "N" | "NORTH" => Ok(Heading::North),
            "1" | "E" | "EAST" => Ok(Heading::East),
            "2" | "S" | "SOUTH" => Ok(Heading::South),
            "3" | "W" | "WEST" => Ok(Heading::West),
            other => Err(format!("unknown heading '{other}'")),
        }
    }
}
