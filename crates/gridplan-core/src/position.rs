use serde::{Deserialize, Serialize};
use std::fmt;

/// A cell on the grid. Row 0 is the top row, column 0 the leftmost column.
///
/// Ordering is row-major, which is also the sweep order of the solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub column: usize,
}

impl Position {
    #[must_use]
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    /// Sum of the absolute row and column differences.
    #[must_use]
    pub fn manhattan(&self, other: &Position) -> usize {
        self.row.abs_diff(other.row) + self.column.abs_diff(other.column)
    }
}

impl From<(usize, usize)> for Position {
    fn from((row, column): (usize, usize)) -> Self {
        Self { row, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.row, self.column)
    }
}
