//! Explicit, fully pre-populated policy and value mappings.
//!
//! Neither mapping falls back to a default for unknown keys. Both are
//! populated once from the environment and lookups outside their domain
//! return `None`.

use gridplan_core::{Environment, Move, Position};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// State values for every in-bounds cell, obstacles and goal included.
///
/// Obstacles stay at 0.0 and the goal keeps its seeded terminal value; only
/// the solver's sweeps over non-goal states write to this table.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueFunction {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

impl ValueFunction {
    /// Zero everywhere except the goal, which holds `terminal_value`.
    #[must_use]
    pub fn new(env: &Environment, terminal_value: f64) -> Self {
        let mut values = vec![0.0; env.rows() * env.cols()];
        if let Some(goal) = env.index_of(&env.goal()) {
            values[goal] = terminal_value;
        }
        Self {
            rows: env.rows(),
            cols: env.cols(),
            values,
        }
    }

    fn index(&self, position: &Position) -> Option<usize> {
        (position.row < self.rows && position.column < self.cols)
            .then(|| position.row * self.cols + position.column)
    }

    #[must_use]
    pub fn get(&self, position: &Position) -> Option<f64> {
        self.index(position).map(|i| self.values[i])
    }

    pub(crate) fn set(&mut self, position: &Position, value: f64) {
        if let Some(i) = self.index(position) {
            self.values[i] = value;
        }
    }

    /// All cells with their values, row-major.
    pub fn iter(&self) -> impl Iterator<Item = (Position, f64)> + '_ {
        let cols = self.cols;
        self.values
            .iter()
            .enumerate()
            .map(move |(i, v)| (Position::new(i / cols, i % cols), *v))
    }
}

/// One action for every non-goal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    actions: BTreeMap<Position, Move>,
}

impl Policy {
    /// Every non-goal state mapped to [`Move::default`].
    #[must_use]
    pub fn new(env: &Environment) -> Self {
        let actions = env
            .state_space()
            .iter()
            .filter(|s| !env.is_goal(s))
            .map(|s| (*s, Move::default()))
            .collect();
        Self { actions }
    }

    #[must_use]
    pub fn get(&self, state: &Position) -> Option<Move> {
        self.actions.get(state).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Position, Move)> + '_ {
        self.actions.iter().map(|(s, a)| (*s, *a))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (&Position, &mut Move)> {
        self.actions.iter_mut()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Serializable `(position, value)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellValue {
    pub position: Position,
    pub value: f64,
}

/// Serializable `(position, action)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellAction {
    pub position: Position,
    pub action: Move,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> Environment {
        Environment::new(2, 3, Position::new(0, 0), Position::new(1, 2), [Position::new(0, 1)])
            .unwrap_or_else(|e| panic!("{e}"))
    }

    #[test]
    fn value_function_covers_every_cell() {
        let env = env();
        let values = ValueFunction::new(&env, 200.0);
        assert_eq!(values.iter().count(), 6);
        assert_eq!(values.get(&Position::new(1, 2)), Some(200.0));
        assert_eq!(values.get(&Position::new(0, 1)), Some(0.0));
        assert_eq!(values.get(&Position::new(2, 0)), None);
    }

    #[test]
    fn set_outside_grid_is_ignored() {
        let env = env();
        let mut values = ValueFunction::new(&env, 1.0);
        let before = values.clone();
        values.set(&Position::new(5, 5), 3.0);
        assert_eq!(values, before);
    }

    #[test]
    fn policy_skips_goal_and_obstacles() {
        let env = env();
        let policy = Policy::new(&env);
        assert_eq!(policy.len(), 4);
        assert_eq!(policy.get(&Position::new(1, 2)), None);
        assert_eq!(policy.get(&Position::new(0, 1)), None);
        assert!(policy.iter().all(|(_, a)| a == Move::Forward));
    }
}
