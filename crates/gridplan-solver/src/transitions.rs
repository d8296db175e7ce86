//! The transition-reward table.
//!
//! For every `(state, move)` the table holds a list of weighted outcomes.
//! Deterministic dynamics produce a single outcome with probability 1.0, but
//! the shape allows several next states with fractional mass so that a
//! stochastic model can be dropped in without touching the solver.

use gridplan_core::{Environment, Move, Position};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Result, SolverError};
use crate::values::ValueFunction;

/// Allowed deviation of the summed probability mass from 1.0.
pub const MASS_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub next_state: Position,
    pub probability: f64,
    pub reward: f64,
    /// True when `next_state` is the goal.
    pub terminal: bool,
}

#[derive(Debug, Clone, Default)]
pub struct TransitionTable {
    rows: usize,
    cols: usize,
    entries: BTreeMap<Position, BTreeMap<Move, Vec<Transition>>>,
}

impl TransitionTable {
    /// Queries the dynamics once for every state and move.
    ///
    /// Each state's entry is created exactly once; the per-move outcomes are
    /// filled in underneath it.
    #[must_use]
    pub fn build(env: &Environment) -> Self {
        let mut entries = BTreeMap::new();
        for state in env.state_space() {
            let per_move: BTreeMap<Move, Vec<Transition>> = Move::ALL
                .iter()
                .map(|action| {
                    let (reward, next_state) = env.apply_dynamics(*state, *action);
                    let outcome = Transition {
                        next_state,
                        probability: 1.0,
                        reward,
                        terminal: env.is_goal(&next_state),
                    };
                    (*action, vec![outcome])
                })
                .collect();
            entries.insert(*state, per_move);
        }

        Self {
            rows: env.rows(),
            cols: env.cols(),
            entries,
        }
    }

    /// Replaces the outcomes of one `(state, move)` pair.
    ///
    /// Entries for other moves of the same state are left untouched.
    /// Returns the previous outcomes, if any.
    ///
    /// # Errors
    ///
    /// Rejects empty outcome lists, negative or non-finite probabilities or
    /// rewards, next states outside the grid and mass that does not sum to
    /// 1.0 within [`MASS_TOLERANCE`].
    pub fn insert(
        &mut self,
        state: Position,
        action: Move,
        outcomes: Vec<Transition>,
    ) -> Result<Option<Vec<Transition>>> {
        let invalid = |reason: String| SolverError::InvalidTransition {
            state,
            action,
            reason,
        };

        if state.row >= self.rows || state.column >= self.cols {
            return Err(invalid("state lies outside the grid".into()));
        }
        if outcomes.is_empty() {
            return Err(invalid("no outcomes".into()));
        }
        for t in &outcomes {
            if t.next_state.row >= self.rows || t.next_state.column >= self.cols {
                return Err(invalid(format!("next state {} lies outside the grid", t.next_state)));
            }
            if !t.probability.is_finite() || t.probability < 0.0 {
                return Err(invalid(format!("probability {} is not a valid weight", t.probability)));
            }
            if !t.reward.is_finite() {
                return Err(invalid("reward must be finite".into()));
            }
        }
        let mass: f64 = outcomes.iter().map(|t| t.probability).sum();
        if (mass - 1.0).abs() > MASS_TOLERANCE {
            return Err(invalid(format!("probabilities sum to {mass}")));
        }

        Ok(self.entries.entry(state).or_default().insert(action, outcomes))
    }

    #[must_use]
    pub fn get(&self, state: &Position, action: Move) -> Option<&[Transition]> {
        self.entries
            .get(state)
            .and_then(|per_move| per_move.get(&action))
            .map(Vec::as_slice)
    }

    /// Summed probability of all outcomes of `(state, move)`, if present.
    #[must_use]
    pub fn probability_mass(&self, state: &Position, action: Move) -> Option<f64> {
        self.get(state, action)
            .map(|outcomes| outcomes.iter().map(|t| t.probability).sum())
    }

    /// All `(state, move)` pairs with their outcomes.
    pub fn iter(&self) -> impl Iterator<Item = (Position, Move, &[Transition])> + '_ {
        self.entries.iter().flat_map(|(state, per_move)| {
            per_move
                .iter()
                .map(move |(action, outcomes)| (*state, *action, outcomes.as_slice()))
        })
    }

    /// Number of `(state, move)` pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One-step lookahead `Σ p · (r + γ·V(s'))` for `(state, move)`.
    ///
    /// # Errors
    ///
    /// Fails if the pair is missing from the table or an outcome has no
    /// value, which only happens for hand-built tables.
    pub fn expected_return(
        &self,
        state: &Position,
        action: Move,
        values: &ValueFunction,
        discount: f64,
    ) -> Result<f64> {
        let outcomes = self
            .get(state, action)
            .ok_or_else(|| SolverError::InvalidTransition {
                state: *state,
                action,
                reason: "missing from transition table".into(),
            })?;

        outcomes.iter().try_fold(0.0, |acc, t| {
            let next_value = values
                .get(&t.next_state)
                .ok_or_else(|| SolverError::InvalidTransition {
                    state: *state,
                    action,
                    reason: format!("no value for next state {}", t.next_state),
                })?;
            Ok(acc + t.probability * (t.reward + discount * next_value))
        })
    }
}
