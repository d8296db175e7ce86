//! The deterministic grid world.
//!
//! An [`Environment`] owns the grid extents, the start and goal cells and the
//! obstacle set. Its only behaviour is [`Environment::apply_dynamics`], a pure
//! function from `(state, move)` to `(reward, next_state)`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::config::EnvironmentConfig;
use crate::error::{ConfigError, Result};
use crate::moves::Move;
use crate::position::Position;

/// Reward for a move whose candidate cell is the goal.
pub const GOAL_REWARD: f64 = 100.0;
/// Reward for a move whose candidate cell is an obstacle.
pub const COLLISION_PENALTY: f64 = -100.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardScheme {
    pub goal_reward: f64,
    pub collision_penalty: f64,
}

impl Default for RewardScheme {
    fn default() -> Self {
        Self {
            goal_reward: GOAL_REWARD,
            collision_penalty: COLLISION_PENALTY,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Environment {
    rows: usize,
    cols: usize,
    start: Position,
    goal: Position,
    obstacles: BTreeSet<Position>,
    state_space: Vec<Position>,
    rewards: RewardScheme,
    agent: Option<Position>,
}

impl Environment {
    /// Builds and validates a grid world.
    ///
    /// # Errors
    ///
    /// Fails on empty extents, a start, goal or obstacle outside the grid,
    /// a goal or start that is also an obstacle, or an empty state space.
    pub fn new(
        rows: usize,
        cols: usize,
        start: Position,
        goal: Position,
        obstacles: impl IntoIterator<Item = Position>,
    ) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(ConfigError::InvalidDimensions { rows, cols });
        }
        let in_bounds = |p: &Position| p.row < rows && p.column < cols;
        if !in_bounds(&start) {
            return Err(ConfigError::OutOfBounds {
                what: "start",
                position: start,
            });
        }
        if !in_bounds(&goal) {
            return Err(ConfigError::OutOfBounds {
                what: "goal",
                position: goal,
            });
        }

        let obstacles: BTreeSet<Position> = obstacles.into_iter().collect();
        if let Some(outside) = obstacles.iter().find(|p| !in_bounds(p)) {
            return Err(ConfigError::OutOfBounds {
                what: "obstacle",
                position: *outside,
            });
        }
        if obstacles.contains(&goal) {
            return Err(ConfigError::GoalIsObstacle(goal));
        }
        if obstacles.contains(&start) {
            return Err(ConfigError::StartIsObstacle(start));
        }

        let state_space: Vec<Position> = (0..rows)
            .flat_map(|row| (0..cols).map(move |column| Position::new(row, column)))
            .filter(|p| !obstacles.contains(p))
            .collect();
        if state_space.is_empty() {
            return Err(ConfigError::EmptyStateSpace);
        }

        Ok(Self {
            rows,
            cols,
            start,
            goal,
            obstacles,
            state_space,
            rewards: RewardScheme::default(),
            agent: None,
        })
    }

    /// Builds the world described by a parsed environment file.
    ///
    /// # Errors
    ///
    /// See [`Environment::new`].
    pub fn from_config(config: &EnvironmentConfig) -> Result<Self> {
        Self::new(
            config.rows,
            config.cols,
            config.start.position,
            config.goal.position,
            config.obstacles.iter().copied(),
        )
    }

    #[must_use]
    pub fn with_rewards(mut self, rewards: RewardScheme) -> Self {
        self.rewards = rewards;
        self
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[must_use]
    pub fn start(&self) -> Position {
        self.start
    }

    #[must_use]
    pub fn goal(&self) -> Position {
        self.goal
    }

    #[must_use]
    pub fn obstacles(&self) -> &BTreeSet<Position> {
        &self.obstacles
    }

    #[must_use]
    pub fn rewards(&self) -> RewardScheme {
        self.rewards
    }

    /// Every in-bounds cell that is not an obstacle, in row-major order.
    /// Always contains the goal.
    #[must_use]
    pub fn state_space(&self) -> &[Position] {
        &self.state_space
    }

    /// Every in-bounds cell, obstacles included, in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.rows).flat_map(move |row| (0..self.cols).map(move |column| Position::new(row, column)))
    }

    #[must_use]
    pub fn contains(&self, position: &Position) -> bool {
        position.row < self.rows && position.column < self.cols
    }

    #[must_use]
    pub fn is_obstacle(&self, position: &Position) -> bool {
        self.obstacles.contains(position)
    }

    #[must_use]
    pub fn is_goal(&self, position: &Position) -> bool {
        *position == self.goal
    }

    /// Row-major index of an in-bounds cell.
    #[must_use]
    pub fn index_of(&self, position: &Position) -> Option<usize> {
        self.contains(position)
            .then(|| position.row * self.cols + position.column)
    }

    /// Moves one step from `state`, clamped to the grid, and scores the
    /// candidate cell.
    ///
    /// The goal earns the goal reward, an obstacle earns the collision
    /// penalty and leaves the agent on the obstacle cell, anything else earns
    /// the change in Manhattan distance to the goal.
    #[must_use]
    pub fn apply_dynamics(&self, state: Position, action: Move) -> (f64, Position) {
        let candidate = self.step(state, action);

        let reward = if candidate == self.goal {
            self.rewards.goal_reward
        } else if self.obstacles.contains(&candidate) {
            self.rewards.collision_penalty
        } else {
            #[allow(clippy::cast_precision_loss)]
            {
                state.manhattan(&self.goal) as f64 - candidate.manhattan(&self.goal) as f64
            }
        };

        (reward, candidate)
    }

    fn step(&self, state: Position, action: Move) -> Position {
        let (dr, dc) = action.delta();
        Position {
            row: state.row.saturating_add_signed(dr).min(self.rows - 1),
            column: state.column.saturating_add_signed(dc).min(self.cols - 1),
        }
    }

    /// Where a renderer should draw the agent. Never read by the dynamics.
    #[must_use]
    pub fn agent_position(&self) -> Option<Position> {
        self.agent
    }

    pub fn set_agent_position(&mut self, position: Option<Position>) {
        self.agent = position;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn open_grid(rows: usize, cols: usize, goal: (usize, usize)) -> Environment {
        Environment::new(rows, cols, Position::new(0, 0), goal.into(), [])
            .unwrap_or_else(|e| panic!("grid should build: {e}"))
    }

    #[rstest]
    #[case(Move::Left, (0, 0))]
    #[case(Move::Backward, (0, 0))]
    #[case(Move::Forward, (0, 1))]
    #[case(Move::Right, (1, 0))]
    fn moves_from_top_left_corner(#[case] action: Move, #[case] expected: (usize, usize)) {
        let env = open_grid(3, 3, (2, 2));
        let (_, next) = env.apply_dynamics(Position::new(0, 0), action);
        assert_eq!(next, expected.into());
    }

    #[rstest]
    #[case(Move::Forward, (1, 2))]
    #[case(Move::Right, (2, 1))]
    fn moves_from_bottom_right_edge_are_clamped(
        #[case] action: Move,
        #[case] expected: (usize, usize),
    ) {
        let env = open_grid(3, 3, (0, 0));
        let from = Position::from(expected);
        let (reward, next) = env.apply_dynamics(from, action);
        assert_eq!(next, from);
        assert!(reward.abs() < f64::EPSILON);
    }

    #[test]
    fn clamped_move_on_two_by_two_is_free() {
        let env = open_grid(2, 2, (1, 1));
        let (reward, next) = env.apply_dynamics(Position::new(0, 0), Move::Left);
        assert_eq!(next, Position::new(0, 0));
        assert!(reward.abs() < f64::EPSILON);
    }

    #[test]
    fn shaping_reward_tracks_distance_change() {
        let env = open_grid(1, 4, (0, 3));
        let (towards, _) = env.apply_dynamics(Position::new(0, 1), Move::Forward);
        let (away, _) = env.apply_dynamics(Position::new(0, 1), Move::Backward);
        assert!((towards - 1.0).abs() < f64::EPSILON);
        assert!((away + 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn goal_reward_ignores_source_cell() {
        let env = open_grid(3, 3, (1, 1));
        for (from, action) in [
            ((0, 1), Move::Right),
            ((2, 1), Move::Left),
            ((1, 0), Move::Forward),
            ((1, 2), Move::Backward),
        ] {
            let (reward, next) = env.apply_dynamics(from.into(), action);
            assert_eq!(next, Position::new(1, 1));
            assert!((reward - GOAL_REWARD).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn collision_keeps_agent_on_obstacle() {
        let env = Environment::new(3, 3, Position::new(0, 0), Position::new(2, 2), [Position::new(1, 1)])
            .unwrap_or_else(|e| panic!("grid should build: {e}"));
        let (reward, next) = env.apply_dynamics(Position::new(0, 1), Move::Right);
        assert_eq!(next, Position::new(1, 1));
        assert!((reward - COLLISION_PENALTY).abs() < f64::EPSILON);
        assert!(!env.state_space().contains(&next));
    }

    #[test]
    fn custom_reward_scheme_is_used() {
        let env = open_grid(1, 2, (0, 1)).with_rewards(RewardScheme {
            goal_reward: 5.0,
            collision_penalty: -1.0,
        });
        let (reward, _) = env.apply_dynamics(Position::new(0, 0), Move::Forward);
        assert!((reward - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn state_space_excludes_obstacles_and_keeps_goal() {
        let env = Environment::new(
            2,
            3,
            Position::new(0, 0),
            Position::new(1, 2),
            [Position::new(0, 1), Position::new(1, 1), Position::new(0, 1)],
        )
        .unwrap_or_else(|e| panic!("grid should build: {e}"));
        assert_eq!(env.obstacles().len(), 2);
        assert_eq!(
            env.state_space(),
            &[
                Position::new(0, 0),
                Position::new(0, 2),
                Position::new(1, 0),
                Position::new(1, 2)
            ]
        );
        assert!(env.state_space().contains(&env.goal()));
        assert_eq!(env.cells().count(), 6);
    }

    #[rstest]
    #[case(0, 3)]
    #[case(3, 0)]
    fn rejects_empty_extents(#[case] rows: usize, #[case] cols: usize) {
        let err = Environment::new(rows, cols, Position::new(0, 0), Position::new(0, 0), [])
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDimensions { .. }));
    }

    #[test]
    fn rejects_out_of_bounds_and_degenerate_layouts() {
        let err = Environment::new(2, 2, Position::new(0, 0), Position::new(2, 0), []).unwrap_err();
        assert!(matches!(err, ConfigError::OutOfBounds { what: "goal", .. }));

        let err = Environment::new(2, 2, Position::new(0, 5), Position::new(1, 1), []).unwrap_err();
        assert!(matches!(err, ConfigError::OutOfBounds { what: "start", .. }));

        let err = Environment::new(2, 2, Position::new(0, 0), Position::new(1, 1), [Position::new(9, 9)])
            .unwrap_err();
        assert!(matches!(err, ConfigError::OutOfBounds { what: "obstacle", .. }));

        let err = Environment::new(2, 2, Position::new(0, 0), Position::new(1, 1), [Position::new(1, 1)])
            .unwrap_err();
        assert!(matches!(err, ConfigError::GoalIsObstacle(_)));
        assert!(err.is_degenerate_model());

        let err = Environment::new(2, 2, Position::new(0, 0), Position::new(1, 1), [Position::new(0, 0)])
            .unwrap_err();
        assert!(matches!(err, ConfigError::StartIsObstacle(_)));
    }

    #[test]
    fn agent_position_is_independent_of_dynamics() {
        let mut env = open_grid(2, 2, (1, 1));
        assert_eq!(env.agent_position(), None);
        let before = env.apply_dynamics(Position::new(0, 0), Move::Forward);
        env.set_agent_position(Some(Position::new(0, 1)));
        assert_eq!(env.agent_position(), Some(Position::new(0, 1)));
        assert_eq!(env.apply_dynamics(Position::new(0, 0), Move::Forward), before);
    }

    #[test]
    fn index_of_is_row_major() {
        let env = open_grid(2, 3, (1, 2));
        assert_eq!(env.index_of(&Position::new(1, 1)), Some(4));
        assert_eq!(env.index_of(&Position::new(2, 0)), None);
    }
}
