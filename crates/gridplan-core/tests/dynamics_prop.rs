//! Property tests for `Environment::apply_dynamics`.
//!
//! Invariants covered:
//! - the result is a pure function of `(state, move)`
//! - next states never leave the grid
//! - edge-crossing moves leave the agent in place with zero reward
//!   (unless the cell itself is the goal)
//! - goal and obstacle destinations get the fixed terminal rewards

use gridplan_core::environment::{COLLISION_PENALTY, GOAL_REWARD};
use gridplan_core::{Environment, Move, Position};
use proptest::prelude::*;

fn world() -> impl Strategy<Value = (Environment, Position)> {
    (1usize..8, 1usize..8)
        .prop_flat_map(|(rows, cols)| {
            (
                Just(rows),
                Just(cols),
                (0..rows, 0..cols),
                (0..rows, 0..cols),
                prop::collection::vec((0..rows, 0..cols), 0..6),
                (0..rows, 0..cols),
            )
        })
        .prop_filter_map("degenerate layout", |(rows, cols, start, goal, obstacles, probe)| {
            let env = Environment::new(
                rows,
                cols,
                start.into(),
                goal.into(),
                obstacles.into_iter().map(Position::from),
            )
            .ok()?;
            Some((env, Position::from(probe)))
        })
}

fn any_move() -> impl Strategy<Value = Move> {
    prop::sample::select(Move::ALL.to_vec())
}

proptest! {
    #[test]
    fn dynamics_are_deterministic((env, from) in world(), action in any_move()) {
        prop_assert_eq!(env.apply_dynamics(from, action), env.apply_dynamics(from, action));
    }

    #[test]
    fn next_state_stays_in_bounds((env, from) in world(), action in any_move()) {
        let (_, next) = env.apply_dynamics(from, action);
        prop_assert!(env.contains(&next));
        prop_assert!(from.manhattan(&next) <= 1);
    }

    #[test]
    fn rewards_follow_destination((env, from) in world(), action in any_move()) {
        let (reward, next) = env.apply_dynamics(from, action);
        if next == env.goal() {
            prop_assert!((reward - GOAL_REWARD).abs() < 1e-12);
        } else if env.is_obstacle(&next) {
            prop_assert!((reward - COLLISION_PENALTY).abs() < 1e-12);
        } else {
            let shaped = from.manhattan(&env.goal()) as f64 - next.manhattan(&env.goal()) as f64;
            prop_assert!((reward - shaped).abs() < 1e-12);
            prop_assert!(reward.abs() <= 1.0);
        }
    }

    #[test]
    fn edge_moves_are_clamped((env, _) in world()) {
        let last_row = env.rows() - 1;
        let last_col = env.cols() - 1;
        let edges = [
            (Position::new(0, 0), Move::Left),
            (Position::new(0, 0), Move::Backward),
            (Position::new(last_row, last_col), Move::Right),
            (Position::new(last_row, last_col), Move::Forward),
        ];
        for (from, action) in edges {
            let (reward, next) = env.apply_dynamics(from, action);
            prop_assert_eq!(next, from);
            if !env.is_goal(&from) && !env.is_obstacle(&from) {
                prop_assert!(reward.abs() < 1e-12);
            }
        }
    }
}
