#![warn(clippy::unwrap_used, clippy::expect_used)]

//! Policy iteration for the gridplan grid world.
//!
//! The environment's dynamics are queried once to build a
//! [`TransitionTable`]; [`PolicyIteration`] then alternates evaluation and
//! improvement over that table until the policy is stable, and walks the
//! final policy from start to goal.
//!
//! ```
//! use gridplan_core::{Environment, Position};
//! use gridplan_solver::{PolicyIteration, SolverSettings};
//! use std::rc::Rc;
//!
//! let env = Environment::new(1, 3, Position::new(0, 0), Position::new(0, 2), [])?;
//! let mut solver = PolicyIteration::new(Rc::new(env), SolverSettings::default())?;
//! solver.solve()?;
//! let path = solver.generate_solution()?;
//! assert_eq!(path.len(), 3);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod observer;
pub mod policy_iteration;
pub mod report;
pub mod settings;
pub mod transitions;
pub mod values;

pub use error::{ErrorKind, Result, SolverError};
pub use observer::{HistoryObserver, IterationSummary, NoopObserver, Observer, Snapshot};
pub use policy_iteration::{
    EvaluationReport, ImprovementReport, IterationReport, Phase, PolicyIteration,
};
pub use report::SolveReport;
pub use settings::SolverSettings;
pub use transitions::{Transition, TransitionTable};
pub use values::{CellAction, CellValue, Policy, ValueFunction};
