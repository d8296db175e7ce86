//! Policy iteration over a [`TransitionTable`].
//!
//! The solver moves through `Uninitialized → Evaluating ⇄ Improving →
//! Converged`. Evaluation repeatedly applies the Bellman expectation update
//! for the current policy; improvement picks the greedy move per state from
//! the resulting values. The goal is never part of either pass.

use gridplan_core::{Environment, Move, Position};
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use tracing::{debug, info, warn};

use crate::error::{Result, SolverError};
use crate::observer::{NoopObserver, Observer, Snapshot};
use crate::settings::SolverSettings;
use crate::transitions::TransitionTable;
use crate::values::{CellAction, CellValue, Policy, ValueFunction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Uninitialized,
    Evaluating,
    Improving,
    Converged,
}

/// Outcome of one policy evaluation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationReport {
    /// Largest absolute value change of each sweep, in order.
    pub deltas: Vec<f64>,
    /// True if the sweep cap stopped the pass before `theta` was reached.
    pub capped: bool,
}

impl EvaluationReport {
    #[must_use]
    pub fn sweeps(&self) -> usize {
        self.deltas.len()
    }

    #[must_use]
    pub fn final_delta(&self) -> f64 {
        self.deltas.last().copied().unwrap_or(0.0)
    }
}

/// Outcome of one policy improvement pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImprovementReport {
    /// States whose action changed.
    pub changed: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IterationReport {
    /// 1-based number of this evaluate/improve round.
    pub iteration: usize,
    pub evaluation: EvaluationReport,
    pub improvement: ImprovementReport,
    pub converged: bool,
}

#[derive(Debug, Clone)]
struct Model {
    table: TransitionTable,
    policy: Policy,
    values: ValueFunction,
}

#[derive(Debug, Clone)]
pub struct PolicyIteration {
    env: Rc<Environment>,
    settings: SolverSettings,
    phase: Phase,
    iterations: usize,
    model: Option<Model>,
}

impl PolicyIteration {
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidSettings`] if `settings` fail validation.
    pub fn new(env: Rc<Environment>, settings: SolverSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            env,
            settings,
            phase: Phase::Uninitialized,
            iterations: 0,
            model: None,
        })
    }

    /// Builds the default policy, the seeded value function and the
    /// transition table from the environment's dynamics. Calling it again
    /// starts over.
    pub fn initialise(&mut self) {
        let table = TransitionTable::build(&self.env);
        debug!(entries = table.len(), "built transition table");
        self.install(table);
    }

    /// Like [`initialise`](Self::initialise) but with a caller-supplied table,
    /// e.g. one carrying stochastic outcomes.
    ///
    /// # Errors
    ///
    /// Fails if the table lacks an entry for some non-goal state and move.
    pub fn initialise_with(&mut self, table: TransitionTable) -> Result<()> {
        for state in self.env.state_space().iter().filter(|s| !self.env.is_goal(s)) {
            for action in Move::ALL {
                if table.get(state, action).is_none() {
                    return Err(SolverError::InvalidTransition {
                        state: *state,
                        action,
                        reason: "missing from transition table".into(),
                    });
                }
            }
        }
        self.install(table);
        Ok(())
    }

    fn install(&mut self, table: TransitionTable) {
        self.model = Some(Model {
            table,
            policy: Policy::new(&self.env),
            values: ValueFunction::new(&self.env, self.settings.terminal_value),
        });
        self.iterations = 0;
        self.phase = Phase::Evaluating;
    }

    /// Evaluates the current policy with synchronous Bellman sweeps until the
    /// largest change drops to `theta` or the sweep cap is hit.
    ///
    /// # Errors
    ///
    /// [`SolverError::NotInitialised`] before [`initialise`](Self::initialise);
    /// [`SolverError::InvalidTransition`] for incomplete hand-built tables.
    pub fn evaluate(&mut self) -> Result<EvaluationReport> {
        let Model {
            table,
            policy,
            values,
        } = self.model.as_mut().ok_or(SolverError::NotInitialised)?;
        let discount = self.settings.discount;

        let mut deltas = Vec::new();
        let mut capped = true;
        for _ in 0..self.settings.max_sweeps {
            let mut next = values.clone();
            let mut delta_max: f64 = 0.0;
            for (state, action) in policy.iter() {
                let updated = table.expected_return(&state, action, values, discount)?;
                let current = values.get(&state).unwrap_or(0.0);
                delta_max = delta_max.max((updated - current).abs());
                next.set(&state, updated);
            }
            *values = next;
            deltas.push(delta_max);
            if delta_max <= self.settings.theta {
                capped = false;
                break;
            }
        }

        if capped {
            warn!(
                sweeps = deltas.len(),
                delta = deltas.last().copied().unwrap_or(0.0),
                "policy evaluation hit the sweep cap"
            );
        } else {
            debug!(sweeps = deltas.len(), "policy evaluation settled");
        }

        self.phase = Phase::Improving;
        Ok(EvaluationReport { deltas, capped })
    }

    /// Makes the policy greedy with respect to the current values. Ties go to
    /// the move that comes first in [`Move::ALL`].
    ///
    /// # Errors
    ///
    /// Same as [`evaluate`](Self::evaluate).
    pub fn improve(&mut self) -> Result<ImprovementReport> {
        let Model {
            table,
            policy,
            values,
        } = self.model.as_mut().ok_or(SolverError::NotInitialised)?;
        let discount = self.settings.discount;

        let mut changed = 0;
        for (state, current) in policy.iter_mut() {
            let mut best: Option<(Move, f64)> = None;
            for action in Move::ALL {
                let q = table.expected_return(state, action, values, discount)?;
                if best.map_or(true, |(_, best_q)| q > best_q) {
                    best = Some((action, q));
                }
            }
            if let Some((action, _)) = best {
                if action != *current {
                    *current = action;
                    changed += 1;
                }
            }
        }

        self.iterations += 1;
        self.phase = if changed == 0 {
            Phase::Converged
        } else {
            Phase::Evaluating
        };
        debug!(iteration = self.iterations, changed, "policy improvement done");
        Ok(ImprovementReport { changed })
    }

    /// One evaluate/improve round.
    ///
    /// # Errors
    ///
    /// Same as [`evaluate`](Self::evaluate).
    pub fn iterate(&mut self) -> Result<IterationReport> {
        let evaluation = self.evaluate()?;
        let improvement = self.improve()?;
        Ok(IterationReport {
            iteration: self.iterations,
            evaluation,
            improvement,
            converged: self.is_converged(),
        })
    }

    /// Iterates until the policy is stable. Initialises first if needed.
    ///
    /// # Errors
    ///
    /// [`SolverError::NotConverged`] once `max_iterations` rounds pass without
    /// a stable policy.
    pub fn solve(&mut self) -> Result<usize> {
        self.solve_with(&mut NoopObserver)
    }

    /// [`solve`](Self::solve), calling `observer` after every round.
    ///
    /// # Errors
    ///
    /// See [`solve`](Self::solve).
    pub fn solve_with(&mut self, observer: &mut dyn Observer) -> Result<usize> {
        if self.model.is_none() {
            self.initialise();
        }
        while !self.is_converged() {
            if self.iterations >= self.settings.max_iterations {
                warn!(iterations = self.iterations, "policy iteration did not converge");
                return Err(SolverError::NotConverged {
                    iterations: self.iterations,
                });
            }
            let report = self.iterate()?;
            observer.on_iteration(self, &report);
        }
        info!(iterations = self.iterations, "policy iteration converged");
        Ok(self.iterations)
    }

    /// Solves and extracts the path, notifying `observer` of both.
    ///
    /// # Errors
    ///
    /// Any error of [`solve_with`](Self::solve_with) or
    /// [`generate_solution`](Self::generate_solution).
    pub fn run(&mut self, observer: &mut dyn Observer) -> Result<Vec<Position>> {
        self.solve_with(observer)?;
        let path = self.generate_solution()?;
        observer.on_solution(self, &path);
        Ok(path)
    }

    /// Follows the policy from the start until the goal is reached.
    ///
    /// The walk is capped at `rows * cols` steps, enough for any simple path.
    ///
    /// # Errors
    ///
    /// [`SolverError::NoPathFound`] if the walk leaves the policy's domain
    /// (i.e. steps onto an obstacle) or runs past the cap.
    pub fn generate_solution(&self) -> Result<Vec<Position>> {
        let model = self.model.as_ref().ok_or(SolverError::NotInitialised)?;
        let goal = self.env.goal();
        let limit = self.env.rows() * self.env.cols();

        let mut current = self.env.start();
        let mut path = vec![current];
        while current != goal {
            let steps = path.len() - 1;
            let action = match model.policy.get(&current) {
                Some(action) if steps < limit => action,
                _ => {
                    return Err(SolverError::NoPathFound {
                        steps,
                        last: current,
                    })
                }
            };
            let (_, next) = self.env.apply_dynamics(current, action);
            path.push(next);
            current = next;
        }

        debug!(steps = path.len() - 1, "extracted solution path");
        Ok(path)
    }

    /// Undiscounted reward collected along `path` under the current policy's
    /// dynamics. Consecutive cells that are not one policy step apart add
    /// nothing.
    #[must_use]
    pub fn path_return(&self, path: &[Position]) -> f64 {
        path.windows(2)
            .filter_map(|pair| {
                let action = self.policy()?.get(&pair[0])?;
                let (reward, next) = self.env.apply_dynamics(pair[0], action);
                (next == pair[1]).then_some(reward)
            })
            .sum()
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn is_converged(&self) -> bool {
        self.phase == Phase::Converged
    }

    /// Completed evaluate/improve rounds since the last initialisation.
    #[must_use]
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    #[must_use]
    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    #[must_use]
    pub fn environment(&self) -> &Environment {
        &self.env
    }

    #[must_use]
    pub fn policy(&self) -> Option<&Policy> {
        self.model.as_ref().map(|m| &m.policy)
    }

    #[must_use]
    pub fn values(&self) -> Option<&ValueFunction> {
        self.model.as_ref().map(|m| &m.values)
    }

    #[must_use]
    pub fn table(&self) -> Option<&TransitionTable> {
        self.model.as_ref().map(|m| &m.table)
    }

    /// Owned, serializable copy of everything a renderer needs.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let values = self
            .values()
            .map(|v| {
                v.iter()
                    .map(|(position, value)| CellValue { position, value })
                    .collect()
            })
            .unwrap_or_default();
        let policy = self
            .policy()
            .map(|p| {
                p.iter()
                    .map(|(position, action)| CellAction { position, action })
                    .collect()
            })
            .unwrap_or_default();

        Snapshot {
            rows: self.env.rows(),
            cols: self.env.cols(),
            start: self.env.start(),
            goal: self.env.goal(),
            obstacles: self.env.obstacles().iter().copied().collect(),
            agent: self.env.agent_position(),
            phase: self.phase,
            iteration: self.iterations,
            values,
            policy,
        }
    }
}
