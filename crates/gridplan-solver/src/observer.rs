//! Read-only hooks for renderers and recorders.
//!
//! Observers are called by the driver loop in
//! [`PolicyIteration::solve_with`] after each completed round, never from
//! inside an evaluation or improvement pass, and only ever see `&PolicyIteration`.

use gridplan_core::Position;
use serde::{Deserialize, Serialize};

use crate::policy_iteration::{IterationReport, Phase, PolicyIteration};
use crate::values::{CellAction, CellValue};

pub trait Observer {
    fn on_iteration(&mut self, solver: &PolicyIteration, report: &IterationReport);

    fn on_solution(&mut self, _solver: &PolicyIteration, _path: &[Position]) {}
}

/// Ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn on_iteration(&mut self, _solver: &PolicyIteration, _report: &IterationReport) {}
}

/// Per-round numbers kept by [`HistoryObserver`] and written to reports.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IterationSummary {
    pub iteration: usize,
    pub sweeps: usize,
    pub final_delta: f64,
    pub policy_changes: usize,
}

impl From<&IterationReport> for IterationSummary {
    fn from(report: &IterationReport) -> Self {
        Self {
            iteration: report.iteration,
            sweeps: report.evaluation.sweeps(),
            final_delta: report.evaluation.final_delta(),
            policy_changes: report.improvement.changed,
        }
    }
}

/// Records a summary of every round and the final path.
#[derive(Debug, Default, Clone)]
pub struct HistoryObserver {
    pub iterations: Vec<IterationSummary>,
    pub path: Option<Vec<Position>>,
}

impl Observer for HistoryObserver {
    fn on_iteration(&mut self, _solver: &PolicyIteration, report: &IterationReport) {
        self.iterations.push(IterationSummary::from(report));
    }

    fn on_solution(&mut self, _solver: &PolicyIteration, path: &[Position]) {
        self.path = Some(path.to_vec());
    }
}

/// Everything a renderer needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub rows: usize,
    pub cols: usize,
    pub start: Position,
    pub goal: Position,
    pub obstacles: Vec<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<Position>,
    pub phase: Phase,
    pub iteration: usize,
    pub values: Vec<CellValue>,
    pub policy: Vec<CellAction>,
}

impl<F> Observer for F
where
    F: FnMut(&PolicyIteration, &IterationReport),
{
    fn on_iteration(&mut self, solver: &PolicyIteration, report: &IterationReport) {
        self(solver, report);
    }
}
