//! Machine-readable summary of a finished run.

use gridplan_core::Position;
use serde::{Deserialize, Serialize};
use std::io::Write;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::observer::{HistoryObserver, IterationSummary, Snapshot};
use crate::policy_iteration::PolicyIteration;
use crate::settings::SolverSettings;

pub const REPORT_VERSION: &str = "0.1.0";

/// Fallback timestamp when formatting fails
const FALLBACK_TIMESTAMP: &str = "1970-01-01T00:00:00Z";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveReport {
    pub version: String,
    pub ts: String,
    pub settings: SolverSettings,
    pub iterations: Vec<IterationSummary>,
    pub converged: bool,
    pub path: Vec<Position>,
    /// Undiscounted reward collected along `path`.
    pub path_return: f64,
    pub snapshot: Snapshot,
}

impl SolveReport {
    #[must_use]
    pub fn new(solver: &PolicyIteration, history: &HistoryObserver, path: &[Position]) -> Self {
        Self {
            version: REPORT_VERSION.to_string(),
            ts: iso8601_now(),
            settings: *solver.settings(),
            iterations: history.iterations.clone(),
            converged: solver.is_converged(),
            path: path.to_vec(),
            path_return: solver.path_return(path),
            snapshot: solver.snapshot(),
        }
    }

    /// Sum of sweeps over all rounds.
    #[must_use]
    pub fn total_sweeps(&self) -> usize {
        self.iterations.iter().map(|i| i.sweeps).sum()
    }

    /// Number of moves in the path.
    #[must_use]
    pub fn steps(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    /// Writes the report as pretty-printed JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Propagates serialization and I/O errors from `writer`.
    pub fn write_json(&self, mut writer: impl Write) -> serde_json::Result<()> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n").map_err(serde_json::Error::io)
    }
}

fn iso8601_now() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| FALLBACK_TIMESTAMP.to_string())
}
