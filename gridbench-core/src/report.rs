//! Batch Report: ordered per-cell outcomes of a batch run.

use crate::error::{CellError, FailureCause, Result};
use crate::metrics::MetricSummary;
use crate::persistence;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Outcome of one (problem, algorithm) cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CellOutcome {
    Success { metric: f64 },
    Failure { cause: FailureCause, message: String },
}

impl CellOutcome {
    pub fn failure(cause: FailureCause, message: impl Into<String>) -> Self {
        Self::Failure {
            cause,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn metric(&self) -> Option<f64> {
        match self {
            Self::Success { metric } => Some(*metric),
            Self::Failure { .. } => None,
        }
    }

    pub fn cause(&self) -> Option<FailureCause> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { cause, .. } => Some(*cause),
        }
    }
}

impl From<CellError> for CellOutcome {
    fn from(err: CellError) -> Self {
        Self::Failure {
            cause: err.cause,
            message: err.message,
        }
    }
}

/// One cell of the problem × algorithm grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchCell {
    pub problem: String,
    pub algorithm: String,
    pub outcome: CellOutcome,
    pub elapsed_ms: u64,
}

/// Result of a batch run: cells in (problem, algorithm) traversal order plus
/// run metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub id: String,
    /// Per-cell operation that produced the metrics ("classification", ...).
    pub operation: String,
    /// Name of the recorded success metric ("accuracy", ...).
    pub metric: String,
    pub problems: Vec<String>,
    pub algorithms: Vec<String>,
    pub cells: Vec<BatchCell>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Set when the run was cancelled before every cell was dispatched.
    pub cancelled: bool,
}

impl BatchReport {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn requested_cells(&self) -> usize {
        self.problems.len() * self.algorithms.len()
    }

    /// True when every requested cell has an outcome.
    pub fn is_complete(&self) -> bool {
        self.cells.len() == self.requested_cells()
    }

    pub fn cell(&self, problem: &str, algorithm: &str) -> Option<&BatchCell> {
        self.cells
            .iter()
            .find(|c| c.problem == problem && c.algorithm == algorithm)
    }

    pub fn successes(&self) -> impl Iterator<Item = &BatchCell> {
        self.cells.iter().filter(|c| c.outcome.is_success())
    }

    pub fn failures(&self) -> impl Iterator<Item = &BatchCell> {
        self.cells.iter().filter(|c| !c.outcome.is_success())
    }

    pub fn failure_counts(&self) -> BTreeMap<FailureCause, usize> {
        let mut counts = BTreeMap::new();
        for cause in self.cells.iter().filter_map(|c| c.outcome.cause()) {
            *counts.entry(cause).or_insert(0) += 1;
        }
        counts
    }

    /// Algorithms with at least one failed cell.
    pub fn failing_algorithms(&self) -> BTreeSet<&str> {
        self.failures().map(|c| c.algorithm.as_str()).collect()
    }

    /// Metric summary per algorithm over its successful cells, in requested
    /// algorithm order. Algorithms without any success are omitted.
    pub fn summaries(&self) -> Vec<MetricSummary> {
        self.algorithms
            .iter()
            .filter_map(|algorithm| {
                let scores: Vec<f64> = self
                    .cells
                    .iter()
                    .filter(|c| &c.algorithm == algorithm)
                    .filter_map(|c| c.outcome.metric())
                    .collect();
                MetricSummary::from_scores(algorithm, &scores)
            })
            .collect()
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }

    /// Save as JSON (atomic write).
    pub fn save(&self, path: &Path) -> Result<()> {
        persistence::atomic_write_json(path, self)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        Ok(persistence::load_json(path)?)
    }
}
