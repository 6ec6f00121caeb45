//! Batch Driver: runs every (problem, algorithm) cell of a grid and records
//! one outcome per cell.
//!
//! Problems are loaded once each, in order. Cells are dispatched in traversal
//! order onto a worker pool bounded by a semaphore; the algorithm work itself
//! runs on the blocking thread pool. Any failure inside a cell (unknown name,
//! fit or evaluation error, load failure, timeout, panic) is recorded in the
//! report and the batch carries on.

use crate::config::BatchConfig;
use crate::data::{Problem, ProblemLoader};
use crate::error::{BatchError, CellError, FailureCause};
use crate::registry::ComponentRegistry;
use crate::report::{BatchCell, BatchReport, CellOutcome};
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// The work done in one cell: fit a fresh component on the train split and
/// score it on the test split.
pub trait CellOperation: Send + Sync + 'static {
    /// Component family this operation drives (`dyn Classifier`, ...).
    type Component: ?Sized + Send + 'static;

    /// Operation name recorded in the report.
    fn name(&self) -> &'static str;

    /// Name of the success metric.
    fn metric_name(&self) -> &'static str;

    fn run(&self, component: &mut Self::Component, problem: &Problem) -> Result<f64, CellError>;
}

/// Execution options for a batch run.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOptions {
    /// Cells in flight at once. 1 runs the grid sequentially.
    ///
    /// A cell that times out gives its slot back immediately, so blocking
    /// work abandoned by timed-out cells is not counted against this limit.
    pub max_concurrent: usize,
    /// Deadline for a single cell's build and evaluation.
    pub cell_timeout: Option<Duration>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            max_concurrent: 1,
            cell_timeout: None,
        }
    }
}

impl BatchOptions {
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn with_cell_timeout(mut self, timeout: Duration) -> Self {
        self.cell_timeout = Some(timeout);
        self
    }
}

impl From<&BatchConfig> for BatchOptions {
    fn from(config: &BatchConfig) -> Self {
        Self {
            max_concurrent: config.max_concurrent.max(1),
            cell_timeout: config
                .cell_timeout_secs
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok()),
        }
    }
}

/// Drives a batch of cells for one operation over one registry.
pub struct BatchDriver<Op: CellOperation> {
    registry: Arc<ComponentRegistry<Op::Component>>,
    loader: Arc<dyn ProblemLoader>,
    operation: Arc<Op>,
    options: BatchOptions,
}

impl<Op: CellOperation> BatchDriver<Op> {
    pub fn new(
        registry: Arc<ComponentRegistry<Op::Component>>,
        loader: Arc<dyn ProblemLoader>,
        operation: Op,
    ) -> Self {
        Self {
            registry,
            loader,
            operation: Arc::new(operation),
            options: BatchOptions::default(),
        }
    }

    pub fn with_options(mut self, options: BatchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    /// Run every requested cell to completion.
    pub async fn run(
        &self,
        problems: &[String],
        algorithms: &[String],
    ) -> Result<BatchReport, BatchError> {
        self.run_with_cancel(problems, algorithms, &CancellationToken::new())
            .await
    }

    /// Run the grid until it completes or `cancel` fires. On cancellation no
    /// further cells are dispatched, in-flight cells finish, and the partial
    /// report is returned with `cancelled` set.
    pub async fn run_with_cancel(
        &self,
        problems: &[String],
        algorithms: &[String],
        cancel: &CancellationToken,
    ) -> Result<BatchReport, BatchError> {
        if problems.is_empty() {
            return Err(BatchError::EmptyProblems);
        }
        if algorithms.is_empty() {
            return Err(BatchError::EmptyAlgorithms);
        }

        let started_at = Utc::now();
        let total = problems.len() * algorithms.len();
        let semaphore = Arc::new(Semaphore::new(self.options.max_concurrent.max(1)));
        let mut tasks: JoinSet<(usize, BatchCell)> = JoinSet::new();
        let mut cells: Vec<(usize, BatchCell)> = Vec::with_capacity(total);
        let mut cancelled = false;

        info!(
            operation = self.operation.name(),
            problems = problems.len(),
            algorithms = algorithms.len(),
            max_concurrent = self.options.max_concurrent,
            "Starting batch"
        );

        'problems: for (p, problem_name) in problems.iter().enumerate() {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            let loaded = self.load_problem(problem_name).await;
            if let Err(err) = &loaded {
                warn!(problem = %problem_name, error = %err, "Failed to load problem");
            }

            for (a, algorithm) in algorithms.iter().enumerate() {
                let index = p * algorithms.len() + a;
                let permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        cancelled = true;
                        break 'problems;
                    }
                    permit = Arc::clone(&semaphore).acquire_owned() => {
                        permit.map_err(|e| BatchError::Assembly(e.to_string()))?
                    }
                };

                let problem = match &loaded {
                    Ok(problem) => Arc::clone(problem),
                    Err(err) => {
                        drop(permit);
                        log_failure(algorithm, err);
                        cells.push((
                            index,
                            BatchCell {
                                problem: problem_name.clone(),
                                algorithm: algorithm.clone(),
                                outcome: err.clone().into(),
                                elapsed_ms: 0,
                            },
                        ));
                        continue;
                    }
                };

                let registry = Arc::clone(&self.registry);
                let operation = Arc::clone(&self.operation);
                let problem_name = problem_name.clone();
                let algorithm = algorithm.clone();
                let timeout = self.options.cell_timeout;
                tasks.spawn(async move {
                    let _permit = permit;
                    let started = Instant::now();
                    let outcome =
                        run_cell(registry, operation, problem, &algorithm, timeout).await;
                    let cell = BatchCell {
                        problem: problem_name,
                        algorithm,
                        outcome,
                        elapsed_ms: started.elapsed().as_millis() as u64,
                    };
                    (index, cell)
                });
            }
        }

        if cancelled {
            warn!(
                in_flight = tasks.len(),
                "Batch cancelled; waiting for in-flight cells"
            );
        }
        while let Some(joined) = tasks.join_next().await {
            cells.push(joined.map_err(|e| BatchError::Assembly(e.to_string()))?);
        }

        let cells = assemble(cells, total, cancelled)?;
        let report = BatchReport {
            id: uuid::Uuid::new_v4().to_string(),
            operation: self.operation.name().to_string(),
            metric: self.operation.metric_name().to_string(),
            problems: problems.to_vec(),
            algorithms: algorithms.to_vec(),
            cells,
            started_at,
            finished_at: Utc::now(),
            cancelled,
        };

        let failing = report.failing_algorithms();
        info!(
            cells = report.len(),
            successes = report.successes().count(),
            failures = report.failures().count(),
            cancelled,
            "Batch finished"
        );
        if !failing.is_empty() {
            warn!(algorithms = ?failing, "Algorithms with failed cells");
        }
        Ok(report)
    }

    /// Load a problem on the blocking pool. A panicking loader is reported
    /// like any other load failure.
    async fn load_problem(&self, name: &str) -> Result<Arc<Problem>, CellError> {
        let loader = Arc::clone(&self.loader);
        let owned = name.to_string();
        match tokio::task::spawn_blocking(move || loader.load(&owned)).await {
            Ok(Ok(problem)) => Ok(Arc::new(problem)),
            Ok(Err(err)) => Err(CellError::from(&err)),
            Err(err) => Err(CellError::new(FailureCause::Panicked, panic_message(err))),
        }
    }
}

async fn run_cell<Op: CellOperation>(
    registry: Arc<ComponentRegistry<Op::Component>>,
    operation: Arc<Op>,
    problem: Arc<Problem>,
    algorithm: &str,
    timeout: Option<Duration>,
) -> CellOutcome {
    let entry = match registry.get_by_name(algorithm) {
        Ok(entry) => entry,
        Err(err) => {
            let err = CellError::new(FailureCause::UnknownAlgorithm, err.to_string());
            log_failure(algorithm, &err);
            return err.into();
        }
    };

    info!("Building {} on {} ....", algorithm, problem.name);
    let metric_name = operation.metric_name();
    let work = tokio::task::spawn_blocking(move || {
        let mut component = entry.build();
        operation.run(&mut *component, &problem)
    });

    let joined = match timeout {
        Some(limit) => match tokio::time::timeout(limit, work).await {
            Ok(joined) => joined,
            Err(_) => {
                let err = CellError::new(
                    FailureCause::Timeout,
                    format!("Timed out after {}ms", limit.as_millis()),
                );
                log_failure(algorithm, &err);
                return err.into();
            }
        },
        None => work.await,
    };

    let result = joined.unwrap_or_else(|err| {
        Err(CellError::new(FailureCause::Panicked, panic_message(err)))
    });
    match result {
        Ok(metric) => {
            info!("Built successfully. {} = {}", metric_name, metric);
            CellOutcome::Success { metric }
        }
        Err(err) => {
            log_failure(algorithm, &err);
            err.into()
        }
    }
}

fn log_failure(algorithm: &str, err: &CellError) {
    warn!(
        "{} failed to build with exception {}: {}",
        algorithm, err.cause, err.message
    );
}

fn panic_message(err: JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    let payload = err.into_panic();
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("panicked: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("panicked: {msg}")
    } else {
        "panicked".to_string()
    }
}

/// Order collected cells by grid index. Every index may appear at most once,
/// and a run that was not cancelled must cover the whole grid.
fn assemble(
    mut cells: Vec<(usize, BatchCell)>,
    total: usize,
    cancelled: bool,
) -> Result<Vec<BatchCell>, BatchError> {
    cells.sort_by_key(|(index, _)| *index);
    if let Some(pair) = cells.windows(2).find(|w| w[0].0 == w[1].0) {
        return Err(BatchError::Assembly(format!(
            "cell {} recorded twice",
            pair[0].0
        )));
    }
    if !cancelled && cells.len() != total {
        return Err(BatchError::Assembly(format!(
            "expected {total} cells, got {}",
            cells.len()
        )));
    }
    Ok(cells.into_iter().map(|(_, cell)| cell).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(problem: &str) -> BatchCell {
        BatchCell {
            problem: problem.into(),
            algorithm: "a".into(),
            outcome: CellOutcome::Success { metric: 1.0 },
            elapsed_ms: 0,
        }
    }

    #[test]
    fn test_assemble_sorts_by_index() {
        let cells = vec![(2, cell("c")), (0, cell("a")), (1, cell("b"))];
        let ordered = assemble(cells, 3, false).unwrap();
        let problems: Vec<_> = ordered.iter().map(|c| c.problem.as_str()).collect();
        assert_eq!(problems, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_assemble_rejects_duplicates() {
        let cells = vec![(0, cell("a")), (0, cell("a"))];
        assert!(matches!(
            assemble(cells, 2, false),
            Err(BatchError::Assembly(_))
        ));
    }

    #[test]
    fn test_assemble_missing_cells() {
        let cells = vec![(0, cell("a"))];
        assert!(assemble(cells.clone(), 2, false).is_err());
        assert_eq!(assemble(cells, 2, true).unwrap().len(), 1);
    }

    #[test]
    fn test_options_from_config() {
        let config = BatchConfig {
            max_concurrent: 0,
            cell_timeout_secs: Some(1.5),
        };
        let options = BatchOptions::from(&config);
        assert_eq!(options.max_concurrent, 1);
        assert_eq!(options.cell_timeout, Some(Duration::from_millis(1500)));
    }
}
