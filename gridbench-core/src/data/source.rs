//! Problem loaders: map a problem name to its train/test splits.

use crate::data::dataset::{Dataset, Instance, Problem};
use crate::error::LoadError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Trait for loading a problem by name.
///
/// Loaders are shared read-only across a batch run and may be called from
/// the blocking thread pool.
pub trait ProblemLoader: Send + Sync {
    fn load(&self, problem: &str) -> Result<Problem, LoadError>;
}

// ---------------------------------------------------------------------------
// DirectoryLoader
// ---------------------------------------------------------------------------

/// Loads `<root>/<problem>/<problem>_TRAIN.<ext>` and `<problem>_TEST.<ext>`.
///
/// When a fold is set, `<problem><fold>_TRAIN.<ext>` is tried first and the
/// unsuffixed pair is used as a fallback.
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    pub root: PathBuf,
    pub extension: String,
    pub delimiter: char,
    pub fold: Option<usize>,
}

impl DirectoryLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: "csv".to_string(),
            delimiter: ',',
            fold: None,
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into().trim_start_matches('.').to_string();
        self
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_fold(mut self, fold: Option<usize>) -> Self {
        self.fold = fold;
        self
    }

    /// Resolve the train and test file paths for a problem.
    pub fn split_paths(&self, problem: &str) -> Result<(PathBuf, PathBuf), LoadError> {
        let dir = self.root.join(problem);
        if !dir.is_dir() {
            return Err(LoadError::NotFound {
                problem: problem.to_string(),
                path: dir,
            });
        }

        if let Some(fold) = self.fold {
            let train = dir.join(format!("{problem}{fold}_TRAIN.{}", self.extension));
            let test = dir.join(format!("{problem}{fold}_TEST.{}", self.extension));
            if train.is_file() && test.is_file() {
                return Ok((train, test));
            }
            tracing::debug!(problem, fold, "No fold split found, using default split");
        }

        let train = dir.join(format!("{problem}_TRAIN.{}", self.extension));
        let test = dir.join(format!("{problem}_TEST.{}", self.extension));
        for path in [&train, &test] {
            if !path.is_file() {
                return Err(LoadError::NotFound {
                    problem: problem.to_string(),
                    path: path.clone(),
                });
            }
        }
        Ok((train, test))
    }

    fn read_split(&self, problem: &str, path: &Path) -> Result<Dataset, LoadError> {
        let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| problem.to_string());
        parse_delimited(problem, &name, &content, self.delimiter)
    }
}

impl ProblemLoader for DirectoryLoader {
    fn load(&self, problem: &str) -> Result<Problem, LoadError> {
        let (train_path, test_path) = self.split_paths(problem)?;
        let train = self.read_split(problem, &train_path)?;
        let test = self.read_split(problem, &test_path)?;
        tracing::debug!(
            problem,
            train = train.len(),
            test = test.len(),
            features = train.num_features(),
            "Loaded problem"
        );
        Problem::new(problem, train, test)
    }
}

/// Parse delimited text: a header line (attributes then the class column),
/// then one row per instance with numeric features and a trailing label.
/// Blank lines and lines starting with `#` are skipped.
pub fn parse_delimited(
    problem: &str,
    name: &str,
    content: &str,
    delimiter: char,
) -> Result<Dataset, LoadError> {
    let mut lines = content
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty() && !l.trim_start().starts_with('#'));

    let (_, header) = lines
        .next()
        .ok_or_else(|| LoadError::malformed(problem, format!("{name}: empty file")))?;
    let mut columns: Vec<String> = header
        .split(delimiter)
        .map(|s| s.trim().trim_matches('"').to_string())
        .collect();
    if columns.len() < 2 {
        return Err(LoadError::malformed(
            problem,
            format!("{name}: header needs at least one attribute and a class column"),
        ));
    }
    columns.pop();
    let width = columns.len();

    let mut instances = Vec::new();
    for (line_no, line) in lines {
        let fields: Vec<&str> = line
            .split(delimiter)
            .map(|s| s.trim().trim_matches('"'))
            .collect();
        if fields.len() != width + 1 {
            return Err(LoadError::malformed(
                problem,
                format!(
                    "{name}: line {} has {} columns, expected {}",
                    line_no + 1,
                    fields.len(),
                    width + 1
                ),
            ));
        }
        let (values, label) = fields.split_at(width);
        let features = values
            .iter()
            .map(|v| {
                v.parse::<f64>().map_err(|_| {
                    LoadError::malformed(
                        problem,
                        format!("{name}: line {}: '{v}' is not numeric", line_no + 1),
                    )
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        instances.push(Instance::new(features, label[0]));
    }

    Ok(Dataset::new(name, columns, instances))
}

// ---------------------------------------------------------------------------
// InMemoryLoader
// ---------------------------------------------------------------------------

/// Loader over prebuilt problems, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLoader {
    problems: HashMap<String, Problem>,
}

impl InMemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, problem: Problem) {
        self.problems.insert(problem.name.clone(), problem);
    }

    pub fn with_problem(mut self, problem: Problem) -> Self {
        self.insert(problem);
        self
    }
}

impl ProblemLoader for InMemoryLoader {
    fn load(&self, problem: &str) -> Result<Problem, LoadError> {
        self.problems
            .get(problem)
            .cloned()
            .ok_or_else(|| LoadError::NotFound {
                problem: problem.to_string(),
                path: PathBuf::from(format!("memory://{problem}")),
            })
    }
}
