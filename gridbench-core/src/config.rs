//! Configuration for gridbench runs.
//!
//! Layered with figment: defaults, user config, workspace config, an explicit
//! config file, then `GRIDBENCH_` environment variables.

use crate::data::DirectoryLoader;
use crate::error::ConfigError;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

/// Where and how problem files are read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory holding one sub-directory per problem.
    #[serde(default = "default_data_root")]
    pub root: PathBuf,
    /// Split file extension, without the dot.
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Single-character column delimiter.
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    /// Resample fold; fold-specific files are preferred when present.
    #[serde(default)]
    pub fold: Option<usize>,
}

fn default_data_root() -> PathBuf {
    PathBuf::from("data")
}

fn default_extension() -> String {
    "csv".to_string()
}

fn default_delimiter() -> String {
    ",".to_string()
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            root: default_data_root(),
            extension: default_extension(),
            delimiter: default_delimiter(),
            fold: None,
        }
    }
}

impl DataConfig {
    pub fn delimiter_char(&self) -> Result<char, ConfigError> {
        let mut chars = self.delimiter.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(ConfigError::Invalid {
                message: format!(
                    "data.delimiter must be a single character, got {:?}",
                    self.delimiter
                ),
            }),
        }
    }

    /// Directory loader for this configuration.
    pub fn loader(&self) -> Result<DirectoryLoader, ConfigError> {
        Ok(DirectoryLoader::new(&self.root)
            .with_extension(self.extension.clone())
            .with_delimiter(self.delimiter_char()?)
            .with_fold(self.fold))
    }
}

/// Batch execution settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Cells in flight at once; 1 runs sequentially.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// Per-cell deadline in seconds. No deadline when unset.
    #[serde(default)]
    pub cell_timeout_secs: Option<f64>,
}

fn default_max_concurrent() -> usize {
    1
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            cell_timeout_secs: None,
        }
    }
}

/// Report output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Write each batch report as JSON into `output_dir`.
    #[serde(default = "default_save_json")]
    pub save_json: bool,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("results")
}

fn default_save_json() -> bool {
    true
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            save_json: default_save_json(),
        }
    }
}

impl BenchConfig {
    /// Reject settings the driver or loader cannot honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch.max_concurrent == 0 {
            return Err(ConfigError::Invalid {
                message: "batch.max_concurrent must be at least 1".into(),
            });
        }
        if let Some(secs) = self.batch.cell_timeout_secs
            && !(secs.is_finite() && secs > 0.0)
        {
            return Err(ConfigError::Invalid {
                message: format!("batch.cell_timeout_secs must be positive, got {secs}"),
            });
        }
        if self.data.extension.trim_start_matches('.').is_empty() {
            return Err(ConfigError::Invalid {
                message: "data.extension must not be empty".into(),
            });
        }
        self.data.delimiter_char()?;
        Ok(())
    }
}

/// Path of the user-level config file, if a home directory is known.
pub fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "gridbench", "gridbench")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Path of the workspace-level config file.
pub fn workspace_config_path(workspace: &Path) -> PathBuf {
    workspace.join(".gridbench").join("config.toml")
}

/// Load configuration by merging, from lowest to highest precedence:
///
/// 1. Built-in defaults
/// 2. User config (`~/.config/gridbench/config.toml`)
/// 3. Workspace config (`<workspace>/.gridbench/config.toml`)
/// 4. Explicit config file, which must exist
/// 5. Environment variables (`GRIDBENCH_BATCH__MAX_CONCURRENT`, ...)
pub fn load_config(
    workspace: Option<&Path>,
    config_file: Option<&Path>,
) -> Result<BenchConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(BenchConfig::default()));

    if let Some(user_config) = user_config_path()
        && user_config.exists()
    {
        figment = figment.merge(Toml::file(&user_config));
    }

    if let Some(ws) = workspace {
        let ws_config = workspace_config_path(ws);
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    if let Some(path) = config_file {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        figment = figment.merge(Toml::file(path));
    }

    figment = figment.merge(Env::prefixed("GRIDBENCH_").split("__"));

    let config: BenchConfig = figment.extract().map_err(Box::new)?;
    config.validate()?;
    Ok(config)
}
