//! # gridbench-core: Component registries and fault-isolated batch experiments
//!
//! Algorithms are registered as named, tagged factories in a
//! [`ComponentRegistry`]. A [`BatchDriver`] evaluates every
//! (problem, algorithm) pair of a grid, isolating failures per cell, and
//! returns a [`BatchReport`] with exactly one outcome per requested cell.

// Foundation
pub mod config;
pub mod error;
pub mod persistence;

// Components and data
pub mod component;
pub mod data;
pub mod registry;

// Batch execution
pub mod driver;
pub mod metrics;
pub mod operations;
pub mod report;

// Re-exports
pub use component::{Classifier, Clusterer, Transform};
pub use config::{BatchConfig, BenchConfig, DataConfig, ReportConfig, load_config};
pub use data::{Dataset, DirectoryLoader, InMemoryLoader, Instance, Problem, ProblemLoader};
pub use driver::{BatchDriver, BatchOptions, CellOperation};
pub use error::{
    AlgorithmError, BatchError, CellError, ConfigError, FailureCause, GridbenchError, LoadError,
    RegistryError, Result,
};
pub use metrics::MetricSummary;
pub use operations::{Classification, Clustering, Transformation};
pub use registry::{
    ClassifierRegistry, ClustererRegistry, ComponentRegistry, RegistryEntry, TagMatch,
    TransformRegistry,
};
pub use report::{BatchCell, BatchReport, CellOutcome};
pub use tokio_util::sync::CancellationToken;
