//! Data model and problem loading: datasets, train/test problems, loaders.

pub mod dataset;
pub mod source;

pub use dataset::{Dataset, Instance, Problem};
pub use source::{DirectoryLoader, InMemoryLoader, ProblemLoader};
