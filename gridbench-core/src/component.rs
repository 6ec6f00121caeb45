//! Component traits: the opaque algorithm units held by a registry.
//!
//! A registry stores factories for `dyn Classifier`, `dyn Transform` or
//! `dyn Clusterer`. Every factory call must return a new instance that shares
//! no mutable state with earlier ones.

use crate::data::Dataset;
use crate::error::AlgorithmError;

/// A supervised classifier.
pub trait Classifier: Send {
    /// Build the classifier from the training split.
    fn fit(&mut self, train: &Dataset) -> Result<(), AlgorithmError>;

    /// Predict one class label per instance of `data`.
    fn predict(&self, data: &Dataset) -> Result<Vec<String>, AlgorithmError>;
}

/// A feature transform, optionally fitted on the training split.
pub trait Transform: Send {
    /// Learn any parameters from the training split. Stateless transforms
    /// can keep the default.
    fn fit(&mut self, _train: &Dataset) -> Result<(), AlgorithmError> {
        Ok(())
    }

    fn transform(&self, data: &Dataset) -> Result<Dataset, AlgorithmError>;
}

/// An unsupervised clusterer.
pub trait Clusterer: Send {
    fn fit(&mut self, train: &Dataset) -> Result<(), AlgorithmError>;

    /// Assign each instance of `data` to a cluster id.
    fn assign(&self, data: &Dataset) -> Result<Vec<usize>, AlgorithmError>;
}
