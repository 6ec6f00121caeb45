//! # gridbench-components: Reference components for gridbench
//!
//! Small, dependency-free classifiers, transforms and clusterers, registered
//! into the core registries through the `register_builtin_*` functions.

pub mod classifiers;
pub mod clusterers;
pub mod transforms;

use gridbench_core::{
    ClassifierRegistry, ClustererRegistry, RegistryEntry, RegistryError, TransformRegistry,
};
use tracing::debug;

pub use classifiers::{MajorityClass, NearestCentroid, NearestNeighbor};
pub use clusterers::KMeans;
pub use transforms::{FirstDerivative, ZNormalise};

/// Register all built-in classifiers.
pub fn register_builtin_classifiers(registry: &ClassifierRegistry) -> Result<(), RegistryError> {
    let entries = vec![
        RegistryEntry::classifier("majority-class", MajorityClass::default)
            .with_tags(["baseline"]),
        RegistryEntry::classifier("ed-1nn", NearestNeighbor::default)
            .with_tags(["distance", "nearest-neighbor", "euclidean"]),
        RegistryEntry::classifier("nearest-centroid", NearestCentroid::default)
            .with_tags(["distance", "centroid", "euclidean"]),
    ];
    for entry in entries {
        registry.register(entry)?;
    }
    debug!(count = registry.len(), "Registered built-in classifiers");
    Ok(())
}

/// Register all built-in transforms.
pub fn register_builtin_transforms(registry: &TransformRegistry) -> Result<(), RegistryError> {
    let entries = vec![
        RegistryEntry::transform("z-normalise", || ZNormalise).with_tags(["normalise", "series"]),
        RegistryEntry::transform("first-derivative", || FirstDerivative)
            .with_tags(["derivative", "series"]),
    ];
    for entry in entries {
        registry.register(entry)?;
    }
    debug!(count = registry.len(), "Registered built-in transforms");
    Ok(())
}

/// Register all built-in clusterers.
pub fn register_builtin_clusterers(registry: &ClustererRegistry) -> Result<(), RegistryError> {
    registry.register(
        RegistryEntry::clusterer("k-means", KMeans::default).with_tags(["partitional", "euclidean"]),
    )?;
    debug!(count = registry.len(), "Registered built-in clusterers");
    Ok(())
}

/// Squared Euclidean distance. Slices must have equal length.
pub(crate) fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}
