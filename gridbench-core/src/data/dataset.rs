//! Labeled datasets and train/test problems.

use crate::error::LoadError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A single labeled instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub features: Vec<f64>,
    pub label: String,
}

impl Instance {
    pub fn new(features: Vec<f64>, label: impl Into<String>) -> Self {
        Self {
            features,
            label: label.into(),
        }
    }
}

/// An in-memory labeled dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub name: String,
    /// Feature attribute names, in column order. The class column is not included.
    pub attributes: Vec<String>,
    pub instances: Vec<Instance>,
}

impl Dataset {
    pub fn new(name: impl Into<String>, attributes: Vec<String>, instances: Vec<Instance>) -> Self {
        Self {
            name: name.into(),
            attributes,
            instances,
        }
    }

    /// Build a dataset with generated attribute names (`att0`, `att1`, ...).
    pub fn from_instances(name: impl Into<String>, instances: Vec<Instance>) -> Self {
        let width = instances.first().map_or(0, |i| i.features.len());
        let attributes = (0..width).map(|i| format!("att{i}")).collect();
        Self::new(name, attributes, instances)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn num_features(&self) -> usize {
        self.attributes.len()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.instances.iter().map(|i| i.label.as_str())
    }

    /// Distinct class labels in sorted order.
    pub fn class_labels(&self) -> Vec<String> {
        self.labels()
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Check that every instance has one value per attribute.
    pub fn validate(&self) -> Result<(), String> {
        let width = self.attributes.len();
        for (idx, instance) in self.instances.iter().enumerate() {
            if instance.features.len() != width {
                return Err(format!(
                    "{}: instance {} has {} features, expected {}",
                    self.name,
                    idx,
                    instance.features.len(),
                    width
                ));
            }
        }
        Ok(())
    }

    pub fn schema_matches(&self, other: &Dataset) -> bool {
        self.attributes == other.attributes
    }
}

/// A named problem with fixed train and test splits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub name: String,
    pub train: Dataset,
    pub test: Dataset,
}

impl Problem {
    /// Build a problem, checking that both splits are non-empty, internally
    /// consistent, and share one schema.
    pub fn new(name: impl Into<String>, train: Dataset, test: Dataset) -> Result<Self, LoadError> {
        let name = name.into();
        if train.is_empty() {
            return Err(LoadError::malformed(&name, "train split has no instances"));
        }
        if test.is_empty() {
            return Err(LoadError::malformed(&name, "test split has no instances"));
        }
        train
            .validate()
            .map_err(|reason| LoadError::malformed(&name, reason))?;
        test.validate()
            .map_err(|reason| LoadError::malformed(&name, reason))?;
        if !train.schema_matches(&test) {
            return Err(LoadError::malformed(
                &name,
                format!(
                    "train and test schemas differ ({} vs {} attributes)",
                    train.num_features(),
                    test.num_features()
                ),
            ));
        }
        Ok(Self { name, train, test })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(name: &str, rows: &[(&[f64], &str)]) -> Dataset {
        Dataset::from_instances(
            name,
            rows.iter()
                .map(|(f, l)| Instance::new(f.to_vec(), *l))
                .collect(),
        )
    }

    #[test]
    fn test_class_labels_sorted_unique() {
        let ds = dataset("d", &[(&[1.0], "b"), (&[2.0], "a"), (&[3.0], "b")]);
        assert_eq!(ds.class_labels(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(ds.num_features(), 1);
    }

    #[test]
    fn test_validate_rejects_ragged_rows() {
        let mut ds = dataset("d", &[(&[1.0, 2.0], "a")]);
        ds.instances.push(Instance::new(vec![1.0], "b"));
        let err = ds.validate().unwrap_err();
        assert!(err.contains("instance 1 has 1 features"));
    }

    #[test]
    fn test_problem_requires_matching_schema() {
        let train = dataset("train", &[(&[1.0, 2.0], "a")]);
        let test = dataset("test", &[(&[1.0], "a")]);
        let err = Problem::new("p", train, test).unwrap_err();
        assert!(matches!(err, LoadError::Malformed { .. }));
    }

    #[test]
    fn test_problem_requires_instances() {
        let train = dataset("train", &[]);
        let test = dataset("test", &[(&[1.0], "a")]);
        assert!(Problem::new("p", train, test).is_err());
    }

    #[test]
    fn test_problem_ok() {
        let train = dataset("train", &[(&[1.0], "a"), (&[2.0], "b")]);
        let test = dataset("test", &[(&[1.5], "a")]);
        let problem = Problem::new("p", train, test).unwrap();
        assert_eq!(problem.name, "p");
        assert_eq!(problem.train.len(), 2);
    }
}
