//! Built-in per-cell operations for the batch driver.

use crate::component::{Classifier, Clusterer, Transform};
use crate::data::Problem;
use crate::driver::CellOperation;
use crate::error::CellError;
use crate::metrics::{accuracy, rand_index};

/// Fit a classifier on train, score accuracy on test.
#[derive(Debug, Clone, Copy, Default)]
pub struct Classification;

impl CellOperation for Classification {
    type Component = dyn Classifier;

    fn name(&self) -> &'static str {
        "classification"
    }

    fn metric_name(&self) -> &'static str {
        "accuracy"
    }

    fn run(&self, classifier: &mut Self::Component, problem: &Problem) -> Result<f64, CellError> {
        classifier
            .fit(&problem.train)
            .map_err(|e| CellError::build_failed(&e))?;
        let predicted = classifier
            .predict(&problem.test)
            .map_err(|e| CellError::evaluation_failed(e.to_string()))?;

        let truth: Vec<&str> = problem.test.labels().collect();
        accuracy(&predicted, &truth).ok_or_else(|| {
            CellError::evaluation_failed(format!(
                "expected {} predictions, got {}",
                truth.len(),
                predicted.len()
            ))
        })
    }
}

/// Fit a transform on train and apply it to both splits. The metric is the
/// transformed feature count.
#[derive(Debug, Clone, Copy, Default)]
pub struct Transformation;

impl CellOperation for Transformation {
    type Component = dyn Transform;

    fn name(&self) -> &'static str {
        "transformation"
    }

    fn metric_name(&self) -> &'static str {
        "num_features"
    }

    fn run(&self, transform: &mut Self::Component, problem: &Problem) -> Result<f64, CellError> {
        transform
            .fit(&problem.train)
            .map_err(|e| CellError::build_failed(&e))?;
        let train = transform
            .transform(&problem.train)
            .map_err(|e| CellError::build_failed(&e))?;
        let test = transform
            .transform(&problem.test)
            .map_err(|e| CellError::evaluation_failed(e.to_string()))?;

        if test.len() != problem.test.len() {
            return Err(CellError::evaluation_failed(format!(
                "transformed test split has {} instances, expected {}",
                test.len(),
                problem.test.len()
            )));
        }
        if train.num_features() != test.num_features() {
            return Err(CellError::evaluation_failed(format!(
                "train and test transform to {} vs {} features",
                train.num_features(),
                test.num_features()
            )));
        }
        Ok(test.num_features() as f64)
    }
}

/// Fit a clusterer on train, score the Rand index of its test assignment
/// against the test labels.
#[derive(Debug, Clone, Copy, Default)]
pub struct Clustering;

impl CellOperation for Clustering {
    type Component = dyn Clusterer;

    fn name(&self) -> &'static str {
        "clustering"
    }

    fn metric_name(&self) -> &'static str {
        "rand_index"
    }

    fn run(&self, clusterer: &mut Self::Component, problem: &Problem) -> Result<f64, CellError> {
        clusterer
            .fit(&problem.train)
            .map_err(|e| CellError::build_failed(&e))?;
        let assignment = clusterer
            .assign(&problem.test)
            .map_err(|e| CellError::evaluation_failed(e.to_string()))?;

        let labels: Vec<&str> = problem.test.labels().collect();
        rand_index(&assignment, &labels).ok_or_else(|| {
            CellError::evaluation_failed(format!(
                "expected {} assignments, got {}",
                labels.len(),
                assignment.len()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Dataset, Instance};
    use crate::error::{AlgorithmError, FailureCause};

    fn problem() -> Problem {
        let train = Dataset::from_instances(
            "train",
            vec![
                Instance::new(vec![0.0, 1.0], "a"),
                Instance::new(vec![5.0, 6.0], "b"),
            ],
        );
        let test = Dataset::from_instances(
            "test",
            vec![
                Instance::new(vec![0.5, 1.0], "a"),
                Instance::new(vec![5.5, 6.0], "b"),
                Instance::new(vec![0.1, 0.9], "b"),
            ],
        );
        Problem::new("toy", train, test).unwrap()
    }

    struct Constant(&'static str);

    impl Classifier for Constant {
        fn fit(&mut self, _train: &Dataset) -> Result<(), AlgorithmError> {
            Ok(())
        }

        fn predict(&self, data: &Dataset) -> Result<Vec<String>, AlgorithmError> {
            Ok(vec![self.0.to_string(); data.len()])
        }
    }

    struct Short;

    impl Classifier for Short {
        fn fit(&mut self, _train: &Dataset) -> Result<(), AlgorithmError> {
            Ok(())
        }

        fn predict(&self, _data: &Dataset) -> Result<Vec<String>, AlgorithmError> {
            Ok(vec!["a".into()])
        }
    }

    struct Unfittable;

    impl Classifier for Unfittable {
        fn fit(&mut self, _train: &Dataset) -> Result<(), AlgorithmError> {
            Err(AlgorithmError::ill_conditioned("singular covariance"))
        }

        fn predict(&self, _data: &Dataset) -> Result<Vec<String>, AlgorithmError> {
            Err(AlgorithmError::NotFitted)
        }
    }

    #[test]
    fn test_classification_accuracy() {
        let acc = Classification.run(&mut Constant("a"), &problem()).unwrap();
        assert!((acc - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_classification_fit_failure() {
        let err = Classification.run(&mut Unfittable, &problem()).unwrap_err();
        assert_eq!(err.cause, FailureCause::BuildFailed);
        assert!(err.message.contains("singular covariance"));
    }

    #[test]
    fn test_classification_wrong_prediction_count() {
        let err = Classification.run(&mut Short, &problem()).unwrap_err();
        assert_eq!(err.cause, FailureCause::EvaluationFailed);
    }

    /// Drops the last feature; optionally refuses datasets named "test".
    struct DropLast {
        reject_test: bool,
    }

    impl Transform for DropLast {
        fn transform(&self, data: &Dataset) -> Result<Dataset, AlgorithmError> {
            if self.reject_test && data.name == "test" {
                return Err(AlgorithmError::unsupported("test split"));
            }
            let instances = data
                .instances
                .iter()
                .map(|i| {
                    let keep = i.features.len().saturating_sub(1);
                    Instance::new(i.features[..keep].to_vec(), i.label.clone())
                })
                .collect();
            Ok(Dataset::from_instances(data.name.clone(), instances))
        }
    }

    /// Emits train and test with different widths.
    struct Ragged;

    impl Transform for Ragged {
        fn transform(&self, data: &Dataset) -> Result<Dataset, AlgorithmError> {
            let width = if data.name == "train" { 2 } else { 3 };
            let instances = data
                .instances
                .iter()
                .map(|i| Instance::new(vec![0.0; width], i.label.clone()))
                .collect();
            Ok(Dataset::from_instances(data.name.clone(), instances))
        }
    }

    #[test]
    fn test_transformation_feature_count() {
        let width = Transformation
            .run(&mut DropLast { reject_test: false }, &problem())
            .unwrap();
        assert_eq!(width, 1.0);
    }

    #[test]
    fn test_transformation_test_failure() {
        let err = Transformation
            .run(&mut DropLast { reject_test: true }, &problem())
            .unwrap_err();
        assert_eq!(err.cause, FailureCause::EvaluationFailed);
    }

    #[test]
    fn test_transformation_width_mismatch() {
        let err = Transformation.run(&mut Ragged, &problem()).unwrap_err();
        assert_eq!(err.cause, FailureCause::EvaluationFailed);
        assert!(err.message.contains("2 vs 3"));
    }

    struct ByFirstFeature;

    impl Clusterer for ByFirstFeature {
        fn fit(&mut self, _train: &Dataset) -> Result<(), AlgorithmError> {
            Ok(())
        }

        fn assign(&self, data: &Dataset) -> Result<Vec<usize>, AlgorithmError> {
            Ok(data
                .instances
                .iter()
                .map(|i| usize::from(i.features[0] > 2.0))
                .collect())
        }
    }

    #[test]
    fn test_clustering_rand_index() {
        // Clusters {0,2} {1}; labels {0} {1,2}. Only pair (0,1) agrees.
        let ri = Clustering.run(&mut ByFirstFeature, &problem()).unwrap();
        assert!((ri - 1.0 / 3.0).abs() < 1e-12);
    }
}
