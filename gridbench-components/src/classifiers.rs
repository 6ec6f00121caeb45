//! Reference classifiers.

use crate::squared_distance;
use gridbench_core::{AlgorithmError, Classifier, Dataset};
use std::collections::BTreeMap;

fn check_width(expected: usize, data: &Dataset) -> Result<(), AlgorithmError> {
    if data.num_features() != expected {
        return Err(AlgorithmError::unsupported(format!(
            "{} has {} features, model was fitted on {}",
            data.name,
            data.num_features(),
            expected
        )));
    }
    Ok(())
}

/// Predicts the most frequent training label. Ties go to the label that
/// sorts first.
#[derive(Debug, Clone, Default)]
pub struct MajorityClass {
    label: Option<String>,
}

impl Classifier for MajorityClass {
    fn fit(&mut self, train: &Dataset) -> Result<(), AlgorithmError> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for label in train.labels() {
            *counts.entry(label).or_insert(0) += 1;
        }
        let best = counts
            .into_iter()
            .fold(None, |best: Option<(&str, usize)>, (label, n)| match best {
                Some((_, top)) if top >= n => best,
                _ => Some((label, n)),
            });
        let (label, _) =
            best.ok_or_else(|| AlgorithmError::unsupported("empty training set"))?;
        self.label = Some(label.to_string());
        Ok(())
    }

    fn predict(&self, data: &Dataset) -> Result<Vec<String>, AlgorithmError> {
        let label = self.label.as_ref().ok_or(AlgorithmError::NotFitted)?;
        Ok(vec![label.clone(); data.len()])
    }
}

/// One-nearest-neighbour under Euclidean distance.
#[derive(Debug, Clone, Default)]
pub struct NearestNeighbor {
    train: Option<Dataset>,
}

impl Classifier for NearestNeighbor {
    fn fit(&mut self, train: &Dataset) -> Result<(), AlgorithmError> {
        if train.is_empty() {
            return Err(AlgorithmError::unsupported("empty training set"));
        }
        self.train = Some(train.clone());
        Ok(())
    }

    fn predict(&self, data: &Dataset) -> Result<Vec<String>, AlgorithmError> {
        let train = self.train.as_ref().ok_or(AlgorithmError::NotFitted)?;
        check_width(train.num_features(), data)?;

        data.instances
            .iter()
            .map(|query| {
                train
                    .instances
                    .iter()
                    .map(|candidate| {
                        (
                            squared_distance(&query.features, &candidate.features),
                            &candidate.label,
                        )
                    })
                    .min_by(|a, b| a.0.total_cmp(&b.0))
                    .map(|(_, label)| label.clone())
                    .ok_or(AlgorithmError::NotFitted)
            })
            .collect()
    }
}

/// Assigns each instance to the class with the nearest mean vector.
#[derive(Debug, Clone, Default)]
pub struct NearestCentroid {
    centroids: Vec<(String, Vec<f64>)>,
    width: usize,
}

impl Classifier for NearestCentroid {
    fn fit(&mut self, train: &Dataset) -> Result<(), AlgorithmError> {
        let width = train.num_features();
        let mut sums: BTreeMap<&str, (Vec<f64>, usize)> = BTreeMap::new();
        for instance in &train.instances {
            let (sum, n) = sums
                .entry(instance.label.as_str())
                .or_insert_with(|| (vec![0.0; width], 0));
            for (acc, x) in sum.iter_mut().zip(&instance.features) {
                *acc += x;
            }
            *n += 1;
        }
        if sums.is_empty() {
            return Err(AlgorithmError::unsupported("empty training set"));
        }

        self.width = width;
        self.centroids = sums
            .into_iter()
            .map(|(label, (sum, n))| {
                let mean = sum.into_iter().map(|s| s / n as f64).collect();
                (label.to_string(), mean)
            })
            .collect();
        Ok(())
    }

    fn predict(&self, data: &Dataset) -> Result<Vec<String>, AlgorithmError> {
        if self.centroids.is_empty() {
            return Err(AlgorithmError::NotFitted);
        }
        check_width(self.width, data)?;

        data.instances
            .iter()
            .map(|query| {
                self.centroids
                    .iter()
                    .map(|(label, centroid)| (squared_distance(&query.features, centroid), label))
                    .min_by(|a, b| a.0.total_cmp(&b.0))
                    .map(|(_, label)| label.clone())
                    .ok_or(AlgorithmError::NotFitted)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridbench_core::Instance;
    use pretty_assertions::assert_eq;

    fn train() -> Dataset {
        Dataset::from_instances(
            "train",
            vec![
                Instance::new(vec![0.0, 0.0], "low"),
                Instance::new(vec![0.2, 0.1], "low"),
                Instance::new(vec![5.0, 5.0], "high"),
            ],
        )
    }

    fn queries() -> Dataset {
        Dataset::from_instances(
            "test",
            vec![
                Instance::new(vec![0.1, 0.0], "low"),
                Instance::new(vec![4.0, 4.5], "high"),
            ],
        )
    }

    #[test]
    fn test_majority_class() {
        let mut clf = MajorityClass::default();
        assert_eq!(clf.predict(&queries()), Err(AlgorithmError::NotFitted));
        clf.fit(&train()).unwrap();
        assert_eq!(clf.predict(&queries()).unwrap(), vec!["low", "low"]);
    }

    #[test]
    fn test_majority_class_tie_breaks_by_label() {
        let data = Dataset::from_instances(
            "tie",
            vec![Instance::new(vec![0.0], "b"), Instance::new(vec![0.0], "a")],
        );
        let mut clf = MajorityClass::default();
        clf.fit(&data).unwrap();
        assert_eq!(clf.predict(&data).unwrap(), vec!["a", "a"]);
    }

    #[test]
    fn test_majority_class_empty_train() {
        let mut clf = MajorityClass::default();
        let err = clf.fit(&Dataset::from_instances("e", Vec::new())).unwrap_err();
        assert!(matches!(err, AlgorithmError::Unsupported(_)));
    }

    #[test]
    fn test_nearest_neighbor() {
        let mut clf = NearestNeighbor::default();
        clf.fit(&train()).unwrap();
        assert_eq!(clf.predict(&queries()).unwrap(), vec!["low", "high"]);
    }

    #[test]
    fn test_nearest_neighbor_width_mismatch() {
        let mut clf = NearestNeighbor::default();
        clf.fit(&train()).unwrap();
        let wide = Dataset::from_instances("wide", vec![Instance::new(vec![0.0; 3], "low")]);
        assert!(matches!(
            clf.predict(&wide),
            Err(AlgorithmError::Unsupported(_))
        ));
    }

    #[test]
    fn test_nearest_centroid() {
        let mut clf = NearestCentroid::default();
        assert_eq!(clf.predict(&queries()), Err(AlgorithmError::NotFitted));
        clf.fit(&train()).unwrap();
        assert_eq!(clf.predict(&queries()).unwrap(), vec!["low", "high"]);
    }
}
