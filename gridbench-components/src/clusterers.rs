//! Reference clusterers.

use crate::squared_distance;
use gridbench_core::{AlgorithmError, Clusterer, Dataset};

/// Lloyd's k-means with deterministic farthest-point seeding.
///
/// When `k` is unset, the number of distinct training labels is used.
#[derive(Debug, Clone)]
pub struct KMeans {
    k: Option<usize>,
    max_iterations: usize,
    centroids: Vec<Vec<f64>>,
}

impl Default for KMeans {
    fn default() -> Self {
        Self {
            k: None,
            max_iterations: 100,
            centroids: Vec::new(),
        }
    }
}

impl KMeans {
    pub fn new(k: usize) -> Self {
        Self {
            k: Some(k),
            ..Self::default()
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn centroids(&self) -> &[Vec<f64>] {
        &self.centroids
    }

    fn nearest(centroids: &[Vec<f64>], point: &[f64]) -> usize {
        centroids
            .iter()
            .enumerate()
            .map(|(i, c)| (i, squared_distance(point, c)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map_or(0, |(i, _)| i)
    }

    /// First centroid is the first instance; each further one is the
    /// instance farthest from all chosen so far.
    fn seed(points: &[&[f64]], k: usize) -> Vec<Vec<f64>> {
        let mut centroids: Vec<Vec<f64>> = vec![points[0].to_vec()];
        while centroids.len() < k {
            let farthest = points
                .iter()
                .map(|p| {
                    centroids
                        .iter()
                        .map(|c| squared_distance(p, c))
                        .fold(f64::INFINITY, f64::min)
                })
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(&b.1))
                .map_or(0, |(i, _)| i);
            centroids.push(points[farthest].to_vec());
        }
        centroids
    }
}

impl Clusterer for KMeans {
    fn fit(&mut self, train: &Dataset) -> Result<(), AlgorithmError> {
        let k = self.k.unwrap_or_else(|| train.class_labels().len());
        if k == 0 {
            return Err(AlgorithmError::unsupported("k must be at least 1"));
        }
        if train.len() < k {
            return Err(AlgorithmError::ill_conditioned(format!(
                "{} instances cannot form {k} clusters",
                train.len()
            )));
        }

        let width = train.num_features();
        let points: Vec<&[f64]> = train.instances.iter().map(|i| i.features.as_slice()).collect();
        let mut centroids = Self::seed(&points, k);
        let mut assignment: Vec<usize> = vec![usize::MAX; points.len()];

        for iteration in 0..self.max_iterations {
            let next: Vec<usize> = points.iter().map(|p| Self::nearest(&centroids, p)).collect();
            if next == assignment {
                tracing::trace!(iteration, "k-means converged");
                break;
            }
            assignment = next;

            let mut sums = vec![(vec![0.0; width], 0usize); k];
            for (point, &cluster) in points.iter().zip(&assignment) {
                let (sum, n) = &mut sums[cluster];
                for (acc, x) in sum.iter_mut().zip(point.iter()) {
                    *acc += x;
                }
                *n += 1;
            }
            for (centroid, (sum, n)) in centroids.iter_mut().zip(sums) {
                // An emptied cluster keeps its previous centroid.
                if n > 0 {
                    *centroid = sum.into_iter().map(|s| s / n as f64).collect();
                }
            }
        }

        self.centroids = centroids;
        Ok(())
    }

    fn assign(&self, data: &Dataset) -> Result<Vec<usize>, AlgorithmError> {
        let width = self
            .centroids
            .first()
            .map(Vec::len)
            .ok_or(AlgorithmError::NotFitted)?;
        if data.num_features() != width {
            return Err(AlgorithmError::unsupported(format!(
                "{} has {} features, model was fitted on {width}",
                data.name,
                data.num_features()
            )));
        }
        Ok(data
            .instances
            .iter()
            .map(|i| Self::nearest(&self.centroids, &i.features))
            .collect())
    }
}
