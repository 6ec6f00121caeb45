//! Evaluation metrics for batch cells.

use serde::{Deserialize, Serialize};

/// Fraction of predictions equal to the true labels.
///
/// Returns `None` when the lengths differ or there is nothing to score.
pub fn accuracy<P, T>(predicted: &[P], truth: &[T]) -> Option<f64>
where
    P: AsRef<str>,
    T: AsRef<str>,
{
    if predicted.len() != truth.len() || truth.is_empty() {
        return None;
    }
    let correct = predicted
        .iter()
        .zip(truth)
        .filter(|(p, t)| p.as_ref() == t.as_ref())
        .count();
    Some(correct as f64 / truth.len() as f64)
}

/// Rand index between a cluster assignment and reference labels: the fraction
/// of instance pairs on which both agree (same group vs. different group).
///
/// Returns `None` when the lengths differ. A single instance scores 1.0.
pub fn rand_index<T: AsRef<str>>(assignment: &[usize], labels: &[T]) -> Option<f64> {
    let n = labels.len();
    if assignment.len() != n || n == 0 {
        return None;
    }
    if n == 1 {
        return Some(1.0);
    }
    let mut agree = 0usize;
    for i in 0..n {
        for j in (i + 1)..n {
            let same_cluster = assignment[i] == assignment[j];
            let same_label = labels[i].as_ref() == labels[j].as_ref();
            if same_cluster == same_label {
                agree += 1;
            }
        }
    }
    let pairs = n * (n - 1) / 2;
    Some(agree as f64 / pairs as f64)
}

/// Summary of one algorithm's metric across the problems of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub algorithm: String,
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl MetricSummary {
    /// Summarize a non-empty set of scores.
    pub fn from_scores(algorithm: &str, scores: &[f64]) -> Option<Self> {
        if scores.is_empty() {
            return None;
        }
        let count = scores.len();
        let mean = scores.iter().sum::<f64>() / count as f64;
        let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / count as f64;
        Some(Self {
            algorithm: algorithm.to_string(),
            count,
            mean,
            std_dev: variance.sqrt(),
            min: scores.iter().copied().fold(f64::INFINITY, f64::min),
            max: scores.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        })
    }
}
