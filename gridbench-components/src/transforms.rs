//! Reference series transforms. Both are stateless and treat each instance's
//! feature vector as one series.

use gridbench_core::{AlgorithmError, Dataset, Instance, Transform};

/// Rescales each series to zero mean and unit variance. Constant series map
/// to all zeros.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZNormalise;

impl Transform for ZNormalise {
    fn transform(&self, data: &Dataset) -> Result<Dataset, AlgorithmError> {
        let instances = data
            .instances
            .iter()
            .map(|instance| {
                let x = &instance.features;
                if x.is_empty() {
                    return instance.clone();
                }
                let n = x.len() as f64;
                let mean = x.iter().sum::<f64>() / n;
                let std = (x.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
                let features = if std > f64::EPSILON {
                    x.iter().map(|v| (v - mean) / std).collect()
                } else {
                    vec![0.0; x.len()]
                };
                Instance::new(features, instance.label.clone())
            })
            .collect();
        Ok(Dataset::new(
            data.name.clone(),
            data.attributes.clone(),
            instances,
        ))
    }
}

/// Replaces each series by its first differences, shortening it by one.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstDerivative;

impl Transform for FirstDerivative {
    fn transform(&self, data: &Dataset) -> Result<Dataset, AlgorithmError> {
        let width = data.num_features();
        if width < 2 {
            return Err(AlgorithmError::unsupported(format!(
                "{}: derivative needs at least 2 features, got {width}",
                data.name
            )));
        }
        let instances = data
            .instances
            .iter()
            .map(|instance| {
                let features = instance.features.windows(2).map(|w| w[1] - w[0]).collect();
                Instance::new(features, instance.label.clone())
            })
            .collect();
        let attributes = (0..width - 1).map(|i| format!("der{i}")).collect();
        Ok(Dataset::new(data.name.clone(), attributes, instances))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn series(values: &[Vec<f64>]) -> Dataset {
        Dataset::from_instances(
            "s",
            values
                .iter()
                .map(|v| Instance::new(v.clone(), "c"))
                .collect(),
        )
    }

    #[test]
    fn test_z_normalise() {
        let out = ZNormalise
            .transform(&series(&[vec![1.0, 2.0, 3.0], vec![4.0, 4.0, 4.0]]))
            .unwrap();
        let z = &out.instances[0].features;
        assert!(z.iter().sum::<f64>().abs() < 1e-12);
        assert!((z[2] - 1.224_744_871_391_589).abs() < 1e-9);
        assert_eq!(out.instances[1].features, vec![0.0, 0.0, 0.0]);
        assert_eq!(out.num_features(), 3);
    }

    #[test]
    fn test_first_derivative() {
        let out = FirstDerivative
            .transform(&series(&[vec![1.0, 4.0, 2.0]]))
            .unwrap();
        assert_eq!(out.instances[0].features, vec![3.0, -2.0]);
        assert_eq!(out.attributes, vec!["der0", "der1"]);
        assert_eq!(out.instances[0].label, "c");
    }

    #[test]
    fn test_first_derivative_too_short() {
        let err = FirstDerivative.transform(&series(&[vec![1.0]])).unwrap_err();
        assert!(matches!(err, AlgorithmError::Unsupported(_)));
    }
}
