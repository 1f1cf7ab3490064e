// src/model/preprocess.rs
use crate::data::matrix::FeatureMatrix;
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Per-feature scaling learned at fit time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scaling {
    Standard { mean: f64, scale: f64 },
    MinMax { min: f64, range: f64 },
    Passthrough,
}

impl Scaling {
    fn apply(&self, x: f64) -> f64 {
        match self {
            Scaling::Standard { mean, scale } => (x - mean) / scale,
            Scaling::MinMax { min, range } => (x - min) / range,
            Scaling::Passthrough => x,
        }
    }
}

/// Fitted preprocessing stage: knows the feature layout it was fit on and
/// scales each feature independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    feature_names: Vec<String>,
    scalings: Vec<Scaling>,
}

impl Preprocessor {
    pub fn from_parts(feature_names: Vec<String>, scalings: Vec<Scaling>) -> Result<Self> {
        if feature_names.len() != scalings.len() {
            return Err(PipelineError::Inference {
                expected: feature_names.len(),
                found: scalings.len(),
            });
        }
        Ok(Self {
            feature_names,
            scalings,
        })
    }

    /// Identity transform over the given layout.
    pub fn passthrough(feature_names: Vec<String>) -> Self {
        let scalings = vec![Scaling::Passthrough; feature_names.len()];
        Self {
            feature_names,
            scalings,
        }
    }

    /// Learn standard scaling for `standard` columns and min-max scaling for
    /// `minmax` columns; every other feature passes through. Missing values
    /// are ignored while fitting.
    pub fn fit(x: &FeatureMatrix, standard: &[String], minmax: &[String]) -> Self {
        for name in standard.iter().chain(minmax) {
            if !x.columns().contains(name) {
                warn!("Scaling configured for {} but the feature is not present", name);
            }
        }

        let scalings = x
            .columns()
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let values: Vec<f64> = x.feature(idx).filter(|v| !v.is_nan()).collect();
                if standard.contains(name) {
                    fit_standard(&values)
                } else if minmax.contains(name) {
                    fit_minmax(&values)
                } else {
                    Scaling::Passthrough
                }
            })
            .collect();

        Self {
            feature_names: x.columns().to_vec(),
            scalings,
        }
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn scalings(&self) -> &[Scaling] {
        &self.scalings
    }

    /// Scale a matrix laid out exactly like the fitted one.
    pub fn transform(&self, x: &FeatureMatrix) -> Result<Vec<Vec<f64>>> {
        if x.n_features() != self.feature_names.len() {
            return Err(PipelineError::Inference {
                expected: self.feature_names.len(),
                found: x.n_features(),
            });
        }
        if let Some((got, want)) = x
            .columns()
            .iter()
            .zip(&self.feature_names)
            .find(|(got, want)| got != want)
        {
            return Err(PipelineError::schema(
                got,
                format!("found where the preprocessor expects {}", want),
            ));
        }

        Ok(x
            .rows()
            .iter()
            .map(|row| row.iter().zip(&self.scalings).map(|(v, s)| s.apply(*v)).collect())
            .collect())
    }
}

fn fit_standard(values: &[f64]) -> Scaling {
    if values.is_empty() {
        return Scaling::Standard { mean: 0.0, scale: 1.0 };
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let scale = if var > 0.0 { var.sqrt() } else { 1.0 };
    Scaling::Standard { mean, scale }
}

fn fit_minmax(values: &[f64]) -> Scaling {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        return Scaling::MinMax { min: 0.0, range: 1.0 };
    }
    let range = if max > min { max - min } else { 1.0 };
    Scaling::MinMax { min, range }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix() -> FeatureMatrix {
        FeatureMatrix::new(
            vec!["Age".into(), "Premium".into(), "Flag".into()],
            vec![vec![20.0, 100.0, 1.0], vec![40.0, 300.0, 0.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_fit_and_transform() {
        let pre = Preprocessor::fit(&matrix(), &["Age".into()], &["Premium".into()]);
        assert_eq!(pre.scalings()[0], Scaling::Standard { mean: 30.0, scale: 10.0 });
        assert_eq!(pre.scalings()[1], Scaling::MinMax { min: 100.0, range: 200.0 });
        assert_eq!(pre.scalings()[2], Scaling::Passthrough);

        let out = pre.transform(&matrix()).unwrap();
        assert_eq!(out, vec![vec![-1.0, 0.0, 1.0], vec![1.0, 1.0, 0.0]]);
    }

    #[test]
    fn test_constant_feature_does_not_divide_by_zero() {
        let x = FeatureMatrix::new(vec!["c".into()], vec![vec![5.0], vec![5.0]]).unwrap();
        let pre = Preprocessor::fit(&x, &["c".into()], &[]);
        assert_eq!(pre.transform(&x).unwrap(), vec![vec![0.0], vec![0.0]]);
    }

    #[test]
    fn test_transform_rejects_wrong_shape() {
        let pre = Preprocessor::fit(&matrix(), &[], &[]);
        let narrow = FeatureMatrix::new(vec!["Age".into()], vec![vec![1.0]]).unwrap();
        assert!(matches!(
            pre.transform(&narrow),
            Err(PipelineError::Inference { expected: 3, found: 1 })
        ));

        let shuffled = FeatureMatrix::new(
            vec!["Premium".into(), "Age".into(), "Flag".into()],
            vec![vec![1.0, 2.0, 3.0]],
        )
        .unwrap();
        assert!(matches!(pre.transform(&shuffled), Err(PipelineError::SchemaMismatch { .. })));
    }
}
