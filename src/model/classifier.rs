// src/model/classifier.rs
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Hyperparameters for [`LogisticRegression::fit`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogisticRegressionParams {
    pub learning_rate: f64,
    pub epochs: usize,
    /// L2 penalty on the weights (not the bias).
    pub l2: f64,
    /// Reweight samples so both classes contribute equally.
    pub balanced: bool,
}

impl Default for LogisticRegressionParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            epochs: 500,
            l2: 1e-4,
            balanced: true,
        }
    }
}

/// Fitted binary classifier scoring already-preprocessed rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    weights: Vec<f64>,
    bias: f64,
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl LogisticRegression {
    pub fn from_parameters(weights: Vec<f64>, bias: f64) -> Self {
        Self { weights, bias }
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Full-batch gradient descent from a zero start, so fitting is
    /// deterministic for a given input.
    pub fn fit(x: &[Vec<f64>], y: &[u8], params: &LogisticRegressionParams) -> Result<Self> {
        if x.is_empty() {
            return Err(PipelineError::Training("training set is empty".to_string()));
        }
        if x.len() != y.len() {
            return Err(PipelineError::Inference {
                expected: x.len(),
                found: y.len(),
            });
        }

        let positives = y.iter().filter(|&&l| l == 1).count();
        let negatives = y.len() - positives;
        if positives == 0 || negatives == 0 {
            return Err(PipelineError::Training(
                "training labels contain a single class".to_string(),
            ));
        }

        let n = y.len() as f64;
        let (w_pos, w_neg) = if params.balanced {
            (n / (2.0 * positives as f64), n / (2.0 * negatives as f64))
        } else {
            (1.0, 1.0)
        };

        let width = x[0].len();
        let mut model = Self {
            weights: vec![0.0; width],
            bias: 0.0,
        };

        for epoch in 0..params.epochs {
            let mut grad_w = vec![0.0; width];
            let mut grad_b = 0.0;

            for (row, &label) in x.iter().zip(y) {
                if row.len() != width {
                    return Err(PipelineError::Inference {
                        expected: width,
                        found: row.len(),
                    });
                }
                let sample_weight = if label == 1 { w_pos } else { w_neg };
                let err = (sigmoid(model.decision(row)) - f64::from(label)) * sample_weight;
                for (g, v) in grad_w.iter_mut().zip(row) {
                    // missing features contribute nothing
                    if !v.is_nan() {
                        *g += err * v;
                    }
                }
                grad_b += err;
            }

            for (w, g) in model.weights.iter_mut().zip(&grad_w) {
                *w -= params.learning_rate * (g / n + params.l2 * *w);
            }
            model.bias -= params.learning_rate * grad_b / n;

            if epoch % 100 == 0 {
                debug!("epoch {}: bias {:.4}", epoch, model.bias);
            }
        }

        Ok(model)
    }

    fn decision(&self, row: &[f64]) -> f64 {
        self.weights
            .iter()
            .zip(row)
            .filter(|(_, v)| !v.is_nan())
            .map(|(w, v)| w * v)
            .sum::<f64>()
            + self.bias
    }

    /// Positive-class probability per row.
    pub fn predict_proba(&self, x: &[Vec<f64>]) -> Result<Vec<f64>> {
        x.iter()
            .map(|row| {
                if row.len() != self.weights.len() {
                    return Err(PipelineError::Inference {
                        expected: self.weights.len(),
                        found: row.len(),
                    });
                }
                Ok(sigmoid(self.decision(row)))
            })
            .collect()
    }

    /// Hard 0/1 labels, positive when the probability reaches one half.
    pub fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<u8>> {
        Ok(self
            .predict_proba(x)?
            .into_iter()
            .map(|p| u8::from(p >= 0.5))
            .collect())
    }
}
