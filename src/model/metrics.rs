// src/model/metrics.rs
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};

/// Positive-class scores of a set of predictions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub f1_score: f64,
    pub precision_score: f64,
    pub recall_score: f64,
}

impl ClassificationMetrics {
    /// Undefined ratios (no predicted or no actual positives) count as zero.
    pub fn compute(y_true: &[u8], y_pred: &[u8]) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(PipelineError::Inference {
                expected: y_true.len(),
                found: y_pred.len(),
            });
        }

        let mut tp = 0usize;
        let mut fp = 0usize;
        let mut fn_ = 0usize;
        for (&t, &p) in y_true.iter().zip(y_pred) {
            match (t, p) {
                (1, 1) => tp += 1,
                (0, 1) => fp += 1,
                (1, 0) => fn_ += 1,
                _ => {}
            }
        }

        let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1 = ratio(2 * tp, 2 * tp + fp + fn_);

        Ok(Self {
            f1_score: f1,
            precision_score: precision,
            recall_score: recall,
        })
    }
}

/// Harmonic mean of precision and recall on the positive class.
pub fn f1_score(y_true: &[u8], y_pred: &[u8]) -> Result<f64> {
    ClassificationMetrics::compute(y_true, y_pred).map(|m| m.f1_score)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_f1_matches_hand_computation() {
        // tp = 2, fp = 1, fn = 1
        let y_true = [1, 1, 1, 0, 0];
        let y_pred = [1, 1, 0, 1, 0];
        let m = ClassificationMetrics::compute(&y_true, &y_pred).unwrap();
        assert!((m.precision_score - 2.0 / 3.0).abs() < 1e-12);
        assert!((m.recall_score - 2.0 / 3.0).abs() < 1e-12);
        assert!((m.f1_score - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_f1_zero_when_no_positives_predicted() {
        assert_eq!(f1_score(&[1, 0, 1], &[0, 0, 0]).unwrap(), 0.0);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(matches!(f1_score(&[1, 0], &[1]), Err(PipelineError::Inference { .. })));
    }
}
