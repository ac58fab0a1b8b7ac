use hrp_registry::Label;
use serde::{Deserialize, Serialize};

use crate::error::EvaluationError;

/// Binary confusion counts with `Positive` as the scored class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionCounts {
    pub tp: u64,
    pub fp: u64,
    pub tn: u64,
    pub fn_: u64,
}

impl ConfusionCounts {
    pub fn from_labels(truth: &[Label], predicted: &[Label]) -> Result<Self, EvaluationError> {
        if truth.len() != predicted.len() {
            return Err(EvaluationError::LengthMismatch {
                truth: truth.len(),
                predicted: predicted.len(),
            });
        }
        let mut c = ConfusionCounts::default();
        for (t, p) in truth.iter().zip(predicted) {
            match (t.is_positive(), p.is_positive()) {
                (true, true) => c.tp += 1,
                (false, true) => c.fp += 1,
                (false, false) => c.tn += 1,
                (true, false) => c.fn_ += 1,
            }
        }
        Ok(c)
    }

    // Zero denominators score 0.0 throughout.

    pub fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }

    /// `2tp / (2tp + fp + fn)`, equal to the harmonic mean of precision and
    /// recall without the intermediate rounding.
    pub fn f1(&self) -> f64 {
        ratio(2 * self.tp, 2 * self.tp + self.fp + self.fn_)
    }
}

fn ratio(num: u64, den: u64) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

pub fn f1_score(truth: &[Label], predicted: &[Label]) -> Result<f64, EvaluationError> {
    Ok(ConfusionCounts::from_labels(truth, predicted)?.f1())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hrp_registry::Label::{Negative as N, Positive as P};

    #[test]
    fn all_positive_predictor_on_three_of_five() {
        let truth = [P, P, P, N, N];
        let pred = [P; 5];
        let c = ConfusionCounts::from_labels(&truth, &pred).unwrap();
        assert_eq!(c, ConfusionCounts { tp: 3, fp: 2, tn: 0, fn_: 0 });
        assert_eq!(c.precision(), 0.6);
        assert_eq!(c.recall(), 1.0);
        assert_eq!(c.f1(), 0.75);
    }

    #[test]
    fn zero_division_scores_zero() {
        assert_eq!(f1_score(&[N, N], &[N, N]).unwrap(), 0.0);
        assert_eq!(f1_score(&[], &[]).unwrap(), 0.0);
        let c = ConfusionCounts::from_labels(&[N], &[N]).unwrap();
        assert_eq!(c.precision(), 0.0);
        assert_eq!(c.recall(), 0.0);
    }

    #[test]
    fn perfect_and_inverted() {
        assert_eq!(f1_score(&[P, N, P], &[P, N, P]).unwrap(), 1.0);
        assert_eq!(f1_score(&[P, N], &[N, P]).unwrap(), 0.0);
    }

    #[test]
    fn length_mismatch_is_error() {
        let err = f1_score(&[P], &[P, N]).unwrap_err();
        assert!(matches!(
            err,
            EvaluationError::LengthMismatch { truth: 1, predicted: 2 }
        ));
    }
}
