use std::ops::Add;

use serde::Serialize;

/// Counts plus the derived precision/recall/F1, either for the whole run or
/// for a single normalised type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ConfusionMatrix {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl ConfusionMatrix {
    pub fn precision(&self) -> f64 {
        let total = self.true_positives + self.false_positives;
        if total == 0 {
            0.0
        } else {
            self.true_positives as f64 / total as f64
        }
    }

    pub fn recall(&self) -> f64 {
        let total = self.true_positives + self.false_negatives;
        if total == 0 {
            0.0
        } else {
            self.true_positives as f64 / total as f64
        }
    }

    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }
}

impl Add for ConfusionMatrix {
    type Output = ConfusionMatrix;

    fn add(self, other: ConfusionMatrix) -> ConfusionMatrix {
        ConfusionMatrix {
            true_positives: self.true_positives + other.true_positives,
            false_positives: self.false_positives + other.false_positives,
            false_negatives: self.false_negatives + other.false_negatives,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_precision_recall_f1() {
        let cm = ConfusionMatrix {
            true_positives: 8,
            false_positives: 2,
            false_negatives: 2,
        };
        assert!((cm.precision() - 0.8).abs() < 1e-9);
        assert!((cm.recall() - 0.8).abs() < 1e-9);
        assert!((cm.f1() - 0.8).abs() < 1e-9);
    }

    #[test]
    fn empty_matrix_reports_zero_not_nan() {
        let cm = ConfusionMatrix::default();
        assert_eq!(cm.precision(), 0.0);
        assert_eq!(cm.recall(), 0.0);
        assert_eq!(cm.f1(), 0.0);
    }

    #[test]
    fn addition_sums_component_wise() {
        let a = ConfusionMatrix {
            true_positives: 1,
            false_positives: 2,
            false_negatives: 3,
        };
        let b = ConfusionMatrix {
            true_positives: 4,
            false_positives: 5,
            false_negatives: 6,
        };
        let sum = a + b;
        assert_eq!(sum.true_positives, 5);
        assert_eq!(sum.false_positives, 7);
        assert_eq!(sum.false_negatives, 9);
    }
}
