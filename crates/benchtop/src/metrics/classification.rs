//! Classification metrics.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::{BenchtopError, Result};

/// Reject empty or unequal-length inputs.
pub(crate) fn check_lengths(true_len: usize, pred_len: usize) -> Result<()> {
    if true_len != pred_len {
        return Err(BenchtopError::length_mismatch(true_len, pred_len));
    }
    if true_len == 0 {
        return Err(BenchtopError::EmptyInput(
            "Metrics need at least one prediction".to_string(),
        ));
    }
    Ok(())
}

/// Fraction of predictions equal to the true value.
pub fn accuracy<T: PartialEq>(y_true: &[T], y_pred: &[T]) -> Result<f64> {
    check_lengths(y_true.len(), y_pred.len())?;
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    Ok(correct as f64 / y_true.len() as f64)
}

/// Per-class F1 averaged with weights equal to each class's support.
///
/// A class whose precision and recall are both zero, or that is never
/// predicted, contributes an F1 of zero.
pub fn f1_weighted<T: PartialOrd + Clone>(y_true: &[T], y_pred: &[T]) -> Result<f64> {
    let matrix = confusion_matrix(y_true, y_pred)?;
    Ok(matrix.f1_weighted())
}

/// Counts of (true, predicted) pairs.
///
/// Row `i` is the true label `labels[i]`, column `j` the predicted label
/// `labels[j]`. Labels are every value seen in either input, sorted
/// ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfusionMatrix<T> {
    pub labels: Vec<T>,
    pub counts: Vec<Vec<usize>>,
}

impl<T: PartialEq> ConfusionMatrix<T> {
    /// Build a matrix over an explicit label order.
    pub fn with_labels(y_true: &[T], y_pred: &[T], labels: Vec<T>) -> Result<Self> {
        check_lengths(y_true.len(), y_pred.len())?;
        let mut counts = vec![vec![0usize; labels.len()]; labels.len()];
        for (t, p) in y_true.iter().zip(y_pred) {
            let row = labels.iter().position(|l| l == t);
            let col = labels.iter().position(|l| l == p);
            match (row, col) {
                (Some(row), Some(col)) => counts[row][col] += 1,
                _ => {
                    return Err(BenchtopError::ShapeMismatch {
                        expected: format!("labels from a set of {}", labels.len()),
                        actual: "a label outside that set".to_string(),
                    });
                }
            }
        }
        Ok(Self { labels, counts })
    }

    /// Number of samples counted.
    pub fn total(&self) -> usize {
        self.counts.iter().map(|row| row.iter().sum::<usize>()).sum()
    }

    /// Samples whose true label is `labels[i]`.
    pub fn support(&self, i: usize) -> usize {
        self.counts.get(i).map(|row| row.iter().sum()).unwrap_or(0)
    }

    fn predicted(&self, j: usize) -> usize {
        self.counts.iter().map(|row| row[j]).sum()
    }

    /// F1 score of `labels[i]`, zero when undefined.
    pub fn f1(&self, i: usize) -> f64 {
        let tp = self.counts[i][i] as f64;
        let predicted = self.predicted(i) as f64;
        let support = self.support(i) as f64;
        let precision = if predicted > 0.0 { tp / predicted } else { 0.0 };
        let recall = if support > 0.0 { tp / support } else { 0.0 };
        if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        }
    }

    /// Support-weighted mean F1.
    pub fn f1_weighted(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (0..self.labels.len())
            .map(|i| self.f1(i) * self.support(i) as f64)
            .sum::<f64>()
            / total as f64
    }
}

/// Confusion matrix with labels sorted ascending.
pub fn confusion_matrix<T: PartialOrd + Clone>(
    y_true: &[T],
    y_pred: &[T],
) -> Result<ConfusionMatrix<T>> {
    check_lengths(y_true.len(), y_pred.len())?;
    let mut labels: Vec<T> = Vec::new();
    for value in y_true.iter().chain(y_pred) {
        if !labels.contains(value) {
            labels.push(value.clone());
        }
    }
    labels.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    ConfusionMatrix::with_labels(y_true, y_pred, labels)
}

/// Held-out classification scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub f1_weighted: f64,
    pub confusion_matrix: ConfusionMatrix<String>,
}

impl ClassificationMetrics {
    /// Score text labels. The matrix orders labels numerically when every
    /// label is a number, lexicographically otherwise.
    pub fn compute(y_true: &[String], y_pred: &[String]) -> Result<Self> {
        Self::with_classes(y_true, y_pred, &[])
    }

    /// Score text labels, keeping every known class in the matrix even if
    /// the held-out rows never mention it.
    pub fn with_classes(y_true: &[String], y_pred: &[String], classes: &[String]) -> Result<Self> {
        check_lengths(y_true.len(), y_pred.len())?;
        let mut labels: Vec<String> = Vec::new();
        for value in classes.iter().chain(y_true).chain(y_pred) {
            if !labels.contains(value) {
                labels.push(value.clone());
            }
        }
        crate::model::sort_labels(&mut labels);
        let matrix = ConfusionMatrix::with_labels(y_true, y_pred, labels)?;
        Ok(Self {
            accuracy: accuracy(y_true, y_pred)?,
            f1_weighted: matrix.f1_weighted(),
            confusion_matrix: matrix,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy() {
        let acc = accuracy(&[1, 0, 1, 1], &[1, 0, 0, 1]).unwrap();
        assert!((acc - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_length_errors() {
        assert!(matches!(
            accuracy(&[1, 0], &[1]),
            Err(BenchtopError::ShapeMismatch { .. })
        ));
        let empty: [i32; 0] = [];
        assert!(matches!(
            accuracy(&empty, &empty),
            Err(BenchtopError::EmptyInput(_))
        ));
    }

    #[test]
    fn test_confusion_matrix_ordering() {
        let y_true = ["b", "a", "c", "a"];
        let y_pred = ["b", "c", "c", "a"];
        let m = confusion_matrix(&y_true, &y_pred).unwrap();
        assert_eq!(m.labels, vec!["a", "b", "c"]);
        assert_eq!(m.counts, vec![vec![1, 0, 1], vec![0, 1, 0], vec![0, 0, 1]]);
        assert_eq!(m, confusion_matrix(&y_true, &y_pred).unwrap());
    }

    #[test]
    fn test_f1_weighted() {
        // class 0: p=1, r=0.5, f1=2/3, support 2
        // class 1: p=2/3, r=1, f1=0.8, support 2
        let f1 = f1_weighted(&[0, 0, 1, 1], &[0, 1, 1, 1]).unwrap();
        let expected = (2.0 / 3.0 + 0.8) / 2.0;
        assert!((f1 - expected).abs() < 1e-12);
    }

    #[test]
    fn test_f1_zero_division() {
        // "b" is never predicted; its F1 counts as zero.
        let f1 = f1_weighted(&["a", "b"], &["a", "a"]).unwrap();
        // a: p=0.5, r=1, f1=2/3, support 1
        assert!((f1 - (2.0 / 3.0) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_numeric_text_labels_sort_numerically() {
        let y_true: Vec<String> = ["10", "2", "1"].iter().map(|s| s.to_string()).collect();
        let metrics = ClassificationMetrics::compute(&y_true, &y_true).unwrap();
        assert_eq!(metrics.confusion_matrix.labels, vec!["1", "2", "10"]);
        assert_eq!(metrics.accuracy, 1.0);
        assert_eq!(metrics.f1_weighted, 1.0);
    }

    #[test]
    fn test_known_classes_stay_in_matrix() {
        let y: Vec<String> = vec!["a".to_string(), "a".to_string()];
        let classes: Vec<String> = vec!["a".to_string(), "b".to_string()];
        let metrics = ClassificationMetrics::with_classes(&y, &y, &classes).unwrap();
        assert_eq!(metrics.confusion_matrix.labels, vec!["a", "b"]);
        assert_eq!(metrics.confusion_matrix.counts, vec![vec![2, 0], vec![0, 0]]);
        assert_eq!(metrics.f1_weighted, 1.0);
    }
}
