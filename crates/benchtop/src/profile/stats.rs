//! Descriptive statistics for numeric columns.

use serde::{Deserialize, Serialize};

/// Describe-style statistics for a numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    /// Number of non-missing values.
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator).
    pub std: f64,
    pub min: f64,
    /// First quartile (25th percentile).
    pub q1: f64,
    pub median: f64,
    /// Third quartile (75th percentile).
    pub q3: f64,
    pub max: f64,
}

impl NumericSummary {
    /// Summarize a set of values. Returns `None` when there are none.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        Some(Self {
            count: values.len(),
            mean: mean(values),
            std: sample_std(values),
            min: sorted[0],
            q1: quantile_sorted(&sorted, 0.25),
            median: quantile_sorted(&sorted, 0.5),
            q3: quantile_sorted(&sorted, 0.75),
            max: sorted[sorted.len() - 1],
        })
    }

    /// Calculate the interquartile range.
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }

    /// Lower and upper IQR fences for the given multiplier.
    pub fn fences(&self, multiplier: f64) -> (f64, f64) {
        let iqr = self.iqr();
        (self.q1 - multiplier * iqr, self.q3 + multiplier * iqr)
    }

    /// Check if a value is an outlier using the IQR method.
    pub fn is_outlier_iqr(&self, value: f64, multiplier: f64) -> bool {
        let (lower, upper) = self.fences(multiplier);
        value < lower || value > upper
    }

    /// Calculate the z-score for a value.
    pub fn z_score(&self, value: f64) -> f64 {
        if self.std == 0.0 {
            0.0
        } else {
            (value - self.mean) / self.std
        }
    }
}

/// Arithmetic mean (0.0 for no values).
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Sample standard deviation (0.0 for fewer than two values).
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

/// Population standard deviation (0.0 for no values).
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / values.len() as f64).sqrt()
}

/// Quantile with linear interpolation between order statistics.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    Some(quantile_sorted(&sorted, q))
}

/// Median of the values.
pub fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

/// Pearson correlation over the rows where both values are present.
///
/// Returns `None` with fewer than two complete pairs or when either side is
/// constant over those pairs.
pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, b)| b).sum::<f64>() / n;
    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (a, b) in &pairs {
        let (dx, dy) = (a - mean_x, b - mean_y);
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    let r = cov / (var_x * var_y).sqrt();
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    // Exact positions skip interpolation, which would turn inf - inf into NaN
    if lo == hi {
        return sorted[lo];
    }
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantiles_interpolate() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&values, 0.25), Some(1.75));
        assert_eq!(quantile(&values, 0.5), Some(2.5));
        assert_eq!(quantile(&values, 0.75), Some(3.25));
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn test_summary() {
        let summary = NumericSummary::from_values(&[4.0, 1.0, 3.0, 2.0, 100.0]).unwrap();
        assert_eq!(summary.count, 5);
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.max, 100.0);
        assert_eq!(summary.median, 3.0);
        assert_eq!(summary.q1, 2.0);
        assert_eq!(summary.q3, 4.0);
        assert!(summary.is_outlier_iqr(100.0, 1.5));
        assert!(!summary.is_outlier_iqr(4.0, 1.5));
        assert_eq!(summary.fences(1.5), (-1.0, 7.0));
    }

    #[test]
    fn test_std() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((population_std(&values) - 2.0).abs() < 1e-12);
        assert!((sample_std(&values) - 2.138_089_935).abs() < 1e-6);
        assert_eq!(sample_std(&[1.0]), 0.0);
    }

    #[test]
    fn test_pearson() {
        let x = [Some(1.0), Some(2.0), Some(3.0), Some(4.0)];
        let y = [Some(2.0), Some(4.0), Some(6.0), Some(8.0)];
        assert!((pearson(&x, &y).unwrap() - 1.0).abs() < 1e-12);

        // Pairs: (1, 1), (2, 3), (3, 2); r = 0.5
        let x = [Some(1.0), Some(2.0), Some(3.0), None];
        let y = [Some(1.0), Some(3.0), Some(2.0), Some(9.0)];
        assert!((pearson(&x, &y).unwrap() - 0.5).abs() < 1e-12);

        let constant = [Some(5.0), Some(5.0), Some(5.0), Some(5.0)];
        assert_eq!(pearson(&x, &constant), None);
        assert_eq!(pearson(&[Some(1.0), None], &[Some(1.0), Some(2.0)]), None);
    }

    #[test]
    fn test_quantiles_with_infinities() {
        let values = [1.0, 2.0, f64::INFINITY, f64::INFINITY, f64::INFINITY];
        assert_eq!(quantile(&values, 0.25), Some(2.0));
        assert_eq!(quantile(&values, 0.75), Some(f64::INFINITY));
        assert_eq!(median(&[f64::INFINITY; 3]), Some(f64::INFINITY));
    }
}
