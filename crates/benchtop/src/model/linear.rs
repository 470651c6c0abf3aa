//! Linear models: ordinary least squares and multinomial logistic regression.

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BenchtopError, Result};

/// Cholesky factor of a symmetric matrix, or `None` if a pivot is not
/// comfortably positive relative to the diagonal scale.
fn cholesky(a: &Array2<f64>) -> Option<Array2<f64>> {
    let n = a.nrows();
    let scale = a.diag().iter().fold(0.0f64, |m, v| m.max(v.abs()));
    let tol = scale * 1e-12;
    let mut l = Array2::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }
            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= tol {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }
    Some(l)
}

fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let l = cholesky(a)?;
    let n = b.len();

    // Forward substitution: L * y = b
    let mut y = Array1::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * y[j];
        }
        y[i] = (b[i] - sum) / l[[i, i]];
    }

    // Backward substitution: L^T * x = y
    let mut x = Array1::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * x[j];
        }
        x[i] = (y[i] - sum) / l[[i, i]];
    }
    Some(x)
}

/// Gauss-Jordan solve with partial pivoting
fn gauss_jordan_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    let mut aug = Array2::zeros((n, n + 1));
    for i in 0..n {
        for j in 0..n {
            aug[[i, j]] = a[[i, j]];
        }
        aug[[i, n]] = b[i];
    }

    for col in 0..n {
        let mut max_row = col;
        for row in col + 1..n {
            if aug[[row, col]].abs() > aug[[max_row, col]].abs() {
                max_row = row;
            }
        }
        if max_row != col {
            for j in 0..=n {
                aug.swap([col, j], [max_row, j]);
            }
        }
        if aug[[col, col]].abs() < 1e-10 {
            return None;
        }

        let pivot = aug[[col, col]];
        for j in 0..=n {
            aug[[col, j]] /= pivot;
        }
        for row in 0..n {
            if row != col {
                let factor = aug[[row, col]];
                for j in 0..=n {
                    aug[[row, j]] -= factor * aug[[col, j]];
                }
            }
        }
    }

    Some(aug.column(n).to_owned())
}

/// Solve the normal equations `(X^T X) w = X^T y`.
///
/// Rank-deficient systems (for example a full set of one-hot columns next to
/// an intercept) get a small ridge term so the solve still succeeds.
fn solve_least_squares(x: &Array2<f64>, y: &Array1<f64>) -> Option<Array1<f64>> {
    let xtx = x.t().dot(x);
    let xty = x.t().dot(y);

    if let Some(w) = cholesky_solve(&xtx, &xty) {
        return Some(w);
    }

    let n = xtx.nrows();
    let ridge = 1e-8 * xtx.diag().iter().map(|v| v.abs()).sum::<f64>().max(1.0) / n.max(1) as f64;
    let mut regularized = xtx.clone();
    for k in 0..n {
        regularized[[k, k]] += ridge;
    }
    cholesky_solve(&regularized, &xty).or_else(|| gauss_jordan_solve(&regularized, &xty))
}

/// Ordinary least squares with an intercept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    pub coefficients: Option<Array1<f64>>,
    pub intercept: f64,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearRegression {
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: 0.0,
        }
    }

    /// Fit on centered data, then recover the intercept from the means.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        if n_samples != y.len() {
            return Err(BenchtopError::length_mismatch(n_samples, y.len()));
        }
        if n_samples == 0 {
            return Err(BenchtopError::Fit("Cannot fit a linear model on zero samples".to_string()));
        }

        let x_mean = x
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(x.ncols()));
        let y_mean = y.mean().unwrap_or(0.0);
        let x_centered = x - &x_mean;
        let y_centered = y - y_mean;

        let coefficients = if x.ncols() == 0 {
            Array1::zeros(0)
        } else {
            solve_least_squares(&x_centered, &y_centered).ok_or_else(|| {
                BenchtopError::Fit("Normal equations are singular".to_string())
            })?
        };

        self.intercept = y_mean - x_mean.dot(&coefficients);
        self.coefficients = Some(coefficients);
        Ok(self)
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self
            .coefficients
            .as_ref()
            .ok_or_else(|| BenchtopError::Fit("Linear regression is not fitted".to_string()))?;
        check_width(x, coefficients.len())?;
        Ok(x.dot(coefficients) + self.intercept)
    }
}

/// Multinomial logistic regression fitted by full-batch gradient descent on
/// the L2-penalized cross-entropy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Weights, one column per class.
    pub coefficients: Option<Array2<f64>>,
    /// Intercept per class.
    pub intercepts: Option<Array1<f64>>,
    /// Inverse regularization strength.
    pub c: f64,
    pub max_iter: usize,
    /// Convergence tolerance on the gradient norm.
    pub tol: f64,
    pub learning_rate: f64,
    n_classes: usize,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new(2)
    }
}

impl LogisticRegression {
    /// Create a model over `n_classes` class indices
    pub fn new(n_classes: usize) -> Self {
        Self {
            coefficients: None,
            intercepts: None,
            c: 1.0,
            max_iter: 1000,
            tol: 1e-6,
            learning_rate: 0.5,
            n_classes,
        }
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    /// Row-wise softmax, shifted by the row maximum for stability
    fn softmax(z: &mut Array2<f64>) {
        for mut row in z.rows_mut() {
            let max = row.fold(f64::NEG_INFINITY, |m, &v| m.max(v));
            row.mapv_inplace(|v| (v - max).exp());
            let sum = row.sum();
            row.mapv_inplace(|v| v / sum);
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();
        if n_samples != y.len() {
            return Err(BenchtopError::length_mismatch(n_samples, y.len()));
        }
        if n_samples == 0 {
            return Err(BenchtopError::Fit(
                "Cannot fit logistic regression on zero samples".to_string(),
            ));
        }
        if self.n_classes < 2 {
            return Err(BenchtopError::Fit(format!(
                "Logistic regression needs at least 2 classes, got {}",
                self.n_classes
            )));
        }

        let k = self.n_classes;
        let mut targets = Array2::<f64>::zeros((n_samples, k));
        for (i, &label) in y.iter().enumerate() {
            let class = label as usize;
            if class >= k {
                return Err(BenchtopError::Fit(format!("Class index {} out of range", class)));
            }
            targets[[i, class]] = 1.0;
        }

        let mut weights = Array2::<f64>::zeros((n_features, k));
        let mut bias = Array1::<f64>::zeros(k);
        let n = n_samples as f64;
        let alpha = 1.0 / (self.c * n);
        let mut iterations = 0;

        for _ in 0..self.max_iter {
            iterations += 1;
            let mut proba = x.dot(&weights) + &bias;
            Self::softmax(&mut proba);

            let errors = &proba - &targets;
            let dw = x.t().dot(&errors) / n + &weights * alpha;
            let db = errors.sum_axis(Axis(0)) / n;

            let grad_norm = (dw.mapv(|v| v * v).sum() + db.mapv(|v| v * v).sum()).sqrt();
            if grad_norm < self.tol {
                break;
            }

            weights = weights - &dw * self.learning_rate;
            bias = bias - &db * self.learning_rate;
        }

        debug!(iterations, classes = k, "fitted logistic regression");
        self.coefficients = Some(weights);
        self.intercepts = Some(bias);
        Ok(self)
    }

    /// Class probabilities, one column per class
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let (Some(weights), Some(bias)) = (&self.coefficients, &self.intercepts) else {
            return Err(BenchtopError::Fit("Logistic regression is not fitted".to_string()));
        };
        check_width(x, weights.nrows())?;
        let mut proba = x.dot(weights) + bias;
        Self::softmax(&mut proba);
        Ok(proba)
    }

    /// Most probable class index per row (ties to the lowest index)
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba
            .rows()
            .into_iter()
            .map(|row| {
                let mut best = 0;
                for (i, &p) in row.iter().enumerate() {
                    if p > row[best] {
                        best = i;
                    }
                }
                best as f64
            })
            .collect())
    }
}

fn check_width(x: &Array2<f64>, expected: usize) -> Result<()> {
    if x.ncols() != expected {
        return Err(BenchtopError::ShapeMismatch {
            expected: format!("{} features", expected),
            actual: format!("{} features", x.ncols()),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_linear_regression_exact_fit() {
        let x = array![[1.0, 0.0], [2.0, 1.0], [3.0, 0.0], [4.0, 1.0]];
        let y = x.column(0).mapv(|v| 2.0 * v) + x.column(1).mapv(|v| -3.0 * v) + 1.0;

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();
        let coef = model.coefficients.as_ref().unwrap();
        assert!((coef[0] - 2.0).abs() < 1e-8);
        assert!((coef[1] + 3.0).abs() < 1e-8);
        assert!((model.intercept - 1.0).abs() < 1e-8);
    }

    #[test]
    fn test_linear_regression_rank_deficient() {
        // one-hot pair always sums to one
        let x = array![[1.0, 0.0], [0.0, 1.0], [1.0, 0.0], [0.0, 1.0]];
        let y = array![1.0, 3.0, 1.0, 3.0];
        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();
        let pred = model.predict(&x).unwrap();
        for (p, t) in pred.iter().zip(y.iter()) {
            assert!((p - t).abs() < 1e-4);
        }
    }

    #[test]
    fn test_logistic_binary() {
        let x = array![[-2.0], [-1.5], [-1.0], [1.0], [1.5], [2.0]];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let mut model = LogisticRegression::new(2);
        model.fit(&x, &y).unwrap();
        assert_eq!(model.predict(&x).unwrap(), y);

        let proba = model.predict_proba(&array![[3.0]]).unwrap();
        assert!(proba[[0, 1]] > 0.5);
        assert!((proba.row(0).sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_logistic_multiclass() {
        let x = array![
            [1.0, 0.0, 0.0],
            [0.9, 0.1, 0.0],
            [0.0, 1.0, 0.0],
            [0.1, 0.9, 0.0],
            [0.0, 0.0, 1.0],
            [0.0, 0.1, 0.9]
        ];
        let y = array![0.0, 0.0, 1.0, 1.0, 2.0, 2.0];
        let mut model = LogisticRegression::new(3);
        model.fit(&x, &y).unwrap();
        assert_eq!(model.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_single_class_fails() {
        let mut model = LogisticRegression::new(1);
        assert!(matches!(
            model.fit(&array![[1.0]], &array![0.0]),
            Err(BenchtopError::Fit(_))
        ));
    }

    #[test]
    fn test_unfitted_predict_fails() {
        assert!(LinearRegression::new().predict(&array![[1.0]]).is_err());
        assert!(LogisticRegression::new(2).predict(&array![[1.0]]).is_err());
    }
}
