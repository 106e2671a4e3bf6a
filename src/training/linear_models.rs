//! Linear model implementations

use crate::error::{ForgeError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Cholesky factorization of a symmetric positive-definite matrix.
///
/// Fails when a pivot is not clearly positive relative to the matrix scale.
fn cholesky(a: &Array2<f64>) -> Option<Array2<f64>> {
    let n = a.nrows();
    let scale = a.diag().iter().fold(0.0f64, |m, v| m.max(v.abs())).max(1e-300);
    let mut l = Array2::<f64>::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }
            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 1e-12 * scale {
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

/// Solve `L Lᵀ x = b`
fn cholesky_substitute(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = l.nrows();
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * y[j];
        }
        y[i] = (b[i] - sum) / l[[i, i]];
    }

    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * x[j];
        }
        x[i] = (y[i] - sum) / l[[i, i]];
    }
    x
}

/// Solve the symmetric system `A x = b`, adding a growing ridge to the
/// diagonal when `A` is singular (collinear or constant features)
fn solve_spd(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    if let Some(l) = cholesky(a) {
        return Some(cholesky_substitute(&l, b));
    }
    let n = a.nrows();
    let base = (a.diag().sum() / n.max(1) as f64).max(1e-12);
    for factor in [1e-10, 1e-8, 1e-6, 1e-4, 1e-2] {
        let mut reg = a.clone();
        for k in 0..n {
            reg[[k, k]] += factor * base;
        }
        if let Some(l) = cholesky(&reg) {
            return Some(cholesky_substitute(&l, b));
        }
    }
    None
}

/// Ordinary least squares with intercept
#[derive(Debug, Clone, Serialize, Deserialize)]
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

    /// Fit by solving the centered normal equations
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        if n_samples != y.len() {
            return Err(ForgeError::Shape {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        let (Some(x_mean), Some(y_mean)) = (x.mean_axis(Axis(0)), y.mean()) else {
            return Err(ForgeError::TrainingFailed("no training samples".to_string()));
        };

        let x_centered = x - &x_mean.view().insert_axis(Axis(0));
        let y_centered = y - y_mean;

        let coefficients = if x.ncols() == 0 {
            Array1::zeros(0)
        } else {
            let xtx = x_centered.t().dot(&x_centered);
            let xty = x_centered.t().dot(&y_centered);
            solve_spd(&xtx, &xty).ok_or_else(|| {
                ForgeError::TrainingFailed("normal equations are singular".to_string())
            })?
        };

        self.intercept = y_mean - coefficients.dot(&x_mean);
        self.coefficients = Some(coefficients);
        Ok(self)
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self.coefficients.as_ref().ok_or(ForgeError::ModelNotFitted)?;
        if x.ncols() != coefficients.len() {
            return Err(ForgeError::Shape {
                expected: format!("{} features", coefficients.len()),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(x.dot(coefficients) + self.intercept)
    }
}

/// Multinomial logistic regression fit by batch gradient descent.
///
/// Targets are class indices `0..n_classes`. Binary problems use the same
/// softmax form with two classes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// (n_features, n_classes)
    pub coefficients: Option<Array2<f64>>,
    pub intercepts: Option<Array1<f64>>,
    /// L2 regularization strength
    pub alpha: f64,
    pub max_iter: usize,
    /// Stop when the gradient norm falls below this
    pub tol: f64,
    pub learning_rate: f64,
    n_classes: usize,
}

impl LogisticRegression {
    pub fn new(n_classes: usize) -> Self {
        Self {
            coefficients: None,
            intercepts: None,
            alpha: 0.01,
            max_iter: 1000,
            tol: 1e-6,
            learning_rate: 0.1,
            n_classes,
        }
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Row-wise softmax, shifted by the row max for stability
    fn softmax(mut z: Array2<f64>) -> Array2<f64> {
        for mut row in z.rows_mut() {
            let max = row.fold(f64::NEG_INFINITY, |m, &v| m.max(v));
            row.mapv_inplace(|v| (v - max).exp());
            let sum = row.sum();
            row.mapv_inplace(|v| v / sum);
        }
        z
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();
        if n_samples != y.len() {
            return Err(ForgeError::Shape {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(ForgeError::TrainingFailed("no training samples".to_string()));
        }
        if self.n_classes < 2 {
            return Err(ForgeError::TrainingFailed(format!(
                "logistic regression needs at least 2 classes, got {}",
                self.n_classes
            )));
        }

        let mut targets = Array2::<f64>::zeros((n_samples, self.n_classes));
        for (i, &class) in y.iter().enumerate() {
            let k = class as usize;
            if class < 0.0 || k >= self.n_classes {
                return Err(ForgeError::TrainingFailed(format!(
                    "class index {} outside 0..{}",
                    class, self.n_classes
                )));
            }
            targets[[i, k]] = 1.0;
        }

        let mut weights = Array2::<f64>::zeros((n_features, self.n_classes));
        let mut bias = Array1::<f64>::zeros(self.n_classes);
        let n = n_samples as f64;

        for _iter in 0..self.max_iter {
            let probs = Self::softmax(x.dot(&weights) + &bias);
            let errors = probs - &targets;

            let dw = x.t().dot(&errors) / n + &weights * self.alpha;
            let db = errors.sum_axis(Axis(0)) / n;

            let grad_norm = (dw.mapv(|v| v * v).sum() + db.mapv(|v| v * v).sum()).sqrt();
            if grad_norm < self.tol {
                break;
            }

            weights = weights - dw * self.learning_rate;
            bias = bias - db * self.learning_rate;
        }

        self.coefficients = Some(weights);
        self.intercepts = Some(bias);
        Ok(self)
    }

    /// Class probabilities, one row per sample, each row summing to 1
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let (Some(weights), Some(bias)) = (&self.coefficients, &self.intercepts) else {
            return Err(ForgeError::ModelNotFitted);
        };
        if x.ncols() != weights.nrows() {
            return Err(ForgeError::Shape {
                expected: format!("{} features", weights.nrows()),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(Self::softmax(x.dot(weights) + bias))
    }

    /// Most probable class index per row
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba
            .rows()
            .into_iter()
            .map(|row| super::decision_tree::argmax(&row.to_vec()) as f64)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_linear_regression_simple() {
        // y = 2x + 1
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0]];
        let y = array![3.0, 5.0, 7.0, 9.0, 11.0];
        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();
        let coef = model.coefficients.as_ref().unwrap();
        assert!((coef[0] - 2.0).abs() < 1e-9);
        assert!((model.intercept - 1.0).abs() < 1e-9);
        let pred = model.predict(&array![[10.0]]).unwrap();
        assert!((pred[0] - 21.0).abs() < 1e-9);
    }

    #[test]
    fn test_linear_regression_collinear_features() {
        // second column duplicates the first
        let x = array![[1.0, 1.0], [2.0, 2.0], [3.0, 3.0], [4.0, 4.0]];
        let y = array![2.0, 4.0, 6.0, 8.0];
        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();
        let pred = model.predict(&x).unwrap();
        for (p, t) in pred.iter().zip(y.iter()) {
            assert!((p - t).abs() < 1e-3, "{} vs {}", p, t);
        }
    }

    #[test]
    fn test_logistic_regression_binary() {
        let x = array![[-2.0], [-1.5], [-1.0], [1.0], [1.5], [2.0]];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let mut model = LogisticRegression::new(2);
        model.fit(&x, &y).unwrap();
        assert_eq!(model.predict(&x).unwrap(), y);

        let proba = model.predict_proba(&x).unwrap();
        for row in proba.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
        }
        assert!(proba[[0, 0]] > 0.5);
    }

    #[test]
    fn test_logistic_regression_multiclass() {
        let x = array![
            [-3.0, -3.0],
            [-3.2, -2.9],
            [5.0, 0.0],
            [5.1, 0.2],
            [0.0, 5.0],
            [0.1, 5.2]
        ];
        let y = array![0.0, 0.0, 1.0, 1.0, 2.0, 2.0];
        let mut model = LogisticRegression::new(3);
        model.fit(&x, &y).unwrap();
        assert_eq!(model.predict(&x).unwrap(), y);
        assert_eq!(model.predict_proba(&x).unwrap().dim(), (6, 3));
    }

    #[test]
    fn test_unfitted_and_single_class() {
        assert!(matches!(
            LinearRegression::new().predict(&array![[1.0]]),
            Err(ForgeError::ModelNotFitted)
        ));
        let mut model = LogisticRegression::new(1);
        assert!(model.fit(&array![[1.0]], &array![0.0]).is_err());
    }
}
