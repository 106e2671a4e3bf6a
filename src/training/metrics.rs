//! Evaluation metrics

use crate::table::Label;
use std::collections::BTreeMap;

/// Metric name to value
pub type Metrics = BTreeMap<String, f64>;

pub const ACCURACY: &str = "accuracy";
pub const F1: &str = "f1";
pub const MEAN_ABSOLUTE_ERROR: &str = "mean_absolute_error";
pub const R2: &str = "r2";

/// Fraction of exact matches
pub fn accuracy(y_true: &[Label], y_pred: &[Label]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    correct as f64 / y_true.len() as f64
}

/// Unweighted mean of per-class F1 over every label seen in either input.
///
/// A class with no true or predicted members scores 0.
pub fn f1_macro(y_true: &[Label], y_pred: &[Label]) -> f64 {
    let mut labels: Vec<&Label> = y_true.iter().chain(y_pred).collect();
    labels.sort_by(|a, b| a.total_cmp(b));
    labels.dedup();
    if labels.is_empty() {
        return 0.0;
    }

    let total: f64 = labels
        .iter()
        .map(|&class| {
            let mut tp = 0usize;
            let mut fp = 0usize;
            let mut fn_ = 0usize;
            for (t, p) in y_true.iter().zip(y_pred) {
                match (t == class, p == class) {
                    (true, true) => tp += 1,
                    (false, true) => fp += 1,
                    (true, false) => fn_ += 1,
                    (false, false) => {}
                }
            }
            let denom = 2 * tp + fp + fn_;
            if denom == 0 {
                0.0
            } else {
                2.0 * tp as f64 / denom as f64
            }
        })
        .sum();
    total / labels.len() as f64
}

pub fn mean_absolute_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).abs())
        .sum::<f64>()
        / y_true.len() as f64
}

/// Coefficient of determination. A constant target scores 1 when predicted
/// exactly and 0 otherwise.
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let mean = y_true.iter().sum::<f64>() / y_true.len() as f64;
    let ss_res: f64 = y_true.iter().zip(y_pred).map(|(t, p)| (t - p).powi(2)).sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();
    if ss_tot == 0.0 {
        if ss_res == 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - ss_res / ss_tot
    }
}

/// `{accuracy, f1}`
pub fn classification_metrics(y_true: &[Label], y_pred: &[Label]) -> Metrics {
    let mut metrics = Metrics::new();
    metrics.insert(ACCURACY.to_string(), accuracy(y_true, y_pred));
    metrics.insert(F1.to_string(), f1_macro(y_true, y_pred));
    metrics
}

/// `{mean_absolute_error, r2}`
pub fn regression_metrics(y_true: &[f64], y_pred: &[f64]) -> Metrics {
    let mut metrics = Metrics::new();
    metrics.insert(
        MEAN_ABSOLUTE_ERROR.to_string(),
        mean_absolute_error(y_true, y_pred),
    );
    metrics.insert(R2.to_string(), r2_score(y_true, y_pred));
    metrics
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(values: &[&str]) -> Vec<Label> {
        values.iter().map(|s| Label::Text(s.to_string())).collect()
    }

    #[test]
    fn test_classification_metrics() {
        let y_true = labels(&["a", "a", "b", "b"]);
        let y_pred = labels(&["a", "b", "b", "b"]);
        let m = classification_metrics(&y_true, &y_pred);
        assert!((m[ACCURACY] - 0.75).abs() < 1e-12);
        // f1(a) = 2/3, f1(b) = 4/5
        assert!((m[F1] - (2.0 / 3.0 + 0.8) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_f1_counts_predicted_only_labels() {
        let y_true = labels(&["a", "a"]);
        let y_pred = labels(&["a", "c"]);
        // f1(a) = 2/3, f1(c) = 0
        assert!((f1_macro(&y_true, &y_pred) - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_regression_metrics() {
        let y_true = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y_pred = [1.1, 2.0, 2.9, 4.1, 5.0];
        let m = regression_metrics(&y_true, &y_pred);
        assert!((m[MEAN_ABSOLUTE_ERROR] - 0.06).abs() < 1e-12);
        assert!(m[R2] > 0.9);
    }

    #[test]
    fn test_r2_constant_target() {
        assert_eq!(r2_score(&[2.0, 2.0], &[2.0, 2.0]), 1.0);
        assert_eq!(r2_score(&[2.0, 2.0], &[1.0, 3.0]), 0.0);
    }
}
