//! Problem-type inference from a target column

use crate::error::{ForgeError, Result};
use crate::table::{ColumnKind, Table};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A numeric target with fewer distinct values than this is treated as
/// classification. A rule of thumb, not a statistical test.
pub const CLASSIFICATION_CARDINALITY_THRESHOLD: usize = 20;

/// Kind of supervised problem a target column poses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProblemType {
    Classification,
    Regression,
    /// No usable target column
    Unsupervised,
}

impl ProblemType {
    /// Classify `target` in `table`.
    ///
    /// Absent or unspecified target: `Unsupervised`. Numeric target with fewer
    /// than [`CLASSIFICATION_CARDINALITY_THRESHOLD`] distinct non-missing
    /// values: `Classification`, otherwise `Regression`. Any non-numeric
    /// target: `Classification`.
    pub fn infer(table: &Table, target: Option<&str>) -> Self {
        let Some(column) = target.and_then(|name| table.column(name)) else {
            return ProblemType::Unsupervised;
        };
        match column.kind() {
            ColumnKind::Numeric => {
                if column.data().n_unique() < CLASSIFICATION_CARDINALITY_THRESHOLD {
                    ProblemType::Classification
                } else {
                    ProblemType::Regression
                }
            }
            ColumnKind::Categorical | ColumnKind::Boolean => ProblemType::Classification,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProblemType::Classification => "Classification",
            ProblemType::Regression => "Regression",
            ProblemType::Unsupervised => "Unsupervised",
        }
    }
}

impl std::fmt::Display for ProblemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProblemType {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "classification" => Ok(ProblemType::Classification),
            "regression" => Ok(ProblemType::Regression),
            "unsupervised" | "unsupervised / unknown" | "unknown" => Ok(ProblemType::Unsupervised),
            other => Err(ForgeError::Config(format!("Unknown problem type: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;

    #[test]
    fn test_two_values_is_classification() {
        let t = Table::new(vec![Column::from_f64("y", &[0.0, 1.0, 0.0, 1.0, 0.0])]).unwrap();
        assert_eq!(ProblemType::infer(&t, Some("y")), ProblemType::Classification);
    }

    #[test]
    fn test_many_values_is_regression() {
        let values: Vec<f64> = (1..=25).map(|i| i as f64 * 1.1).collect();
        let t = Table::new(vec![Column::from_f64("y", &values)]).unwrap();
        assert_eq!(ProblemType::infer(&t, Some("y")), ProblemType::Regression);
    }

    #[test]
    fn test_threshold_boundary() {
        let nineteen: Vec<f64> = (0..19).map(|i| i as f64).collect();
        let twenty: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let t = Table::new(vec![
            Column::from_f64("a", &nineteen),
            Column::from_f64("b", &nineteen.iter().map(|v| v + 0.5).collect::<Vec<_>>()),
        ])
        .unwrap();
        assert_eq!(ProblemType::infer(&t, Some("a")), ProblemType::Classification);
        let t = Table::new(vec![Column::from_f64("b", &twenty)]).unwrap();
        assert_eq!(ProblemType::infer(&t, Some("b")), ProblemType::Regression);
    }

    #[test]
    fn test_text_and_absent() {
        let t = Table::new(vec![Column::from_strs("label", &["a", "b"])]).unwrap();
        assert_eq!(ProblemType::infer(&t, Some("label")), ProblemType::Classification);
        assert_eq!(ProblemType::infer(&t, Some("nope")), ProblemType::Unsupervised);
        assert_eq!(ProblemType::infer(&t, None), ProblemType::Unsupervised);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("Classification".parse::<ProblemType>().unwrap(), ProblemType::Classification);
        assert_eq!("regression".parse::<ProblemType>().unwrap(), ProblemType::Regression);
        assert_eq!(
            "Unsupervised / Unknown".parse::<ProblemType>().unwrap(),
            ProblemType::Unsupervised
        );
        assert!("clustering".parse::<ProblemType>().is_err());
        assert_eq!(ProblemType::Regression.to_string(), "Regression");
    }
}
