//! Closed algorithm catalog

use super::problem_type::ProblemType;
use crate::error::{ForgeError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Trainable algorithms, addressed by their short ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    #[serde(rename = "rf_clf")]
    RandomForestClassifier,
    #[serde(rename = "log_reg")]
    LogisticRegression,
    #[serde(rename = "rf_reg")]
    RandomForestRegressor,
    #[serde(rename = "lin_reg")]
    LinearRegression,
}

impl Algorithm {
    pub const ALL: [Algorithm; 4] = [
        Algorithm::RandomForestClassifier,
        Algorithm::LogisticRegression,
        Algorithm::RandomForestRegressor,
        Algorithm::LinearRegression,
    ];

    /// Resolve an id, failing with `UnknownAlgorithm` for anything outside the catalog
    pub fn from_id(id: &str) -> Result<Self> {
        match id {
            "rf_clf" => Ok(Algorithm::RandomForestClassifier),
            "log_reg" => Ok(Algorithm::LogisticRegression),
            "rf_reg" => Ok(Algorithm::RandomForestRegressor),
            "lin_reg" => Ok(Algorithm::LinearRegression),
            other => Err(ForgeError::UnknownAlgorithm(other.to_string())),
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Algorithm::RandomForestClassifier => "rf_clf",
            Algorithm::LogisticRegression => "log_reg",
            Algorithm::RandomForestRegressor => "rf_reg",
            Algorithm::LinearRegression => "lin_reg",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::RandomForestClassifier => "Random Forest Classifier",
            Algorithm::LogisticRegression => "Logistic Regression",
            Algorithm::RandomForestRegressor => "Random Forest Regressor",
            Algorithm::LinearRegression => "Linear Regression",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Algorithm::RandomForestClassifier => "Robust ensemble method, good for complex data.",
            Algorithm::LogisticRegression => "Simple, interpretable baseline.",
            Algorithm::RandomForestRegressor => "Non-linear regression, handles outliers well.",
            Algorithm::LinearRegression => "Basic linear approach.",
        }
    }

    /// Whether the fitted model predicts class labels
    pub fn is_classifier(&self) -> bool {
        matches!(
            self,
            Algorithm::RandomForestClassifier | Algorithm::LogisticRegression
        )
    }

    /// Problem type this algorithm is meant for
    pub fn problem_type(&self) -> ProblemType {
        if self.is_classifier() {
            ProblemType::Classification
        } else {
            ProblemType::Regression
        }
    }

    pub fn info(&self) -> AlgorithmInfo {
        AlgorithmInfo {
            id: self.id().to_string(),
            name: self.name().to_string(),
            description: self.description().to_string(),
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Algorithm {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_id(s)
    }
}

/// Catalog entry as shown to users
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmInfo {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// Catalog entries suited to `problem_type`; empty when there is no target
pub fn recommend_algorithms(problem_type: ProblemType) -> Vec<AlgorithmInfo> {
    Algorithm::ALL
        .iter()
        .filter(|a| problem_type != ProblemType::Unsupervised && a.problem_type() == problem_type)
        .map(Algorithm::info)
        .collect()
}
