//! Engine configuration

use crate::error::{ForgeError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Top-level configuration shared by the trainer and the model registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory holding persisted model artifacts
    pub models_dir: PathBuf,
    /// Seed for the train/test split and forest bootstrap
    pub random_state: u64,
    /// Held-out fraction of rows used for evaluation
    pub test_size: f64,
    /// Trees per random forest
    pub n_estimators: usize,
    /// Depth limit for forest trees (None = grow until pure)
    pub max_depth: Option<usize>,
    /// Gradient descent iterations for logistic regression
    pub max_iter: usize,
    /// Gradient descent step size for logistic regression
    pub learning_rate: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            models_dir: std::env::var("FORGEML_MODELS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("models")),
            random_state: env_or("FORGEML_SEED", 42),
            test_size: 0.2,
            n_estimators: env_or("FORGEML_N_ESTIMATORS", 100),
            max_depth: None,
            max_iter: 1000,
            learning_rate: 0.1,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_models_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.models_dir = dir.into();
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn with_test_size(mut self, size: f64) -> Self {
        self.test_size = size;
        self
    }

    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_max_iter(mut self, iters: usize) -> Self {
        self.max_iter = iters;
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(ForgeError::Config(format!(
                "test_size must be in (0, 1), got {}",
                self.test_size
            )));
        }
        if self.n_estimators == 0 {
            return Err(ForgeError::Config("n_estimators must be at least 1".to_string()));
        }
        if self.max_depth == Some(0) {
            return Err(ForgeError::Config("max_depth must be at least 1".to_string()));
        }
        if self.learning_rate <= 0.0 || !self.learning_rate.is_finite() {
            return Err(ForgeError::Config(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }
}
