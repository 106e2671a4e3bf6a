//! Training configuration

use crate::config::EngineConfig;
use serde::{Deserialize, Serialize};

/// Hyperparameters and split settings used by the [`Trainer`](super::Trainer)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Fraction of rows held out for evaluation
    pub test_size: f64,
    /// Seed for the row shuffle and the forest
    pub random_state: u64,
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub max_iter: usize,
    pub learning_rate: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            random_state: 42,
            n_estimators: 100,
            max_depth: None,
            max_iter: 1000,
            learning_rate: 0.1,
        }
    }
}

impl TrainingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_test_size(mut self, size: f64) -> Self {
        self.test_size = size;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
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
}

impl From<&EngineConfig> for TrainingConfig {
    fn from(config: &EngineConfig) -> Self {
        Self {
            test_size: config.test_size,
            random_state: config.random_state,
            n_estimators: config.n_estimators,
            max_depth: config.max_depth,
            max_iter: config.max_iter,
            learning_rate: config.learning_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_engine_config() {
        let engine = EngineConfig::new()
            .with_random_state(9)
            .with_n_estimators(12)
            .with_max_depth(4);
        let config = TrainingConfig::from(&engine);
        assert_eq!(config.random_state, 9);
        assert_eq!(config.n_estimators, 12);
        assert_eq!(config.max_depth, Some(4));
        assert_eq!(config.test_size, engine.test_size);
    }
}
