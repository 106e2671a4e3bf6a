//! Random Forest implementation

use super::decision_tree::{argmax, DecisionTree};
use crate::error::{ForgeError, Result};
use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Strategy for max features
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MaxFeatures {
    /// Square root of n_features
    Sqrt,
    /// Fixed number
    Fixed(usize),
    /// All features
    All,
}

/// Random Forest model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    /// Number of trees
    pub n_estimators: usize,
    /// Maximum depth per tree
    pub max_depth: Option<usize>,
    /// Features tried at each split
    pub max_features: MaxFeatures,
    /// Bootstrap sampling
    pub bootstrap: bool,
    /// Base seed; tree `i` uses `random_state + i`
    pub random_state: u64,
    n_features: usize,
    /// 0 for regression
    n_classes: usize,
}

impl RandomForest {
    /// Classifier over `n_classes` class indices (sqrt features per split)
    pub fn new_classifier(n_estimators: usize, n_classes: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: None,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            random_state: 42,
            n_features: 0,
            n_classes,
        }
    }

    /// Regressor (all features per split)
    pub fn new_regressor(n_estimators: usize) -> Self {
        Self {
            max_features: MaxFeatures::All,
            ..Self::new_classifier(n_estimators, 0)
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    pub fn is_classifier(&self) -> bool {
        self.n_classes > 0
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn compute_max_features(&self, n_features: usize) -> usize {
        match self.max_features {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().ceil() as usize,
            MaxFeatures::Fixed(n) => n.min(n_features),
            MaxFeatures::All => n_features,
        }
        .max(1)
    }

    /// Fit the forest. Trees are built in parallel; each derives its RNG from
    /// its own index so the result does not depend on scheduling.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        if n_samples != y.len() {
            return Err(ForgeError::Shape {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(ForgeError::TrainingFailed("no training samples".to_string()));
        }
        if self.n_estimators == 0 {
            return Err(ForgeError::TrainingFailed("n_estimators must be at least 1".to_string()));
        }

        self.n_features = x.ncols();
        let max_features = self.compute_max_features(self.n_features);
        let base_seed = self.random_state;

        let trees: Vec<DecisionTree> = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_idx| -> Result<DecisionTree> {
                let seed = base_seed.wrapping_add(tree_idx as u64);
                let mut rng = ChaCha8Rng::seed_from_u64(seed);

                let sample_indices: Vec<usize> = if self.bootstrap {
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };

                let mut tree = DecisionTree::new_classifier(self.n_classes)
                    .with_max_features(max_features)
                    .with_random_state(rng.gen());
                if let Some(d) = self.max_depth {
                    tree = tree.with_max_depth(d);
                }
                tree.fit_indices(x, y, sample_indices)?;
                Ok(tree)
            })
            .collect::<Result<Vec<_>>>()?;

        self.trees = trees;
        Ok(self)
    }

    /// Majority vote (classification, lowest class index wins ties) or mean (regression)
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(ForgeError::ModelNotFitted);
        }

        if self.is_classifier() {
            let proba = self.vote_fractions(x)?;
            Ok(proba
                .rows()
                .into_iter()
                .map(|row| argmax(&row.to_vec()) as f64)
                .collect())
        } else {
            let all: Vec<Array1<f64>> = self
                .trees
                .par_iter()
                .map(|tree| tree.predict(x))
                .collect::<Result<Vec<_>>>()?;
            let mut sum = Array1::<f64>::zeros(x.nrows());
            for preds in &all {
                sum += preds;
            }
            Ok(sum / all.len() as f64)
        }
    }

    /// Fraction of trees voting for each class
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if self.trees.is_empty() {
            return Err(ForgeError::ModelNotFitted);
        }
        if !self.is_classifier() {
            return Err(ForgeError::TrainingFailed(
                "predict_proba is only available for classification".to_string(),
            ));
        }
        self.vote_fractions(x)
    }

    fn vote_fractions(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let all: Vec<Array1<f64>> = self
            .trees
            .par_iter()
            .map(|tree| tree.predict(x))
            .collect::<Result<Vec<_>>>()?;

        let mut proba = Array2::zeros((x.nrows(), self.n_classes));
        for preds in &all {
            for (i, &class) in preds.iter().enumerate() {
                proba[[i, class as usize]] += 1.0;
            }
        }
        Ok(proba / all.len() as f64)
    }
}
