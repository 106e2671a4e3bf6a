//! CART decision tree
//!
//! Classification targets are class indices `0..n_classes` stored as f64.
//! Leaves keep the class distribution so forests can report probabilities.

use crate::error::{ForgeError, Result};
use ndarray::{Array1, Array2};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        /// Mean target (regression) or majority class index (classification)
        value: f64,
        /// Class frequencies, empty for regression
        distribution: Vec<f64>,
        n_samples: usize,
    },
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
    },
}

/// Candidate split: (feature, threshold, gain)
type SplitCandidate = (usize, f64, f64);

/// Decision tree model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    /// Maximum depth
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features considered at each split (None = all)
    pub max_features: Option<usize>,
    /// Seed for the per-split feature subset
    pub random_state: u64,
    n_features: usize,
    /// 0 for regression
    n_classes: usize,
}

impl DecisionTree {
    /// Gini classifier over `n_classes` class indices
    pub fn new_classifier(n_classes: usize) -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            random_state: 0,
            n_features: 0,
            n_classes,
        }
    }

    /// Variance-reduction regressor
    pub fn new_regressor() -> Self {
        Self::new_classifier(0)
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_max_features(mut self, n: usize) -> Self {
        self.max_features = Some(n);
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn is_classifier(&self) -> bool {
        self.n_classes > 0
    }

    /// Fit on all rows
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let indices: Vec<usize> = (0..x.nrows()).collect();
        self.fit_indices(x, y, indices)
    }

    /// Fit on the given rows (repeats allowed, as in a bootstrap sample)
    pub fn fit_indices(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: Vec<usize>,
    ) -> Result<&mut Self> {
        if x.nrows() != y.len() {
            return Err(ForgeError::Shape {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }
        if indices.is_empty() {
            return Err(ForgeError::TrainingFailed(
                "cannot fit a tree on zero samples".to_string(),
            ));
        }
        if self.is_classifier() {
            if let Some(bad) = y.iter().find(|&&c| c < 0.0 || c as usize >= self.n_classes) {
                return Err(ForgeError::TrainingFailed(format!(
                    "class index {} outside 0..{}",
                    bad, self.n_classes
                )));
            }
        }

        self.n_features = x.ncols();
        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state);
        self.root = Some(self.build_tree(x, y, indices, 0, &mut rng));
        Ok(self)
    }

    fn build_tree(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: Vec<usize>,
        depth: usize,
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let n_samples = indices.len();
        let should_stop = n_samples < self.min_samples_split
            || self.max_depth.is_some_and(|d| depth >= d)
            || self.is_pure(y, &indices);

        if !should_stop {
            if let Some((feature, threshold, _)) = self.find_best_split(x, y, &indices, rng) {
                let (left, right): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .partition(|&&i| x[[i, feature]] <= threshold);
                let left = Box::new(self.build_tree(x, y, left, depth + 1, rng));
                let right = Box::new(self.build_tree(x, y, right, depth + 1, rng));
                return TreeNode::Split {
                    feature_idx: feature,
                    threshold,
                    left,
                    right,
                    n_samples,
                };
            }
        }
        self.make_leaf(y, &indices)
    }

    fn candidate_features(&self, rng: &mut ChaCha8Rng) -> Vec<usize> {
        match self.max_features {
            Some(m) if m < self.n_features => {
                let mut picked = rand::seq::index::sample(rng, self.n_features, m.max(1)).into_vec();
                picked.sort_unstable();
                picked
            }
            _ => (0..self.n_features).collect(),
        }
    }

    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        rng: &mut ChaCha8Rng,
    ) -> Option<SplitCandidate> {
        let features = self.candidate_features(rng);
        let parent = self.impurity_of(y, indices);

        // Each feature is scanned independently; results come back in feature order
        let results: Vec<Option<SplitCandidate>> = features
            .par_iter()
            .map(|&f| self.best_split_for_feature(x, y, indices, f, parent))
            .collect();

        results.into_iter().flatten().fold(None, |best, cand| match best {
            Some(b) if b.2 >= cand.2 => Some(b),
            _ => Some(cand),
        })
    }

    /// Sort the node's rows by one feature and sweep every boundary between
    /// distinct values, updating child statistics incrementally
    fn best_split_for_feature(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        feature: usize,
        parent: f64,
    ) -> Option<SplitCandidate> {
        let mut order: Vec<usize> = indices.to_vec();
        order.sort_by(|&a, &b| x[[a, feature]].total_cmp(&x[[b, feature]]));

        let n = order.len();
        let mut left = NodeStats::new(self.n_classes);
        let mut right = NodeStats::new(self.n_classes);
        for &i in &order {
            right.add(y[i]);
        }

        let mut best: Option<SplitCandidate> = None;
        for pos in 0..n - 1 {
            let yi = y[order[pos]];
            left.add(yi);
            right.remove(yi);

            let here = x[[order[pos], feature]];
            let next = x[[order[pos + 1], feature]];
            if here == next {
                continue;
            }
            let n_left = pos + 1;
            let n_right = n - n_left;
            if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                continue;
            }

            let weighted = (n_left as f64 * left.impurity() + n_right as f64 * right.impurity())
                / n as f64;
            let gain = parent - weighted;
            if gain > 1e-12 && best.map_or(true, |b| gain > b.2) {
                let mut threshold = (here + next) / 2.0;
                // midpoint can round up to `next` for adjacent floats
                if threshold >= next {
                    threshold = here;
                }
                best = Some((feature, threshold, gain));
            }
        }
        best
    }

    fn impurity_of(&self, y: &Array1<f64>, indices: &[usize]) -> f64 {
        let mut stats = NodeStats::new(self.n_classes);
        for &i in indices {
            stats.add(y[i]);
        }
        stats.impurity()
    }

    fn is_pure(&self, y: &Array1<f64>, indices: &[usize]) -> bool {
        let first = y[indices[0]];
        indices.iter().all(|&i| (y[i] - first).abs() < 1e-12)
    }

    fn make_leaf(&self, y: &Array1<f64>, indices: &[usize]) -> TreeNode {
        let n_samples = indices.len();
        if self.is_classifier() {
            let mut counts = vec![0.0; self.n_classes];
            for &i in indices {
                counts[y[i] as usize] += 1.0;
            }
            let value = argmax(&counts) as f64;
            let distribution = counts.iter().map(|c| c / n_samples as f64).collect();
            TreeNode::Leaf {
                value,
                distribution,
                n_samples,
            }
        } else {
            let mean = indices.iter().map(|&i| y[i]).sum::<f64>() / n_samples as f64;
            TreeNode::Leaf {
                value: mean,
                distribution: Vec::new(),
                n_samples,
            }
        }
    }

    fn leaf_for(&self, sample: ndarray::ArrayView1<f64>) -> Result<&TreeNode> {
        let mut node = self.root.as_ref().ok_or(ForgeError::ModelNotFitted)?;
        while let TreeNode::Split {
            feature_idx,
            threshold,
            left,
            right,
            ..
        } = node
        {
            node = if sample[*feature_idx] <= *threshold { left } else { right };
        }
        Ok(node)
    }

    fn check_width(&self, x: &Array2<f64>) -> Result<()> {
        if x.ncols() != self.n_features {
            return Err(ForgeError::Shape {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(())
    }

    /// Leaf value per row
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.check_width(x)?;
        x.rows()
            .into_iter()
            .map(|row| match self.leaf_for(row)? {
                TreeNode::Leaf { value, .. } => Ok(*value),
                TreeNode::Split { .. } => Err(ForgeError::ModelNotFitted),
            })
            .collect::<Result<Vec<f64>>>()
            .map(Array1::from_vec)
    }

    /// Leaf class distribution per row (classification only)
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if !self.is_classifier() {
            return Err(ForgeError::TrainingFailed(
                "predict_proba is only available for classification".to_string(),
            ));
        }
        self.check_width(x)?;
        let mut out = Array2::zeros((x.nrows(), self.n_classes));
        for (i, row) in x.rows().into_iter().enumerate() {
            if let TreeNode::Leaf { distribution, .. } = self.leaf_for(row)? {
                for (k, p) in distribution.iter().enumerate() {
                    out[[i, k]] = *p;
                }
            }
        }
        Ok(out)
    }

    /// Tree depth (a lone leaf has depth 1)
    pub fn get_depth(&self) -> usize {
        fn depth(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => 1 + depth(left).max(depth(right)),
            }
        }
        self.root.as_ref().map(depth).unwrap_or(0)
    }
}

/// Index of the largest value; the lowest index wins ties
pub(crate) fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(bi, bv), (i, &v)| {
            if v > bv {
                (i, v)
            } else {
                (bi, bv)
            }
        })
        .0
}

/// Running statistics of a node's targets
struct NodeStats {
    count: usize,
    sum: f64,
    sq_sum: f64,
    class_counts: Vec<usize>,
}

impl NodeStats {
    fn new(n_classes: usize) -> Self {
        Self {
            count: 0,
            sum: 0.0,
            sq_sum: 0.0,
            class_counts: vec![0; n_classes],
        }
    }

    fn add(&mut self, y: f64) {
        self.count += 1;
        if self.class_counts.is_empty() {
            self.sum += y;
            self.sq_sum += y * y;
        } else {
            self.class_counts[y as usize] += 1;
        }
    }

    fn remove(&mut self, y: f64) {
        self.count -= 1;
        if self.class_counts.is_empty() {
            self.sum -= y;
            self.sq_sum -= y * y;
        } else {
            self.class_counts[y as usize] -= 1;
        }
    }

    /// Gini for classification, variance for regression
    fn impurity(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let n = self.count as f64;
        if self.class_counts.is_empty() {
            (self.sq_sum / n - (self.sum / n).powi(2)).max(0.0)
        } else {
            1.0 - self
                .class_counts
                .iter()
                .map(|&c| (c as f64 / n).powi(2))
                .sum::<f64>()
        }
    }
}
