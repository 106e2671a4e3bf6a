//! Training engine implementation

use super::algorithms::Algorithm;
use super::config::TrainingConfig;
use super::linear_models::{LinearRegression, LogisticRegression};
use super::metrics::{self, Metrics};
use super::pipeline::{FittedModel, TrainedPipeline};
use super::problem_type::ProblemType;
use super::random_forest::RandomForest;
use crate::error::{ForgeError, Result};
use crate::preprocessing::FeaturePreprocessor;
use crate::table::{ColumnData, Label, Table};
use ndarray::{Array1, Array2};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Instant;
use tracing::{debug, info};

/// Row indices of a train/test partition
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Fits a preprocessing + model pipeline and evaluates it on held-out rows
#[derive(Debug, Clone, Default)]
pub struct Trainer {
    config: TrainingConfig,
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Train `algorithm_id` to predict `target_col` from every other column.
    ///
    /// Metrics are computed on the held-out partition and chosen by
    /// `problem_type`. Nothing is persisted.
    pub fn train(
        &self,
        table: &Table,
        target_col: &str,
        algorithm_id: &str,
        problem_type: ProblemType,
    ) -> Result<(Metrics, TrainedPipeline)> {
        let algorithm = Algorithm::from_id(algorithm_id)?;
        self.train_algorithm(table, target_col, algorithm, problem_type)
    }

    pub fn train_algorithm(
        &self,
        table: &Table,
        target_col: &str,
        algorithm: Algorithm,
        problem_type: ProblemType,
    ) -> Result<(Metrics, TrainedPipeline)> {
        let start = Instant::now();

        let target = table.column(target_col).ok_or_else(|| {
            ForgeError::TrainingFailed(format!("target column '{}' not found", target_col))
        })?;

        let labelled: Vec<usize> = (0..table.n_rows())
            .filter(|&i| !target.data().is_missing(i))
            .collect();
        if labelled.is_empty() {
            return Err(ForgeError::TrainingFailed(format!(
                "target column '{}' has no values",
                target_col
            )));
        }
        let y_all = target.data().take(&labelled);
        let x_all = table.take_rows(&labelled).without_column(target_col);
        if x_all.n_cols() == 0 {
            return Err(ForgeError::TrainingFailed(
                "no feature columns besides the target".to_string(),
            ));
        }

        let split = self.split(x_all.n_rows())?;
        debug!(
            train = split.train.len(),
            test = split.test.len(),
            dropped = table.n_rows() - labelled.len(),
            "Split rows"
        );

        let x_train = x_all.take_rows(&split.train);
        let x_test = x_all.take_rows(&split.test);
        let y_train = y_all.take(&split.train);
        let y_test = y_all.take(&split.test);

        let (preprocessor, features) =
            FeaturePreprocessor::fit_transform(&x_train).map_err(training_failed)?;

        let pipeline = if algorithm.is_classifier() {
            let classes = sorted_classes(&y_all);
            if classes.len() < 2 {
                return Err(ForgeError::TrainingFailed(format!(
                    "classification needs at least 2 distinct target values, '{}' has {}",
                    target_col,
                    classes.len()
                )));
            }
            let y = class_indices(&y_train, &classes)?;
            let model = self.fit_classifier(algorithm, &features, &y, classes.len())?;
            TrainedPipeline::new(preprocessor, model, Some(classes), algorithm)
        } else {
            let y = numeric_target(&y_train, target_col, algorithm)?;
            let model = self.fit_regressor(algorithm, &features, &y)?;
            TrainedPipeline::new(preprocessor, model, None, algorithm)
        };

        let y_pred = pipeline.predict(&x_test).map_err(training_failed)?;
        let y_true = labels(&y_test);
        let metrics = match problem_type {
            ProblemType::Classification => metrics::classification_metrics(&y_true, &y_pred),
            _ => metrics::regression_metrics(
                &as_numbers(&y_true, "target")?,
                &as_numbers(&y_pred, "prediction")?,
            ),
        };

        info!(
            algorithm = %algorithm,
            problem_type = %problem_type,
            rows = labelled.len(),
            features = pipeline.preprocessor().output_width(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            metrics = ?metrics,
            "Trained model"
        );
        Ok((metrics, pipeline))
    }

    /// Shuffle `0..n` with the configured seed and hold out
    /// `ceil(test_size * n)` rows (at least one) for evaluation
    pub fn split(&self, n: usize) -> Result<Split> {
        let n_test = ((self.config.test_size * n as f64).ceil() as usize).max(1);
        if n_test >= n {
            return Err(ForgeError::TrainingFailed(format!(
                "{} rows are too few to hold out {} for evaluation",
                n, n_test
            )));
        }
        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.random_state);
        indices.shuffle(&mut rng);
        let train = indices.split_off(n_test);
        Ok(Split {
            train,
            test: indices,
        })
    }

    fn fit_classifier(
        &self,
        algorithm: Algorithm,
        x: &Array2<f64>,
        y: &Array1<f64>,
        n_classes: usize,
    ) -> Result<FittedModel> {
        match algorithm {
            Algorithm::RandomForestClassifier => {
                let mut model = RandomForest::new_classifier(self.config.n_estimators, n_classes)
                    .with_random_state(self.config.random_state);
                if let Some(depth) = self.config.max_depth {
                    model = model.with_max_depth(depth);
                }
                model.fit(x, y).map_err(training_failed)?;
                Ok(FittedModel::RandomForestClassifier(model))
            }
            Algorithm::LogisticRegression => {
                let mut model = LogisticRegression::new(n_classes)
                    .with_max_iter(self.config.max_iter)
                    .with_learning_rate(self.config.learning_rate);
                model.fit(x, y).map_err(training_failed)?;
                Ok(FittedModel::LogisticRegression(model))
            }
            other => Err(ForgeError::TrainingFailed(format!(
                "{} is not a classifier",
                other
            ))),
        }
    }

    fn fit_regressor(
        &self,
        algorithm: Algorithm,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> Result<FittedModel> {
        match algorithm {
            Algorithm::RandomForestRegressor => {
                let mut model = RandomForest::new_regressor(self.config.n_estimators)
                    .with_random_state(self.config.random_state);
                if let Some(depth) = self.config.max_depth {
                    model = model.with_max_depth(depth);
                }
                model.fit(x, y).map_err(training_failed)?;
                Ok(FittedModel::RandomForestRegressor(model))
            }
            Algorithm::LinearRegression => {
                let mut model = LinearRegression::new();
                model.fit(x, y).map_err(training_failed)?;
                Ok(FittedModel::LinearRegression(model))
            }
            other => Err(ForgeError::TrainingFailed(format!(
                "{} is not a regressor",
                other
            ))),
        }
    }
}

fn training_failed(err: ForgeError) -> ForgeError {
    match err {
        ForgeError::TrainingFailed(_) => err,
        other => ForgeError::TrainingFailed(other.to_string()),
    }
}

fn labels(data: &ColumnData) -> Vec<Label> {
    (0..data.len()).filter_map(|i| data.label(i)).collect()
}

fn sorted_classes(data: &ColumnData) -> Vec<Label> {
    let mut classes = data.distinct();
    classes.sort_by(|a, b| a.total_cmp(b));
    classes
}

fn class_indices(data: &ColumnData, classes: &[Label]) -> Result<Array1<f64>> {
    labels(data)
        .iter()
        .map(|label| {
            classes
                .binary_search_by(|c| c.total_cmp(label))
                .map(|idx| idx as f64)
                .map_err(|_| ForgeError::TrainingFailed(format!("unknown class {}", label)))
        })
        .collect()
}

fn numeric_target(data: &ColumnData, target_col: &str, algorithm: Algorithm) -> Result<Array1<f64>> {
    let values = data.as_numeric().ok_or_else(|| {
        ForgeError::TrainingFailed(format!(
            "{} needs a numeric target, '{}' is {}",
            algorithm,
            target_col,
            data.kind()
        ))
    })?;
    Ok(values.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

fn as_numbers(values: &[Label], what: &str) -> Result<Vec<f64>> {
    values
        .iter()
        .map(|v| {
            v.as_f64().ok_or_else(|| {
                ForgeError::TrainingFailed(format!(
                    "regression metrics need numeric values, {} {} is not a number",
                    what, v
                ))
            })
        })
        .collect()
}
