//! Model training module
//!
//! Provides problem-type inference, the algorithm catalog and the trainer for:
//! - Random Forest classification and regression
//! - Logistic regression (multinomial)
//! - Linear regression (OLS)

mod algorithms;
mod config;
mod engine;
mod pipeline;
pub mod decision_tree;
pub mod linear_models;
pub mod metrics;
pub mod problem_type;
pub mod random_forest;

pub use algorithms::{recommend_algorithms, Algorithm, AlgorithmInfo};
pub use config::TrainingConfig;
pub use decision_tree::{DecisionTree, TreeNode};
pub use engine::{Split, Trainer};
pub use linear_models::{LinearRegression, LogisticRegression};
pub use metrics::Metrics;
pub use pipeline::{FittedModel, TrainedPipeline};
pub use problem_type::{ProblemType, CLASSIFICATION_CARDINALITY_THRESHOLD};
pub use random_forest::{MaxFeatures, RandomForest};
