//! Data preprocessing module
//!
//! Two users of the same building blocks:
//! - [`TransformEngine`]: applies a declarative step list (drop duplicates,
//!   drop column, impute, scale, encode) to a table and returns a new table
//! - [`FeaturePreprocessor`]: the fitted impute/scale/one-hot plan the trainer
//!   binds into every trained pipeline

mod column_transformer;
mod encoder;
mod engine;
mod imputer;
mod scaler;
mod step;

pub use column_transformer::FeaturePreprocessor;
pub use encoder::{label_encode, one_hot_columns, OneHotEncoder};
pub use engine::{PipelinePreview, TransformEngine};
pub use imputer::{mean, median, most_frequent};
pub use scaler::ScalerParams;
pub use step::{EncodeMethod, ImputeStrategy, ScaleMethod, StepSpec, TransformStep};
