//! forgeml - declarative tabular transforms and a persisted model lifecycle
//!
//! # Modules
//!
//! - [`table`] - Typed in-memory columnar table and JSON row conversion
//! - [`preprocessing`] - Transform engine for `{type, action, params}` step lists
//!   and the fitted feature preprocessor used for training
//! - [`training`] - Problem-type inference, algorithm catalog, trainer and models
//! - [`registry`] - Saving, loading and serving trained pipelines
//! - [`profile`] - Dataset profiling
//! - [`insights`] - Best-effort insight text from a profile
//! - [`utils`] - CSV/JSON/Parquet loading through polars
//! - [`cli`] - Command-line host
//!
//! # Example
//!
//! ```no_run
//! use forgeml::prelude::*;
//!
//! # fn main() -> forgeml::error::Result<()> {
//! let table = DataLoader::new().load_table("data.csv")?;
//! let steps: Vec<StepSpec> = serde_json::from_str(
//!     r#"[{"type": "cleaning", "action": "drop_duplicates", "params": {}}]"#,
//! )?;
//! let table = TransformEngine::new().apply(&table, &steps)?;
//!
//! let problem_type = ProblemType::infer(&table, Some("label"));
//! let (metrics, pipeline) = Trainer::default().train(&table, "label", "rf_clf", problem_type)?;
//!
//! let registry = ModelRegistry::open("models")?;
//! let features = table.column_names().into_iter().filter(|c| *c != "label").map(String::from).collect();
//! let model_id = registry.save(&pipeline, metrics, features, "label", problem_type)?;
//! # let _ = model_id;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod insights;
pub mod preprocessing;
pub mod profile;
pub mod registry;
pub mod table;
pub mod training;
pub mod utils;

pub use error::{ForgeError, Result};

/// Commonly used types
pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::error::{ErrorCategory, ForgeError, Result};
    pub use crate::insights::{generate_or_fallback, HeuristicInsights, InsightGenerator};
    pub use crate::preprocessing::{StepSpec, TransformEngine, TransformStep};
    pub use crate::profile::{profile, Profile};
    pub use crate::registry::{ModelRecord, ModelRegistry, PredictionResult};
    pub use crate::table::{Column, ColumnData, ColumnKind, Label, Table};
    pub use crate::training::{
        recommend_algorithms, Algorithm, Metrics, ProblemType, TrainedPipeline, Trainer,
        TrainingConfig,
    };
    pub use crate::utils::{DataLoader, DataSaver};
}
