//! Model registry
//!
//! Persists fitted pipelines with their metadata under generated ids, loads
//! them back and serves predictions against new rows.

mod envelope;
mod record;
mod store;

pub use envelope::Envelope;
pub use record::ModelRecord;
pub use store::{ArtifactKind, ArtifactStore, FsArtifactStore, MemoryArtifactStore};

use crate::config::EngineConfig;
use crate::error::{ForgeError, Result};
use crate::table::{Field, Label, Table};
use crate::training::{Metrics, ProblemType, TrainedPipeline};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Response of [`ModelRegistry::predict`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// One per input row, in input order
    pub predictions: Vec<Label>,
    /// One vector per row, columns ordered as `classes`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probabilities: Option<Vec<Vec<f64>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classes: Option<Vec<Label>>,
}

/// Registry over an injected [`ArtifactStore`]
#[derive(Clone)]
pub struct ModelRegistry {
    store: Arc<dyn ArtifactStore>,
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry").finish_non_exhaustive()
    }
}

impl ModelRegistry {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self { store }
    }

    /// Filesystem-backed registry rooted at `dir`
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(Arc::new(FsArtifactStore::open(dir)?)))
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        Self::open(&config.models_dir)
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryArtifactStore::new()))
    }

    /// Persist `pipeline` with its metadata under a fresh id.
    ///
    /// The pipeline is written first and the metadata last, so a record is
    /// only ever visible once its pipeline is complete. Non-finite metrics and
    /// feature names that differ from the pipeline's input columns are
    /// rejected with `Data` before anything is written.
    pub fn save(
        &self,
        pipeline: &TrainedPipeline,
        metrics: Metrics,
        feature_names: Vec<String>,
        target_col: &str,
        problem_type: ProblemType,
    ) -> Result<Uuid> {
        check_metrics(&metrics)?;
        check_feature_names(pipeline, &feature_names)?;

        let mut model_id = Uuid::new_v4();
        while self.is_taken(&model_id)? {
            model_id = Uuid::new_v4();
        }
        let key = model_id.to_string();

        let record = ModelRecord {
            model_id,
            created_at: Utc::now(),
            metrics,
            feature_names,
            target_col: target_col.to_string(),
            problem_type,
            algorithm: pipeline.algorithm(),
        };

        let bytes = envelope::seal(pipeline)?;
        self.store.write(&key, ArtifactKind::Pipeline, &bytes)?;
        self.store
            .write(&key, ArtifactKind::Metadata, record.to_json()?.as_bytes())?;

        info!(
            model_id = %model_id,
            algorithm = %record.algorithm,
            bytes = bytes.len(),
            "Saved model"
        );
        Ok(model_id)
    }

    fn is_taken(&self, id: &Uuid) -> Result<bool> {
        let key = id.to_string();
        Ok(self.store.exists(&key, ArtifactKind::Metadata)?
            || self.store.exists(&key, ArtifactKind::Pipeline)?)
    }

    /// Metadata only
    pub fn metadata(&self, model_id: &str) -> Result<ModelRecord> {
        let key = normalize_id(model_id)?;
        let bytes = self
            .store
            .read(&key, ArtifactKind::Metadata)?
            .ok_or_else(|| ForgeError::ModelNotFound(model_id.to_string()))?;
        let json = std::str::from_utf8(&bytes)
            .map_err(|e| ForgeError::CorruptArtifact(format!("metadata is not UTF-8: {}", e)))?;
        ModelRecord::from_json(json)
            .map_err(|e| ForgeError::CorruptArtifact(format!("unreadable metadata: {}", e)))
    }

    pub fn load(&self, model_id: &str) -> Result<(TrainedPipeline, ModelRecord)> {
        let record = self.metadata(model_id)?;
        let bytes = self
            .store
            .read(&record.model_id.to_string(), ArtifactKind::Pipeline)?
            .ok_or_else(|| {
                ForgeError::CorruptArtifact(format!("pipeline missing for model {}", model_id))
            })?;
        let pipeline: TrainedPipeline = envelope::open(&bytes)?;
        debug!(model_id = %record.model_id, "Loaded model");
        Ok((pipeline, record))
    }

    /// Ids of every saved model, sorted
    pub fn list(&self) -> Result<Vec<String>> {
        let mut ids = self.store.keys(ArtifactKind::Metadata)?;
        ids.retain(|id| Uuid::parse_str(id).is_ok());
        ids.sort();
        Ok(ids)
    }

    /// Predict for `rows`, consuming only the model's declared features.
    ///
    /// Extra fields are ignored. A missing feature or a value of the wrong
    /// JSON type fails the whole call.
    pub fn predict(&self, model_id: &str, rows: &[Map<String, Value>]) -> Result<PredictionResult> {
        let (pipeline, record) = self.load(model_id)?;
        let schema = aligned_schema(&pipeline, &record)?;
        let table = Table::from_records_with_schema(rows, &schema)?;

        let with_proba = record.problem_type == ProblemType::Classification
            && pipeline.model().supports_proba();

        let result = if with_proba {
            let (predictions, proba) = pipeline.predict_with_proba(&table)?;
            PredictionResult {
                predictions,
                probabilities: proba
                    .map(|p| p.rows().into_iter().map(|row| row.to_vec()).collect()),
                classes: pipeline.classes().map(|c| c.to_vec()),
            }
        } else {
            PredictionResult {
                predictions: pipeline.predict(&table)?,
                probabilities: None,
                classes: None,
            }
        };

        debug!(model_id = %record.model_id, rows = rows.len(), "Served predictions");
        Ok(result)
    }
}

/// Feature schema in the record's feature order
fn aligned_schema(pipeline: &TrainedPipeline, record: &ModelRecord) -> Result<Vec<Field>> {
    let schema = pipeline.input_schema();
    record
        .feature_names
        .iter()
        .map(|name| {
            schema
                .iter()
                .find(|f| &f.name == name)
                .cloned()
                .ok_or_else(|| {
                    ForgeError::CorruptArtifact(format!(
                        "feature '{}' is not consumed by the stored pipeline",
                        name
                    ))
                })
        })
        .collect()
}

/// Non-finite values have no JSON form
fn check_metrics(metrics: &Metrics) -> Result<()> {
    match metrics.iter().find(|(_, value)| !value.is_finite()) {
        Some((name, value)) => Err(ForgeError::Data(format!(
            "metric '{}' is not finite ({})",
            name, value
        ))),
        None => Ok(()),
    }
}

/// The saved feature names must cover exactly the columns the pipeline was fitted on
fn check_feature_names(pipeline: &TrainedPipeline, feature_names: &[String]) -> Result<()> {
    let expected: BTreeSet<&str> = pipeline
        .input_schema()
        .iter()
        .map(|field| field.name.as_str())
        .collect();
    let given: BTreeSet<&str> = feature_names.iter().map(String::as_str).collect();
    if given != expected || given.len() != feature_names.len() {
        return Err(ForgeError::Data(format!(
            "feature names {:?} do not match the pipeline's input columns {:?}",
            feature_names, expected
        )));
    }
    Ok(())
}

/// Canonical hyphenated form, or `ModelNotFound` for anything that is not a UUID
fn normalize_id(model_id: &str) -> Result<String> {
    Uuid::parse_str(model_id.trim())
        .map(|id| id.to_string())
        .map_err(|_| ForgeError::ModelNotFound(model_id.to_string()))
}
