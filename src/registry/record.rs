//! Immutable model metadata

use crate::training::{Algorithm, Metrics, ProblemType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata bound to one saved pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub model_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub metrics: Metrics,
    /// Raw feature columns consumed at prediction time, in order
    pub feature_names: Vec<String>,
    pub target_col: String,
    pub problem_type: ProblemType,
    pub algorithm: Algorithm,
}

impl ModelRecord {
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_round_trip() {
        let mut metrics = Metrics::new();
        metrics.insert("accuracy".to_string(), 0.5);
        let record = ModelRecord {
            model_id: Uuid::new_v4(),
            created_at: Utc::now(),
            metrics,
            feature_names: vec!["a".into(), "b".into()],
            target_col: "y".into(),
            problem_type: ProblemType::Classification,
            algorithm: Algorithm::RandomForestClassifier,
        };
        let json = record.to_json().unwrap();
        assert!(json.contains("\"rf_clf\""));
        assert_eq!(ModelRecord::from_json(&json).unwrap(), record);
    }
}
