//! Integration test: saving, loading and serving models from disk

use forgeml::error::ForgeError;
use forgeml::registry::{ArtifactKind, ArtifactStore, FsArtifactStore, ModelRegistry};
use forgeml::table::{Column, Label, Table};
use forgeml::training::{Metrics, ProblemType, TrainedPipeline, Trainer, TrainingConfig};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tempfile::tempdir;

/// Columns [a, b, c], target c
fn trained() -> (TrainedPipeline, Metrics) {
    let a: Vec<f64> = (0..24).map(|i| i as f64).collect();
    let b: Vec<&str> = (0..24).map(|i| if i % 3 == 0 { "x" } else { "y" }).collect();
    let c: Vec<&str> = (0..24).map(|i| if i < 12 { "small" } else { "large" }).collect();
    let table = Table::new(vec![
        Column::from_f64("a", &a),
        Column::from_strs("b", &b),
        Column::from_strs("c", &c),
    ])
    .unwrap();
    let (metrics, pipeline) = Trainer::new(TrainingConfig::default().with_n_estimators(15))
        .train(&table, "c", "rf_clf", ProblemType::Classification)
        .unwrap();
    (pipeline, metrics)
}

fn features() -> Vec<String> {
    vec!["a".to_string(), "b".to_string()]
}

fn rows(value: Value) -> Vec<Map<String, Value>> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_object().cloned().unwrap())
        .collect()
}

#[test]
fn test_round_trip_survives_reopen() {
    let dir = tempdir().unwrap();
    let (pipeline, metrics) = trained();
    let id = {
        let registry = ModelRegistry::open(dir.path()).unwrap();
        registry
            .save(&pipeline, metrics.clone(), features(), "c", ProblemType::Classification)
            .unwrap()
    };

    let registry = ModelRegistry::open(dir.path()).unwrap();
    let (loaded, record) = registry.load(&id.to_string()).unwrap();
    assert_eq!(record.model_id, id);
    assert_eq!(record.metrics, metrics);
    assert_eq!(record.feature_names, features());
    assert_eq!(record.target_col, "c");
    assert_eq!(record.problem_type, ProblemType::Classification);
    assert_eq!(loaded.classes(), pipeline.classes());
    assert_eq!(registry.metadata(&id.to_string()).unwrap(), record);
}

#[test]
fn test_predict_with_extra_and_reordered_fields() {
    let dir = tempdir().unwrap();
    let registry = ModelRegistry::open(dir.path()).unwrap();
    let (pipeline, metrics) = trained();
    let id = registry
        .save(&pipeline, metrics, features(), "c", ProblemType::Classification)
        .unwrap()
        .to_string();

    let result = registry
        .predict(
            &id,
            &rows(json!([
                {"d": "extra", "b": "x", "a": 1.0},
                {"a": 23, "b": "y"},
                {"b": null, "a": null}
            ])),
        )
        .unwrap();
    assert_eq!(result.predictions.len(), 3);
    assert_eq!(result.predictions[0], Label::Text("small".into()));
    assert_eq!(result.predictions[1], Label::Text("large".into()));

    let classes = result.classes.unwrap();
    assert_eq!(classes, vec![Label::Text("large".into()), Label::Text("small".into())]);
    for p in result.probabilities.unwrap() {
        assert_eq!(p.len(), classes.len());
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }
}

#[test]
fn test_regression_model_has_no_probabilities() {
    let x: Vec<f64> = (0..20).map(|i| i as f64).collect();
    let y: Vec<f64> = x.iter().map(|v| 2.0 * v + 1.0).collect();
    let table = Table::new(vec![Column::from_f64("x", &x), Column::from_f64("y", &y)]).unwrap();
    let (metrics, pipeline) = Trainer::default()
        .train(&table, "y", "lin_reg", ProblemType::Regression)
        .unwrap();

    let registry = ModelRegistry::in_memory();
    let id = registry
        .save(&pipeline, metrics, vec!["x".into()], "y", ProblemType::Regression)
        .unwrap()
        .to_string();
    let result = registry.predict(&id, &rows(json!([{"x": 10}]))).unwrap();
    assert!(result.probabilities.is_none());
    assert!(result.classes.is_none());
    assert!((result.predictions[0].as_f64().unwrap() - 21.0).abs() < 1e-6);

    let json = serde_json::to_value(&result).unwrap();
    assert!(json.get("probabilities").is_none());
}

#[test]
fn test_never_saved_id_is_not_found() {
    let dir = tempdir().unwrap();
    let registry = ModelRegistry::open(dir.path()).unwrap();
    let err = registry
        .predict("6f1c7b9e-3d0a-4c3e-9a51-2f8e1d4b7c10", &rows(json!([{"a": 1.0, "b": "x"}])))
        .unwrap_err();
    assert!(matches!(err, ForgeError::ModelNotFound(_)));
}

#[test]
fn test_malformed_row_rejects_whole_batch() {
    let registry = ModelRegistry::in_memory();
    let (pipeline, metrics) = trained();
    let id = registry
        .save(&pipeline, metrics, features(), "c", ProblemType::Classification)
        .unwrap()
        .to_string();

    let err = registry
        .predict(&id, &rows(json!([{"a": 1.0, "b": "x"}, {"a": [1, 2], "b": "x"}])))
        .unwrap_err();
    match err {
        ForgeError::PredictionInput(msg) => assert!(msg.contains("row 1"), "{}", msg),
        other => panic!("expected PredictionInput, got {:?}", other),
    }
}

#[test]
fn test_non_finite_metrics_are_rejected_before_writing() {
    let dir = tempdir().unwrap();
    let registry = ModelRegistry::open(dir.path()).unwrap();
    let (pipeline, mut metrics) = trained();
    metrics.insert("r2".to_string(), f64::NAN);

    let err = registry
        .save(&pipeline, metrics.clone(), features(), "c", ProblemType::Classification)
        .unwrap_err();
    assert!(matches!(err, ForgeError::Data(ref msg) if msg.contains("r2")), "{:?}", err);

    metrics.insert("r2".to_string(), f64::INFINITY);
    assert!(registry
        .save(&pipeline, metrics, features(), "c", ProblemType::Classification)
        .is_err());

    assert!(registry.list().unwrap().is_empty());
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[test]
fn test_feature_names_must_match_pipeline_columns() {
    let registry = ModelRegistry::in_memory();
    let (pipeline, metrics) = trained();

    for names in [
        vec!["a".to_string()],
        vec!["a".to_string(), "z".to_string()],
        vec!["a".to_string(), "b".to_string(), "c".to_string()],
        vec!["a".to_string(), "b".to_string(), "b".to_string()],
    ] {
        let err = registry
            .save(&pipeline, metrics.clone(), names.clone(), "c", ProblemType::Classification)
            .unwrap_err();
        assert!(matches!(err, ForgeError::Data(_)), "{:?} accepted: {:?}", names, err);
    }
    assert!(registry.list().unwrap().is_empty());

    // order does not matter
    let id = registry
        .save(
            &pipeline,
            metrics,
            vec!["b".to_string(), "a".to_string()],
            "c",
            ProblemType::Classification,
        )
        .unwrap()
        .to_string();
    let result = registry.predict(&id, &rows(json!([{"a": 1.0, "b": "x"}]))).unwrap();
    assert_eq!(result.predictions.len(), 1);
}

#[test]
fn test_metadata_is_commit_marker() {
    let dir = tempdir().unwrap();
    let store = Arc::new(FsArtifactStore::open(dir.path()).unwrap());
    let registry = ModelRegistry::new(store.clone());

    // a pipeline without metadata is invisible
    store
        .write("0b9d2f0e-8f6e-4a55-b3a1-7c2d9e4f5a61", ArtifactKind::Pipeline, b"partial")
        .unwrap();
    assert!(registry.list().unwrap().is_empty());
    assert!(registry
        .load("0b9d2f0e-8f6e-4a55-b3a1-7c2d9e4f5a61")
        .unwrap_err()
        .is_not_found());
}

#[test]
fn test_concurrent_saves_get_distinct_ids() {
    let dir = tempdir().unwrap();
    let registry = ModelRegistry::open(dir.path()).unwrap();
    let (pipeline, metrics) = trained();

    let ids: Vec<String> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let registry = registry.clone();
                let pipeline = &pipeline;
                let metrics = metrics.clone();
                s.spawn(move || {
                    registry
                        .save(pipeline, metrics, features(), "c", ProblemType::Classification)
                        .unwrap()
                        .to_string()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let mut listed = registry.list().unwrap();
    let mut expected = ids.clone();
    expected.sort();
    listed.sort();
    assert_eq!(listed, expected);
    for id in &ids {
        assert!(registry.load(id).is_ok());
    }
}
