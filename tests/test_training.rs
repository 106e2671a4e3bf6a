//! Integration test: problem-type inference and training end-to-end

use forgeml::config::EngineConfig;
use forgeml::error::{ErrorCategory, ForgeError};
use forgeml::table::{Column, ColumnData, Label, Table};
use forgeml::training::{recommend_algorithms, ProblemType, Trainer, TrainingConfig};

fn classification_table() -> Table {
    let f1: Vec<f64> = (0..30).map(|i| (i % 15) as f64 + 0.5 * (i / 15) as f64).collect();
    let f2: Vec<f64> = f1.iter().map(|v| 15.0 - v).collect();
    let city: Vec<Option<&str>> = (0..30)
        .map(|i| match i % 4 {
            0 => Some("paris"),
            1 => Some("berlin"),
            2 => None,
            _ => Some("rome"),
        })
        .collect();
    let target: Vec<f64> = f1.iter().map(|v| if *v < 7.5 { 0.0 } else { 1.0 }).collect();
    Table::new(vec![
        Column::from_f64("f1", &f1),
        Column::from_f64("f2", &f2),
        Column::from_opt_strs("city", &city),
        Column::from_f64("target", &target),
    ])
    .unwrap()
}

fn regression_table() -> Table {
    let x1: Vec<f64> = (1..=40).map(|i| i as f64).collect();
    let x2: Vec<f64> = (1..=40).map(|i| ((i * 13) % 7) as f64).collect();
    let target: Vec<f64> = x1.iter().zip(&x2).map(|(a, b)| 1.5 * a + 0.5 * b + 2.0).collect();
    Table::new(vec![
        Column::from_f64("x1", &x1),
        Column::from_f64("x2", &x2),
        Column::from_f64("target", &target),
    ])
    .unwrap()
}

fn trainer() -> Trainer {
    Trainer::new(TrainingConfig::default().with_n_estimators(20))
}

#[test]
fn test_inference_scenarios() {
    let t = Table::new(vec![Column::from_f64("y", &[0.0, 1.0, 0.0, 1.0, 0.0])]).unwrap();
    assert_eq!(ProblemType::infer(&t, Some("y")), ProblemType::Classification);

    let values: Vec<f64> = (1..=25).map(|i| i as f64 * 1.1).collect();
    let t = Table::new(vec![Column::from_f64("y", &values)]).unwrap();
    assert_eq!(ProblemType::infer(&t, Some("y")), ProblemType::Regression);
    assert_eq!(ProblemType::infer(&t, None), ProblemType::Unsupervised);
}

#[test]
fn test_inferred_type_drives_training() {
    let table = classification_table();
    let problem_type = ProblemType::infer(&table, Some("target"));
    assert_eq!(problem_type, ProblemType::Classification);

    for info in recommend_algorithms(problem_type) {
        let (metrics, pipeline) = trainer()
            .train(&table, "target", &info.id, problem_type)
            .unwrap();
        assert_eq!(metrics.keys().collect::<Vec<_>>(), vec!["accuracy", "f1"]);
        assert!(metrics["accuracy"] >= 0.5, "{}: {:?}", info.id, metrics);
        assert_eq!(
            pipeline.classes().unwrap(),
            &[Label::Number(0.0), Label::Number(1.0)]
        );
    }
}

#[test]
fn test_regression_algorithms() {
    let table = regression_table();
    let problem_type = ProblemType::infer(&table, Some("target"));
    assert_eq!(problem_type, ProblemType::Regression);

    let (metrics, _) = trainer()
        .train(&table, "target", "lin_reg", problem_type)
        .unwrap();
    assert_eq!(metrics.keys().collect::<Vec<_>>(), vec!["mean_absolute_error", "r2"]);
    assert!(metrics["r2"] > 0.999);

    let (metrics, pipeline) = trainer()
        .train(&table, "target", "rf_reg", problem_type)
        .unwrap();
    assert!(metrics["r2"] > 0.8, "{:?}", metrics);
    assert!(pipeline.classes().is_none());
}

#[test]
fn test_training_is_deterministic() {
    let table = classification_table();
    let run = || {
        trainer()
            .train(&table, "target", "rf_clf", ProblemType::Classification)
            .unwrap()
            .0
    };
    assert_eq!(run(), run());

    let table = regression_table();
    let run = || {
        trainer()
            .train(&table, "target", "rf_reg", ProblemType::Regression)
            .unwrap()
            .0
    };
    assert_eq!(run(), run());
}

#[test]
fn test_unseen_category_at_prediction() {
    let table = classification_table();
    let (_, pipeline) = trainer()
        .train(&table, "target", "log_reg", ProblemType::Classification)
        .unwrap();
    let rows = Table::new(vec![
        Column::from_f64("f1", &[1.0, 14.0]),
        Column::from_f64("f2", &[14.0, 1.0]),
        Column::from_strs("city", &["tokyo", "paris"]),
    ])
    .unwrap();
    let predictions = pipeline.predict(&rows).unwrap();
    assert_eq!(predictions, vec![Label::Number(0.0), Label::Number(1.0)]);
}

#[test]
fn test_failures_are_categorized() {
    let table = classification_table();
    let err = trainer()
        .train(&table, "target", "gbm", ProblemType::Classification)
        .unwrap_err();
    assert!(matches!(err, ForgeError::UnknownAlgorithm(_)));
    assert_eq!(err.category(), ErrorCategory::BadInput);

    let constant = Table::new(vec![
        Column::from_f64("x", &[1.0, 2.0, 3.0, 4.0]),
        Column::new("y", ColumnData::Numeric(vec![Some(1.0), Some(1.0), None, Some(1.0)])),
    ])
    .unwrap();
    let err = trainer()
        .train(&constant, "y", "rf_clf", ProblemType::Classification)
        .unwrap_err();
    assert!(matches!(err, ForgeError::TrainingFailed(_)));
    assert_eq!(err.category(), ErrorCategory::Internal);
}

#[test]
fn test_config_flows_into_trainer() {
    let engine = EngineConfig::new().with_random_state(7).with_test_size(0.25);
    let trainer = Trainer::new(TrainingConfig::from(&engine));
    let split = trainer.split(8).unwrap();
    assert_eq!(split.test.len(), 2);
    assert_eq!(split.train.len(), 6);
}
