//! Fitted preprocessing + model unit

use super::algorithms::Algorithm;
use super::decision_tree::argmax;
use super::linear_models::{LinearRegression, LogisticRegression};
use super::random_forest::RandomForest;
use crate::error::{ForgeError, Result};
use crate::preprocessing::FeaturePreprocessor;
use crate::table::{Field, Label, Table};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Enum to hold the fitted model variants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FittedModel {
    RandomForestClassifier(RandomForest),
    LogisticRegression(LogisticRegression),
    RandomForestRegressor(RandomForest),
    LinearRegression(LinearRegression),
}

impl FittedModel {
    /// Class indices for classifiers, values for regressors
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            FittedModel::RandomForestClassifier(m) | FittedModel::RandomForestRegressor(m) => {
                m.predict(x)
            }
            FittedModel::LogisticRegression(m) => m.predict(x),
            FittedModel::LinearRegression(m) => m.predict(x),
        }
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Option<Array2<f64>>> {
        match self {
            FittedModel::RandomForestClassifier(m) => m.predict_proba(x).map(Some),
            FittedModel::LogisticRegression(m) => m.predict_proba(x).map(Some),
            FittedModel::RandomForestRegressor(_) | FittedModel::LinearRegression(_) => Ok(None),
        }
    }

    pub fn supports_proba(&self) -> bool {
        matches!(
            self,
            FittedModel::RandomForestClassifier(_) | FittedModel::LogisticRegression(_)
        )
    }
}

/// Preprocessor and model fitted together on one training partition.
///
/// Classifiers carry their sorted class labels; model outputs are class
/// indices into that list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedPipeline {
    preprocessor: FeaturePreprocessor,
    model: FittedModel,
    #[serde(with = "tagged_labels")]
    classes: Option<Vec<Label>>,
    algorithm: Algorithm,
}

impl TrainedPipeline {
    pub(crate) fn new(
        preprocessor: FeaturePreprocessor,
        model: FittedModel,
        classes: Option<Vec<Label>>,
        algorithm: Algorithm,
    ) -> Self {
        Self {
            preprocessor,
            model,
            classes,
            algorithm,
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn preprocessor(&self) -> &FeaturePreprocessor {
        &self.preprocessor
    }

    pub fn model(&self) -> &FittedModel {
        &self.model
    }

    /// Class labels in probability-column order (classifiers only)
    pub fn classes(&self) -> Option<&[Label]> {
        self.classes.as_deref()
    }

    /// Raw feature columns the pipeline consumes, in training order
    pub fn input_schema(&self) -> &[Field] {
        self.preprocessor.input_schema()
    }

    /// One prediction per row of `x`
    pub fn predict(&self, x: &Table) -> Result<Vec<Label>> {
        let features = self.preprocessor.transform(x)?;
        let raw = self.model.predict(&features)?;
        match &self.classes {
            Some(classes) => raw
                .iter()
                .map(|&idx| {
                    classes.get(idx as usize).cloned().ok_or_else(|| {
                        ForgeError::Data(format!(
                            "model produced class index {} but only {} classes are known",
                            idx,
                            classes.len()
                        ))
                    })
                })
                .collect(),
            None => Ok(raw.iter().map(|&v| Label::Number(v)).collect()),
        }
    }

    /// Class probabilities, one row per input row, or `None` when the model
    /// has no probability output
    pub fn predict_proba(&self, x: &Table) -> Result<Option<Array2<f64>>> {
        if !self.model.supports_proba() {
            return Ok(None);
        }
        let features = self.preprocessor.transform(x)?;
        self.model.predict_proba(&features)
    }

    /// Predictions and probabilities from a single preprocessing pass
    pub fn predict_with_proba(&self, x: &Table) -> Result<(Vec<Label>, Option<Array2<f64>>)> {
        let Some(classes) = &self.classes else {
            return Ok((self.predict(x)?, None));
        };
        let features = self.preprocessor.transform(x)?;
        match self.model.predict_proba(&features)? {
            Some(proba) => {
                let predictions = proba
                    .rows()
                    .into_iter()
                    .map(|row| {
                        let idx = argmax(&row.to_vec());
                        classes.get(idx).cloned().ok_or_else(|| {
                            ForgeError::Data(format!("no class label for index {}", idx))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok((predictions, Some(proba)))
            }
            None => Ok((self.predict(x)?, None)),
        }
    }
}

/// Class labels are stored with an explicit variant tag so the binary
/// encoding does not rely on self-describing input.
mod tagged_labels {
    use crate::table::Label;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    enum Tagged {
        Bool(bool),
        Number(f64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(
        labels: &Option<Vec<Label>>,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        let tagged: Option<Vec<Tagged>> = labels.as_ref().map(|labels| {
            labels
                .iter()
                .map(|label| match label {
                    Label::Bool(b) => Tagged::Bool(*b),
                    Label::Number(v) => Tagged::Number(*v),
                    Label::Text(s) => Tagged::Text(s.clone()),
                })
                .collect()
        });
        tagged.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Option<Vec<Label>>, D::Error> {
        let tagged = Option::<Vec<Tagged>>::deserialize(deserializer)?;
        Ok(tagged.map(|labels| {
            labels
                .into_iter()
                .map(|t| match t {
                    Tagged::Bool(b) => Label::Bool(b),
                    Tagged::Number(v) => Label::Number(v),
                    Tagged::Text(s) => Label::Text(s),
                })
                .collect()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;

    fn fitted() -> (TrainedPipeline, Table) {
        let x = Table::new(vec![
            Column::from_f64("x", &[-2.0, -1.5, -1.0, 1.0, 1.5, 2.0]),
            Column::from_strs("c", &["a", "a", "b", "b", "a", "b"]),
        ])
        .unwrap();
        let y = Array1::from(vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
        let (pre, features) = FeaturePreprocessor::fit_transform(&x).unwrap();
        let mut model = LogisticRegression::new(2);
        model.fit(&features, &y).unwrap();
        let pipeline = TrainedPipeline::new(
            pre,
            FittedModel::LogisticRegression(model),
            Some(vec![Label::Text("no".into()), Label::Text("yes".into())]),
            Algorithm::LogisticRegression,
        );
        (pipeline, x)
    }

    #[test]
    fn test_predict_maps_classes() {
        let (pipeline, x) = fitted();
        let pred = pipeline.predict(&x).unwrap();
        assert_eq!(pred[0], Label::Text("no".into()));
        assert_eq!(pred[5], Label::Text("yes".into()));

        let (with_proba, proba) = pipeline.predict_with_proba(&x).unwrap();
        assert_eq!(with_proba, pred);
        assert_eq!(proba.unwrap().dim(), (6, 2));
    }

    #[test]
    fn test_bincode_round_trip() {
        let (pipeline, x) = fitted();
        let bytes = bincode::serialize(&pipeline).unwrap();
        let restored: TrainedPipeline = bincode::deserialize(&bytes).unwrap();
        assert_eq!(restored.classes(), pipeline.classes());
        assert_eq!(restored.predict(&x).unwrap(), pipeline.predict(&x).unwrap());
    }

    #[test]
    fn test_regressor_has_no_proba() {
        let x = Table::new(vec![Column::from_f64("x", &[1.0, 2.0, 3.0, 4.0])]).unwrap();
        let (pre, features) = FeaturePreprocessor::fit_transform(&x).unwrap();
        let mut model = LinearRegression::new();
        model
            .fit(&features, &Array1::from(vec![2.0, 4.0, 6.0, 8.0]))
            .unwrap();
        let pipeline = TrainedPipeline::new(
            pre,
            FittedModel::LinearRegression(model),
            None,
            Algorithm::LinearRegression,
        );
        assert!(pipeline.predict_proba(&x).unwrap().is_none());
        let pred = pipeline.predict(&x).unwrap();
        assert!((pred[2].as_f64().unwrap() - 6.0).abs() < 1e-9);
    }
}
