//! Declarative transform steps
//!
//! Steps arrive as `{type, action, params}` objects ([`StepSpec`]) and are
//! validated once into the typed [`TransformStep`] before anything runs.

use crate::error::{ForgeError, Result};
use crate::table::Label;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One step exactly as it appears on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSpec {
    /// `"cleaning"` or `"preprocessing"`. Absent fields parse as empty and
    /// the step is treated as unrecognized.
    #[serde(rename = "type", default)]
    pub category: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl StepSpec {
    pub fn new(category: impl Into<String>, action: impl Into<String>, params: Value) -> Self {
        Self {
            category: category.into(),
            action: action.into(),
            params: match params {
                Value::Object(map) => map,
                _ => Map::new(),
            },
        }
    }
}

/// Fill strategy for `cleaning/impute`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputeStrategy {
    Mean,
    Median,
    MostFrequent,
    Constant,
}

/// Method for `preprocessing/scale`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleMethod {
    Standard,
    MinMax,
}

/// Method for `preprocessing/encode`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodeMethod {
    Label,
    OneHot,
}

/// A validated transform step
#[derive(Debug, Clone, PartialEq)]
pub enum TransformStep {
    DropDuplicates,
    DropColumn {
        column: String,
    },
    Impute {
        column: String,
        strategy: ImputeStrategy,
        fill_value: Option<Label>,
    },
    Scale {
        columns: Vec<String>,
        method: ScaleMethod,
    },
    Encode {
        columns: Vec<String>,
        method: EncodeMethod,
    },
    /// A `(category, action)` pair this engine does not know; applying it
    /// leaves the table unchanged
    Unrecognized {
        category: String,
        action: String,
    },
}

impl TransformStep {
    /// Validate a wire step. `index` is the step's position, used in errors.
    pub fn parse(index: usize, spec: &StepSpec) -> Result<Self> {
        let p = Params {
            index,
            action: &spec.action,
            params: &spec.params,
        };

        let step = match (spec.category.as_str(), spec.action.as_str()) {
            ("cleaning", "drop_duplicates") => TransformStep::DropDuplicates,
            ("cleaning", "drop_column") => TransformStep::DropColumn {
                column: p.required_str("column")?,
            },
            ("cleaning", "impute") => {
                let strategy = match p.optional_str("strategy")?.as_deref() {
                    None | Some("mean") => ImputeStrategy::Mean,
                    Some("median") => ImputeStrategy::Median,
                    Some("most_frequent") => ImputeStrategy::MostFrequent,
                    Some("constant") => ImputeStrategy::Constant,
                    Some(other) => return Err(p.invalid(format!("unknown strategy '{}'", other))),
                };
                TransformStep::Impute {
                    column: p.required_str("column")?,
                    strategy,
                    fill_value: p.fill_value()?,
                }
            }
            ("preprocessing", "scale") => {
                let method = match p.optional_str("method")?.as_deref() {
                    None | Some("standard") => ScaleMethod::Standard,
                    Some("minmax") => ScaleMethod::MinMax,
                    Some(other) => return Err(p.invalid(format!("unknown method '{}'", other))),
                };
                TransformStep::Scale {
                    columns: p.columns()?,
                    method,
                }
            }
            ("preprocessing", "encode") => {
                let method = match p.optional_str("method")?.as_deref() {
                    None | Some("label") => EncodeMethod::Label,
                    Some("onehot") => EncodeMethod::OneHot,
                    Some(other) => return Err(p.invalid(format!("unknown method '{}'", other))),
                };
                TransformStep::Encode {
                    columns: p.columns()?,
                    method,
                }
            }
            (category, action) => TransformStep::Unrecognized {
                category: category.to_string(),
                action: action.to_string(),
            },
        };
        Ok(step)
    }

    /// Validate a whole step list, failing on the first bad step
    pub fn parse_all(specs: &[StepSpec]) -> Result<Vec<Self>> {
        specs
            .iter()
            .enumerate()
            .map(|(i, spec)| Self::parse(i, spec))
            .collect()
    }

    /// Short name for logs and errors
    pub fn action(&self) -> &str {
        match self {
            TransformStep::DropDuplicates => "drop_duplicates",
            TransformStep::DropColumn { .. } => "drop_column",
            TransformStep::Impute { .. } => "impute",
            TransformStep::Scale { .. } => "scale",
            TransformStep::Encode { .. } => "encode",
            TransformStep::Unrecognized { action, .. } => action,
        }
    }
}

struct Params<'a> {
    index: usize,
    action: &'a str,
    params: &'a Map<String, Value>,
}

impl Params<'_> {
    fn invalid(&self, reason: String) -> ForgeError {
        ForgeError::invalid_step(self.index, self.action, reason)
    }

    fn optional_str(&self, key: &str) -> Result<Option<String>> {
        match self.params.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(self.invalid(format!("'{}' must be a string, got {}", key, other))),
        }
    }

    fn required_str(&self, key: &str) -> Result<String> {
        self.optional_str(key)?
            .ok_or_else(|| self.invalid(format!("missing required parameter '{}'", key)))
    }

    /// `columns` as a list of names; a bare string is one column, absent is none
    fn columns(&self) -> Result<Vec<String>> {
        match self.params.get("columns") {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::String(s)) => Ok(vec![s.clone()]),
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| {
                    v.as_str().map(str::to_string).ok_or_else(|| {
                        self.invalid(format!("'columns' entries must be strings, got {}", v))
                    })
                })
                .collect(),
            Some(other) => Err(self.invalid(format!("'columns' must be a list, got {}", other))),
        }
    }

    fn fill_value(&self) -> Result<Option<Label>> {
        match self.params.get("fill_value") {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(Label::Bool(*b))),
            Some(Value::Number(n)) => n
                .as_f64()
                .map(|v| Some(Label::Number(v)))
                .ok_or_else(|| self.invalid(format!("'fill_value' {} is not representable", n))),
            Some(Value::String(s)) => Ok(Some(Label::Text(s.clone()))),
            Some(other) => Err(self.invalid(format!("'fill_value' must be a scalar, got {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_format() {
        let specs: Vec<StepSpec> = serde_json::from_value(json!([
            {"type": "cleaning", "action": "drop_duplicates"},
            {"type": "cleaning", "action": "impute", "params": {"column": "age", "strategy": "median"}},
            {"type": "preprocessing", "action": "encode", "params": {"columns": ["color"], "method": "onehot"}}
        ]))
        .unwrap();
        let steps = TransformStep::parse_all(&specs).unwrap();
        assert_eq!(steps[0], TransformStep::DropDuplicates);
        assert_eq!(
            steps[1],
            TransformStep::Impute {
                column: "age".into(),
                strategy: ImputeStrategy::Median,
                fill_value: None,
            }
        );
        assert_eq!(
            steps[2],
            TransformStep::Encode {
                columns: vec!["color".into()],
                method: EncodeMethod::OneHot,
            }
        );
    }

    #[test]
    fn test_defaults() {
        let scale = StepSpec::new("preprocessing", "scale", json!({"columns": "x"}));
        assert_eq!(
            TransformStep::parse(0, &scale).unwrap(),
            TransformStep::Scale {
                columns: vec!["x".into()],
                method: ScaleMethod::Standard,
            }
        );
        let impute = StepSpec::new("cleaning", "impute", json!({"column": "x"}));
        assert!(matches!(
            TransformStep::parse(0, &impute).unwrap(),
            TransformStep::Impute { strategy: ImputeStrategy::Mean, .. }
        ));
    }

    #[test]
    fn test_unknown_pair_is_unrecognized() {
        let spec = StepSpec::new("cleaning", "sparkle", json!({"anything": [1, 2]}));
        assert_eq!(
            TransformStep::parse(0, &spec).unwrap(),
            TransformStep::Unrecognized {
                category: "cleaning".into(),
                action: "sparkle".into(),
            }
        );
        let spec = StepSpec::new("feature_engineering", "scale", json!({}));
        assert!(matches!(
            TransformStep::parse(0, &spec).unwrap(),
            TransformStep::Unrecognized { .. }
        ));
    }

    #[test]
    fn test_bad_params_are_errors() {
        let bad_strategy = StepSpec::new("cleaning", "impute", json!({"column": "a", "strategy": "mode"}));
        let err = TransformStep::parse(3, &bad_strategy).unwrap_err();
        assert!(matches!(err, ForgeError::InvalidStep { index: 3, .. }));

        let missing_column = StepSpec::new("cleaning", "drop_column", json!({}));
        assert!(TransformStep::parse(0, &missing_column).is_err());

        let bad_columns = StepSpec::new("preprocessing", "encode", json!({"columns": [1, 2]}));
        assert!(TransformStep::parse(0, &bad_columns).is_err());

        let bad_fill = StepSpec::new(
            "cleaning",
            "impute",
            json!({"column": "a", "strategy": "constant", "fill_value": {"x": 1}}),
        );
        assert!(TransformStep::parse(0, &bad_fill).is_err());
    }
}
