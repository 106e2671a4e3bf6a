//! Cell-level values: labels, text rendering and hashable row keys

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A single non-missing cell value.
///
/// Used for class labels, categories and prediction outputs. Serializes as the
/// plain JSON scalar (`true`, `3.5`, `"red"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Label {
    /// Numeric view of the label, if it is a number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Label::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Text rendering used when values are coerced to categories
    pub fn to_text(&self) -> String {
        match self {
            Label::Bool(b) => b.to_string(),
            Label::Number(v) => format_number(*v),
            Label::Text(s) => s.clone(),
        }
    }

    /// Convert into a JSON scalar
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Label::Bool(b) => serde_json::Value::Bool(*b),
            Label::Number(v) => serde_json::Number::from_f64(*v)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Label::Text(s) => serde_json::Value::String(s.clone()),
        }
    }

    /// Total order: booleans, then numbers, then text
    pub fn total_cmp(&self, other: &Label) -> Ordering {
        fn rank(label: &Label) -> u8 {
            match label {
                Label::Bool(_) => 0,
                Label::Number(_) => 1,
                Label::Text(_) => 2,
            }
        }
        match (self, other) {
            (Label::Bool(a), Label::Bool(b)) => a.cmp(b),
            (Label::Number(a), Label::Number(b)) => a.total_cmp(b),
            (Label::Text(a), Label::Text(b)) => a.cmp(b),
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// Render a float the way a category name should read: `3` rather than `3.0`.
pub fn format_number(v: f64) -> String {
    if v == 0.0 {
        "0".to_string()
    } else {
        format!("{}", v)
    }
}

/// Hashable identity of one cell, used for duplicate detection.
///
/// Missing equals missing and `-0.0` equals `0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKey<'a> {
    Missing,
    Number(u64),
    Text(&'a str),
    Bool(bool),
}

impl CellKey<'_> {
    pub fn number(v: f64) -> Self {
        let v = if v == 0.0 { 0.0 } else { v };
        CellKey::Number(v.to_bits())
    }
}
