//! Categorical encoders

use crate::table::{Column, ColumnData};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Replace each value (as text) with an integer code in order of first appearance
pub fn label_encode(data: &ColumnData) -> ColumnData {
    let mut codes: HashMap<String, usize> = HashMap::new();
    let encoded = (0..data.len())
        .map(|row| {
            data.text(row).map(|text| {
                let next = codes.len();
                *codes.entry(text).or_insert(next) as f64
            })
        })
        .collect();
    ColumnData::Numeric(encoded)
}

/// Indicator columns for one source column, dropping the lowest sorted value
/// as the reference when there are at least two distinct values.
///
/// Missing cells produce all-zero rows. A column with no values yields no
/// indicators.
pub fn one_hot_columns(name: &str, data: &ColumnData) -> Vec<Column> {
    let mut categories = data.distinct();
    categories.sort_by(|a, b| a.total_cmp(b));
    let kept = if categories.len() >= 2 {
        &categories[1..]
    } else {
        &categories[..]
    };

    let texts: Vec<Option<String>> = (0..data.len()).map(|row| data.text(row)).collect();
    kept.iter()
        .map(|category| {
            let target = category.to_text();
            let values = texts
                .iter()
                .map(|t| Some(if t.as_deref() == Some(target.as_str()) { 1.0 } else { 0.0 }))
                .collect();
            Column::new(format!("{}_{}", name, target), ColumnData::Numeric(values))
        })
        .collect()
}

/// Fitted one-hot encoder over text categories.
///
/// Unlike [`one_hot_columns`] every category gets a column, and values not
/// seen during fit map to all zeros.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    categories: Vec<String>,
}

impl OneHotEncoder {
    /// Fit on text values; categories are sorted
    pub fn fit(values: &[String]) -> Self {
        let mut categories: Vec<String> = values.to_vec();
        categories.sort();
        categories.dedup();
        Self { categories }
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn width(&self) -> usize {
        self.categories.len()
    }

    /// Write the indicator for `value` into `out`, which must be `width()` long
    pub fn encode_into(&self, value: &str, out: &mut [f64]) {
        out.iter_mut().for_each(|v| *v = 0.0);
        if let Ok(idx) = self.categories.binary_search_by(|c| c.as_str().cmp(value)) {
            out[idx] = 1.0;
        }
    }

    /// Output feature names, `<column>_<category>`
    pub fn feature_names(&self, column: &str) -> Vec<String> {
        self.categories
            .iter()
            .map(|c| format!("{}_{}", column, c))
            .collect()
    }
}
