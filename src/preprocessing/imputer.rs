//! Missing value imputation

use crate::table::{CellKey, ColumnData, Label};
use std::collections::HashMap;

/// Mean of the non-missing values
pub fn mean(values: &[Option<f64>]) -> Option<f64> {
    let (sum, count) = values
        .iter()
        .flatten()
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Median of the non-missing values (average of the middle two for even counts)
pub fn median(values: &[Option<f64>]) -> Option<f64> {
    let mut present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return None;
    }
    present.sort_by(|a, b| a.total_cmp(b));
    let mid = present.len() / 2;
    if present.len() % 2 == 0 {
        Some((present[mid - 1] + present[mid]) / 2.0)
    } else {
        Some(present[mid])
    }
}

/// Most common non-missing value; ties go to the value seen first
pub fn most_frequent(data: &ColumnData) -> Option<Label> {
    let mut counts: HashMap<CellKey<'_>, (usize, usize)> = HashMap::new();
    for row in 0..data.len() {
        let key = data.key(row);
        if key == CellKey::Missing {
            continue;
        }
        counts.entry(key).or_insert((0, row)).0 += 1;
    }
    counts
        .values()
        .max_by(|(ca, fa), (cb, fb)| ca.cmp(cb).then(fb.cmp(fa)))
        .and_then(|&(_, first_row)| data.label(first_row))
}

/// Replace missing cells with `value`.
///
/// The fill must match the column kind: numbers for numeric columns, booleans
/// for boolean columns. Categorical columns take any scalar as text.
pub fn fill(data: &ColumnData, value: &Label) -> std::result::Result<ColumnData, String> {
    match (data, value) {
        (ColumnData::Numeric(v), Label::Number(x)) => {
            Ok(ColumnData::Numeric(v.iter().map(|c| Some(c.unwrap_or(*x))).collect()))
        }
        (ColumnData::Boolean(v), Label::Bool(b)) => {
            Ok(ColumnData::Boolean(v.iter().map(|c| Some(c.unwrap_or(*b))).collect()))
        }
        (ColumnData::Categorical(v), value) => {
            let text = value.to_text();
            Ok(ColumnData::Categorical(
                v.iter()
                    .map(|c| Some(c.clone().unwrap_or_else(|| text.clone())))
                    .collect(),
            ))
        }
        (data, value) => Err(format!(
            "fill value {} cannot be used on a {} column",
            value.to_json(),
            data.kind()
        )),
    }
}
