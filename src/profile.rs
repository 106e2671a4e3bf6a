//! Dataset profiling
//!
//! Summary statistics over a [`Table`] used for display and as input to
//! insight generation.

use crate::table::{ColumnData, ColumnKind, Table};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Whole-table summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub rows: usize,
    pub cols: usize,
    pub missing_cells: usize,
    /// Percentage (0-100) of all cells that are missing
    pub missing_cells_pct: f64,
    /// Rows that repeat an earlier row exactly
    pub duplicate_rows: usize,
    pub columns: Vec<ColumnProfile>,
}

/// Per-column summary. Numeric statistics are `None` for non-numeric columns
/// and for numeric columns without values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub kind: ColumnKind,
    /// Distinct non-missing values
    pub unique: usize,
    pub missing: usize,
    pub missing_pct: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    /// Sample standard deviation (ddof = 1)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub std: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl Profile {
    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|c| c.name == name)
    }
}

fn pct(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Profile every column of `table`
pub fn profile(table: &Table) -> Profile {
    let rows = table.n_rows();
    let columns: Vec<ColumnProfile> = table
        .columns()
        .iter()
        .map(|col| {
            let data = col.data();
            let missing = data.null_count();
            let mut summary = ColumnProfile {
                name: col.name().to_string(),
                kind: col.kind(),
                unique: data.n_unique(),
                missing,
                missing_pct: pct(missing, rows),
                mean: None,
                std: None,
                min: None,
                max: None,
            };
            if let ColumnData::Numeric(values) = data {
                numeric_stats(values, &mut summary);
            }
            summary
        })
        .collect();

    let missing_cells: usize = columns.iter().map(|c| c.missing).sum();
    let mut seen = HashSet::with_capacity(rows);
    let duplicate_rows = (0..rows).filter(|&i| !seen.insert(table.row_key(i))).count();

    Profile {
        rows,
        cols: table.n_cols(),
        missing_cells,
        missing_cells_pct: pct(missing_cells, rows * table.n_cols()),
        duplicate_rows,
        columns,
    }
}

fn numeric_stats(values: &[Option<f64>], summary: &mut ColumnProfile) {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return;
    }
    let n = present.len() as f64;
    let mean = present.iter().sum::<f64>() / n;
    summary.mean = Some(mean);
    summary.std = if present.len() > 1 {
        let ss: f64 = present.iter().map(|v| (v - mean).powi(2)).sum();
        Some((ss / (n - 1.0)).sqrt())
    } else {
        None
    };
    summary.min = present.iter().copied().reduce(f64::min);
    summary.max = present.iter().copied().reduce(f64::max);
}
