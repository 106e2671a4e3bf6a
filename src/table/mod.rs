//! Typed, column-oriented in-memory table
//!
//! Every column carries one of a small closed set of semantic kinds, fixed at
//! construction time. Row counts are validated once in [`Table::new`].

mod records;
mod value;

pub use records::Field;
pub use value::{format_number, CellKey, Label};

use crate::error::{ForgeError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Semantic kind of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Categorical,
    Boolean,
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnKind::Numeric => write!(f, "numeric"),
            ColumnKind::Categorical => write!(f, "categorical"),
            ColumnKind::Boolean => write!(f, "boolean"),
        }
    }
}

/// Column values. `None` is a missing cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Categorical(Vec<Option<String>>),
    Boolean(Vec<Option<bool>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Categorical(v) => v.len(),
            ColumnData::Boolean(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            ColumnData::Numeric(_) => ColumnKind::Numeric,
            ColumnData::Categorical(_) => ColumnKind::Categorical,
            ColumnData::Boolean(_) => ColumnKind::Boolean,
        }
    }

    pub fn is_missing(&self, row: usize) -> bool {
        match self {
            ColumnData::Numeric(v) => v[row].is_none(),
            ColumnData::Categorical(v) => v[row].is_none(),
            ColumnData::Boolean(v) => v[row].is_none(),
        }
    }

    pub fn null_count(&self) -> usize {
        (0..self.len()).filter(|&i| self.is_missing(i)).count()
    }

    /// The value at `row` as a label, `None` when missing
    pub fn label(&self, row: usize) -> Option<Label> {
        match self {
            ColumnData::Numeric(v) => v[row].map(Label::Number),
            ColumnData::Categorical(v) => v[row].clone().map(Label::Text),
            ColumnData::Boolean(v) => v[row].map(Label::Bool),
        }
    }

    /// The value at `row` coerced to text, `None` when missing
    pub fn text(&self, row: usize) -> Option<String> {
        self.label(row).map(|l| l.to_text())
    }

    pub fn key(&self, row: usize) -> CellKey<'_> {
        match self {
            ColumnData::Numeric(v) => v[row].map(CellKey::number).unwrap_or(CellKey::Missing),
            ColumnData::Categorical(v) => v[row]
                .as_deref()
                .map(CellKey::Text)
                .unwrap_or(CellKey::Missing),
            ColumnData::Boolean(v) => v[row].map(CellKey::Bool).unwrap_or(CellKey::Missing),
        }
    }

    /// Numeric values, if this is a numeric column
    pub fn as_numeric(&self) -> Option<&[Option<f64>]> {
        match self {
            ColumnData::Numeric(v) => Some(v),
            _ => None,
        }
    }

    /// Distinct non-missing values in order of first appearance
    pub fn distinct(&self) -> Vec<Label> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for row in 0..self.len() {
            let key = self.key(row);
            if key != CellKey::Missing && seen.insert(key) {
                if let Some(label) = self.label(row) {
                    out.push(label);
                }
            }
        }
        out
    }

    pub fn n_unique(&self) -> usize {
        (0..self.len())
            .map(|row| self.key(row))
            .filter(|k| *k != CellKey::Missing)
            .collect::<HashSet<_>>()
            .len()
    }

    /// Gather rows by index
    pub fn take(&self, indices: &[usize]) -> ColumnData {
        match self {
            ColumnData::Numeric(v) => ColumnData::Numeric(indices.iter().map(|&i| v[i]).collect()),
            ColumnData::Categorical(v) => {
                ColumnData::Categorical(indices.iter().map(|&i| v[i].clone()).collect())
            }
            ColumnData::Boolean(v) => ColumnData::Boolean(indices.iter().map(|&i| v[i]).collect()),
        }
    }

    fn normalized(self) -> ColumnData {
        match self {
            ColumnData::Numeric(v) => ColumnData::Numeric(
                v.into_iter().map(|x| x.filter(|f| !f.is_nan())).collect(),
            ),
            other => other,
        }
    }
}

/// A named, typed column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    name: String,
    data: ColumnData,
}

impl Column {
    /// Create a column. NaN in numeric data is stored as missing.
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data: data.normalized(),
        }
    }

    /// Numeric column from plain floats, NaN meaning missing
    pub fn from_f64(name: impl Into<String>, values: &[f64]) -> Self {
        Self::new(
            name,
            ColumnData::Numeric(values.iter().map(|&v| Some(v)).collect()),
        )
    }

    pub fn from_strs(name: impl Into<String>, values: &[&str]) -> Self {
        Self::new(
            name,
            ColumnData::Categorical(values.iter().map(|s| Some(s.to_string())).collect()),
        )
    }

    pub fn from_opt_strs(name: impl Into<String>, values: &[Option<&str>]) -> Self {
        Self::new(
            name,
            ColumnData::Categorical(values.iter().map(|s| s.map(str::to_string)).collect()),
        )
    }

    pub fn from_bools(name: impl Into<String>, values: &[bool]) -> Self {
        Self::new(name, ColumnData::Boolean(values.iter().map(|&b| Some(b)).collect()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn kind(&self) -> ColumnKind {
        self.data.kind()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_data(self) -> ColumnData {
        self.data
    }
}

/// An ordered set of equal-length named columns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<Column>,
    n_rows: usize,
}

impl Table {
    /// Build a table, checking that column names are unique and lengths agree
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let n_rows = columns.first().map(|c| c.len()).unwrap_or(0);
        let mut names = HashSet::with_capacity(columns.len());
        for col in &columns {
            if col.len() != n_rows {
                return Err(ForgeError::Data(format!(
                    "Column '{}' has {} rows, expected {}",
                    col.name,
                    col.len(),
                    n_rows
                )));
            }
            if !names.insert(col.name.as_str()) {
                return Err(ForgeError::Data(format!("Duplicate column name '{}'", col.name)));
            }
        }
        Ok(Self { columns, n_rows })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.columns.len())
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Column names and kinds, in order
    pub fn schema(&self) -> Vec<Field> {
        self.columns
            .iter()
            .map(|c| Field::new(c.name.clone(), c.kind()))
            .collect()
    }

    /// New table with the given rows, in the given order
    pub fn take_rows(&self, indices: &[usize]) -> Table {
        Table {
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    data: c.data.take(indices),
                })
                .collect(),
            n_rows: indices.len(),
        }
    }

    /// First `n` rows
    pub fn head(&self, n: usize) -> Table {
        let indices: Vec<usize> = (0..n.min(self.n_rows)).collect();
        self.take_rows(&indices)
    }

    /// New table without the named column; unchanged copy if absent
    pub fn without_column(&self, name: &str) -> Table {
        let mut out = self.clone();
        out.remove_column(name);
        out
    }

    /// Hashable identity of a whole row
    pub fn row_key(&self, row: usize) -> Vec<CellKey<'_>> {
        self.columns.iter().map(|c| c.data.key(row)).collect()
    }

    /// Index of each column name
    pub fn name_index(&self) -> HashMap<&str, usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.as_str(), i))
            .collect()
    }

    // Working-copy mutators used by the transform engine. Callers outside the
    // crate only ever receive fresh tables.

    pub(crate) fn remove_column(&mut self, name: &str) -> Option<Column> {
        let idx = self.position(name)?;
        Some(self.columns.remove(idx))
    }

    /// Replace the column with the same name in place, or append it
    pub(crate) fn put_column(&mut self, column: Column) -> Result<()> {
        if !self.columns.is_empty() && column.len() != self.n_rows {
            return Err(ForgeError::Data(format!(
                "Column '{}' has {} rows, expected {}",
                column.name,
                column.len(),
                self.n_rows
            )));
        }
        if self.columns.is_empty() {
            self.n_rows = column.len();
        }
        match self.position(&column.name) {
            Some(idx) => self.columns[idx] = column,
            None => self.columns.push(column),
        }
        Ok(())
    }

    /// Insert a column at `idx`, replacing any column with the same name
    pub(crate) fn insert_column(&mut self, idx: usize, column: Column) -> Result<()> {
        self.remove_column(&column.name);
        self.put_column(column)?;
        let last = self.columns.len() - 1;
        let idx = idx.min(last);
        let col = self.columns.remove(last);
        self.columns.insert(idx, col);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new(vec![
            Column::from_f64("age", &[20.0, 30.0, f64::NAN]),
            Column::from_strs("color", &["red", "blue", "red"]),
            Column::from_bools("member", &[true, false, true]),
        ])
        .unwrap()
    }

    #[test]
    fn test_nan_is_missing() {
        let t = sample();
        let age = t.column("age").unwrap();
        assert_eq!(age.data().null_count(), 1);
        assert!(age.data().is_missing(2));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let result = Table::new(vec![
            Column::from_f64("a", &[1.0, 2.0]),
            Column::from_f64("b", &[1.0]),
        ]);
        assert!(matches!(result, Err(ForgeError::Data(_))));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = Table::new(vec![
            Column::from_f64("a", &[1.0]),
            Column::from_strs("a", &["x"]),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_take_rows_and_head() {
        let t = sample();
        let picked = t.take_rows(&[2, 0]);
        assert_eq!(picked.n_rows(), 2);
        assert_eq!(
            picked.column("color").unwrap().data(),
            &ColumnData::Categorical(vec![Some("red".into()), Some("red".into())])
        );
        assert_eq!(t.head(10).n_rows(), 3);
        assert_eq!(t.head(1).shape(), (1, 3));
    }

    #[test]
    fn test_distinct_first_appearance() {
        let t = sample();
        let distinct = t.column("color").unwrap().data().distinct();
        assert_eq!(
            distinct,
            vec![Label::Text("red".into()), Label::Text("blue".into())]
        );
        assert_eq!(t.column("age").unwrap().data().n_unique(), 2);
    }

    #[test]
    fn test_put_and_insert_column() {
        let mut t = sample();
        t.put_column(Column::from_f64("age", &[1.0, 2.0, 3.0])).unwrap();
        assert_eq!(t.position("age"), Some(0));

        t.insert_column(1, Column::from_f64("score", &[0.0, 0.5, 1.0]))
            .unwrap();
        assert_eq!(t.column_names(), vec!["age", "score", "color", "member"]);

        let bad = t.put_column(Column::from_f64("short", &[1.0]));
        assert!(bad.is_err());
    }

    #[test]
    fn test_without_column_leaves_original() {
        let t = sample();
        let dropped = t.without_column("color");
        assert_eq!(dropped.n_cols(), 2);
        assert_eq!(t.n_cols(), 3);
        assert_eq!(t.without_column("nope"), t);
    }
}
