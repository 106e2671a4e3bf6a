//! Conversion between tables and JSON row records

use super::{Column, ColumnData, ColumnKind, Table};
use crate::error::{ForgeError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A column name with its kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub kind: ColumnKind,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

fn json_scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => n.as_f64().map(super::format_number),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl Table {
    /// Build a table from JSON row objects, inferring each column's kind.
    ///
    /// Columns appear in order of first appearance across rows. A key missing
    /// from a row, or `null`, is a missing cell. A column whose non-null values
    /// are all numbers is numeric, all booleans is boolean, anything else is
    /// categorical with values rendered as text.
    pub fn from_records(rows: &[Map<String, Value>]) -> Result<Table> {
        let mut names: Vec<&str> = Vec::new();
        for row in rows {
            for key in row.keys() {
                if !names.contains(&key.as_str()) {
                    names.push(key.as_str());
                }
            }
        }

        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            let cells: Vec<&Value> = rows
                .iter()
                .map(|r| r.get(name).unwrap_or(&Value::Null))
                .collect();

            if let Some(bad) = cells.iter().find(|v| v.is_array() || v.is_object()) {
                return Err(ForgeError::Data(format!(
                    "Column '{}' holds a non-scalar value: {}",
                    name, bad
                )));
            }

            let present = cells.iter().filter(|v| !v.is_null());
            let data = if present.clone().all(|v| v.is_number()) {
                ColumnData::Numeric(cells.iter().map(|v| v.as_f64()).collect())
            } else if present.clone().all(|v| v.is_boolean()) {
                ColumnData::Boolean(cells.iter().map(|v| v.as_bool()).collect())
            } else {
                ColumnData::Categorical(cells.iter().map(|v| json_scalar_text(v)).collect())
            };
            columns.push(Column::new(name, data));
        }

        if columns.is_empty() && !rows.is_empty() {
            return Ok(Table {
                columns,
                n_rows: rows.len(),
            });
        }
        Table::new(columns)
    }

    /// Build a table from JSON rows under a fixed schema.
    ///
    /// Only the schema's fields are read, in schema order; extra keys are
    /// ignored. A missing key or a value of the wrong JSON type is an error
    /// naming the row and field. `null` is a missing cell.
    pub fn from_records_with_schema(rows: &[Map<String, Value>], schema: &[Field]) -> Result<Table> {
        let mut columns = Vec::with_capacity(schema.len());
        for field in schema {
            let mut numeric = Vec::new();
            let mut text = Vec::new();
            let mut flags = Vec::new();

            for (row_idx, row) in rows.iter().enumerate() {
                let value = row.get(&field.name).ok_or_else(|| {
                    ForgeError::PredictionInput(format!(
                        "row {}: missing feature '{}'",
                        row_idx, field.name
                    ))
                })?;
                let mismatch = || {
                    ForgeError::PredictionInput(format!(
                        "row {}: feature '{}' expects a {} value, got {}",
                        row_idx, field.name, field.kind, value
                    ))
                };
                match (field.kind, value) {
                    (ColumnKind::Numeric, Value::Null) => numeric.push(None),
                    (ColumnKind::Numeric, Value::Number(n)) => {
                        numeric.push(Some(n.as_f64().ok_or_else(mismatch)?))
                    }
                    (ColumnKind::Categorical, Value::Null) => text.push(None),
                    (ColumnKind::Categorical, Value::String(s)) => text.push(Some(s.clone())),
                    (ColumnKind::Boolean, Value::Null) => flags.push(None),
                    (ColumnKind::Boolean, Value::Bool(b)) => flags.push(Some(*b)),
                    _ => return Err(mismatch()),
                }
            }

            let data = match field.kind {
                ColumnKind::Numeric => ColumnData::Numeric(numeric),
                ColumnKind::Categorical => ColumnData::Categorical(text),
                ColumnKind::Boolean => ColumnData::Boolean(flags),
            };
            columns.push(Column::new(field.name.clone(), data));
        }

        let mut table = Table::new(columns)?;
        table.n_rows = rows.len();
        Ok(table)
    }

    /// Rows as JSON objects; missing cells become `null`
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        (0..self.n_rows)
            .map(|row| {
                self.columns
                    .iter()
                    .map(|col| {
                        let value = col
                            .data
                            .label(row)
                            .map(|l| l.to_json())
                            .unwrap_or(Value::Null);
                        (col.name.clone(), value)
                    })
                    .collect()
            })
            .collect()
    }
}
