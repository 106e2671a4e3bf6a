//! Transform engine: applies declarative steps to a table

use super::encoder::{label_encode, one_hot_columns};
use super::imputer;
use super::scaler::ScalerParams;
use super::step::{EncodeMethod, ImputeStrategy, ScaleMethod, StepSpec, TransformStep};
use crate::error::{ForgeError, Result};
use crate::profile::{profile, Profile};
use crate::table::{Column, ColumnData, Label, Table};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Result of [`TransformEngine::preview`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelinePreview {
    /// First rows of the transformed table
    pub head: Vec<Map<String, Value>>,
    pub profile: Profile,
    pub columns: Vec<String>,
    /// (rows, columns)
    pub shape: (usize, usize),
}

/// Applies ordered transform steps. Stateless; every call fits on the data it is given.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransformEngine;

impl TransformEngine {
    pub fn new() -> Self {
        Self
    }

    /// Validate and apply wire steps in order.
    ///
    /// All steps are validated before any is applied, so a bad parameter
    /// anywhere in the list fails the call without partial work.
    pub fn apply(&self, table: &Table, specs: &[StepSpec]) -> Result<Table> {
        let steps = TransformStep::parse_all(specs)?;
        self.apply_steps(table, &steps)
    }

    /// Apply already-validated steps in order. The input table is not modified.
    pub fn apply_steps(&self, table: &Table, steps: &[TransformStep]) -> Result<Table> {
        let start = Instant::now();
        let mut working = table.clone();

        for (index, step) in steps.iter().enumerate() {
            debug!(step = index, action = step.action(), "Applying transform step");
            working = apply_step(working, index, step)?;
        }

        info!(
            steps = steps.len(),
            rows_in = table.n_rows(),
            rows_out = working.n_rows(),
            cols_out = working.n_cols(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Transform pipeline applied"
        );
        Ok(working)
    }

    /// Apply steps and summarize the result
    pub fn preview(&self, table: &Table, specs: &[StepSpec], n: usize) -> Result<PipelinePreview> {
        let out = self.apply(table, specs)?;
        Ok(PipelinePreview {
            head: out.head(n).to_records(),
            profile: profile(&out),
            columns: out.column_names().into_iter().map(str::to_string).collect(),
            shape: out.shape(),
        })
    }
}

fn apply_step(mut table: Table, index: usize, step: &TransformStep) -> Result<Table> {
    match step {
        TransformStep::DropDuplicates => Ok(drop_duplicates(&table)),
        TransformStep::DropColumn { column } => {
            if table.remove_column(column).is_none() {
                debug!(step = index, column = %column, "Column absent, nothing to drop");
            }
            Ok(table)
        }
        TransformStep::Impute {
            column,
            strategy,
            fill_value,
        } => {
            impute(&mut table, index, column, *strategy, fill_value.as_ref())?;
            Ok(table)
        }
        TransformStep::Scale { columns, method } => {
            scale(&mut table, columns, *method)?;
            Ok(table)
        }
        TransformStep::Encode { columns, method } => {
            encode(&mut table, columns, *method)?;
            Ok(table)
        }
        TransformStep::Unrecognized { category, action } => {
            warn!(step = index, category = %category, action = %action, "Unrecognized transform step skipped");
            Ok(table)
        }
    }
}

fn drop_duplicates(table: &Table) -> Table {
    let mut seen = HashSet::with_capacity(table.n_rows());
    let keep: Vec<usize> = (0..table.n_rows())
        .filter(|&row| seen.insert(table.row_key(row)))
        .collect();
    if keep.len() == table.n_rows() {
        return table.clone();
    }
    table.take_rows(&keep)
}

fn impute(
    table: &mut Table,
    index: usize,
    column: &str,
    strategy: ImputeStrategy,
    fill_value: Option<&Label>,
) -> Result<()> {
    let Some(col) = table.column(column) else {
        return Ok(());
    };
    let data = col.data();
    if data.null_count() == 0 {
        return Ok(());
    }

    let value = match strategy {
        ImputeStrategy::Constant => fill_value.cloned(),
        ImputeStrategy::Mean | ImputeStrategy::Median => {
            let stat_name = if strategy == ImputeStrategy::Mean { "mean" } else { "median" };
            let values = data.as_numeric().ok_or_else(|| {
                ForgeError::invalid_step(
                    index,
                    "impute",
                    format!(
                        "{} requires a numeric column, '{}' is {}",
                        stat_name,
                        column,
                        data.kind()
                    ),
                )
            })?;
            let stat = if strategy == ImputeStrategy::Mean {
                imputer::mean(values)
            } else {
                imputer::median(values)
            };
            stat.map(Label::Number)
        }
        ImputeStrategy::MostFrequent => imputer::most_frequent(data),
    };

    // Nothing to compute from (all missing) or no constant supplied
    let Some(value) = value else {
        return Ok(());
    };

    let filled = imputer::fill(data, &value)
        .map_err(|reason| ForgeError::invalid_step(index, "impute", reason))?;
    table.put_column(Column::new(column, filled))
}

fn scale(table: &mut Table, columns: &[String], method: ScaleMethod) -> Result<()> {
    for name in columns {
        let Some(values) = table.column(name).and_then(|c| c.data().as_numeric()) else {
            debug!(column = %name, "Skipping non-numeric or absent column in scale");
            continue;
        };
        if let Some(params) = ScalerParams::fit(method, values) {
            let scaled = ColumnData::Numeric(params.transform(values));
            table.put_column(Column::new(name.as_str(), scaled))?;
        }
    }
    Ok(())
}

fn encode(table: &mut Table, columns: &[String], method: EncodeMethod) -> Result<()> {
    for name in columns {
        let Some(col) = table.column(name) else {
            continue;
        };
        match method {
            EncodeMethod::Label => {
                let encoded = label_encode(col.data());
                table.put_column(Column::new(name.as_str(), encoded))?;
            }
            EncodeMethod::OneHot => {
                let indicators = one_hot_columns(name, col.data());
                table.remove_column(name);
                for indicator in indicators {
                    table.put_column(indicator)?;
                }
            }
        }
    }
    Ok(())
}
