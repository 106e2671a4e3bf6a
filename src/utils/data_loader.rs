//! Data loading utilities
//!
//! Files are read with polars and converted into a [`Table`]: integer and
//! float columns become numeric, booleans stay boolean, everything else is
//! read as text.

use crate::error::{ForgeError, Result};
use crate::table::{Column, ColumnData, Table};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Supported input formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Tsv,
    Parquet,
    Json,
    JsonLines,
}

impl FileFormat {
    /// Detect from the extension, defaulting to CSV
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "tsv" => FileFormat::Tsv,
            "parquet" | "pq" => FileFormat::Parquet,
            "json" => FileFormat::Json,
            "jsonl" | "ndjson" => FileFormat::JsonLines,
            _ => FileFormat::Csv,
        }
    }
}

/// Data loader for various file formats
#[derive(Debug, Clone)]
pub struct DataLoader {
    /// Rows sampled when inferring CSV column types
    infer_schema_length: usize,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self {
            infer_schema_length: 100,
        }
    }

    pub fn with_infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = rows.max(1);
        self
    }

    /// Load a delimited text file with a header row
    pub fn load_csv(&self, path: impl AsRef<Path>, separator: u8) -> Result<DataFrame> {
        let file = File::open(path.as_ref())?;
        let parse_opts = CsvParseOptions::default().with_separator(separator);
        Ok(CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(self.infer_schema_length))
            .with_parse_options(parse_opts)
            .into_reader_with_file_handle(file)
            .finish()?)
    }

    pub fn load_parquet(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let file = File::open(path.as_ref())?;
        Ok(ParquetReader::new(file).finish()?)
    }

    /// Load a JSON array of objects, or newline-delimited objects
    pub fn load_json(&self, path: impl AsRef<Path>, lines: bool) -> Result<DataFrame> {
        let file = File::open(path.as_ref())?;
        let format = if lines {
            JsonFormat::JsonLines
        } else {
            JsonFormat::Json
        };
        Ok(JsonReader::new(file).with_json_format(format).finish()?)
    }

    /// Detect file format from extension and load
    pub fn load_auto(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        match FileFormat::from_path(path) {
            FileFormat::Csv => self.load_csv(path, b','),
            FileFormat::Tsv => self.load_csv(path, b'\t'),
            FileFormat::Parquet => self.load_parquet(path),
            FileFormat::Json => self.load_json(path, false),
            FileFormat::JsonLines => self.load_json(path, true),
        }
    }

    /// Load any supported file straight into a [`Table`]
    pub fn load_table(&self, path: impl AsRef<Path>) -> Result<Table> {
        let path = path.as_ref();
        let df = self.load_auto(path)?;
        let table = Table::from_dataframe(&df)?;
        debug!(path = %path.display(), rows = table.n_rows(), cols = table.n_cols(), "Loaded table");
        Ok(table)
    }
}

/// Writes tables back to disk
pub struct DataSaver;

impl DataSaver {
    pub fn save_csv(table: &Table, path: impl AsRef<Path>) -> Result<()> {
        let mut df = table.to_dataframe()?;
        let mut file = File::create(path.as_ref())?;
        CsvWriter::new(&mut file).finish(&mut df)?;
        Ok(())
    }

    pub fn save_parquet(table: &Table, path: impl AsRef<Path>) -> Result<()> {
        let mut df = table.to_dataframe()?;
        let file = File::create(path.as_ref())?;
        ParquetWriter::new(file).finish(&mut df)?;
        Ok(())
    }
}

impl Table {
    /// Convert a polars frame, mapping dtypes onto column kinds
    pub fn from_dataframe(df: &DataFrame) -> Result<Table> {
        let columns = df
            .get_columns()
            .iter()
            .map(|col| {
                let series = col.as_materialized_series();
                let name = series.name().as_str().to_string();
                let data = match series.dtype() {
                    DataType::Boolean => {
                        ColumnData::Boolean(series.bool()?.into_iter().collect())
                    }
                    DataType::Int8
                    | DataType::Int16
                    | DataType::Int32
                    | DataType::Int64
                    | DataType::UInt8
                    | DataType::UInt16
                    | DataType::UInt32
                    | DataType::UInt64
                    | DataType::Float32
                    | DataType::Float64 => {
                        let cast = series.cast(&DataType::Float64)?;
                        ColumnData::Numeric(cast.f64()?.into_iter().collect())
                    }
                    _ => {
                        let cast = series.cast(&DataType::String)?;
                        ColumnData::Categorical(
                            cast.str()?
                                .into_iter()
                                .map(|v| v.map(str::to_string))
                                .collect(),
                        )
                    }
                };
                Ok(Column::new(name, data))
            })
            .collect::<Result<Vec<_>>>()?;
        Table::new(columns)
    }

    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let columns = self
            .columns()
            .iter()
            .map(|col| {
                let name: PlSmallStr = col.name().into();
                let series = match col.data() {
                    ColumnData::Numeric(values) => Series::new(name, values.as_slice()),
                    ColumnData::Categorical(values) => Series::new(name, values.as_slice()),
                    ColumnData::Boolean(values) => Series::new(name, values.as_slice()),
                };
                series.into_column()
            })
            .collect::<Vec<_>>();
        DataFrame::new(columns).map_err(|e| ForgeError::Data(e.to_string()))
    }
}
