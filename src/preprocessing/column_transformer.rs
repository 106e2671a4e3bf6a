//! Fitted two-branch feature preprocessor
//!
//! Numeric columns: mean imputation, then standard scaling.
//! Categorical and boolean columns: most-frequent imputation on the text form,
//! then one-hot encoding with unknown categories mapped to all zeros.
//! Output is numeric features first, then the expanded categorical features,
//! each in their original column order.

use super::encoder::OneHotEncoder;
use super::imputer;
use super::scaler::ScalerParams;
use super::step::ScaleMethod;
use crate::error::{ForgeError, Result};
use crate::table::{ColumnData, ColumnKind, Field, Table};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct NumericFeature {
    name: String,
    fill: f64,
    scaler: ScalerParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CategoricalFeature {
    name: String,
    kind: ColumnKind,
    fill: Option<String>,
    encoder: OneHotEncoder,
}

/// Maps raw feature columns to a fixed-width numeric matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeaturePreprocessor {
    input_schema: Vec<Field>,
    numeric: Vec<NumericFeature>,
    categorical: Vec<CategoricalFeature>,
}

impl FeaturePreprocessor {
    /// Fit both branches on every column of `x`
    pub fn fit(x: &Table) -> Result<Self> {
        let mut numeric = Vec::new();
        let mut categorical = Vec::new();

        for col in x.columns() {
            match col.data() {
                ColumnData::Numeric(values) => {
                    let fill = imputer::mean(values).unwrap_or(0.0);
                    let imputed: Vec<Option<f64>> =
                        values.iter().map(|v| Some(v.unwrap_or(fill))).collect();
                    let scaler = ScalerParams::fit(ScaleMethod::Standard, &imputed).unwrap_or(
                        ScalerParams {
                            center: 0.0,
                            scale: 1.0,
                        },
                    );
                    numeric.push(NumericFeature {
                        name: col.name().to_string(),
                        fill,
                        scaler,
                    });
                }
                data => {
                    let fill = imputer::most_frequent(data).map(|l| l.to_text());
                    let texts: Vec<String> = (0..data.len())
                        .filter_map(|row| data.text(row).or_else(|| fill.clone()))
                        .collect();
                    categorical.push(CategoricalFeature {
                        name: col.name().to_string(),
                        kind: col.kind(),
                        fill,
                        encoder: OneHotEncoder::fit(&texts),
                    });
                }
            }
        }

        let fitted = Self {
            input_schema: x.schema(),
            numeric,
            categorical,
        };
        debug!(
            numeric = fitted.numeric.len(),
            categorical = fitted.categorical.len(),
            width = fitted.output_width(),
            "Fitted feature preprocessor"
        );
        Ok(fitted)
    }

    /// Transform a table holding (at least) the fitted input columns
    pub fn transform(&self, x: &Table) -> Result<Array2<f64>> {
        let n = x.n_rows();
        let mut out = Array2::<f64>::zeros((n, self.output_width()));

        for (j, feature) in self.numeric.iter().enumerate() {
            let values = self
                .input(x, &feature.name, ColumnKind::Numeric)?
                .as_numeric()
                .ok_or_else(|| ForgeError::Data(format!("Column '{}' is not numeric", feature.name)))?;
            for (i, v) in values.iter().enumerate() {
                out[[i, j]] = feature.scaler.apply(v.unwrap_or(feature.fill));
            }
        }

        let mut offset = self.numeric.len();
        for feature in &self.categorical {
            let data = self.input(x, &feature.name, feature.kind)?;
            let width = feature.encoder.width();
            let mut indicator = vec![0.0; width];
            for i in 0..n {
                match data.text(i).or_else(|| feature.fill.clone()) {
                    Some(text) => feature.encoder.encode_into(&text, &mut indicator),
                    None => indicator.iter_mut().for_each(|v| *v = 0.0),
                }
                for (k, v) in indicator.iter().enumerate() {
                    out[[i, offset + k]] = *v;
                }
            }
            offset += width;
        }

        Ok(out)
    }

    /// Fit on `x` and transform it
    pub fn fit_transform(x: &Table) -> Result<(Self, Array2<f64>)> {
        let fitted = Self::fit(x)?;
        let matrix = fitted.transform(x)?;
        Ok((fitted, matrix))
    }

    fn input<'a>(&self, x: &'a Table, name: &str, kind: ColumnKind) -> Result<&'a ColumnData> {
        let col = x
            .column(name)
            .ok_or_else(|| ForgeError::Data(format!("Missing feature column '{}'", name)))?;
        if col.kind() != kind {
            return Err(ForgeError::Data(format!(
                "Feature column '{}' is {}, expected {}",
                name,
                col.kind(),
                kind
            )));
        }
        Ok(col.data())
    }

    /// Columns (and kinds) the preprocessor was fitted on, in input order
    pub fn input_schema(&self) -> &[Field] {
        &self.input_schema
    }

    pub fn output_width(&self) -> usize {
        self.numeric.len()
            + self
                .categorical
                .iter()
                .map(|c| c.encoder.width())
                .sum::<usize>()
    }

    /// Names of the output features, in matrix column order
    pub fn feature_names_out(&self) -> Vec<String> {
        self.numeric
            .iter()
            .map(|f| f.name.clone())
            .chain(
                self.categorical
                    .iter()
                    .flat_map(|f| f.encoder.feature_names(&f.name)),
            )
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;

    fn features() -> Table {
        Table::new(vec![
            Column::from_strs("city", &["b", "a", "b", "c"]),
            Column::from_f64("age", &[10.0, f64::NAN, 30.0, 20.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_layout_numeric_first() {
        let (pre, x) = FeaturePreprocessor::fit_transform(&features()).unwrap();
        assert_eq!(
            pre.feature_names_out(),
            vec!["age", "city_a", "city_b", "city_c"]
        );
        assert_eq!(x.dim(), (4, 4));
        // missing age is the mean, which scales to zero
        assert!(x[[1, 0]].abs() < 1e-12);
        assert_eq!(x.row(1).to_vec()[1..], [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_unknown_category_is_zero_row() {
        let pre = FeaturePreprocessor::fit(&features()).unwrap();
        let new = Table::new(vec![
            Column::from_f64("age", &[20.0]),
            Column::from_strs("city", &["zzz"]),
            Column::from_f64("extra", &[1.0]),
        ])
        .unwrap();
        let x = pre.transform(&new).unwrap();
        assert_eq!(x.row(0).to_vec()[1..], [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_missing_category_uses_most_frequent() {
        let pre = FeaturePreprocessor::fit(&features()).unwrap();
        let new = Table::new(vec![
            Column::from_f64("age", &[f64::NAN]),
            Column::from_opt_strs("city", &[None]),
        ])
        .unwrap();
        let x = pre.transform(&new).unwrap();
        assert_eq!(x.row(0).to_vec()[1..], [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_missing_column_is_error() {
        let pre = FeaturePreprocessor::fit(&features()).unwrap();
        let new = Table::new(vec![Column::from_f64("age", &[1.0])]).unwrap();
        assert!(pre.transform(&new).is_err());
    }
}
