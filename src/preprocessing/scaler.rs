//! Feature scaling

use super::step::ScaleMethod;
use serde::{Deserialize, Serialize};

/// Parameters for a fitted scaler: `(x - center) / scale`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub center: f64,
    pub scale: f64,
}

impl ScalerParams {
    /// Fit on the non-missing values. Returns `None` if there are none.
    ///
    /// Standard scaling uses the population standard deviation. A zero spread
    /// scales by 1 so constant columns center to zero instead of dividing by zero.
    pub fn fit(method: ScaleMethod, values: &[Option<f64>]) -> Option<Self> {
        let present: Vec<f64> = values.iter().flatten().copied().collect();
        if present.is_empty() {
            return None;
        }
        let n = present.len() as f64;

        let (center, spread) = match method {
            ScaleMethod::Standard => {
                let mean = present.iter().sum::<f64>() / n;
                let var = present.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                (mean, var.sqrt())
            }
            ScaleMethod::MinMax => {
                let min = present.iter().copied().fold(f64::INFINITY, f64::min);
                let max = present.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                (min, max - min)
            }
        };

        Some(Self {
            center,
            scale: if spread == 0.0 || !spread.is_finite() { 1.0 } else { spread },
        })
    }

    pub fn apply(&self, value: f64) -> f64 {
        (value - self.center) / self.scale
    }

    /// Scale a column, keeping missing cells missing
    pub fn transform(&self, values: &[Option<f64>]) -> Vec<Option<f64>> {
        values.iter().map(|v| v.map(|x| self.apply(x))).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard() {
        let values = vec![Some(1.0), Some(2.0), Some(3.0), None];
        let params = ScalerParams::fit(ScaleMethod::Standard, &values).unwrap();
        assert!((params.center - 2.0).abs() < 1e-12);
        let out = params.transform(&values);
        let present: Vec<f64> = out.iter().flatten().copied().collect();
        let mean = present.iter().sum::<f64>() / 3.0;
        let var = present.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 3.0;
        assert!(mean.abs() < 1e-12);
        assert!((var - 1.0).abs() < 1e-12);
        assert_eq!(out[3], None);
    }

    #[test]
    fn test_minmax() {
        let values = vec![Some(10.0), Some(20.0), Some(15.0)];
        let params = ScalerParams::fit(ScaleMethod::MinMax, &values).unwrap();
        assert_eq!(params.transform(&values), vec![Some(0.0), Some(1.0), Some(0.5)]);
    }

    #[test]
    fn test_constant_and_empty() {
        let params = ScalerParams::fit(ScaleMethod::Standard, &[Some(5.0), Some(5.0)]).unwrap();
        assert_eq!(params.apply(5.0), 0.0);
        assert!(ScalerParams::fit(ScaleMethod::MinMax, &[None]).is_none());
    }
}
