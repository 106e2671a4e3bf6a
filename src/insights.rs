//! Dataset insights
//!
//! Insight text is best-effort: hosts call [`generate_or_fallback`], which
//! never fails and returns a labelled fallback message when the generator does.

use crate::error::Result;
use crate::profile::Profile;
use crate::table::ColumnKind;
use tracing::warn;

/// Returned when insight generation fails
pub const FALLBACK_INSIGHTS: &str =
    "- Unable to generate insights due to an error.\n- Please check your insight service configuration.";

/// Produces free-text insights, one bullet per line
pub trait InsightGenerator: Send + Sync {
    fn generate(&self, profile: &Profile) -> Result<String>;
}

/// Run `generator`, substituting [`FALLBACK_INSIGHTS`] on failure
pub fn generate_or_fallback(generator: &dyn InsightGenerator, profile: &Profile) -> String {
    match generator.generate(profile) {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "Insight generation failed, using fallback");
            FALLBACK_INSIGHTS.to_string()
        }
    }
}

/// Rule-based insights computed locally from the profile
#[derive(Debug, Clone)]
pub struct HeuristicInsights {
    /// Missing percentage above which a column is flagged
    pub missing_threshold_pct: f64,
    /// Distinct/rows ratio above which a categorical column looks like an id
    pub id_ratio: f64,
    /// Max bullets returned
    pub max_bullets: usize,
}

impl Default for HeuristicInsights {
    fn default() -> Self {
        Self {
            missing_threshold_pct: 20.0,
            id_ratio: 0.9,
            max_bullets: 5,
        }
    }
}

impl HeuristicInsights {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InsightGenerator for HeuristicInsights {
    fn generate(&self, profile: &Profile) -> Result<String> {
        let mut bullets = Vec::new();

        let complete = 100.0 - profile.missing_cells_pct;
        bullets.push(format!(
            "The dataset has {} rows and {} columns and is {:.1}% complete.",
            profile.rows, profile.cols, complete
        ));

        for col in &profile.columns {
            if col.missing_pct > self.missing_threshold_pct {
                bullets.push(format!(
                    "Column '{}' is missing {:.1}% of its values; consider imputing or dropping it.",
                    col.name, col.missing_pct
                ));
            }
        }

        for col in &profile.columns {
            if profile.rows > 1 && col.unique <= 1 {
                bullets.push(format!(
                    "Column '{}' has a single value and carries no signal.",
                    col.name
                ));
            } else if col.kind == ColumnKind::Categorical
                && profile.rows >= 10
                && col.unique as f64 / profile.rows as f64 > self.id_ratio
            {
                bullets.push(format!(
                    "Column '{}' is nearly unique per row and may be an identifier.",
                    col.name
                ));
            }
        }

        for col in &profile.columns {
            if let (Some(min), Some(max), Some(std)) = (col.min, col.max, col.std) {
                if std > 0.0 && (max - min) / std > 10.0 {
                    bullets.push(format!(
                        "Column '{}' spans {} to {}, a wide range that suggests outliers or a need for scaling.",
                        col.name, min, max
                    ));
                }
            }
        }

        if profile.duplicate_rows > 0 {
            bullets.push(format!(
                "{} duplicate rows were found; a drop_duplicates step would remove them.",
                profile.duplicate_rows
            ));
        }

        bullets.truncate(self.max_bullets);
        Ok(bullets
            .iter()
            .map(|b| format!("- {}", b))
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ForgeError;
    use crate::profile::profile;
    use crate::table::{Column, ColumnData, Table};

    struct Broken;

    impl InsightGenerator for Broken {
        fn generate(&self, _profile: &Profile) -> Result<String> {
            Err(ForgeError::Config("no insight service configured".to_string()))
        }
    }

    fn sample() -> Profile {
        let t = Table::new(vec![
            Column::new("a", ColumnData::Numeric(vec![Some(1.0), None, None, Some(2.0)])),
            Column::from_strs("k", &["x", "x", "x", "x"]),
        ])
        .unwrap();
        profile(&t)
    }

    #[test]
    fn test_fallback_on_error() {
        assert_eq!(generate_or_fallback(&Broken, &sample()), FALLBACK_INSIGHTS);
    }

    #[test]
    fn test_heuristics() {
        let text = generate_or_fallback(&HeuristicInsights::new(), &sample());
        assert!(text.starts_with("- The dataset has 4 rows and 2 columns"));
        assert!(text.contains("Column 'a' is missing 50.0%"));
        assert!(text.contains("Column 'k' has a single value"));
        assert!(text.lines().all(|l| l.starts_with("- ")));
    }
}
