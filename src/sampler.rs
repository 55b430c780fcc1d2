//! Sampling strategy planning
//!
//! The sampler decides how many rows each side fetches and under which
//! selection criterion, so the two independently-fetched samples stay
//! comparable. It never touches data itself.

use crate::error::{RecondiffError, Result};
use serde::{Deserialize, Serialize};

/// How rows are selected from each side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleMethod {
    /// Seeded random selection; reproducible when both sources support it.
    Random,
    /// Deterministic top-N by key columns ascending - maximal overlap.
    Ordered,
}

impl SampleMethod {
    pub fn parse(s: &str) -> std::result::Result<Self, String> {
        match s.to_lowercase().as_str() {
            "random" => Ok(Self::Random),
            "ordered" => Ok(Self::Ordered),
            _ => Err(format!(
                "Invalid sampling method: {}. Use 'random' or 'ordered'",
                s
            )),
        }
    }
}

impl std::fmt::Display for SampleMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleMethod::Random => write!(f, "random"),
            SampleMethod::Ordered => write!(f, "ordered"),
        }
    }
}

/// Selection criterion carried inside a [`SamplePlan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Pick rows with a seeded RNG over the key-ordered row set.
    SeededRandom { seed: u64 },
    /// Take the first `limit` rows ordered by the key columns ascending.
    OrderedByKey,
}

/// Instructions handed to each row source for one fetch.
#[derive(Debug, Clone)]
pub struct SamplePlan {
    pub limit: usize,
    pub key_columns: Vec<String>,
    pub selection: Selection,
}

/// Plans which subset of rows to request from each side.
pub struct Sampler;

impl Sampler {
    /// Build a sample plan for one job.
    pub fn plan(
        requested_size: usize,
        method: SampleMethod,
        key_columns: &[String],
    ) -> Result<SamplePlan> {
        if requested_size == 0 {
            return Err(RecondiffError::invalid_configuration(
                "sample size must be greater than 0",
            ));
        }

        let selection = match method {
            SampleMethod::Random => Selection::SeededRandom {
                seed: crate::DEFAULT_RANDOM_SEED,
            },
            SampleMethod::Ordered => Selection::OrderedByKey,
        };

        Ok(SamplePlan {
            limit: requested_size,
            key_columns: key_columns.to_vec(),
            selection,
        })
    }

    /// Statistically significant sample size for a table of `total_rows`
    /// (95% confidence, 5% margin of error, finite population correction).
    pub fn recommended_sample_size(total_rows: u64) -> usize {
        if total_rows <= 1000 {
            return total_rows as usize;
        }

        let z_score: f64 = 1.96;
        let p: f64 = 0.5;
        let margin_of_error: f64 = 0.05;

        let numerator = z_score * z_score * p * (1.0 - p);
        let sample = numerator / (margin_of_error * margin_of_error);
        let corrected = sample / (1.0 + (sample - 1.0) / total_rows as f64);

        (corrected.ceil() as usize).min(total_rows as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parse() {
        assert!(matches!(SampleMethod::parse("random"), Ok(SampleMethod::Random)));
        assert!(matches!(SampleMethod::parse("ORDERED"), Ok(SampleMethod::Ordered)));
        assert!(SampleMethod::parse("stratified").is_err());
    }

    #[test]
    fn test_plan_rejects_zero_size() {
        let err = Sampler::plan(0, SampleMethod::Ordered, &["id".to_string()]).unwrap_err();
        assert!(matches!(
            err,
            crate::error::RecondiffError::InvalidConfiguration { .. }
        ));
    }

    #[test]
    fn test_plan_carries_key_columns() {
        let plan = Sampler::plan(5, SampleMethod::Ordered, &["id".to_string()]).unwrap();
        assert_eq!(plan.limit, 5);
        assert_eq!(plan.key_columns, vec!["id".to_string()]);
        assert_eq!(plan.selection, Selection::OrderedByKey);
    }

    #[test]
    fn test_random_plan_is_seeded() {
        let plan = Sampler::plan(5, SampleMethod::Random, &["id".to_string()]).unwrap();
        assert!(matches!(plan.selection, Selection::SeededRandom { .. }));
    }

    #[test]
    fn test_recommended_sample_size_small_table() {
        assert_eq!(Sampler::recommended_sample_size(250), 250);
        assert_eq!(Sampler::recommended_sample_size(1000), 1000);
    }

    #[test]
    fn test_recommended_sample_size_large_table() {
        let size = Sampler::recommended_sample_size(1_000_000);
        assert!(size >= 380 && size <= 390, "got {}", size);

        let size = Sampler::recommended_sample_size(10_000);
        assert!(size >= 360 && size <= 380, "got {}", size);
    }
}
