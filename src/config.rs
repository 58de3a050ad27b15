//! Evaluation Configuration
//!
//! A plain value object describing which columns of an `ObservationTable` an
//! evaluator works on, together with the grouping and binning policy.
use crate::constants::{
    DEFAULT_LIFT_FRACTION, DEFAULT_MAX_CATEGORIES, DEFAULT_MIN_CATEGORIES, DEFAULT_N_BINS, DEFAULT_PERCENTILES,
};
use crate::errors::{EvaluationError, Result};
use crate::grouping::GroupingPolicy;
use crate::utils::{validate_float_parameter, validate_fraction_parameter};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// A binary target together with its observability flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSpec {
    /// Column holding the 0/1 outcome.
    pub outcome_column: String,
    /// Column holding the flag marking rows with a known outcome.
    pub observability_column: String,
}

impl TargetSpec {
    pub fn new(outcome_column: &str, observability_column: &str) -> Self {
        TargetSpec {
            outcome_column: outcome_column.to_string(),
            observability_column: observability_column.to_string(),
        }
    }
}

fn default_max_categories() -> usize {
    DEFAULT_MAX_CATEGORIES
}
fn default_min_categories() -> usize {
    DEFAULT_MIN_CATEGORIES
}
fn default_n_bins() -> usize {
    DEFAULT_N_BINS
}
fn default_lift_fraction() -> f64 {
    DEFAULT_LIFT_FRACTION
}
fn default_percentiles() -> Vec<f64> {
    DEFAULT_PERCENTILES.to_vec()
}

/// Configuration shared by all evaluators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Predictor evaluated by the histogram, stability and association views.
    #[serde(default)]
    pub predictor_column: Option<String>,
    /// Binary targets, only the first one is displayed.
    #[serde(default)]
    pub targets: Vec<TargetSpec>,
    /// Score columns compared by the discrimination views.
    #[serde(default)]
    pub scores: Vec<String>,
    /// Integer time bucket column, e.g. YYYYMM.
    #[serde(default)]
    pub time_column: Option<String>,
    /// Maximum number of distinct categories of a categorical predictor.
    #[serde(default = "default_max_categories")]
    pub max_categories: usize,
    /// Minimum number of distinct categories of a categorical predictor.
    #[serde(default = "default_min_categories")]
    pub min_categories: usize,
    /// Number of equal width bins for a continuous predictor.
    #[serde(default = "default_n_bins")]
    pub n_bins: usize,
    /// Fraction of top scores used by the lift views.
    #[serde(default = "default_lift_fraction")]
    pub lift_fraction: f64,
    /// Percentiles, in [0, 100], reported for continuous predictors.
    #[serde(default = "default_percentiles")]
    pub percentiles: Vec<f64>,
    /// Evaluate groups in parallel.
    #[serde(default)]
    pub parallel: bool,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        EvaluationConfig {
            predictor_column: None,
            targets: Vec::new(),
            scores: Vec::new(),
            time_column: None,
            max_categories: DEFAULT_MAX_CATEGORIES,
            min_categories: DEFAULT_MIN_CATEGORIES,
            n_bins: DEFAULT_N_BINS,
            lift_fraction: DEFAULT_LIFT_FRACTION,
            percentiles: DEFAULT_PERCENTILES.to_vec(),
            parallel: false,
        }
    }
}

impl EvaluationConfig {
    /// Check the policy values are usable.
    pub fn validate(&self) -> Result<()> {
        if self.n_bins == 0 {
            return Err(EvaluationError::InvalidInput(
                "Invalid parameter value passed for n_bins, expected at least 1 but 0 provided.".to_string(),
            ));
        }
        if self.min_categories == 0 || self.min_categories > self.max_categories {
            return Err(EvaluationError::InvalidInput(format!(
                "Invalid category bounds, expected 1 <= min_categories <= max_categories but got [{}, {}].",
                self.min_categories, self.max_categories
            )));
        }
        validate_fraction_parameter(self.lift_fraction, "lift_fraction")?;
        for p in &self.percentiles {
            validate_float_parameter(*p, 0.0, 100.0, "percentiles")?;
        }
        Ok(())
    }

    /// The target displayed by the evaluators.
    pub fn primary_target(&self) -> Result<&TargetSpec> {
        self.targets
            .first()
            .ok_or_else(|| EvaluationError::InvalidInput("No target was configured.".to_string()))
    }

    pub fn predictor(&self) -> Result<&str> {
        self.predictor_column
            .as_deref()
            .ok_or_else(|| EvaluationError::InvalidInput("No predictor column was configured.".to_string()))
    }

    pub fn time(&self) -> Result<&str> {
        self.time_column
            .as_deref()
            .ok_or_else(|| EvaluationError::InvalidInput("No time column was configured.".to_string()))
    }

    pub fn score_columns(&self) -> Result<&[String]> {
        if self.scores.is_empty() {
            Err(EvaluationError::InvalidInput("No score columns were configured.".to_string()))
        } else {
            Ok(&self.scores)
        }
    }

    pub fn grouping_policy(&self) -> GroupingPolicy {
        GroupingPolicy {
            min_categories: self.min_categories,
            max_categories: self.max_categories,
            parallel: self.parallel,
        }
    }
}

/// JSON (de)serialization, kept in memory.
pub trait ConfigIO: Serialize + DeserializeOwned + Sized {
    /// Dump the configuration as a json object.
    fn json_dump(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| EvaluationError::InvalidInput(e.to_string()))
    }

    /// Load the configuration from a json string.
    ///
    /// * `json_str` - String object, which can be serialized to json.
    fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str::<Self>(json_str).map_err(|e| EvaluationError::InvalidInput(e.to_string()))
    }
}

impl ConfigIO for EvaluationConfig {}
