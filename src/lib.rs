// Modules
pub mod binning;
pub mod config;
pub mod constants;
pub mod crosstab;
pub mod data;
pub mod errors;
pub mod evaluators;
pub mod grouping;
pub mod metric;
pub mod report;
pub mod utils;

// Individual classes, and functions
pub use config::{ConfigIO, EvaluationConfig, TargetSpec};
pub use data::{ColumnData, ObservationTable};
pub use errors::EvaluationError;
pub use evaluators::{ComplexEvaluator, Evaluator};
pub use metric::{gini, ks_statistic, lift, lift_at, Metric};
pub use report::Report;
