//! Evaluators
//!
//! Every evaluator produces one graph and one table for a single view of the
//! data. Complex evaluators assemble several of them into a multi panel report.
//!
//! # Submodules
//!
//! * `histogram`: Distribution of a categorical or continuous predictor.
//! * `stability`: Distribution of a predictor in time.
//! * `association`: Default rate, or its log odds, against a predictor.
//! * `discrimination`: ROC, precision-recall and lift curves of the scores.
//! * `in_time`: Discrimination metrics of the scores per time bucket.
//! * `complex`: Multi panel reports.

pub mod association;
pub mod complex;
pub mod discrimination;
pub mod histogram;
pub mod in_time;
pub mod stability;
#[cfg(test)]
mod tests;

use crate::config::{EvaluationConfig, TargetSpec};
use crate::data::ObservationTable;
use crate::errors::Result;
use crate::grouping::MetricResult;
use crate::report::{Graph, Panel, ResultTable};

pub use association::{TargetAssociationCategorical, TargetAssociationContinuous};
pub use complex::ComplexEvaluator;
pub use discrimination::{LiftCurve, PrCurve, RocCurve};
pub use histogram::{HistogramCategorical, HistogramContinuous};
pub use in_time::MetricInTime;
pub use stability::{StabilityInTimeCategorical, StabilityInTimeContinuous};

/// A single statistical view of an observation table.
pub trait Evaluator {
    fn name(&self) -> &'static str;
    /// Labelled series for the visualization layer.
    fn produce_series(&self, config: &EvaluationConfig, table: &ObservationTable) -> Result<Graph>;
    /// Tabular result for the presentation layer.
    fn produce_table(&self, config: &EvaluationConfig, table: &ObservationTable) -> Result<ResultTable>;

    fn evaluate(&self, config: &EvaluationConfig, table: &ObservationTable) -> Result<Panel> {
        Ok(Panel {
            name: self.name().to_string(),
            graph: self.produce_series(config, table)?,
            table: self.produce_table(config, table)?,
        })
    }
}

/// The primary target and the rows where its outcome is known.
pub(crate) fn observable_rows<'c>(
    config: &'c EvaluationConfig,
    table: &ObservationTable,
) -> Result<(&'c TargetSpec, ObservationTable)> {
    let target = config.primary_target()?;
    Ok((target, table.filter_observable(target)?))
}

/// Table with one column per metric result, all computed over the same grouping.
/// Degenerate groups are left blank.
pub(crate) fn metric_table(
    caption: String,
    row_header: &str,
    columns: Vec<String>,
    results: &[MetricResult],
) -> Result<ResultTable> {
    let mut table = ResultTable::new(caption, row_header, columns);
    if let Some(first) = results.first() {
        for (key, _) in first.entries() {
            let values = results.iter().map(|r| r.value(key)).collect();
            table.push_row(key.clone(), values)?;
        }
    }
    Ok(table)
}
