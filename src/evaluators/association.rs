use crate::binning::bin_continuous;
use crate::config::EvaluationConfig;
use crate::crosstab::{crosstab, crosstab_mean, CrossTabOptions, CrossTable, KeyColumn, Normalize};
use crate::data::ObservationTable;
use crate::errors::Result;
use crate::evaluators::{observable_rows, Evaluator};
use crate::grouping::{group_by_time, Aggregation};
use crate::report::{Graph, ResultTable, Series};

/// Default rate per category and time bucket, on the rows with an observable outcome.
pub struct TargetAssociationCategorical;

impl TargetAssociationCategorical {
    fn rates(config: &EvaluationConfig, table: &ObservationTable) -> Result<CrossTable> {
        let (target, observed) = observable_rows(config, table)?;
        crosstab_mean(
            &observed,
            KeyColumn::Time(config.time()?),
            KeyColumn::Category(config.predictor()?),
            &target.outcome_column,
            &config.grouping_policy(),
        )
    }
}

impl Evaluator for TargetAssociationCategorical {
    fn name(&self) -> &'static str {
        "TargetAssociationCategorical"
    }

    fn produce_series(&self, config: &EvaluationConfig, table: &ObservationTable) -> Result<Graph> {
        let ct = Self::rates(config, table)?;
        let mut graph = Graph::new(
            format!(
                "Target association (default rate) of predictor \"{}\" in time",
                config.predictor()?
            ),
            config.time()?,
            "Mean of the target",
        );
        for key in ct.col_keys.iter().filter(|k| !k.is_margin()) {
            graph.series.push(Series::keyed(&key.to_string(), ct.column_series(key)));
        }
        Ok(graph)
    }

    fn produce_table(&self, config: &EvaluationConfig, table: &ObservationTable) -> Result<ResultTable> {
        let ct = Self::rates(config, table)?;
        Ok(ct.to_result_table(&format!(
            "Target association (default rate) of predictor \"{}\" in time",
            config.predictor()?
        )))
    }
}

/// Log odds of the target per equal width bin of a continuous predictor, one
/// curve per time bucket. Straight lines are what a logistic model assumes.
pub struct TargetAssociationContinuous;

impl TargetAssociationContinuous {
    fn by_bin_and_time(
        config: &EvaluationConfig,
        observed: &ObservationTable,
        outcome: &str,
        aggregation: Aggregation,
    ) -> Result<CrossTable> {
        let bins = bin_continuous(observed, config.predictor()?, config.n_bins)?;
        let times = group_by_time(observed, config.time()?)?;
        let options = CrossTabOptions {
            aggregation,
            normalize: Normalize::None,
            margins: true,
        };
        crosstab(&bins, &times, Some(outcome), &options)
    }
}

impl Evaluator for TargetAssociationContinuous {
    fn name(&self) -> &'static str {
        "TargetAssociationContinuous"
    }

    fn produce_series(&self, config: &EvaluationConfig, table: &ObservationTable) -> Result<Graph> {
        let (target, observed) = observable_rows(config, table)?;
        let predictor = config.predictor()?;
        let ct = Self::by_bin_and_time(config, &observed, &target.outcome_column, Aggregation::LogOdds)?;
        let mut graph = Graph::new(
            format!(
                "Logodds of the target variable \"{}\" vs. the predictor \"{}\" values",
                target.outcome_column, predictor
            ),
            &format!("{}_binned", predictor),
            "Logodds of the target variable",
        );
        for key in &ct.col_keys {
            graph.series.push(Series::keyed(&key.to_string(), ct.column_series(key)));
        }
        Ok(graph)
    }

    /// One column per aggregation and time bucket, e.g. `mean 202001`, margins included.
    fn produce_table(&self, config: &EvaluationConfig, table: &ObservationTable) -> Result<ResultTable> {
        let (target, observed) = observable_rows(config, table)?;
        let predictor = config.predictor()?;
        let aggregations = [Aggregation::Count, Aggregation::Sum, Aggregation::Mean, Aggregation::LogOdds];
        let tables = aggregations
            .iter()
            .map(|a| Self::by_bin_and_time(config, &observed, &target.outcome_column, *a))
            .collect::<Result<Vec<_>>>()?;

        let mut columns = Vec::new();
        for (a, ct) in aggregations.iter().zip(&tables) {
            columns.extend(ct.col_keys.iter().map(|k| format!("{} {}", a, k)));
        }
        let mut result = ResultTable::new(
            format!(
                "Different aggregations of target variable \"{}\" vs. the predictor \"{}\" values",
                target.outcome_column, predictor
            ),
            &format!("{}_binned", predictor),
            columns,
        );
        for (i, key) in tables[0].row_keys.iter().enumerate() {
            let values = tables.iter().flat_map(|ct| ct.cells[i].iter().copied()).collect();
            result.push_row(key.clone(), values)?;
        }
        Ok(result)
    }
}
