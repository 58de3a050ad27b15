use crate::config::EvaluationConfig;
use crate::crosstab::{crosstab, CrossTabOptions, CrossTable, Normalize};
use crate::data::ObservationTable;
use crate::errors::Result;
use crate::evaluators::{metric_table, Evaluator};
use crate::grouping::{aggregate, group_by_category, group_by_time, Aggregation, ColumnStatistic, MetricResult};
use crate::report::{Graph, ResultTable, Series};

/// Share of each category per time bucket. The `All` row holds the overall shares.
pub struct StabilityInTimeCategorical;

impl StabilityInTimeCategorical {
    fn shares(config: &EvaluationConfig, table: &ObservationTable) -> Result<CrossTable> {
        let times = group_by_time(table, config.time()?)?;
        let categories = group_by_category(table, config.predictor()?, &config.grouping_policy())?;
        let options = CrossTabOptions {
            aggregation: Aggregation::Count,
            normalize: Normalize::Rows,
            margins: true,
        };
        crosstab(&times, &categories, None, &options)
    }
}

impl Evaluator for StabilityInTimeCategorical {
    fn name(&self) -> &'static str {
        "StabilityInTimeCategorical"
    }

    fn produce_series(&self, config: &EvaluationConfig, table: &ObservationTable) -> Result<Graph> {
        let ct = Self::shares(config, table)?;
        let mut graph = Graph::new(
            format!("Distribution of predictor \"{}\" in time", config.predictor()?),
            config.time()?,
            "Share of the given category",
        );
        for key in &ct.col_keys {
            graph.series.push(Series::keyed(&key.to_string(), ct.column_series(key)));
        }
        Ok(graph)
    }

    fn produce_table(&self, config: &EvaluationConfig, table: &ObservationTable) -> Result<ResultTable> {
        let ct = Self::shares(config, table)?;
        Ok(ct.to_result_table(&format!(
            "Distribution of predictor \"{}\" in time",
            config.predictor()?
        )))
    }
}

/// Percentiles of a continuous predictor per time bucket.
pub struct StabilityInTimeContinuous;

impl StabilityInTimeContinuous {
    fn percentiles(config: &EvaluationConfig, table: &ObservationTable) -> Result<Vec<MetricResult>> {
        let grouping = group_by_time(table, config.time()?)?.with_parallel(config.parallel);
        config
            .percentiles
            .iter()
            .map(|p| {
                let statistic = ColumnStatistic::new(table, config.predictor()?, Aggregation::Percentile(*p))?;
                aggregate(&grouping, &statistic, true)
            })
            .collect()
    }
}

impl Evaluator for StabilityInTimeContinuous {
    fn name(&self) -> &'static str {
        "StabilityInTimeContinuous"
    }

    fn produce_series(&self, config: &EvaluationConfig, table: &ObservationTable) -> Result<Graph> {
        let mut graph = Graph::new(
            format!("Distribution of predictor \"{}\" in time", config.predictor()?),
            config.time()?,
            "Percentiles",
        );
        for result in Self::percentiles(config, table)? {
            graph.series.push(Series::keyed(&result.metric, result.series()));
        }
        Ok(graph)
    }

    fn produce_table(&self, config: &EvaluationConfig, table: &ObservationTable) -> Result<ResultTable> {
        let results = Self::percentiles(config, table)?;
        metric_table(
            format!("Distribution of predictor \"{}\" in time", config.predictor()?),
            config.time()?,
            results.iter().map(|r| r.metric.clone()).collect(),
            &results,
        )
    }
}
