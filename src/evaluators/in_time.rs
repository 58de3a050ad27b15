use crate::config::EvaluationConfig;
use crate::data::ObservationTable;
use crate::errors::Result;
use crate::evaluators::{metric_table, observable_rows, Evaluator};
use crate::grouping::{aggregate, group_by_time, MetricResult, ScoreMetric};
use crate::metric::Metric;
use crate::report::{Graph, ResultTable, Series};
use crate::utils::precision_round;

/// A discrimination metric of every score per time bucket, with the metric over
/// all observable rows as the `All` margin. Buckets where the metric is undefined,
/// e.g. a month without any positive outcome, are left out of the curves and
/// blank in the table.
pub struct MetricInTime {
    pub metric: Metric,
}

impl MetricInTime {
    pub fn lift_in_time() -> Self {
        MetricInTime { metric: Metric::Lift }
    }

    pub fn ks_in_time() -> Self {
        MetricInTime { metric: Metric::KS }
    }

    pub fn gini_in_time() -> Self {
        MetricInTime { metric: Metric::Gini }
    }

    /// Plain lift follows the configured fraction.
    fn resolved_metric(&self, config: &EvaluationConfig) -> Metric {
        match self.metric {
            Metric::Lift => Metric::LiftAt(config.lift_fraction),
            m => m,
        }
    }

    fn metric_label(&self, config: &EvaluationConfig) -> String {
        match self.resolved_metric(config) {
            Metric::LiftAt(p) => format!("Lift ({}%)", precision_round(p * 100.0, 6)),
            m => m.to_string(),
        }
    }

    fn results(&self, config: &EvaluationConfig, table: &ObservationTable) -> Result<Vec<MetricResult>> {
        let (target, observed) = observable_rows(config, table)?;
        let grouping = group_by_time(&observed, config.time()?)?.with_parallel(config.parallel);
        let metric = self.resolved_metric(config);
        config
            .score_columns()?
            .iter()
            .map(|score| {
                let score_metric = ScoreMetric::new(&observed, &target.outcome_column, score, metric)?;
                aggregate(&grouping, &score_metric, true)
            })
            .collect()
    }
}

impl Evaluator for MetricInTime {
    fn name(&self) -> &'static str {
        match self.metric {
            Metric::Lift | Metric::LiftAt(_) => "LiftInTime",
            Metric::KS => "KsInTime",
            Metric::Gini => "GiniInTime",
            Metric::AUC => "AucInTime",
        }
    }

    fn produce_series(&self, config: &EvaluationConfig, table: &ObservationTable) -> Result<Graph> {
        let target = config.primary_target()?;
        let label = self.metric_label(config);
        let mut graph = Graph::new(
            format!("{} in time for target \"{}\"", label, target.outcome_column),
            config.time()?,
            &label,
        );
        for (score, result) in config.score_columns()?.iter().zip(self.results(config, table)?) {
            graph.series.push(Series::keyed(score, result.series()));
        }
        Ok(graph)
    }

    fn produce_table(&self, config: &EvaluationConfig, table: &ObservationTable) -> Result<ResultTable> {
        let target = config.primary_target()?;
        metric_table(
            format!("{} on target \"{}\"", self.metric_label(config), target.outcome_column),
            config.time()?,
            config.score_columns()?.to_vec(),
            &self.results(config, table)?,
        )
    }
}
