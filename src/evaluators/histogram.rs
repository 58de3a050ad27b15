use crate::binning::bin_continuous;
use crate::config::EvaluationConfig;
use crate::data::ObservationTable;
use crate::errors::Result;
use crate::evaluators::Evaluator;
use crate::grouping::{aggregate, group_by_category, Aggregation, GroupKey, RowCount};
use crate::report::{Graph, ResultTable, Series};
use crate::utils::percentile;

/// Share of each category of a categorical predictor, over all rows.
pub struct HistogramCategorical;

impl HistogramCategorical {
    fn shares(config: &EvaluationConfig, table: &ObservationTable) -> Result<Vec<(GroupKey, f64, f64)>> {
        let predictor = config.predictor()?;
        let grouping = group_by_category(table, predictor, &config.grouping_policy())?;
        let counts = aggregate(&grouping, &RowCount::new(table), true)?;
        let total = table.n_rows() as f64;
        Ok(counts
            .series()
            .into_iter()
            .chain(counts.value(&GroupKey::All).map(|n| (GroupKey::All, n)))
            .map(|(k, n)| (k, n / total, n))
            .collect())
    }
}

impl Evaluator for HistogramCategorical {
    fn name(&self) -> &'static str {
        "HistogramCategorical"
    }

    fn produce_series(&self, config: &EvaluationConfig, table: &ObservationTable) -> Result<Graph> {
        let predictor = config.predictor()?;
        let shares = Self::shares(config, table)?;
        let mut graph = Graph::new(
            format!("Distribution of predictor \"{}\"", predictor),
            "Categories",
            "Share of the given category",
        );
        graph.series.push(Series::keyed(
            predictor,
            shares
                .into_iter()
                .filter(|(k, _, _)| !k.is_margin())
                .map(|(k, s, _)| (k, s))
                .collect(),
        ));
        Ok(graph)
    }

    fn produce_table(&self, config: &EvaluationConfig, table: &ObservationTable) -> Result<ResultTable> {
        let predictor = config.predictor()?;
        let mut result = ResultTable::new(
            format!("Distribution of predictor \"{}\"", predictor),
            predictor,
            vec!["share".to_string(), "count".to_string()],
        );
        for (key, share, count) in Self::shares(config, table)? {
            result.push_row(key, vec![Some(share), Some(count)])?;
        }
        Ok(result)
    }
}

/// Counts of a continuous predictor per equal width bin, and its percentiles.
pub struct HistogramContinuous;

impl Evaluator for HistogramContinuous {
    fn name(&self) -> &'static str {
        "HistogramContinuous"
    }

    fn produce_series(&self, config: &EvaluationConfig, table: &ObservationTable) -> Result<Graph> {
        let predictor = config.predictor()?;
        let bins = bin_continuous(table, predictor, config.n_bins)?;
        let counts = aggregate(&bins, &RowCount::new(table), false)?;
        let mut graph = Graph::new(
            format!("Histogram of predictor \"{}\"", predictor),
            "Values",
            "Number of observations",
        );
        graph.series.push(Series::keyed(predictor, counts.series()));
        Ok(graph)
    }

    fn produce_table(&self, config: &EvaluationConfig, table: &ObservationTable) -> Result<ResultTable> {
        let predictor = config.predictor()?;
        let values = table.float_column(predictor)?;
        let columns = config
            .percentiles
            .iter()
            .map(|p| Aggregation::Percentile(*p).to_string())
            .collect();
        let mut result = ResultTable::new(format!("Percentiles of predictor \"{}\"", predictor), predictor, columns);
        let row = config
            .percentiles
            .iter()
            .map(|p| percentile(&values, *p).map(Some))
            .collect::<Result<Vec<_>>>()?;
        result.push_row(GroupKey::All, row)?;
        Ok(result)
    }
}
