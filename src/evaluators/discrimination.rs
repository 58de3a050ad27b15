use crate::config::EvaluationConfig;
use crate::data::ObservationTable;
use crate::errors::Result;
use crate::evaluators::{observable_rows, Evaluator};
use crate::grouping::GroupKey;
use crate::metric::{
    average_precision, default_lift_fractions, gini, lift_curve, precision_recall_curve, roc_auc, roc_curve, Metric,
};
use crate::report::{Graph, ResultTable, Series};
use crate::utils::mean;

/// Labels of the primary target and the values of every configured score,
/// restricted to the rows with an observable outcome.
struct ScoredRows<'c> {
    outcome: &'c str,
    labels: Vec<f64>,
    scores: Vec<(&'c str, Vec<f64>)>,
}

impl<'c> ScoredRows<'c> {
    fn load(config: &'c EvaluationConfig, table: &ObservationTable) -> Result<Self> {
        let (target, observed) = observable_rows(config, table)?;
        let scores = config
            .score_columns()?
            .iter()
            .map(|s| Ok((s.as_str(), observed.float_column(s)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(ScoredRows {
            outcome: &target.outcome_column,
            labels: observed.float_column(&target.outcome_column)?,
            scores,
        })
    }
}

/// ROC curve of every score against the primary target.
pub struct RocCurve;

impl Evaluator for RocCurve {
    fn name(&self) -> &'static str {
        "RocCurve"
    }

    fn produce_series(&self, config: &EvaluationConfig, table: &ObservationTable) -> Result<Graph> {
        let rows = ScoredRows::load(config, table)?;
        let mut graph = Graph::new(
            format!("ROC curves for target \"{}\"", rows.outcome),
            "False Positive Rate",
            "True Positive Rate",
        );
        for (name, scores) in &rows.scores {
            let curve = roc_curve(&rows.labels, scores)?;
            graph.series.push(Series::numeric(name, &curve.fpr, &curve.tpr));
        }
        graph.series.push(Series::numeric("baseline", &[0.0, 1.0], &[0.0, 1.0]));
        Ok(graph)
    }

    fn produce_table(&self, config: &EvaluationConfig, table: &ObservationTable) -> Result<ResultTable> {
        let rows = ScoredRows::load(config, table)?;
        let mut result = ResultTable::new(
            format!("AUC and Gini for target \"{}\"", rows.outcome),
            "score",
            vec!["AUC".to_string(), "Gini".to_string()],
        );
        for (name, scores) in &rows.scores {
            let auc = roc_auc(&rows.labels, scores)?;
            let g = gini(&rows.labels, scores)?;
            result.push_row(GroupKey::Category(name.to_string()), vec![Some(auc), Some(g)])?;
        }
        Ok(result)
    }
}

/// Precision-recall curve of every score, with the no skill line at the positive rate.
pub struct PrCurve;

impl Evaluator for PrCurve {
    fn name(&self) -> &'static str {
        "PrCurve"
    }

    fn produce_series(&self, config: &EvaluationConfig, table: &ObservationTable) -> Result<Graph> {
        let rows = ScoredRows::load(config, table)?;
        let mut graph = Graph::new(format!("PR curves for target \"{}\"", rows.outcome), "Recall", "Precision");
        for (name, scores) in &rows.scores {
            let curve = precision_recall_curve(&rows.labels, scores)?;
            graph.series.push(Series::numeric(name, &curve.recall, &curve.precision));
        }
        if let Some(rate) = mean(&rows.labels) {
            graph.series.push(Series::numeric("no skill", &[0.0, 1.0], &[rate, rate]));
        }
        Ok(graph)
    }

    fn produce_table(&self, config: &EvaluationConfig, table: &ObservationTable) -> Result<ResultTable> {
        let rows = ScoredRows::load(config, table)?;
        let mut result = ResultTable::new(
            format!("Average precision for target \"{}\"", rows.outcome),
            "score",
            vec!["average_precision".to_string(), "positive_rate".to_string()],
        );
        let rate = mean(&rows.labels);
        for (name, scores) in &rows.scores {
            let ap = average_precision(&rows.labels, scores)?;
            result.push_row(GroupKey::Category(name.to_string()), vec![Some(ap), rate])?;
        }
        Ok(result)
    }
}

/// Lift of every score at the fractions 0.1, 0.2, ..., 1.0.
pub struct LiftCurve;

impl Evaluator for LiftCurve {
    fn name(&self) -> &'static str {
        "LiftCurve"
    }

    fn produce_series(&self, config: &EvaluationConfig, table: &ObservationTable) -> Result<Graph> {
        let rows = ScoredRows::load(config, table)?;
        let fractions = default_lift_fractions();
        let mut graph = Graph::new(format!("Lifts for target \"{}\"", rows.outcome), "Lift percentage", "Lift");
        for (name, scores) in &rows.scores {
            let (x, y): (Vec<f64>, Vec<f64>) = lift_curve(&rows.labels, scores, &fractions)?.into_iter().unzip();
            graph.series.push(Series::numeric(name, &x, &y));
        }
        graph.series.push(Series::numeric("baseline", &[0.0, 1.0], &[1.0, 1.0]));
        Ok(graph)
    }

    fn produce_table(&self, config: &EvaluationConfig, table: &ObservationTable) -> Result<ResultTable> {
        let rows = ScoredRows::load(config, table)?;
        let fractions = default_lift_fractions();
        let columns: Vec<String> = fractions.iter().map(|p| Metric::LiftAt(*p).to_string()).collect();
        let mut result = ResultTable::new(format!("Lifts for target \"{}\"", rows.outcome), "score", columns);
        for (name, scores) in &rows.scores {
            let values = lift_curve(&rows.labels, scores, &fractions)?
                .into_iter()
                .map(|(_, l)| Some(l))
                .collect();
            result.push_row(GroupKey::Category(name.to_string()), values)?;
        }
        Ok(result)
    }
}
