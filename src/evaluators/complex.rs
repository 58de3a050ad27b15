use crate::config::EvaluationConfig;
use crate::data::ObservationTable;
use crate::errors::Result;
use crate::evaluators::{
    Evaluator, HistogramCategorical, HistogramContinuous, LiftCurve, MetricInTime, PrCurve, RocCurve,
    StabilityInTimeCategorical, StabilityInTimeContinuous, TargetAssociationCategorical,
    TargetAssociationContinuous,
};
use crate::report::{Panel, Report};
use log::info;
use rayon::prelude::*;

/// A titled collection of basic evaluators, evaluated on the same data.
pub struct ComplexEvaluator {
    pub title: String,
    pub components: Vec<Box<dyn Evaluator + Send + Sync>>,
}

impl ComplexEvaluator {
    pub fn new(title: &str, components: Vec<Box<dyn Evaluator + Send + Sync>>) -> Self {
        ComplexEvaluator {
            title: title.to_string(),
            components,
        }
    }

    /// Distribution, stability in time and default rate of a categorical predictor.
    pub fn categorical_predictor() -> Self {
        ComplexEvaluator::new(
            "Categorical Predictor Evaluation",
            vec![
                Box::new(HistogramCategorical),
                Box::new(StabilityInTimeCategorical),
                Box::new(TargetAssociationCategorical),
            ],
        )
    }

    /// Distribution, stability in time and log odds of a continuous predictor.
    pub fn continuous_predictor() -> Self {
        ComplexEvaluator::new(
            "Continuous Predictor Evaluation",
            vec![
                Box::new(HistogramContinuous),
                Box::new(StabilityInTimeContinuous),
                Box::new(TargetAssociationContinuous),
            ],
        )
    }

    /// Side by side comparison of the configured scores.
    pub fn score_comparison() -> Self {
        ComplexEvaluator::new(
            "Score Comparison",
            vec![
                Box::new(RocCurve),
                Box::new(PrCurve),
                Box::new(LiftCurve),
                Box::new(MetricInTime::ks_in_time()),
            ],
        )
    }

    /// Evaluate every component. The first failing component aborts the report.
    ///
    /// * `config` - Columns and policy shared by all components, validated first.
    /// * `table` - Observations, unobservable outcomes are filtered by the components that need a target.
    pub fn report(&self, config: &EvaluationConfig, table: &ObservationTable) -> Result<Report> {
        config.validate()?;
        let panels: Vec<Panel> = if config.parallel {
            self.components
                .par_iter()
                .map(|c| c.evaluate(config, table))
                .collect::<Result<Vec<_>>>()?
        } else {
            self.components
                .iter()
                .map(|c| c.evaluate(config, table))
                .collect::<Result<Vec<_>>>()?
        };
        info!(
            "{}: assembled {} panels from a table of {} rows.",
            self.title,
            panels.len(),
            table.n_rows()
        );
        Ok(Report {
            title: self.title.clone(),
            panels,
        })
    }
}
