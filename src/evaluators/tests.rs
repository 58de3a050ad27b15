use super::*;
use crate::config::TargetSpec;
use crate::data::ColumnData;
use crate::errors::EvaluationError;
use crate::grouping::GroupKey;
use crate::metric::{ks_statistic, Metric};
use crate::report::AxisValue;
use crate::utils::precision_round;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// Three months of observations. Score s1 separates the observable outcomes
// perfectly, rows 4 and 10 are unobservable and would break that separation.
// Month 202003 has no observed positive outcome.
fn observations() -> ObservationTable {
    let month = vec![
        202001, 202001, 202001, 202001, 202001, 202001, 202002, 202002, 202002, 202002, 202002, 202002, 202003,
        202003, 202003, 202003,
    ];
    let cat = ["a", "a", "b", "b", "a", "b", "a", "b", "a", "b", "a", "b", "a", "b", "a", "b"];
    let x = vec![1., 2., 3., 4., 5., 6., 7., 8., 9., 10., 11., 1., 2., 3., 4., 5.];
    let def = vec![1., 0., 1., 0., 1., 0., 1., 0., 0., 1., 0., 0., 0., 0., 0., 0.];
    let mut obs = vec![true; 16];
    obs[4] = false;
    obs[10] = false;
    let s1 = vec![
        0.9, 0.3, 0.8, 0.2, 0.1, 0.4, 0.95, 0.35, 0.25, 0.85, 0.99, 0.15, 0.5, 0.6, 0.45, 0.55,
    ];
    let s2 = vec![
        0.2, 0.6, 0.1, 0.7, 0.5, 0.3, 0.4, 0.8, 0.9, 0.35, 0.1, 0.45, 0.5, 0.55, 0.65, 0.15,
    ];
    ObservationTable::new()
        .with_column("month", ColumnData::Int(month))
        .unwrap()
        .with_column("cat", ColumnData::Str(cat.iter().map(|c| c.to_string()).collect()))
        .unwrap()
        .with_column("x", ColumnData::Float(x))
        .unwrap()
        .with_column("def", ColumnData::Float(def))
        .unwrap()
        .with_column("def_obs", ColumnData::Bool(obs))
        .unwrap()
        .with_column("s1", ColumnData::Float(s1))
        .unwrap()
        .with_column("s2", ColumnData::Float(s2))
        .unwrap()
}

fn config(predictor: &str) -> EvaluationConfig {
    EvaluationConfig {
        predictor_column: Some(predictor.to_string()),
        targets: vec![TargetSpec::new("def", "def_obs")],
        scores: vec!["s1".to_string(), "s2".to_string()],
        time_column: Some("month".to_string()),
        ..Default::default()
    }
}

fn cat(c: &str) -> GroupKey {
    GroupKey::Category(c.to_string())
}

#[test]
fn test_histogram_categorical() {
    let table = observations();
    let cfg = config("cat");
    let panel = HistogramCategorical.evaluate(&cfg, &table).unwrap();
    // The histogram describes every row, observable or not.
    assert_eq!(panel.table.get(&cat("a"), "count"), Some(8.0));
    assert_eq!(panel.table.get(&cat("b"), "share"), Some(0.5));
    assert_eq!(panel.table.get(&GroupKey::All, "count"), Some(16.0));
    assert_eq!(panel.table.get(&GroupKey::All, "share"), Some(1.0));
    let series = panel.graph.series("cat").unwrap();
    assert_eq!(series.y(), vec![0.5, 0.5]);
    assert_eq!(series.points[0].0, AxisValue::Key(cat("a")));
}

#[test]
fn test_histogram_categorical_cardinality() {
    let table = observations();
    let cfg = EvaluationConfig {
        min_categories: 3,
        ..config("cat")
    };
    assert!(matches!(
        HistogramCategorical.evaluate(&cfg, &table),
        Err(EvaluationError::Cardinality { found: 2, min: 3, .. })
    ));
    let cfg = EvaluationConfig {
        predictor_column: None,
        ..config("cat")
    };
    assert!(matches!(
        HistogramCategorical.evaluate(&cfg, &table),
        Err(EvaluationError::InvalidInput(_))
    ));
}

#[test]
fn test_histogram_continuous() {
    let table = observations();
    let cfg = config("x");
    let panel = HistogramContinuous.evaluate(&cfg, &table).unwrap();
    let counts = panel.graph.series("x").unwrap().y();
    assert_eq!(counts, vec![4.0, 4.0, 3.0, 2.0, 3.0]);
    assert_eq!(panel.table.columns.len(), 5);
    assert_eq!(panel.table.get(&GroupKey::All, "percentile_50"), Some(4.5));
    assert_eq!(panel.table.get(&GroupKey::All, "percentile_10"), Some(1.5));
}

#[test]
fn test_stability_in_time_categorical() {
    let table = observations();
    let cfg = config("cat");
    let panel = StabilityInTimeCategorical.evaluate(&cfg, &table).unwrap();
    assert_eq!(
        panel.table.row_keys(),
        vec![
            &GroupKey::Time(202001),
            &GroupKey::Time(202002),
            &GroupKey::Time(202003),
            &GroupKey::All
        ]
    );
    assert_eq!(panel.table.columns, vec!["a", "b"]);
    for row in &panel.table.rows {
        let total: f64 = row.values.iter().flatten().sum();
        assert_eq!(precision_round(total, 8), 1.0);
    }
    assert_eq!(panel.graph.series.len(), 2);
    assert_eq!(panel.graph.series("a").unwrap().len(), 3);
}

#[test]
fn test_stability_in_time_continuous() {
    let table = observations();
    let cfg = EvaluationConfig {
        percentiles: vec![50.0],
        ..config("x")
    };
    let panel = StabilityInTimeContinuous.evaluate(&cfg, &table).unwrap();
    assert_eq!(panel.table.get(&GroupKey::Time(202003), "percentile_50"), Some(3.5));
    assert_eq!(panel.table.get(&GroupKey::All, "percentile_50"), Some(4.5));
    let series = panel.graph.series("percentile_50").unwrap();
    assert_eq!(series.len(), 3);
    assert_eq!(panel.graph.x_label, "month");
}

#[test]
fn test_target_association_categorical_uses_observable_rows() {
    let table = observations();
    let cfg = config("cat");
    let panel = TargetAssociationCategorical.evaluate(&cfg, &table).unwrap();
    // Row 4 (a, 202001, default) is not observable.
    assert_eq!(panel.table.get(&GroupKey::Time(202001), "a"), Some(0.5));
    assert_eq!(
        precision_round(panel.table.get(&GroupKey::Time(202002), "b").unwrap(), 6),
        0.333333
    );
    assert_eq!(panel.table.get(&GroupKey::Time(202003), "a"), Some(0.0));
    assert_eq!(panel.table.get(&GroupKey::All, "b"), Some(0.25));
    assert_eq!(
        precision_round(panel.table.get(&GroupKey::All, "All").unwrap(), 6),
        precision_round(4.0 / 14.0, 6)
    );
    // Margins stay in the table, not in the curves.
    assert!(panel.graph.series("All").is_none());
    assert_eq!(panel.graph.series("a").unwrap().len(), 3);
}

#[test]
fn test_target_association_requires_time() {
    let table = observations();
    let cfg = EvaluationConfig {
        time_column: None,
        ..config("cat")
    };
    assert!(matches!(
        TargetAssociationCategorical.evaluate(&cfg, &table),
        Err(EvaluationError::InvalidInput(_))
    ));
    let cfg = EvaluationConfig {
        targets: vec![],
        ..config("cat")
    };
    assert!(matches!(
        TargetAssociationCategorical.evaluate(&cfg, &table),
        Err(EvaluationError::InvalidInput(_))
    ));
}

#[test]
fn test_target_association_continuous() {
    let table = observations();
    let cfg = config("x");
    let panel = TargetAssociationContinuous.evaluate(&cfg, &table).unwrap();
    let all = panel.graph.series("All").unwrap();
    let expected = vec![(1.0_f64 / 3.0).ln(), (1.0_f64 / 3.0).ln(), -10.0, 0.0, 0.0];
    assert_eq!(
        all.y().iter().map(|v| precision_round(*v, 6)).collect::<Vec<_>>(),
        expected.iter().map(|v| precision_round(*v, 6)).collect::<Vec<_>>()
    );
    assert_eq!(panel.graph.series.len(), 4);
    assert!(panel
        .graph
        .series
        .iter()
        .flat_map(|s| s.y())
        .all(|v| (-10.0..=10.0).contains(&v)));

    // count, sum, mean and logodds for three months and the margin.
    assert_eq!(panel.table.columns.len(), 16);
    assert_eq!(panel.table.rows.len(), 6);
    assert_eq!(panel.table.get(&GroupKey::All, "count All"), Some(14.0));
    assert_eq!(panel.table.get(&GroupKey::All, "sum All"), Some(4.0));
    assert_eq!(panel.table.get(&GroupKey::All, "count 202003"), Some(4.0));
}

#[test]
fn test_roc_curve() {
    let table = observations();
    let cfg = config("x");
    let panel = RocCurve.evaluate(&cfg, &table).unwrap();
    assert_eq!(panel.table.get(&cat("s1"), "AUC"), Some(1.0));
    assert_eq!(panel.table.get(&cat("s1"), "Gini"), Some(1.0));
    let auc = panel.table.get(&cat("s2"), "AUC").unwrap();
    let gini = panel.table.get(&cat("s2"), "Gini").unwrap();
    assert_eq!(precision_round(gini, 8), precision_round(2.0 * auc - 1.0, 8));
    let s1 = panel.graph.series("s1").unwrap();
    assert_eq!(s1.points.first().unwrap(), &(AxisValue::Number(0.0), 0.0));
    assert_eq!(s1.points.last().unwrap(), &(AxisValue::Number(1.0), 1.0));
    assert!(panel.graph.series("baseline").is_some());
}

#[test]
fn test_pr_curve() {
    let table = observations();
    let cfg = config("x");
    let panel = PrCurve.evaluate(&cfg, &table).unwrap();
    assert_eq!(precision_round(panel.table.get(&cat("s1"), "average_precision").unwrap(), 8), 1.0);
    assert_eq!(
        panel.table.get(&cat("s2"), "positive_rate"),
        Some(4.0 / 14.0)
    );
    assert_eq!(panel.graph.series("no skill").unwrap().y(), vec![4.0 / 14.0, 4.0 / 14.0]);
}

#[test]
fn test_lift_curve() {
    let table = observations();
    let cfg = config("x");
    let panel = LiftCurve.evaluate(&cfg, &table).unwrap();
    assert_eq!(panel.table.columns.len(), 10);
    assert_eq!(panel.table.get(&cat("s1"), "Lift@1"), Some(1.0));
    assert_eq!(panel.table.get(&cat("s2"), "Lift@1"), Some(1.0));
    assert_eq!(precision_round(panel.table.get(&cat("s1"), "Lift@0.3").unwrap(), 6), 3.5);
    assert_eq!(panel.graph.series("s1").unwrap().len(), 10);
}

#[test]
fn test_ks_in_time() {
    let table = observations();
    let cfg = config("x");
    let evaluator = MetricInTime::ks_in_time();
    assert_eq!(evaluator.name(), "KsInTime");
    let panel = evaluator.evaluate(&cfg, &table).unwrap();
    assert_eq!(panel.table.get(&GroupKey::Time(202001), "s1"), Some(1.0));
    assert_eq!(panel.table.get(&GroupKey::Time(202002), "s1"), Some(1.0));
    // No observed default in 202003.
    assert_eq!(panel.table.get(&GroupKey::Time(202003), "s1"), None);
    assert_eq!(panel.table.rows.len(), 4);
    assert_eq!(panel.graph.series("s1").unwrap().len(), 2);

    let observed = table.filter_observable(cfg.primary_target().unwrap()).unwrap();
    let labels = observed.float_column("def").unwrap();
    let scores = observed.float_column("s2").unwrap();
    assert_eq!(
        panel.table.get(&GroupKey::All, "s2"),
        Some(ks_statistic(&labels, &scores).unwrap())
    );
}

#[test]
fn test_gini_and_lift_in_time() {
    let table = observations();
    let cfg = config("x");
    let panel = MetricInTime::gini_in_time().evaluate(&cfg, &table).unwrap();
    // s2 ranks both 202001 defaults below every non default.
    assert_eq!(panel.table.get(&GroupKey::Time(202001), "s2"), Some(-1.0));
    assert_eq!(panel.table.get(&GroupKey::All, "s1"), Some(1.0));

    let cfg = EvaluationConfig {
        lift_fraction: 0.3,
        ..config("x")
    };
    let evaluator = MetricInTime::lift_in_time();
    let panel = evaluator.evaluate(&cfg, &table).unwrap();
    assert_eq!(panel.name, "LiftInTime");
    assert!(panel.table.caption.starts_with("Lift (30%)"));
    assert_eq!(precision_round(panel.table.get(&GroupKey::All, "s1").unwrap(), 6), 3.5);
}

#[test]
fn test_metric_in_time_rank_invariance() {
    let mut rng = StdRng::seed_from_u64(42);
    let n = 600;
    let month: Vec<i64> = (0..n).map(|i| 202001 + (i % 6) as i64).collect();
    let scores: Vec<f64> = (0..n).map(|_| rng.gen::<f64>()).collect();
    let def: Vec<f64> = scores
        .iter()
        .map(|s| if rng.gen::<f64>() < *s { 1.0 } else { 0.0 })
        .collect();
    let transformed: Vec<f64> = scores.iter().map(|s| (3.0 * s).exp()).collect();
    let table = ObservationTable::new()
        .with_column("month", ColumnData::Int(month))
        .unwrap()
        .with_column("def", ColumnData::Float(def))
        .unwrap()
        .with_column("def_obs", ColumnData::Int(vec![1; n]))
        .unwrap()
        .with_column("raw", ColumnData::Float(scores))
        .unwrap()
        .with_column("exp", ColumnData::Float(transformed))
        .unwrap();
    let cfg = EvaluationConfig {
        targets: vec![TargetSpec::new("def", "def_obs")],
        scores: vec!["raw".to_string(), "exp".to_string()],
        time_column: Some("month".to_string()),
        ..Default::default()
    };
    for metric in [Metric::KS, Metric::Gini, Metric::AUC] {
        let panel = MetricInTime { metric }.evaluate(&cfg, &table).unwrap();
        for row in &panel.table.rows {
            let raw = row.values[0].unwrap();
            let exp = row.values[1].unwrap();
            assert_eq!(precision_round(raw, 10), precision_round(exp, 10));
        }
    }
}

#[test]
fn test_complex_categorical_predictor() {
    let table = observations();
    let cfg = config("cat");
    let report = ComplexEvaluator::categorical_predictor().report(&cfg, &table).unwrap();
    assert_eq!(report.title, "Categorical Predictor Evaluation");
    let names: Vec<&str> = report.panels.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "HistogramCategorical",
            "StabilityInTimeCategorical",
            "TargetAssociationCategorical"
        ]
    );
    assert!(report.to_json().unwrap().contains("Categorical Predictor Evaluation"));
}

#[test]
fn test_complex_continuous_predictor() {
    let table = observations();
    let cfg = config("x");
    let report = ComplexEvaluator::continuous_predictor().report(&cfg, &table).unwrap();
    assert_eq!(report.panels.len(), 3);
    assert!(report.panel("TargetAssociationContinuous").is_some());
}

#[test]
fn test_complex_score_comparison() {
    let table = observations();
    let cfg = config("x");
    let evaluator = ComplexEvaluator::score_comparison();
    let sequential = evaluator.report(&cfg, &table).unwrap();
    assert_eq!(sequential.panels.len(), 4);
    let parallel_cfg = EvaluationConfig {
        parallel: true,
        ..config("x")
    };
    let parallel = evaluator.report(&parallel_cfg, &table).unwrap();
    assert_eq!(sequential, parallel);
    let ks = sequential.panel("KsInTime").unwrap();
    assert_eq!(ks.table.get(&GroupKey::Time(202003), "s2"), None);
}

#[test]
fn test_complex_rejects_invalid_config() {
    let table = observations();
    let cfg = EvaluationConfig {
        n_bins: 0,
        ..config("x")
    };
    assert!(matches!(
        ComplexEvaluator::continuous_predictor().report(&cfg, &table),
        Err(EvaluationError::InvalidInput(_))
    ));
    let cfg = EvaluationConfig {
        scores: vec!["s1".to_string(), "missing".to_string()],
        ..config("x")
    };
    assert!(matches!(
        ComplexEvaluator::score_comparison().report(&cfg, &table),
        Err(EvaluationError::Schema(_))
    ));
}
