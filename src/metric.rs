//! Metrics
//!
//! Scalar discrimination metrics over pairs of ground truth labels and scores.
//! Labels are 0/1 and scores are assumed to be positively correlated with them,
//! i.e. higher scores mark observations more likely to be labelled 1. All the
//! metrics here only depend on the ordering of the scores.
use crate::constants::{DEFAULT_LIFT_FRACTION, LIFT_CURVE_STEPS};
use crate::errors::{EvaluationError, Result};
use crate::utils::{items_to_strings, quantile_sorted, validate_fraction_parameter};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub enum Metric {
    /// Lift of the top 10% of scores.
    Lift,
    /// Lift of the top `p` fraction of scores.
    LiftAt(f64),
    KS,
    Gini,
    AUC,
}

fn get_parse_error(s: &str) -> EvaluationError {
    EvaluationError::InvalidInput(format!(
        "Invalid value {} passed for Metric, expected one of {}.",
        s,
        items_to_strings(vec!["Lift", "Lift@p", "KS", "Gini", "AUC"])
    ))
}

impl FromStr for Metric {
    type Err = EvaluationError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Lift" => Ok(Metric::Lift),
            "KS" => Ok(Metric::KS),
            "Gini" => Ok(Metric::Gini),
            "AUC" => Ok(Metric::AUC),
            _ if s.starts_with("Lift@") => {
                let p_str = &s["Lift@".len()..];
                let p: f64 = p_str.parse().map_err(|_| get_parse_error(s))?;
                validate_fraction_parameter(p, "Lift@p")?;
                Ok(Metric::LiftAt(p))
            }
            _ => Err(get_parse_error(s)),
        }
    }
}

impl Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Lift => write!(f, "Lift"),
            Metric::LiftAt(p) => write!(f, "Lift@{}", p),
            Metric::KS => write!(f, "KS"),
            Metric::Gini => write!(f, "Gini"),
            Metric::AUC => write!(f, "AUC"),
        }
    }
}

impl Metric {
    pub fn calculate(&self, labels: &[f64], scores: &[f64]) -> Result<f64> {
        match self {
            Metric::Lift => lift(labels, scores),
            Metric::LiftAt(p) => lift_at(labels, scores, *p),
            Metric::KS => ks_statistic(labels, scores),
            Metric::Gini => gini(labels, scores),
            Metric::AUC => roc_auc(labels, scores),
        }
    }
}

fn validate_labels_scores(labels: &[f64], scores: &[f64]) -> Result<()> {
    if labels.is_empty() {
        return Err(EvaluationError::InvalidInput("Labels are empty.".to_string()));
    }
    if labels.len() != scores.len() {
        return Err(EvaluationError::InvalidInput(format!(
            "Labels have {} values but scores have {}.",
            labels.len(),
            scores.len()
        )));
    }
    if let Some(l) = labels.iter().find(|&&l| l != 0.0 && l != 1.0) {
        return Err(EvaluationError::InvalidInput(format!(
            "Labels must be binary (0 or 1), found {}.",
            l
        )));
    }
    if let Some(s) = scores.iter().find(|s| !s.is_finite()) {
        return Err(EvaluationError::InvalidInput(format!("Scores must be finite, found {}.", s)));
    }
    Ok(())
}

/// Number of positive and negative labels.
fn class_counts(labels: &[f64]) -> (usize, usize) {
    let pos = labels.iter().filter(|&&l| l == 1.0).count();
    (pos, labels.len() - pos)
}

fn require_both_classes(labels: &[f64], metric: &str) -> Result<(usize, usize)> {
    let (pos, neg) = class_counts(labels);
    if pos == 0 || neg == 0 {
        Err(EvaluationError::DegenerateGroup(format!(
            "{} requires both label classes, found {} positive and {} negative labels.",
            metric, pos, neg
        )))
    } else {
        Ok((pos, neg))
    }
}

/// Indices of the scores, highest score first.
fn descending_order(scores: &[f64]) -> Vec<usize> {
    let mut indices = (0..scores.len()).collect::<Vec<_>>();
    indices.sort_unstable_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    indices
}

/// Lift of the top `p` fraction of scores.
///
/// Rows strictly above the `1 - p` quantile of the scores are selected, so with
/// many ties at the quantile the subset can be smaller than `p` of the rows.
/// The positive rate of the subset is divided by the overall positive rate.
/// `p == 1.0` always yields exactly 1.
///
/// * `labels` - 0/1 ground truth.
/// * `scores` - Model scores.
/// * `p` - Selected fraction, in (0, 1].
pub fn lift_at(labels: &[f64], scores: &[f64], p: f64) -> Result<f64> {
    validate_labels_scores(labels, scores)?;
    validate_fraction_parameter(p, "p")?;
    if p == 1.0 {
        return Ok(1.0);
    }

    let mut sorted = scores.to_vec();
    sorted.sort_unstable_by(|a, b| a.total_cmp(b));
    let threshold = quantile_sorted(&sorted, 1.0 - p);

    let (selected, selected_pos) = labels
        .iter()
        .zip(scores)
        .filter(|(_, s)| **s > threshold)
        .fold((0usize, 0.0), |(n, pos), (l, _)| (n + 1, pos + l));
    if selected == 0 {
        return Err(EvaluationError::DegenerateGroup(format!(
            "No score lies above the {} quantile {}, the top {} subset is empty.",
            1.0 - p,
            threshold,
            p
        )));
    }

    let overall_pos: f64 = labels.iter().sum();
    if overall_pos == 0.0 {
        return Err(EvaluationError::DegenerateGroup(
            "Lift is undefined without positive labels.".to_string(),
        ));
    }

    let rate_selected = selected_pos / selected as f64;
    let rate_overall = overall_pos / labels.len() as f64;
    Ok(rate_selected / rate_overall)
}

/// Lift of the top 10% of scores.
pub fn lift(labels: &[f64], scores: &[f64]) -> Result<f64> {
    lift_at(labels, scores, DEFAULT_LIFT_FRACTION)
}

/// Lift at every fraction in `fractions`, as `(fraction, lift)` pairs.
pub fn lift_curve(labels: &[f64], scores: &[f64], fractions: &[f64]) -> Result<Vec<(f64, f64)>> {
    fractions
        .iter()
        .map(|&p| lift_at(labels, scores, p).map(|l| (p, l)))
        .collect()
}

/// The fractions 0.1, 0.2, ..., 1.0.
pub fn default_lift_fractions() -> Vec<f64> {
    (1..=LIFT_CURVE_STEPS)
        .map(|i| i as f64 / LIFT_CURVE_STEPS as f64)
        .collect()
}

/// Two sample Kolmogorov-Smirnov statistic between the scores of the positive
/// and of the negative rows: the largest distance between their empirical
/// cumulative distribution functions.
pub fn ks_statistic(labels: &[f64], scores: &[f64]) -> Result<f64> {
    validate_labels_scores(labels, scores)?;
    let (pos, neg) = require_both_classes(labels, "KS statistic")?;

    let mut indices = descending_order(scores);
    indices.reverse();

    let (pos, neg) = (pos as f64, neg as f64);
    let mut cum_pos = 0.0;
    let mut cum_neg = 0.0;
    let mut ks: f64 = 0.0;
    for (i, &idx) in indices.iter().enumerate() {
        if labels[idx] == 1.0 {
            cum_pos += 1.0;
        } else {
            cum_neg += 1.0;
        }
        // Only compare once every tie of this score has been consumed.
        let last_of_value = match indices.get(i + 1) {
            Some(&next) => scores[next] != scores[idx],
            None => true,
        };
        if last_of_value {
            ks = ks.max((cum_pos / pos - cum_neg / neg).abs());
        }
    }
    Ok(ks)
}

fn trapezoid_area(x0: f64, x1: f64, y0: f64, y1: f64) -> f64 {
    (x0 - x1).abs() * (y0 + y1) * 0.5
}

/// Area under the ROC curve, ties in the scores count one half.
pub fn roc_auc(labels: &[f64], scores: &[f64]) -> Result<f64> {
    validate_labels_scores(labels, scores)?;
    require_both_classes(labels, "AUC")?;

    let indices = descending_order(scores);
    let mut auc: f64 = 0.0;

    let mut label = labels[indices[0]];
    let mut fp = 1.0 - label;
    let mut tp: f64 = label;
    let mut tp_prev: f64 = 0.0;
    let mut fp_prev: f64 = 0.0;

    for i in 1..indices.len() {
        if scores[indices[i]] != scores[indices[i - 1]] {
            auc += trapezoid_area(fp_prev, fp, tp_prev, tp);
            tp_prev = tp;
            fp_prev = fp;
        }
        label = labels[indices[i]];
        fp += 1.0 - label;
        tp += label;
    }

    auc += trapezoid_area(fp_prev, fp, tp_prev, tp);
    Ok(auc / (tp * fp))
}

/// GINI coefficient, `2 * AUC - 1`, between -1 and 1.
pub fn gini(labels: &[f64], scores: &[f64]) -> Result<f64> {
    Ok(2.0 * roc_auc(labels, scores)? - 1.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocCurve {
    pub fpr: Vec<f64>,
    pub tpr: Vec<f64>,
    /// Score thresholds, the first one is infinite and selects no rows.
    pub thresholds: Vec<f64>,
}

/// ROC curve with one point per distinct score, starting at (0, 0).
pub fn roc_curve(labels: &[f64], scores: &[f64]) -> Result<RocCurve> {
    validate_labels_scores(labels, scores)?;
    let (pos, neg) = require_both_classes(labels, "ROC curve")?;
    let (pos, neg) = (pos as f64, neg as f64);

    let indices = descending_order(scores);
    let mut curve = RocCurve {
        fpr: vec![0.0],
        tpr: vec![0.0],
        thresholds: vec![f64::INFINITY],
    };
    let mut tp = 0.0;
    let mut fp = 0.0;
    for (i, &idx) in indices.iter().enumerate() {
        tp += labels[idx];
        fp += 1.0 - labels[idx];
        let last_of_value = match indices.get(i + 1) {
            Some(&next) => scores[next] != scores[idx],
            None => true,
        };
        if last_of_value {
            curve.fpr.push(fp / neg);
            curve.tpr.push(tp / pos);
            curve.thresholds.push(scores[idx]);
        }
    }
    Ok(curve)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrecisionRecallCurve {
    pub precision: Vec<f64>,
    pub recall: Vec<f64>,
    /// Score thresholds, the first one is infinite and stands for the
    /// (recall 0, precision 1) end point.
    pub thresholds: Vec<f64>,
}

/// Precision-recall curve, ordered by increasing recall.
pub fn precision_recall_curve(labels: &[f64], scores: &[f64]) -> Result<PrecisionRecallCurve> {
    validate_labels_scores(labels, scores)?;
    let (pos, _) = class_counts(labels);
    if pos == 0 {
        return Err(EvaluationError::DegenerateGroup(
            "Precision-recall curve requires positive labels.".to_string(),
        ));
    }
    let pos = pos as f64;

    let indices = descending_order(scores);
    let mut curve = PrecisionRecallCurve {
        precision: vec![1.0],
        recall: vec![0.0],
        thresholds: vec![f64::INFINITY],
    };
    let mut tp = 0.0;
    for (i, &idx) in indices.iter().enumerate() {
        tp += labels[idx];
        let last_of_value = match indices.get(i + 1) {
            Some(&next) => scores[next] != scores[idx],
            None => true,
        };
        if last_of_value {
            curve.precision.push(tp / (i + 1) as f64);
            curve.recall.push(tp / pos);
            curve.thresholds.push(scores[idx]);
        }
    }
    Ok(curve)
}

/// Average precision, the precision at each threshold weighted by the increase in recall.
pub fn average_precision(labels: &[f64], scores: &[f64]) -> Result<f64> {
    let curve = precision_recall_curve(labels, scores)?;
    Ok(curve
        .recall
        .windows(2)
        .zip(curve.precision.iter().skip(1))
        .map(|(r, p)| (r[1] - r[0]) * p)
        .sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::precision_round;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_sample(n: usize, seed: u64) -> (Vec<f64>, Vec<f64>) {
        let mut rng = StdRng::seed_from_u64(seed);
        let scores: Vec<f64> = (0..n).map(|_| rng.gen::<f64>()).collect();
        let labels = scores
            .iter()
            .map(|s| if rng.gen::<f64>() < *s { 1.0 } else { 0.0 })
            .collect();
        (labels, scores)
    }

    #[test]
    fn test_lift_rank_ordered() {
        let labels = vec![1., 1., 1., 0., 0., 0., 0., 0., 0., 0.];
        let scores = vec![9., 8., 7., 6., 5., 4., 3., 2., 1., 0.];
        let res = lift_at(&labels, &scores, 0.3).unwrap();
        assert_eq!(precision_round(res, 3), 3.333);
        // Top 10% is {9}, fully positive.
        assert_eq!(precision_round(lift(&labels, &scores).unwrap(), 3), 3.333);
        assert_eq!(precision_round(lift_at(&labels, &scores, 0.5).unwrap(), 3), 2.0);
    }

    #[test]
    fn test_lift_full_population() {
        let (labels, scores) = random_sample(200, 0);
        assert_eq!(lift_at(&labels, &scores, 1.0).unwrap(), 1.0);
        let labels = vec![1., 0., 0.];
        let scores = vec![0.5, 0.5, 0.5];
        assert_eq!(lift_at(&labels, &scores, 1.0).unwrap(), 1.0);
    }

    #[test]
    fn test_lift_errors() {
        let labels = vec![1., 0., 0.];
        assert!(matches!(
            lift_at(&[], &[], 0.1),
            Err(EvaluationError::InvalidInput(_))
        ));
        assert!(matches!(
            lift_at(&labels, &[0.1, 0.2], 0.1),
            Err(EvaluationError::InvalidInput(_))
        ));
        assert!(matches!(
            lift_at(&labels, &[0.1, 0.2, 0.3], 0.0),
            Err(EvaluationError::InvalidInput(_))
        ));
        assert!(matches!(
            lift_at(&labels, &[0.1, 0.2, 0.3], 1.5),
            Err(EvaluationError::InvalidInput(_))
        ));
        // Constant scores leave nothing strictly above the quantile.
        assert!(matches!(
            lift_at(&labels, &[0.5, 0.5, 0.5], 0.3),
            Err(EvaluationError::DegenerateGroup(_))
        ));
        assert!(matches!(
            lift_at(&[0., 0., 0.], &[0.1, 0.2, 0.3], 0.3),
            Err(EvaluationError::DegenerateGroup(_))
        ));
        assert!(matches!(
            lift_at(&[2., 0., 0.], &[0.1, 0.2, 0.3], 0.3),
            Err(EvaluationError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_lift_ties_at_quantile() {
        // The 0.5 quantile is 1.0 and only the single 2.0 lies strictly above it.
        let labels = vec![1., 0., 1., 0.];
        let scores = vec![2., 1., 1., 1.];
        assert_eq!(lift_at(&labels, &scores, 0.5).unwrap(), 2.0);
    }

    #[test]
    fn test_lift_curve() {
        let labels = vec![1., 1., 1., 0., 0., 0., 0., 0., 0., 0.];
        let scores = vec![9., 8., 7., 6., 5., 4., 3., 2., 1., 0.];
        let curve = lift_curve(&labels, &scores, &default_lift_fractions()).unwrap();
        assert_eq!(curve.len(), 10);
        assert_eq!(curve.last().unwrap(), &(1.0, 1.0));
        assert!(curve.windows(2).all(|w| w[0].1 >= w[1].1));
    }

    #[test]
    fn test_ks_perfect_separation() {
        let labels = vec![1., 1., 0., 0.];
        let scores = vec![1.0, 1.0, 0.0, 0.0];
        assert_eq!(ks_statistic(&labels, &scores).unwrap(), 1.0);
    }

    #[test]
    fn test_ks_known_value() {
        let labels = vec![1., 0., 1., 0., 1., 0.];
        let scores = vec![0.9, 0.8, 0.7, 0.3, 0.2, 0.1];
        // Classes alternate, the gap never exceeds one observation of a class.
        assert_eq!(precision_round(ks_statistic(&labels, &scores).unwrap(), 6), 0.333333);
    }

    #[test]
    fn test_ks_ties_across_classes() {
        let labels = vec![1., 0.];
        let scores = vec![0.5, 0.5];
        assert_eq!(ks_statistic(&labels, &scores).unwrap(), 0.0);
    }

    #[test]
    fn test_ks_single_class() {
        let res = ks_statistic(&[1., 1.], &[0.2, 0.3]);
        assert!(matches!(res, Err(EvaluationError::DegenerateGroup(_))));
    }

    #[test]
    fn test_ks_monotone_invariance() {
        let (labels, scores) = random_sample(500, 1);
        let transformed: Vec<f64> = scores.iter().map(|s| (3.0 * s).exp() + 7.0).collect();
        let ks = ks_statistic(&labels, &scores).unwrap();
        let ks_t = ks_statistic(&labels, &transformed).unwrap();
        assert_eq!(precision_round(ks, 10), precision_round(ks_t, 10));
        assert!(ks > 0.0 && ks <= 1.0);
    }

    #[test]
    fn test_ks_class_swap() {
        let (labels, scores) = random_sample(300, 2);
        let swapped: Vec<f64> = labels.iter().map(|l| 1.0 - l).collect();
        assert_eq!(
            precision_round(ks_statistic(&labels, &scores).unwrap(), 10),
            precision_round(ks_statistic(&swapped, &scores).unwrap(), 10)
        );
    }

    #[test]
    fn test_auc_generic() {
        assert_eq!(roc_auc(&[0., 1.], &[0., 1.]).unwrap(), 1.0);
        assert_eq!(roc_auc(&[0., 1.], &[1., 0.]).unwrap(), 0.0);
        assert_eq!(roc_auc(&[1., 0.], &[1., 1.]).unwrap(), 0.5);
        assert_eq!(roc_auc(&[1., 0.], &[0.5, 0.5]).unwrap(), 0.5);
        assert!(roc_auc(&[0., 0.], &[0.25, 0.75]).unwrap_err().is_degenerate());
        assert!(roc_auc(&[1., 1.], &[0.25, 0.75]).unwrap_err().is_degenerate());
    }

    #[test]
    fn test_auc_real_data() {
        let y = vec![1., 0., 1., 0., 0., 0., 0.];
        let yhat = vec![0.5, 0.01, -0., 1.05, 0., -4., 0.];
        let res = roc_auc(&y, &yhat).unwrap();
        assert_eq!(precision_round(res, 5), 0.6);
    }

    #[test]
    fn test_gini_range_and_inversion() {
        for seed in 0..5 {
            let (labels, scores) = random_sample(100, seed);
            let g = gini(&labels, &scores).unwrap();
            let inverted: Vec<f64> = scores.iter().map(|s| -s).collect();
            let g_inv = gini(&labels, &inverted).unwrap();
            assert!((-1.0..=1.0).contains(&g));
            assert_eq!(precision_round(g, 10), precision_round(-g_inv, 10));
        }
    }

    #[test]
    fn test_gini_monotone_invariance() {
        let (labels, scores) = random_sample(250, 3);
        let transformed: Vec<f64> = scores.iter().map(|s| s.powi(3) * 100.0 - 4.0).collect();
        assert_eq!(
            precision_round(gini(&labels, &scores).unwrap(), 10),
            precision_round(gini(&labels, &transformed).unwrap(), 10)
        );
    }

    #[test]
    fn test_roc_curve() {
        let labels = vec![1., 1., 0., 0.];
        let scores = vec![0.9, 0.6, 0.6, 0.1];
        let curve = roc_curve(&labels, &scores).unwrap();
        assert_eq!(curve.fpr, vec![0.0, 0.0, 0.5, 1.0]);
        assert_eq!(curve.tpr, vec![0.0, 0.5, 1.0, 1.0]);
        assert_eq!(curve.thresholds[1..], [0.9, 0.6, 0.1]);
    }

    #[test]
    fn test_precision_recall_curve() {
        let labels = vec![1., 0., 1., 0.];
        let scores = vec![0.9, 0.8, 0.7, 0.1];
        let curve = precision_recall_curve(&labels, &scores).unwrap();
        assert_eq!(curve.recall, vec![0.0, 0.5, 0.5, 1.0, 1.0]);
        assert_eq!(curve.precision[..4], [1.0, 1.0, 0.5, 2.0 / 3.0]);
        assert_eq!(curve.precision[4], 0.5);
        let ap = average_precision(&labels, &scores).unwrap();
        assert_eq!(precision_round(ap, 6), precision_round(0.5 + 0.5 * 2.0 / 3.0, 6));
    }

    #[test]
    fn test_metric_from_str() {
        assert_eq!(Metric::from_str("KS").unwrap(), Metric::KS);
        assert_eq!(Metric::from_str("Lift@0.2").unwrap(), Metric::LiftAt(0.2));
        assert!(Metric::from_str("Lift@2").is_err());
        assert!(Metric::from_str("Lift@x").is_err());
        assert!(Metric::from_str("F1").is_err());
        assert_eq!(Metric::LiftAt(0.2).to_string(), "Lift@0.2");
    }

    #[test]
    fn test_metric_calculate() {
        let labels = vec![1., 1., 0., 0.];
        let scores = vec![1.0, 1.0, 0.0, 0.0];
        assert_eq!(Metric::KS.calculate(&labels, &scores).unwrap(), 1.0);
        assert_eq!(Metric::Gini.calculate(&labels, &scores).unwrap(), 1.0);
        assert_eq!(Metric::AUC.calculate(&labels, &scores).unwrap(), 1.0);
        assert_eq!(Metric::LiftAt(1.0).calculate(&labels, &scores).unwrap(), 1.0);
    }
}
