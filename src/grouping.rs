//! Grouped metrics
//!
//! Partitions of an `ObservationTable` by category, by time bucket or by bin of
//! a continuous predictor, and the aggregation of a metric over every group of
//! such a partition. When a margin is requested it is computed on the union of
//! the rows of all the groups, never by averaging the per group values.
use crate::binning::Bin;
use crate::constants::{DEFAULT_MAX_CATEGORIES, DEFAULT_MIN_CATEGORIES, MARGIN_NAME};
use crate::data::ObservationTable;
use crate::errors::{EvaluationError, Result};
use crate::metric::Metric;
use crate::utils::{logodds, mean, percentile};
use hashbrown::HashMap;
use log::{debug, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{self, Display};

/// Key of a single group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GroupKey {
    Category(String),
    /// Integer time bucket, e.g. 202001.
    Time(i64),
    Bin(Bin),
    /// The margin, computed over the union of all groups.
    All,
}

impl GroupKey {
    fn rank(&self) -> u8 {
        match self {
            GroupKey::Category(_) => 0,
            GroupKey::Time(_) => 1,
            GroupKey::Bin(_) => 2,
            GroupKey::All => 3,
        }
    }

    pub fn is_margin(&self) -> bool {
        matches!(self, GroupKey::All)
    }
}

// Categories sort as strings, time buckets chronologically, bins by position,
// and the margin always comes last.
impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (GroupKey::Category(a), GroupKey::Category(b)) => a.cmp(b),
            (GroupKey::Time(a), GroupKey::Time(b)) => a.cmp(b),
            (GroupKey::Bin(a), GroupKey::Bin(b)) => a
                .index
                .cmp(&b.index)
                .then_with(|| a.lo.total_cmp(&b.lo))
                .then_with(|| a.hi.total_cmp(&b.hi)),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GroupKey {}

impl Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Category(c) => write!(f, "{}", c),
            GroupKey::Time(t) => write!(f, "{}", t),
            GroupKey::Bin(b) => write!(f, "{}", b),
            GroupKey::All => write!(f, "{}", MARGIN_NAME),
        }
    }
}

/// Bounds guarding categorical groupings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupingPolicy {
    pub min_categories: usize,
    pub max_categories: usize,
    /// Evaluate the groups of a grouping in parallel.
    pub parallel: bool,
}

impl Default for GroupingPolicy {
    fn default() -> Self {
        GroupingPolicy {
            min_categories: DEFAULT_MIN_CATEGORIES,
            max_categories: DEFAULT_MAX_CATEGORIES,
            parallel: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub key: GroupKey,
    /// Row indices into the grouped table.
    pub rows: Vec<usize>,
}

/// A partition of the rows of a table, groups ordered by key.
#[derive(Debug, Clone)]
pub struct Grouping<'a> {
    table: &'a ObservationTable,
    key_column: String,
    groups: Vec<Group>,
    parallel: bool,
}

impl<'a> Grouping<'a> {
    pub(crate) fn new(table: &'a ObservationTable, key_column: &str, groups: Vec<Group>) -> Self {
        debug!("Grouped {} rows by \"{}\" into {} groups", table.n_rows(), key_column, groups.len());
        Grouping {
            table,
            key_column: key_column.to_string(),
            groups,
            parallel: false,
        }
    }

    /// Evaluate groups in parallel during aggregation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn table(&self) -> &'a ObservationTable {
        self.table
    }

    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn keys(&self) -> Vec<GroupKey> {
        self.groups.iter().map(|g| g.key.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Union of the rows of all groups, in ascending row order.
    pub fn all_rows(&self) -> Vec<usize> {
        let mut rows: Vec<usize> = self.groups.iter().flat_map(|g| g.rows.iter().copied()).collect();
        rows.sort_unstable();
        rows
    }

    /// Group index of every row of the table, `None` for rows in no group.
    pub fn row_lookup(&self) -> Vec<Option<usize>> {
        let mut lookup = vec![None; self.table.n_rows()];
        for (i, g) in self.groups.iter().enumerate() {
            for &r in &g.rows {
                lookup[r] = Some(i);
            }
        }
        lookup
    }
}

/// Partition rows by the string value of `key_column`.
///
/// Fails when the number of distinct values is outside
/// `[policy.min_categories, policy.max_categories]`.
pub fn group_by_category<'a>(
    table: &'a ObservationTable,
    key_column: &str,
    policy: &GroupingPolicy,
) -> Result<Grouping<'a>> {
    let values = table.string_column(key_column)?;
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<Group> = Vec::new();
    for (row, v) in values.iter().enumerate() {
        let i = *index.entry(v.as_str()).or_insert_with(|| {
            groups.push(Group {
                key: GroupKey::Category(v.clone()),
                rows: Vec::new(),
            });
            groups.len() - 1
        });
        groups[i].rows.push(row);
    }

    if groups.len() < policy.min_categories || groups.len() > policy.max_categories {
        return Err(EvaluationError::Cardinality {
            column: key_column.to_string(),
            found: groups.len(),
            min: policy.min_categories,
            max: policy.max_categories,
        });
    }

    groups.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(Grouping::new(table, key_column, groups).with_parallel(policy.parallel))
}

/// Partition rows by the integer value of `time_column`, in chronological order.
pub fn group_by_time<'a>(table: &'a ObservationTable, time_column: &str) -> Result<Grouping<'a>> {
    let values = table.int_column(time_column)?;
    let mut index: HashMap<i64, usize> = HashMap::new();
    let mut groups: Vec<Group> = Vec::new();
    for (row, &t) in values.iter().enumerate() {
        let i = *index.entry(t).or_insert_with(|| {
            groups.push(Group {
                key: GroupKey::Time(t),
                rows: Vec::new(),
            });
            groups.len() - 1
        });
        groups[i].rows.push(row);
    }
    groups.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(Grouping::new(table, time_column, groups))
}

/// A scalar computed from a subset of the rows of a table.
///
/// Implementations read their columns up front, so that schema errors surface
/// before any group is evaluated.
pub trait GroupMetric: Sync {
    /// Evaluate the metric on the given rows.
    fn evaluate(&self, rows: &[usize]) -> Result<f64>;
    /// Number of rows of the table the metric was built from.
    fn n_rows(&self) -> usize;
    fn name(&self) -> String;
}

/// Number of rows in the group.
pub struct RowCount {
    n_rows: usize,
}

impl RowCount {
    pub fn new(table: &ObservationTable) -> Self {
        RowCount { n_rows: table.n_rows() }
    }
}

impl GroupMetric for RowCount {
    fn evaluate(&self, rows: &[usize]) -> Result<f64> {
        Ok(rows.len() as f64)
    }
    fn n_rows(&self) -> usize {
        self.n_rows
    }
    fn name(&self) -> String {
        "count".to_string()
    }
}

/// A discrimination metric of a score against a binary outcome.
pub struct ScoreMetric {
    labels: Vec<f64>,
    scores: Vec<f64>,
    metric: Metric,
}

impl ScoreMetric {
    pub fn new(table: &ObservationTable, outcome_column: &str, score_column: &str, metric: Metric) -> Result<Self> {
        Ok(ScoreMetric {
            labels: table.float_column(outcome_column)?,
            scores: table.float_column(score_column)?,
            metric,
        })
    }
}

impl GroupMetric for ScoreMetric {
    fn evaluate(&self, rows: &[usize]) -> Result<f64> {
        if rows.is_empty() {
            return Err(EvaluationError::DegenerateGroup(format!("{} of an empty group.", self.metric)));
        }
        let labels: Vec<f64> = rows.iter().map(|&r| self.labels[r]).collect();
        let scores: Vec<f64> = rows.iter().map(|&r| self.scores[r]).collect();
        self.metric.calculate(&labels, &scores)
    }
    fn n_rows(&self) -> usize {
        self.labels.len()
    }
    fn name(&self) -> String {
        self.metric.to_string()
    }
}

/// Statistic summarising the values of a single column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Aggregation {
    Count,
    Sum,
    Mean,
    /// Clamped log odds of the mean of a 0/1 column.
    LogOdds,
    /// Percentile in [0, 100].
    Percentile(f64),
}

impl Aggregation {
    pub fn apply(&self, values: &[f64]) -> Result<f64> {
        match self {
            Aggregation::Count => Ok(values.len() as f64),
            Aggregation::Sum => Ok(values.iter().sum()),
            Aggregation::Mean => mean(values).ok_or_else(|| Self::empty_error("Mean")),
            Aggregation::LogOdds => {
                let rate = mean(values).ok_or_else(|| Self::empty_error("Log odds"))?;
                if !(0.0..=1.0).contains(&rate) {
                    return Err(EvaluationError::InvalidInput(format!(
                        "Log odds need a rate within [0, 1], found mean {}.",
                        rate
                    )));
                }
                Ok(logodds(rate))
            }
            Aggregation::Percentile(p) => percentile(values, *p),
        }
    }

    /// Sums and counts add up across groups, which makes shares meaningful.
    pub fn is_additive(&self) -> bool {
        matches!(self, Aggregation::Count | Aggregation::Sum)
    }

    fn empty_error(what: &str) -> EvaluationError {
        EvaluationError::DegenerateGroup(format!("{} of an empty group is undefined.", what))
    }
}

impl Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aggregation::Count => write!(f, "count"),
            Aggregation::Sum => write!(f, "sum"),
            Aggregation::Mean => write!(f, "mean"),
            Aggregation::LogOdds => write!(f, "logodds"),
            Aggregation::Percentile(p) => write!(f, "percentile_{}", p),
        }
    }
}

/// An `Aggregation` of a numeric column.
pub struct ColumnStatistic {
    values: Vec<f64>,
    aggregation: Aggregation,
}

impl ColumnStatistic {
    pub fn new(table: &ObservationTable, column: &str, aggregation: Aggregation) -> Result<Self> {
        Ok(ColumnStatistic {
            values: table.float_column(column)?,
            aggregation,
        })
    }
}

impl GroupMetric for ColumnStatistic {
    fn evaluate(&self, rows: &[usize]) -> Result<f64> {
        let values: Vec<f64> = rows.iter().map(|&r| self.values[r]).collect();
        self.aggregation.apply(&values)
    }
    fn n_rows(&self) -> usize {
        self.values.len()
    }
    fn name(&self) -> String {
        self.aggregation.to_string()
    }
}

/// Metric value of a group, or the degenerate error explaining why there is none.
pub type GroupValue = std::result::Result<f64, EvaluationError>;

/// Per group metric values, ordered by key, the margin last.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricResult {
    pub metric: String,
    entries: Vec<(GroupKey, GroupValue)>,
}

impl MetricResult {
    pub fn entries(&self) -> &[(GroupKey, GroupValue)] {
        &self.entries
    }

    pub fn get(&self, key: &GroupKey) -> Option<&GroupValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Value of a group, `None` when the group is absent or degenerate.
    pub fn value(&self, key: &GroupKey) -> Option<f64> {
        self.get(key).and_then(|v| v.as_ref().ok().copied())
    }

    pub fn margin(&self) -> Option<&GroupValue> {
        self.get(&GroupKey::All)
    }

    /// Keys of the groups whose metric could not be computed.
    pub fn degenerate_keys(&self) -> Vec<&GroupKey> {
        self.entries
            .iter()
            .filter(|(_, v)| v.is_err())
            .map(|(k, _)| k)
            .collect()
    }

    /// The computable per group values, without the margin.
    pub fn series(&self) -> Vec<(GroupKey, f64)> {
        self.entries
            .iter()
            .filter(|(k, _)| !k.is_margin())
            .filter_map(|(k, v)| v.as_ref().ok().map(|v| (k.clone(), *v)))
            .collect()
    }
}

fn evaluate_group<M: GroupMetric + ?Sized>(metric: &M, key: &GroupKey, rows: &[usize]) -> Result<GroupValue> {
    match metric.evaluate(rows) {
        Ok(v) => Ok(Ok(v)),
        Err(e) if e.is_degenerate() => {
            warn!("Group {} recorded as degenerate for {}: {}", key, metric.name(), e);
            Ok(Err(e))
        }
        Err(e) => Err(e),
    }
}

/// Apply `metric` to every group of `grouping`.
///
/// A degenerate group is recorded as such and does not stop the other groups.
/// Any other error aborts the aggregation. With `include_margin` an `All` entry
/// is computed over the union of the rows of all the groups.
pub fn aggregate<M: GroupMetric + ?Sized>(
    grouping: &Grouping,
    metric: &M,
    include_margin: bool,
) -> Result<MetricResult> {
    if metric.n_rows() != grouping.table().n_rows() {
        return Err(EvaluationError::InvalidInput(format!(
            "Metric {} was built from a table of {} rows, but the grouping covers {} rows.",
            metric.name(),
            metric.n_rows(),
            grouping.table().n_rows()
        )));
    }

    let per_group: Vec<GroupValue> = if grouping.parallel {
        grouping
            .groups
            .par_iter()
            .map(|g| evaluate_group(metric, &g.key, &g.rows))
            .collect::<Result<Vec<_>>>()?
    } else {
        grouping
            .groups
            .iter()
            .map(|g| evaluate_group(metric, &g.key, &g.rows))
            .collect::<Result<Vec<_>>>()?
    };

    let mut entries: Vec<(GroupKey, GroupValue)> = grouping.keys().into_iter().zip(per_group).collect();
    if include_margin {
        let margin = evaluate_group(metric, &GroupKey::All, &grouping.all_rows())?;
        entries.push((GroupKey::All, margin));
    }

    Ok(MetricResult {
        metric: metric.name(),
        entries,
    })
}
