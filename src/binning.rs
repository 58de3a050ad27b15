//! Binning
//!
//! Equal width binning of a continuous predictor. The range
//! `[min(predictor), max(predictor)]` is split into `n_bins` intervals of the
//! same length, so bin boundaries follow the natural scale of the predictor
//! rather than the density of the data. Bins can therefore be empty or hold
//! most of the rows; they are kept either way so that every chart over the
//! predictor has the same x axis.
use crate::errors::{EvaluationError, Result};
use crate::grouping::{Group, GroupKey, Grouping};
use crate::data::ObservationTable;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// A half open interval `[lo, hi)`, the last bin of a binning is closed `[lo, hi]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Bin {
    /// Position of the bin, 0 is the lowest.
    pub index: usize,
    pub lo: f64,
    pub hi: f64,
    pub closed_right: bool,
}

impl Bin {
    pub fn contains(&self, v: f64) -> bool {
        self.lo <= v && (v < self.hi || (self.closed_right && v == self.hi))
    }

    pub fn width(&self) -> f64 {
        self.hi - self.lo
    }
}

impl Display for Bin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let close = if self.closed_right { ']' } else { ')' };
        write!(f, "[{}, {}{}", self.lo, self.hi, close)
    }
}

/// Boundaries of `n_bins` equal width bins over `[min, max]`, `n_bins + 1` values.
/// The last edge is exactly `max` so that the maximum always falls in the last bin.
///
/// A range wider than `f64::MAX` is split on the halved scale, where `max - min`
/// cannot overflow, and the edges are scaled back.
pub fn equal_width_edges(min: f64, max: f64, n_bins: usize) -> Vec<f64> {
    let n = n_bins as f64;
    let mut edges: Vec<f64> = if (max - min).is_finite() {
        let width = (max - min) / n;
        (0..n_bins).map(|i| min + width * i as f64).collect()
    } else {
        let half_width = (max / 2.0 - min / 2.0) / n;
        (0..n_bins).map(|i| 2.0 * (min / 2.0 + half_width * i as f64)).collect()
    };
    edges.push(max);
    edges
}

/// Position of `v` among the bins described by `edges`, the last bin being closed.
/// `v` is expected to lie within `[edges[0], edges[last]]`.
fn bin_index(edges: &[f64], v: f64) -> usize {
    let n_bins = edges.len() - 1;
    edges.partition_point(|&e| e <= v).saturating_sub(1).min(n_bins - 1)
}

/// Bin a continuous predictor into `n_bins` equal width intervals.
///
/// Every row lands in exactly one bin, empty bins are kept as empty groups.
///
/// * `table` - Observations, the predictor must be convertible to float.
/// * `predictor_column` - Column to bin.
/// * `n_bins` - Number of bins, at least 1.
pub fn bin_continuous<'a>(table: &'a ObservationTable, predictor_column: &str, n_bins: usize) -> Result<Grouping<'a>> {
    if n_bins == 0 {
        return Err(EvaluationError::InvalidInput(
            "Invalid parameter value passed for n_bins, expected at least 1 but 0 provided.".to_string(),
        ));
    }
    let values = table.float_column(predictor_column)?;
    if let Some(v) = values.iter().find(|v| !v.is_finite()) {
        return Err(EvaluationError::Schema(format!(
            "Column \"{}\" holds the non finite value {}, which cannot be binned.",
            predictor_column, v
        )));
    }
    if values.is_empty() {
        return Err(EvaluationError::DegenerateGroup(format!(
            "Column \"{}\" has no values to bin.",
            predictor_column
        )));
    }

    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if min == max {
        return Err(EvaluationError::DegenerateGroup(format!(
            "Column \"{}\" has the single value {}, equal width bins need a non empty range.",
            predictor_column, min
        )));
    }

    let edges = equal_width_edges(min, max, n_bins);
    debug!("Binning \"{}\" with edges {:?}", predictor_column, edges);

    let mut groups: Vec<Group> = edges
        .windows(2)
        .enumerate()
        .map(|(index, w)| Group {
            key: GroupKey::Bin(Bin {
                index,
                lo: w[0],
                hi: w[1],
                closed_right: index == n_bins - 1,
            }),
            rows: Vec::new(),
        })
        .collect();
    for (row, &v) in values.iter().enumerate() {
        groups[bin_index(&edges, v)].rows.push(row);
    }

    Ok(Grouping::new(table, predictor_column, groups))
}
