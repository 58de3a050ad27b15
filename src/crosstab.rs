//! Cross tabulation
//!
//! Two way tables of a column statistic, with rows from one grouping and
//! columns from another grouping of the same table. Margins (`All`) are
//! computed from the raw rows of the whole row, column or table.
use crate::data::ObservationTable;
use crate::errors::{EvaluationError, Result};
use crate::grouping::{group_by_category, group_by_time, Aggregation, GroupKey, Grouping, GroupingPolicy};
use crate::report::{ResultTable, TableRow};
use serde::{Deserialize, Serialize};

/// Share of total normalization of an additive cross table.
///
/// Shares of a row, column or table whose total is zero are undefined. Their
/// cells are `None` even where the unnormalized cell has rows, e.g. a month
/// without any default in a row normalized sum of defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Normalize {
    None,
    /// Each row sums to one, the `All` column is dropped.
    Rows,
    /// Each column sums to one, the `All` row is dropped.
    Columns,
    /// The whole table sums to one.
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossTabOptions {
    pub aggregation: Aggregation,
    pub normalize: Normalize,
    pub margins: bool,
}

impl Default for CrossTabOptions {
    fn default() -> Self {
        CrossTabOptions {
            aggregation: Aggregation::Mean,
            normalize: Normalize::None,
            margins: true,
        }
    }
}

/// How a key column of a cross table is grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyColumn<'c> {
    Category(&'c str),
    Time(&'c str),
}

impl<'c> KeyColumn<'c> {
    pub fn group<'a>(&self, table: &'a ObservationTable, policy: &GroupingPolicy) -> Result<Grouping<'a>> {
        match self {
            KeyColumn::Category(c) => group_by_category(table, c, policy),
            KeyColumn::Time(c) => group_by_time(table, c),
        }
    }
}

/// A two way table, cells without any row are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossTable {
    pub row_key_name: String,
    pub col_key_name: String,
    pub row_keys: Vec<GroupKey>,
    pub col_keys: Vec<GroupKey>,
    pub cells: Vec<Vec<Option<f64>>>,
}

impl CrossTable {
    pub fn get(&self, row: &GroupKey, col: &GroupKey) -> Option<f64> {
        let r = self.row_keys.iter().position(|k| k == row)?;
        let c = self.col_keys.iter().position(|k| k == col)?;
        self.cells[r][c]
    }

    /// Values of a column against the row keys, skipping empty cells and the `All` row.
    pub fn column_series(&self, col: &GroupKey) -> Vec<(GroupKey, f64)> {
        let Some(c) = self.col_keys.iter().position(|k| k == col) else {
            return Vec::new();
        };
        self.row_keys
            .iter()
            .zip(&self.cells)
            .filter(|(k, _)| !k.is_margin())
            .filter_map(|(k, row)| row[c].map(|v| (k.clone(), v)))
            .collect()
    }

    /// Values of a row against the column keys, skipping empty cells and the `All` column.
    pub fn row_series(&self, row: &GroupKey) -> Vec<(GroupKey, f64)> {
        let Some(r) = self.row_keys.iter().position(|k| k == row) else {
            return Vec::new();
        };
        self.col_keys
            .iter()
            .zip(&self.cells[r])
            .filter(|(k, _)| !k.is_margin())
            .filter_map(|(k, v)| v.map(|v| (k.clone(), v)))
            .collect()
    }

    pub fn to_result_table(&self, caption: &str) -> ResultTable {
        ResultTable {
            caption: caption.to_string(),
            row_header: self.row_key_name.clone(),
            columns: self.col_keys.iter().map(|k| k.to_string()).collect(),
            rows: self
                .row_keys
                .iter()
                .zip(&self.cells)
                .map(|(k, cells)| TableRow {
                    key: k.clone(),
                    values: cells.clone(),
                })
                .collect(),
        }
    }
}

fn cell(aggregation: &Aggregation, values: &[f64]) -> Result<Option<f64>> {
    if values.is_empty() {
        Ok(None)
    } else {
        aggregation.apply(values).map(Some)
    }
}

/// `None` for a zero total, the share is undefined.
fn share(v: Option<f64>, total: f64) -> Option<f64> {
    v.and_then(|x| if total != 0.0 { Some(x / total) } else { None })
}

fn total(values: &[Option<f64>]) -> f64 {
    values.iter().flatten().sum()
}

/// Cross tabulate a statistic of `value_column` by two groupings of the same table.
///
/// * `rows` - Grouping giving the rows of the result.
/// * `cols` - Grouping giving the columns of the result.
/// * `value_column` - Column aggregated in each cell, may be omitted for counts.
/// * `options` - Statistic, normalization and margins.
pub fn crosstab(
    rows: &Grouping,
    cols: &Grouping,
    value_column: Option<&str>,
    options: &CrossTabOptions,
) -> Result<CrossTable> {
    let table = rows.table();
    if !std::ptr::eq(table, cols.table()) {
        return Err(EvaluationError::InvalidInput(
            "Both groupings of a cross table must come from the same table.".to_string(),
        ));
    }
    if options.normalize != Normalize::None && !options.aggregation.is_additive() {
        return Err(EvaluationError::InvalidInput(format!(
            "Normalization is only defined for sums and counts, not for {}.",
            options.aggregation
        )));
    }
    let values = match value_column {
        Some(c) => table.float_column(c)?,
        None if options.aggregation == Aggregation::Count => vec![1.0; table.n_rows()],
        None => {
            return Err(EvaluationError::InvalidInput(format!(
                "A value column is required to cross tabulate the {}.",
                options.aggregation
            )))
        }
    };

    let (n_r, n_c) = (rows.len(), cols.len());
    let row_of = rows.row_lookup();
    let col_of = cols.row_lookup();
    let mut buckets: Vec<Vec<Vec<f64>>> = vec![vec![Vec::new(); n_c]; n_r];
    for (i, v) in values.iter().enumerate() {
        if let (Some(r), Some(c)) = (row_of[i], col_of[i]) {
            buckets[r][c].push(*v);
        }
    }

    let agg = &options.aggregation;
    let mut core: Vec<Vec<Option<f64>>> = Vec::with_capacity(n_r);
    for row in &buckets {
        core.push(row.iter().map(|b| cell(agg, b)).collect::<Result<Vec<_>>>()?);
    }

    let mut row_keys = rows.keys();
    let mut col_keys = cols.keys();

    // Margins come from the pooled rows, not from the cells.
    let (row_margin, col_margin, grand) = if options.margins {
        let row_margin = buckets
            .iter()
            .map(|row| cell(agg, &row.concat()))
            .collect::<Result<Vec<_>>>()?;
        let col_margin = (0..n_c)
            .map(|c| {
                let pooled: Vec<f64> = buckets.iter().flat_map(|row| row[c].iter().copied()).collect();
                cell(agg, &pooled)
            })
            .collect::<Result<Vec<_>>>()?;
        let pooled: Vec<f64> = buckets.iter().flatten().flatten().copied().collect();
        (row_margin, col_margin, cell(agg, &pooled)?)
    } else {
        (Vec::new(), Vec::new(), None)
    };

    let cells = match options.normalize {
        Normalize::None => {
            let mut cells = core;
            if options.margins {
                for (row, m) in cells.iter_mut().zip(&row_margin) {
                    row.push(*m);
                }
                let mut last = col_margin;
                last.push(grand);
                cells.push(last);
            }
            cells
        }
        Normalize::Rows => {
            let mut cells: Vec<Vec<Option<f64>>> = core
                .iter()
                .map(|row| {
                    let t = total(row);
                    row.iter().map(|v| share(*v, t)).collect()
                })
                .collect();
            if options.margins {
                let t = total(&col_margin);
                cells.push(col_margin.iter().map(|v| share(*v, t)).collect());
            }
            cells
        }
        Normalize::Columns => {
            let col_totals: Vec<f64> = (0..n_c)
                .map(|c| core.iter().filter_map(|row| row[c]).sum())
                .collect();
            let mut cells: Vec<Vec<Option<f64>>> = core
                .iter()
                .map(|row| row.iter().zip(&col_totals).map(|(v, t)| share(*v, *t)).collect())
                .collect();
            if options.margins {
                let t = total(&row_margin);
                for (row, m) in cells.iter_mut().zip(&row_margin) {
                    row.push(share(*m, t));
                }
            }
            cells
        }
        Normalize::All => {
            let t: f64 = core.iter().map(|row| total(row)).sum();
            let mut cells: Vec<Vec<Option<f64>>> = core
                .iter()
                .map(|row| row.iter().map(|v| share(*v, t)).collect())
                .collect();
            if options.margins {
                for (row, m) in cells.iter_mut().zip(&row_margin) {
                    row.push(share(*m, t));
                }
                let mut last: Vec<Option<f64>> = col_margin.iter().map(|v| share(*v, t)).collect();
                last.push(share(grand, t));
                cells.push(last);
            }
            cells
        }
    };

    if options.margins {
        if options.normalize != Normalize::Columns {
            row_keys.push(GroupKey::All);
        }
        if options.normalize != Normalize::Rows {
            col_keys.push(GroupKey::All);
        }
    }

    Ok(CrossTable {
        row_key_name: rows.key_column().to_string(),
        col_key_name: cols.key_column().to_string(),
        row_keys,
        col_keys,
        cells,
    })
}

/// Mean of `value_column` by two key columns, with `All` margins.
///
/// Sums, counts and normalized shares are available through `crosstab`.
pub fn crosstab_mean(
    table: &ObservationTable,
    row_key: KeyColumn,
    col_key: KeyColumn,
    value_column: &str,
    policy: &GroupingPolicy,
) -> Result<CrossTable> {
    let rows = row_key.group(table, policy)?;
    let cols = col_key.group(table, policy)?;
    crosstab(&rows, &cols, Some(value_column), &CrossTabOptions::default())
}
