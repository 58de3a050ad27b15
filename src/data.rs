//! Observation table
//!
//! An in-memory, column oriented table of observations. Columns are named and
//! hold one of four physical types; evaluators read them through the typed
//! coercions below, which fail with a schema error rather than guessing.
use crate::config::TargetSpec;
use crate::errors::{EvaluationError, Result};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Physical storage of a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnData {
    Float(Vec<f64>),
    Int(Vec<i64>),
    Str(Vec<String>),
    Bool(Vec<bool>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Float(v) => v.len(),
            ColumnData::Int(v) => v.len(),
            ColumnData::Str(v) => v.len(),
            ColumnData::Bool(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn type_name(&self) -> &'static str {
        match self {
            ColumnData::Float(_) => "float",
            ColumnData::Int(_) => "integer",
            ColumnData::Str(_) => "string",
            ColumnData::Bool(_) => "boolean",
        }
    }

    fn select(&self, rows: &[usize]) -> ColumnData {
        match self {
            ColumnData::Float(v) => ColumnData::Float(rows.iter().map(|&i| v[i]).collect()),
            ColumnData::Int(v) => ColumnData::Int(rows.iter().map(|&i| v[i]).collect()),
            ColumnData::Str(v) => ColumnData::Str(rows.iter().map(|&i| v[i].clone()).collect()),
            ColumnData::Bool(v) => ColumnData::Bool(rows.iter().map(|&i| v[i]).collect()),
        }
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    /// Values as floats. Integers and booleans widen, strings are parsed.
    pub fn to_float(&self) -> Result<Vec<f64>> {
        match &self.data {
            ColumnData::Float(v) => Ok(v.clone()),
            ColumnData::Int(v) => Ok(v.iter().map(|&x| x as f64).collect()),
            ColumnData::Bool(v) => Ok(v.iter().map(|&x| if x { 1.0 } else { 0.0 }).collect()),
            ColumnData::Str(v) => v
                .iter()
                .map(|s| {
                    s.trim()
                        .parse::<f64>()
                        .map_err(|_| self.coercion_error(s, "float"))
                })
                .collect(),
        }
    }

    /// Values as integers, e.g. time buckets such as 2019, 202110 or 20211001.
    /// Finite floats are truncated toward zero, strings must hold an integer literal.
    pub fn to_int(&self) -> Result<Vec<i64>> {
        match &self.data {
            ColumnData::Int(v) => Ok(v.clone()),
            ColumnData::Bool(v) => Ok(v.iter().map(|&x| x as i64).collect()),
            ColumnData::Float(v) => v
                .iter()
                .map(|&x| {
                    if x.is_finite() {
                        Ok(x.trunc() as i64)
                    } else {
                        Err(self.coercion_error(&x.to_string(), "integer"))
                    }
                })
                .collect(),
            ColumnData::Str(v) => v
                .iter()
                .map(|s| {
                    s.trim()
                        .parse::<i64>()
                        .map_err(|_| self.coercion_error(s, "integer"))
                })
                .collect(),
        }
    }

    /// Values as category labels.
    pub fn to_str(&self) -> Vec<String> {
        match &self.data {
            ColumnData::Str(v) => v.clone(),
            ColumnData::Int(v) => v.iter().map(|x| x.to_string()).collect(),
            ColumnData::Float(v) => v.iter().map(|x| format_float(*x)).collect(),
            ColumnData::Bool(v) => v.iter().map(|x| x.to_string()).collect(),
        }
    }

    /// Values as flags. Accepts booleans, 0/1 numbers and the strings
    /// "0", "1", "true" and "false".
    pub fn to_bool(&self) -> Result<Vec<bool>> {
        match &self.data {
            ColumnData::Bool(v) => Ok(v.clone()),
            ColumnData::Int(v) => v
                .iter()
                .map(|&x| match x {
                    0 => Ok(false),
                    1 => Ok(true),
                    _ => Err(self.coercion_error(&x.to_string(), "boolean")),
                })
                .collect(),
            ColumnData::Float(v) => v
                .iter()
                .map(|&x| {
                    if x == 0.0 {
                        Ok(false)
                    } else if x == 1.0 {
                        Ok(true)
                    } else {
                        Err(self.coercion_error(&x.to_string(), "boolean"))
                    }
                })
                .collect(),
            ColumnData::Str(v) => v
                .iter()
                .map(|s| match s.trim().to_ascii_lowercase().as_str() {
                    "0" | "false" => Ok(false),
                    "1" | "true" => Ok(true),
                    _ => Err(self.coercion_error(s, "boolean")),
                })
                .collect(),
        }
    }

    fn coercion_error(&self, value: &str, target: &str) -> EvaluationError {
        EvaluationError::Schema(format!(
            "Column \"{}\" of type {} holds value \"{}\" which cannot be converted to {}.",
            self.name,
            self.data.type_name(),
            value,
            target
        ))
    }
}

// Whole numbers keep a trailing ".0", e.g. 3.0 becomes "3.0".
fn format_float(x: f64) -> String {
    if x.is_finite() && x.fract() == 0.0 {
        format!("{:.1}", x)
    } else {
        x.to_string()
    }
}

/// Ordered collection of rows with named, typed fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservationTable {
    columns: Vec<Column>,
    n_rows: usize,
}

impl ObservationTable {
    pub fn new() -> Self {
        ObservationTable::default()
    }

    /// Add a column to the table.
    ///
    /// * `name` - Column name, must be unique within the table.
    /// * `data` - Column values, must have as many entries as the table has rows.
    pub fn push_column(&mut self, name: &str, data: ColumnData) -> Result<()> {
        if self.columns.iter().any(|c| c.name == name) {
            return Err(EvaluationError::Schema(format!("Column \"{}\" already exists.", name)));
        }
        if !self.columns.is_empty() && data.len() != self.n_rows {
            return Err(EvaluationError::Schema(format!(
                "Column \"{}\" has {} rows, but the table has {} rows.",
                name,
                data.len(),
                self.n_rows
            )));
        }
        self.n_rows = data.len();
        self.columns.push(Column {
            name: name.to_string(),
            data,
        });
        Ok(())
    }

    /// Consuming version of `push_column`, convenient when assembling a table inline.
    pub fn with_column(mut self, name: &str, data: ColumnData) -> Result<Self> {
        self.push_column(name, data)?;
        Ok(self)
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| EvaluationError::Schema(format!("Column \"{}\" not found in the table.", name)))
    }

    pub fn float_column(&self, name: &str) -> Result<Vec<f64>> {
        self.column(name)?.to_float()
    }

    pub fn int_column(&self, name: &str) -> Result<Vec<i64>> {
        self.column(name)?.to_int()
    }

    pub fn string_column(&self, name: &str) -> Result<Vec<String>> {
        Ok(self.column(name)?.to_str())
    }

    pub fn bool_column(&self, name: &str) -> Result<Vec<bool>> {
        self.column(name)?.to_bool()
    }

    /// Copy of the table restricted to the given rows, in the given order.
    pub fn select_rows(&self, rows: &[usize]) -> Result<ObservationTable> {
        if let Some(&bad) = rows.iter().find(|&&i| i >= self.n_rows) {
            return Err(EvaluationError::InvalidInput(format!(
                "Row {} is out of bounds for a table with {} rows.",
                bad, self.n_rows
            )));
        }
        Ok(ObservationTable {
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    data: c.data.select(rows),
                })
                .collect(),
            n_rows: rows.len(),
        })
    }

    /// Copy of the table holding only the rows where the target outcome is observable.
    ///
    /// The outcome column must exist and be numeric; its values on the kept rows are
    /// checked by the metrics themselves.
    pub fn filter_observable(&self, target: &TargetSpec) -> Result<ObservationTable> {
        let observable = self.bool_column(&target.observability_column)?;
        self.float_column(&target.outcome_column)?;
        let rows: Vec<usize> = observable
            .iter()
            .enumerate()
            .filter_map(|(i, &o)| if o { Some(i) } else { None })
            .collect();
        self.select_rows(&rows)
    }
}

impl Display for ObservationTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ObservationTable({} rows: {})",
            self.n_rows,
            self.column_names().join(", ")
        )
    }
}
