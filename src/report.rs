//! Report
//!
//! Plain data handed to the visualization and presentation layers. Nothing here
//! knows how a graph is drawn or a table styled.
use crate::errors::{EvaluationError, Result};
use crate::grouping::GroupKey;
use serde::{Deserialize, Serialize};

/// Position of a point on the x axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AxisValue {
    Number(f64),
    /// A category, time bucket or bin.
    Key(GroupKey),
}

/// A labelled curve or bar series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub label: String,
    pub points: Vec<(AxisValue, f64)>,
}

impl Series {
    pub fn numeric(label: &str, x: &[f64], y: &[f64]) -> Self {
        Series {
            label: label.to_string(),
            points: x.iter().zip(y).map(|(x, y)| (AxisValue::Number(*x), *y)).collect(),
        }
    }

    pub fn keyed(label: &str, points: Vec<(GroupKey, f64)>) -> Self {
        Series {
            label: label.to_string(),
            points: points.into_iter().map(|(k, v)| (AxisValue::Key(k), v)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn y(&self) -> Vec<f64> {
        self.points.iter().map(|(_, y)| *y).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<Series>,
}

impl Graph {
    pub fn new(title: String, x_label: &str, y_label: &str) -> Self {
        Graph {
            title,
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            series: Vec::new(),
        }
    }

    pub fn series(&self, label: &str) -> Option<&Series> {
        self.series.iter().find(|s| s.label == label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub key: GroupKey,
    /// One value per column, `None` where there is nothing to report.
    pub values: Vec<Option<f64>>,
}

/// Rows are groups, the `All` margin last when present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    pub caption: String,
    pub row_header: String,
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl ResultTable {
    pub fn new(caption: String, row_header: &str, columns: Vec<String>) -> Self {
        ResultTable {
            caption,
            row_header: row_header.to_string(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, key: GroupKey, values: Vec<Option<f64>>) -> Result<()> {
        if values.len() != self.columns.len() {
            return Err(EvaluationError::InvalidInput(format!(
                "Row {} has {} values, but the table has {} columns.",
                key,
                values.len(),
                self.columns.len()
            )));
        }
        self.rows.push(TableRow { key, values });
        Ok(())
    }

    pub fn get(&self, row: &GroupKey, column: &str) -> Option<f64> {
        let c = self.columns.iter().position(|name| name == column)?;
        self.rows.iter().find(|r| &r.key == row).and_then(|r| r.values[c])
    }

    pub fn row_keys(&self) -> Vec<&GroupKey> {
        self.rows.iter().map(|r| &r.key).collect()
    }
}

/// Output of a single basic evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    pub name: String,
    pub graph: Graph,
    pub table: ResultTable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub title: String,
    pub panels: Vec<Panel>,
}

impl Report {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| EvaluationError::InvalidInput(e.to_string()))
    }

    pub fn panel(&self, name: &str) -> Option<&Panel> {
        self.panels.iter().find(|p| p.name == name)
    }
}
