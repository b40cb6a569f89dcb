use crate::error::{Result, TrendAnalyserError};
use crate::utils::parse_amount;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A raw cell as decoded by the host from the spreadsheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Cell {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    /// Numeric reading of the cell. `None` means missing, never zero.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Empty => None,
            Cell::Number(v) if v.is_finite() => Some(*v),
            Cell::Number(_) => None,
            Cell::Text(text) => parse_amount(text),
        }
    }

    pub fn as_label(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Number(v) => v.to_string(),
            Cell::Text(text) => text.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(text) => text.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Number(v) => write!(f, "{}", v),
            Cell::Text(text) => write!(f, "{}", text),
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        if value.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value.to_string())
        }
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::from(value.as_str())
    }
}

/// A wide sheet: the first column holds row labels, the remaining columns hold values.
///
/// Deserialized tables go through the same checks as [`RawTable::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTableRepr")]
pub struct RawTable {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

#[derive(Deserialize)]
struct RawTableRepr {
    name: String,
    columns: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<Cell>>,
}

impl TryFrom<RawTableRepr> for RawTable {
    type Error = TrendAnalyserError;

    fn try_from(repr: RawTableRepr) -> Result<Self> {
        RawTable::new(repr.name, repr.columns, repr.rows)
    }
}

impl RawTable {
    pub fn new(name: impl Into<String>, columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self> {
        let name = name.into();

        if columns.is_empty() {
            return Err(TrendAnalyserError::InvalidTable {
                table: name,
                details: "table has no columns".to_string(),
            });
        }

        if let Some(idx) = columns.iter().position(|c| c.trim().is_empty()) {
            return Err(TrendAnalyserError::InvalidTable {
                table: name,
                details: format!("column #{} has a blank header", idx),
            });
        }

        for (idx, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(TrendAnalyserError::InvalidTable {
                    table: name,
                    details: format!(
                        "row #{} has {} cells but the header has {} columns",
                        idx,
                        row.len(),
                        columns.len()
                    ),
                });
            }
        }

        Ok(Self {
            name,
            columns,
            rows,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn label_column(&self) -> &str {
        &self.columns[0]
    }

    /// Headers of every column after the label column, in table order.
    pub fn value_columns(&self) -> &[String] {
        &self.columns[1..]
    }

    pub fn has_value_columns(&self) -> bool {
        self.columns.len() > 1
    }

    pub fn row_label(&self, row: usize) -> Option<String> {
        self.rows.get(row).map(|cells| cells[0].as_label())
    }

    /// Fails unless the first column is `expected`.
    pub fn label_column_checked(&self, expected: &str) -> Result<&str> {
        let found = self.label_column();
        if found.trim() != expected {
            return Err(TrendAnalyserError::MissingLineItemColumn {
                table: self.name.clone(),
                expected: expected.to_string(),
                found: found.to_string(),
            });
        }
        Ok(found)
    }

    /// Indices of rows whose label equals `label` exactly (case and punctuation sensitive).
    ///
    /// Numeric labels compare by their rendered form, so `Cell::Number(2020.0)` matches `"2020"`.
    pub fn rows_labelled<'a>(&'a self, label: &'a str) -> impl Iterator<Item = usize> + 'a {
        self.rows
            .iter()
            .enumerate()
            .filter(move |(_, cells)| match &cells[0] {
                Cell::Text(text) => text == label,
                Cell::Number(_) => cells[0].as_label() == label,
                Cell::Empty => false,
            })
            .map(|(idx, _)| idx)
    }

    /// Copy of this table keeping only the given column indices, in the given order.
    pub fn project(&self, indices: &[usize]) -> Result<Self> {
        if let Some(bad) = indices.iter().find(|&&i| i >= self.columns.len()) {
            return Err(TrendAnalyserError::InvalidTable {
                table: self.name.clone(),
                details: format!("column index {} out of range", bad),
            });
        }

        let columns = indices.iter().map(|&i| self.columns[i].clone()).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();

        Self::new(self.name.clone(), columns, rows)
    }

    /// Plain-text grid with padded columns, suitable for embedding in a prompt.
    pub fn to_text(&self) -> String {
        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.chars().count()).collect();
        let rendered: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect();

        for row in &rendered {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let mut out = String::new();
        let write_line = |out: &mut String, cells: &[String]| {
            let padded: Vec<String> = cells
                .iter()
                .enumerate()
                .map(|(i, c)| format!("{:<width$}", c, width = widths[i]))
                .collect();
            out.push_str(padded.join(" | ").trim_end());
            out.push('\n');
        };

        write_line(&mut out, &self.columns);
        for row in &rendered {
            write_line(&mut out, row);
        }
        out
    }
}

/// Named sheets decoded by the host, kept in their workbook order.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: BTreeMap<String, RawTable>,
    order: Vec<String>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sheet under the table's own name, replacing any sheet with that name.
    pub fn insert(&mut self, table: RawTable) {
        let name = table.name().to_string();
        if !self.sheets.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.sheets.insert(name, table);
    }

    pub fn with_sheet(mut self, table: RawTable) -> Self {
        self.insert(table);
        self
    }

    pub fn sheet(&self, name: &str) -> Option<&RawTable> {
        self.sheets.get(name)
    }

    pub fn first_sheet(&self) -> Option<&RawTable> {
        self.order.first().and_then(|name| self.sheets.get(name))
    }

    pub fn sheet_names(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
