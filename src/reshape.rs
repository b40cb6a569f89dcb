use crate::period::{Period, PeriodAxis};
use crate::table::RawTable;
use serde::{Deserialize, Serialize};

/// One cell of a wide table mapped to its period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub line_item: String,
    pub period: Period,
    /// `None` for blank or non-numeric cells; zero is only ever a real zero.
    pub value: Option<f64>,
}

/// One cell of a wide table with its column header kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongRecord {
    pub label: String,
    pub column: String,
    pub value: Option<f64>,
}

pub struct TableReshaper;

impl TableReshaper {
    /// Flattens every (row, period column) cell, row-major then column-major.
    ///
    /// Output length is always `rows × recognized periods`.
    pub fn reshape(table: &RawTable, axis: &PeriodAxis) -> Vec<SeriesPoint> {
        let periods: Vec<_> = axis.periods().collect();
        let mut points = Vec::with_capacity(table.rows().len() * periods.len());

        for row in table.rows() {
            let line_item = row[0].as_label();
            for (column, period) in &periods {
                points.push(SeriesPoint {
                    line_item: line_item.clone(),
                    period: (*period).clone(),
                    value: row.get(column.index).and_then(|c| c.as_number()),
                });
            }
        }

        points
    }

    /// Points of a single row, in axis order.
    pub fn reshape_row(table: &RawTable, axis: &PeriodAxis, row: usize) -> Vec<SeriesPoint> {
        let Some(cells) = table.rows().get(row) else {
            return Vec::new();
        };
        let line_item = cells[0].as_label();

        axis.periods()
            .map(|(column, period)| SeriesPoint {
                line_item: line_item.clone(),
                period: period.clone(),
                value: cells.get(column.index).and_then(|c| c.as_number()),
            })
            .collect()
    }

    /// Melts any wide table keyed by its first column into long form.
    ///
    /// Headers are not interpreted, so this also serves sheets whose columns
    /// are companies rather than periods.
    pub fn melt(table: &RawTable) -> Vec<LongRecord> {
        let headers = table.value_columns();
        let mut records = Vec::with_capacity(table.rows().len() * headers.len());

        for row in table.rows() {
            let label = row[0].as_label();
            for (offset, header) in headers.iter().enumerate() {
                records.push(LongRecord {
                    label: label.clone(),
                    column: header.clone(),
                    value: row[offset + 1].as_number(),
                });
            }
        }

        records
    }
}
