use crate::error::{Result, TrendAnalyserError};
use crate::period::{Period, PeriodAxis};
use crate::schema::CatalogueEntry;
use crate::table::RawTable;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Values of one line-item, one slot per axis column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricVector {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl MetricVector {
    pub fn missing(name: impl Into<String>, len: usize) -> Self {
        Self {
            name: name.into(),
            values: vec![None; len],
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_all_missing(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    pub fn present_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSet {
    /// Value-column headers in table order.
    pub axis: Vec<String>,
    /// Period of each axis slot; `None` for headers that are not periods.
    pub periods: Vec<Option<Period>>,
    /// One vector per catalogue entry, in catalogue order.
    pub metrics: Vec<MetricVector>,
    /// Catalogue entries with no matching row.
    pub unmatched: Vec<String>,
}

impl MetricSet {
    pub fn get(&self, name: &str) -> Option<&MetricVector> {
        self.metrics.iter().find(|m| m.name == name)
    }

    pub fn axis_len(&self) -> usize {
        self.axis.len()
    }
}

pub struct MetricExtractor<'a> {
    catalogue: &'a [CatalogueEntry],
}

impl<'a> MetricExtractor<'a> {
    pub fn new(catalogue: &'a [CatalogueEntry]) -> Self {
        Self { catalogue }
    }

    /// First row whose label equals `line_item` exactly.
    pub fn find_row(table: &RawTable, line_item: &str) -> Result<usize> {
        let mut matches = table.rows_labelled(line_item);
        let first = matches
            .next()
            .ok_or_else(|| TrendAnalyserError::MissingCatalogueMatch {
                line_item: line_item.to_string(),
            })?;

        let extra = matches.count();
        if extra > 0 {
            warn!(
                "'{}' appears {} times in '{}'; using the first row",
                line_item,
                extra + 1,
                table.name()
            );
        }
        Ok(first)
    }

    fn row_vector(table: &RawTable, axis: &PeriodAxis, row: usize, name: &str) -> MetricVector {
        let cells = &table.rows()[row];
        MetricVector {
            name: name.to_string(),
            values: axis
                .columns()
                .iter()
                .map(|c| cells.get(c.index).and_then(|cell| cell.as_number()))
                .collect(),
        }
    }

    /// Vector for a single line-item; all slots missing when no row matches.
    pub fn extract_one(table: &RawTable, axis: &PeriodAxis, line_item: &str) -> MetricVector {
        match Self::find_row(table, line_item) {
            Ok(row) => Self::row_vector(table, axis, row, line_item),
            Err(e) => {
                debug!("{}", e);
                MetricVector::missing(line_item, axis.len())
            }
        }
    }

    pub fn extract(
        &self,
        table: &RawTable,
        axis: &PeriodAxis,
        line_item_column: &str,
    ) -> Result<MetricSet> {
        table.label_column_checked(line_item_column)?;

        info!(
            "Extracting {} catalogue entries from '{}' over {} columns",
            self.catalogue.len(),
            table.name(),
            axis.len()
        );

        let mut metrics = Vec::with_capacity(self.catalogue.len());
        let mut unmatched = Vec::new();

        for entry in self.catalogue {
            let vector = match Self::find_row(table, &entry.name) {
                Ok(row) => Self::row_vector(table, axis, row, &entry.name),
                Err(e) => {
                    warn!("{} in '{}'; filled with missing values", e, table.name());
                    unmatched.push(entry.name.clone());
                    MetricVector::missing(&entry.name, axis.len())
                }
            };
            metrics.push(vector);
        }

        Ok(MetricSet {
            axis: axis.labels(),
            periods: axis.columns().iter().map(|c| c.period.clone()).collect(),
            metrics,
            unmatched,
        })
    }
}
