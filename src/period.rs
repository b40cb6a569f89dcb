use crate::error::{Result, TrendAnalyserError};
use crate::schema::AnalyserConfig;
use crate::table::RawTable;
use crate::utils::find_year;
use chrono::{Datelike, NaiveDate};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Sub-period position given to year-only periods: after every day of that year.
const YEAR_ONLY_ORDINAL: u32 = 367;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodKey {
    /// Exact reporting date (e.g., quarter end).
    Date(NaiveDate),
    /// Only a year could be recovered from the header.
    Year(i32),
}

/// A reporting column with a canonical sort key and the header it came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    pub key: PeriodKey,
    pub label: String,
}

impl Period {
    pub fn date(date: NaiveDate, label: impl Into<String>) -> Self {
        Self {
            key: PeriodKey::Date(date),
            label: label.into(),
        }
    }

    pub fn year_only(year: i32, label: impl Into<String>) -> Self {
        Self {
            key: PeriodKey::Year(year),
            label: label.into(),
        }
    }

    pub fn year(&self) -> i32 {
        match self.key {
            PeriodKey::Date(d) => d.year(),
            PeriodKey::Year(y) => y,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self.key {
            PeriodKey::Date(d) => Some(d),
            PeriodKey::Year(_) => None,
        }
    }

    /// `(year, day_of_year)`; year-only periods sort after the dates of their year.
    pub fn sort_key(&self) -> (i32, u32) {
        match self.key {
            PeriodKey::Date(d) => (d.year(), d.ordinal()),
            PeriodKey::Year(y) => (y, YEAR_ONLY_ORDINAL),
        }
    }

    /// `YYYY-MM-DD` for dated periods, `YYYY` for year-only ones.
    pub fn iso(&self) -> String {
        match self.key {
            PeriodKey::Date(d) => d.format("%Y-%m-%d").to_string(),
            PeriodKey::Year(y) => format!("{:04}", y),
        }
    }
}

impl Ord for Period {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key()
            .cmp(&other.sort_key())
            .then_with(|| self.label.cmp(&other.label))
    }
}

impl PartialOrd for Period {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Classifies column headers as periods.
///
/// Exact dates are tried first against the configured formats, then the
/// header is searched for a standalone four-digit year. Anything else is
/// reported as [`TrendAnalyserError::UnparseablePeriod`].
#[derive(Debug, Clone)]
pub struct PeriodParser {
    formats: Vec<String>,
}

impl PeriodParser {
    pub fn new(formats: Vec<String>) -> Self {
        Self { formats }
    }

    pub fn from_config(config: &AnalyserConfig) -> Self {
        Self::new(config.date_formats.clone())
    }

    pub fn formats(&self) -> &[String] {
        &self.formats
    }

    pub fn parse(&self, header: &str) -> Result<Period> {
        let trimmed = header.trim();

        for format in &self.formats {
            if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
                return Ok(Period::date(date, header));
            }
        }

        if let Some(year) = find_year(trimmed) {
            debug!("Header '{}' matched no date format, using year {}", header, year);
            return Ok(Period::year_only(year, header));
        }

        Err(TrendAnalyserError::UnparseablePeriod {
            header: header.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisColumn {
    /// Column index in the source table.
    pub index: usize,
    pub header: String,
    /// `None` when the header is not a period; the column stays in table order.
    pub period: Option<Period>,
}

/// Every value column of a table, in table order, with its period classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PeriodAxis {
    columns: Vec<AxisColumn>,
}

impl PeriodAxis {
    pub fn from_table(table: &RawTable, parser: &PeriodParser) -> Self {
        let columns = table
            .columns()
            .iter()
            .enumerate()
            .skip(1)
            .map(|(index, header)| {
                let period = match parser.parse(header) {
                    Ok(period) => Some(period),
                    Err(e) => {
                        warn!("{} in table '{}'; excluded from time series", e, table.name());
                        None
                    }
                };
                AxisColumn {
                    index,
                    header: header.clone(),
                    period,
                }
            })
            .collect();

        Self { columns }
    }

    pub fn columns(&self) -> &[AxisColumn] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn labels(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.header.clone()).collect()
    }

    /// Recognized period columns only, in table order.
    pub fn periods(&self) -> impl Iterator<Item = (&AxisColumn, &Period)> {
        self.columns
            .iter()
            .filter_map(|c| c.period.as_ref().map(|p| (c, p)))
    }

    pub fn recognized_count(&self) -> usize {
        self.periods().count()
    }

    pub fn excluded_headers(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.period.is_none())
            .map(|c| c.header.as_str())
            .collect()
    }
}
