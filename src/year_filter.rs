use crate::error::{Result, TrendAnalyserError};
use crate::table::RawTable;
use crate::utils::find_year;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum YearSelection {
    #[default]
    All,
    Year(String),
}

impl YearSelection {
    /// Reads a host-side option such as `"All year"` or `"2021"`.
    pub fn parse(option: &str) -> Self {
        let trimmed = option.trim();
        if trimmed.is_empty()
            || trimmed.eq_ignore_ascii_case("all")
            || trimmed.eq_ignore_ascii_case("all year")
            || trimmed.eq_ignore_ascii_case("all years")
        {
            Self::All
        } else {
            Self::Year(trimmed.to_string())
        }
    }
}

impl fmt::Display for YearSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "All year"),
            Self::Year(year) => write!(f, "{}", year),
        }
    }
}

impl From<i32> for YearSelection {
    fn from(year: i32) -> Self {
        Self::Year(year.to_string())
    }
}

pub struct YearFilter;

impl YearFilter {
    /// Indices of value columns whose header contains `year` as a substring.
    pub fn select_columns(table: &RawTable, year: &str) -> Result<Vec<usize>> {
        let indices: Vec<usize> = table
            .columns()
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, header)| header.contains(year))
            .map(|(idx, _)| idx)
            .collect();

        if indices.is_empty() {
            return Err(TrendAnalyserError::EmptyYearSelection {
                table: table.name().to_string(),
                year: year.to_string(),
            });
        }
        Ok(indices)
    }

    /// Restricts `table` to its line-item column plus the columns of the selected year.
    ///
    /// A year with no matching columns yields a table holding only the
    /// line-item column. Only a missing line-item column is an error.
    pub fn apply(
        table: &RawTable,
        selection: &YearSelection,
        line_item_column: &str,
    ) -> Result<RawTable> {
        table.label_column_checked(line_item_column)?;

        let year = match selection {
            YearSelection::All => return Ok(table.clone()),
            YearSelection::Year(year) => year,
        };

        let mut keep = vec![0];
        match Self::select_columns(table, year) {
            Ok(indices) => {
                debug!(
                    "Year {} keeps {} of {} value columns in '{}'",
                    year,
                    indices.len(),
                    table.value_columns().len(),
                    table.name()
                );
                keep.extend(indices);
            }
            Err(e @ TrendAnalyserError::EmptyYearSelection { .. }) => warn!("{}", e),
            Err(e) => return Err(e),
        }

        table.project(&keep)
    }

    /// Distinct years mentioned in the value-column headers, ascending.
    pub fn available_years(table: &RawTable) -> Vec<i32> {
        table
            .value_columns()
            .iter()
            .filter_map(|header| find_year(header))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Host-facing option list: `All` followed by every year found in the headers.
    pub fn selection_options(table: &RawTable) -> Vec<YearSelection> {
        std::iter::once(YearSelection::All)
            .chain(Self::available_years(table).into_iter().map(YearSelection::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;

    fn table() -> RawTable {
        RawTable::new(
            "Results",
            vec![
                "Particulars".into(),
                "30 June 2021".into(),
                "31 March 2021".into(),
                "31 March 2020".into(),
            ],
            vec![vec![
                "Total income".into(),
                Cell::Number(3.0),
                Cell::Number(2.0),
                Cell::Number(1.0),
            ]],
        )
        .unwrap()
    }

    #[test]
    fn test_filter_by_year_substring() {
        let filtered =
            YearFilter::apply(&table(), &YearSelection::parse("2021"), "Particulars").unwrap();
        assert_eq!(
            filtered.columns(),
            &["Particulars", "30 June 2021", "31 March 2021"]
        );
        assert_eq!(filtered.rows()[0][2], Cell::Number(2.0));
    }

    #[test]
    fn test_all_years_is_identity() {
        let table = table();
        let filtered = YearFilter::apply(&table, &YearSelection::All, "Particulars").unwrap();
        assert_eq!(filtered, table);
    }

    #[test]
    fn test_no_matching_year_keeps_label_column_only() {
        let filtered =
            YearFilter::apply(&table(), &YearSelection::parse("2099"), "Particulars").unwrap();
        assert_eq!(filtered.columns(), &["Particulars"]);
        assert_eq!(filtered.rows().len(), 1);
        assert!(!filtered.has_value_columns());
    }

    #[test]
    fn test_select_columns_reports_empty_selection() {
        let result = YearFilter::select_columns(&table(), "2099");
        assert!(matches!(
            result,
            Err(TrendAnalyserError::EmptyYearSelection { ref year, .. }) if year == "2099"
        ));
        assert!(result.unwrap_err().is_recoverable());
    }

    #[test]
    fn test_missing_label_column_is_fatal() {
        let result = YearFilter::apply(&table(), &YearSelection::parse("2021"), "Age group");
        assert!(matches!(
            result,
            Err(TrendAnalyserError::MissingLineItemColumn { .. })
        ));
    }

    #[test]
    fn test_available_years_and_options() {
        let table = table();
        assert_eq!(YearFilter::available_years(&table), vec![2020, 2021]);
        assert_eq!(
            YearFilter::selection_options(&table),
            vec![
                YearSelection::All,
                YearSelection::Year("2020".into()),
                YearSelection::Year("2021".into()),
            ]
        );
    }

    #[test]
    fn test_selection_parse() {
        assert_eq!(YearSelection::parse("All year"), YearSelection::All);
        assert_eq!(YearSelection::parse(" "), YearSelection::All);
        assert_eq!(YearSelection::parse("2022").to_string(), "2022");
    }
}
