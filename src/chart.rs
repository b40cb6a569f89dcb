use crate::error::{Result, TrendAnalyserError};
use crate::extractor::MetricExtractor;
use crate::period::{Period, PeriodAxis};
use crate::reshape::{SeriesPoint, TableReshaper};
use crate::schema::ChartStyleEntry;
use crate::table::RawTable;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartForm {
    Line,
    Bar,
    Area,
    /// Category breakdowns only (demographics); never a time series.
    Pie,
}

impl ChartForm {
    pub fn parse(form: &str, line_item: &str) -> Result<Self> {
        match form.trim().to_ascii_lowercase().as_str() {
            "line" => Ok(Self::Line),
            "bar" => Ok(Self::Bar),
            "area" => Ok(Self::Area),
            "pie" => Ok(Self::Pie),
            _ => Err(TrendAnalyserError::UnsupportedChartForm {
                line_item: line_item.to_string(),
                form: form.to_string(),
            }),
        }
    }

    pub fn is_time_series(&self) -> bool {
        !matches!(self, Self::Pie)
    }
}

impl fmt::Display for ChartForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Line => "line",
            Self::Bar => "bar",
            Self::Area => "area",
            Self::Pie => "pie",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartStyle {
    pub form: ChartForm,
    pub color: String,
}

impl ChartStyle {
    /// Validates a configured style for a period chart (line, bar or area).
    pub fn from_entry(entry: &ChartStyleEntry) -> Result<Self> {
        let form = ChartForm::parse(&entry.form, &entry.line_item)?;
        if !form.is_time_series() {
            return Err(TrendAnalyserError::UnsupportedChartForm {
                line_item: entry.line_item.clone(),
                form: entry.form.clone(),
            });
        }
        Ok(Self {
            form,
            color: entry.color.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub period: Period,
    pub value: Option<f64>,
}

/// A renderer-ready period series. Points are sorted by period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub line_item: String,
    pub points: Vec<ChartPoint>,
    pub style: ChartStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartFailure {
    pub line_item: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ChartBatch {
    pub series: Vec<ChartSeries>,
    pub failures: Vec<ChartFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryPoint {
    pub category: String,
    pub value: Option<f64>,
}

/// A series over row labels in sheet order (competitors over quarters, or
/// age-group shares of one company).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySeries {
    pub name: String,
    pub points: Vec<CategoryPoint>,
    pub form: ChartForm,
}

impl CategorySeries {
    /// Sum of the present values.
    pub fn total(&self) -> f64 {
        self.points.iter().filter_map(|p| p.value).sum()
    }
}

pub struct ChartSeriesBuilder<'a> {
    styles: &'a [ChartStyleEntry],
}

impl<'a> ChartSeriesBuilder<'a> {
    pub fn new(styles: &'a [ChartStyleEntry]) -> Self {
        Self { styles }
    }

    /// Builds one series from the points of a single line-item.
    pub fn build(points: &[SeriesPoint], style: &ChartStyleEntry) -> Result<ChartSeries> {
        let style_desc = ChartStyle::from_entry(style)?;

        let mut sorted: Vec<ChartPoint> = points
            .iter()
            .map(|p| ChartPoint {
                period: p.period.clone(),
                value: p.value,
            })
            .collect();
        sorted.sort_by(|a, b| a.period.cmp(&b.period));

        Ok(ChartSeries {
            line_item: style.line_item.clone(),
            points: sorted,
            style: style_desc,
        })
    }

    /// One series per configured line-item present in `table`.
    ///
    /// Line-items without a row are left out. A bad style fails only its own chart.
    pub fn build_batch(
        &self,
        table: &RawTable,
        axis: &PeriodAxis,
        line_item_column: &str,
    ) -> Result<ChartBatch> {
        table.label_column_checked(line_item_column)?;

        let mut batch = ChartBatch::default();
        for style in self.styles {
            let row = match MetricExtractor::find_row(table, &style.line_item) {
                Ok(row) => row,
                Err(_) => {
                    debug!("No row for '{}' in '{}'; chart omitted", style.line_item, table.name());
                    continue;
                }
            };

            let points = TableReshaper::reshape_row(table, axis, row);
            match Self::build(&points, style) {
                Ok(series) => batch.series.push(series),
                Err(e) => {
                    warn!("{}", e);
                    batch.failures.push(ChartFailure {
                        line_item: style.line_item.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(batch)
    }

    /// One line per competitor column over the sheet's period rows.
    pub fn competitive_series(
        table: &RawTable,
        label_column: &str,
    ) -> Result<Vec<CategorySeries>> {
        Self::category_series(table, label_column, ChartForm::Line)
    }

    /// One pie per company column, one slice per age group.
    pub fn demographic_series(
        table: &RawTable,
        label_column: &str,
    ) -> Result<Vec<CategorySeries>> {
        Self::category_series(table, label_column, ChartForm::Pie)
    }

    fn category_series(
        table: &RawTable,
        label_column: &str,
        form: ChartForm,
    ) -> Result<Vec<CategorySeries>> {
        table.label_column_checked(label_column)?;
        let records = TableReshaper::melt(table);

        Ok(table
            .value_columns()
            .iter()
            .map(|column| CategorySeries {
                name: column.clone(),
                points: records
                    .iter()
                    .filter(|r| &r.column == column)
                    .map(|r| CategoryPoint {
                        category: r.label.clone(),
                        value: r.value,
                    })
                    .collect(),
                form,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::PeriodParser;
    use crate::schema::AnalyserConfig;
    use crate::table::Cell;

    fn statement() -> RawTable {
        RawTable::new(
            "Results",
            vec![
                "Particulars".into(),
                "31 March 2021".into(),
                "31 December 2020".into(),
                "30 June 2021".into(),
            ],
            vec![
                vec!["Total income".into(), "120".into(), "110".into(), "130".into()],
                vec!["Total expenses".into(), "90".into(), Cell::Empty, "95".into()],
            ],
        )
        .unwrap()
    }

    fn axis(table: &RawTable) -> PeriodAxis {
        PeriodAxis::from_table(table, &PeriodParser::from_config(&AnalyserConfig::default()))
    }

    #[test]
    fn test_form_parsing() {
        assert_eq!(ChartForm::parse("Line", "x").unwrap(), ChartForm::Line);
        assert_eq!(ChartForm::parse(" bar ", "x").unwrap(), ChartForm::Bar);
        assert!(matches!(
            ChartForm::parse("scatter", "x"),
            Err(TrendAnalyserError::UnsupportedChartForm { .. })
        ));
    }

    #[test]
    fn test_pie_rejected_for_period_charts() {
        let entry = ChartStyleEntry::new("Total income", "pie", "blue");
        assert!(matches!(
            ChartStyle::from_entry(&entry),
            Err(TrendAnalyserError::UnsupportedChartForm { .. })
        ));
    }

    #[test]
    fn test_build_sorts_by_period_and_is_idempotent() {
        let table = statement();
        let axis = axis(&table);
        let points = TableReshaper::reshape_row(&table, &axis, 0);
        let style = ChartStyleEntry::new("Total income", "line", "blue");

        let first = ChartSeriesBuilder::build(&points, &style).unwrap();
        let second = ChartSeriesBuilder::build(&points, &style).unwrap();
        assert_eq!(first, second);

        let values: Vec<Option<f64>> = first.points.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![Some(110.0), Some(120.0), Some(130.0)]);
        assert_eq!(first.style.color, "blue");
        assert_eq!(first.style.form, ChartForm::Line);
    }

    #[test]
    fn test_batch_isolates_unsupported_form() {
        let table = statement();
        let styles = vec![
            ChartStyleEntry::new("Total income", "scatter", "blue"),
            ChartStyleEntry::new("Total expenses", "bar", "green"),
            ChartStyleEntry::new("Total tax expense", "area", "orange"),
        ];
        let batch = ChartSeriesBuilder::new(&styles)
            .build_batch(&table, &axis(&table), "Particulars")
            .unwrap();

        assert_eq!(batch.series.len(), 1);
        assert_eq!(batch.series[0].line_item, "Total expenses");
        assert_eq!(batch.series[0].points[0].value, None);
        assert_eq!(batch.failures.len(), 1);
        assert_eq!(batch.failures[0].line_item, "Total income");
        assert!(batch.failures[0].reason.contains("scatter"));
    }

    #[test]
    fn test_demographic_series_per_company() {
        let table = RawTable::new(
            "demograph",
            vec!["Age group".into(), "CompanyA".into(), "CompanyB".into()],
            vec![
                vec!["18-25".into(), 40.0.into(), 55.0.into()],
                vec!["26-40".into(), 60.0.into(), 45.0.into()],
            ],
        )
        .unwrap();

        let series = ChartSeriesBuilder::demographic_series(&table, "Age group").unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].name, "CompanyA");
        assert_eq!(series[0].form, ChartForm::Pie);
        assert_eq!(series[0].points.len(), 2);
        assert!((series[0].total() - 100.0).abs() < 1e-9);
        assert!((series[1].total() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_competitive_series_keeps_row_order() {
        let table = RawTable::new(
            "Competitive_analysis",
            vec!["Period".into(), "VB".into(), "Peer".into()],
            vec![
                vec!["Q2 FY24".into(), 50.0.into(), 30.0.into()],
                vec!["Q1 FY24".into(), 45.0.into(), Cell::Empty],
            ],
        )
        .unwrap();

        let series = ChartSeriesBuilder::competitive_series(&table, "Period").unwrap();
        let categories: Vec<&str> = series[1].points.iter().map(|p| p.category.as_str()).collect();
        assert_eq!(categories, vec!["Q2 FY24", "Q1 FY24"]);
        assert_eq!(series[1].points[1].value, None);
        assert_eq!(series[0].form, ChartForm::Line);
        assert!(ChartSeriesBuilder::competitive_series(&table, "Quarter").is_err());
    }
}
