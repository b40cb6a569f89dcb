//! # Financial Trend Analyser
//!
//! A library for turning loosely structured financial statement spreadsheets
//! into period-aligned metrics, chart-ready series and narrative prompts for
//! an external text generator.
//!
//! ## Core Concepts
//!
//! - **Raw table**: one sheet as decoded by the host; first column holds line-item labels
//! - **Period**: a column header parsed into an exact date or a bare year, with a canonical order
//! - **Long form**: one `(line-item, period, value)` point per cell; missing stays missing
//! - **Catalogue**: the configured, ordered list of line-items to extract
//! - **Metric vector**: one value per axis column for a catalogue entry, always full length
//!
//! ## Example
//!
//! ```rust,ignore
//! use financial_trend_analyser::*;
//!
//! let config = AnalyserConfig::quarterly_results_layout();
//! let analyser = TrendAnalyser::new(config)?;
//!
//! let table = table_from_records(
//!     "Results",
//!     vec![
//!         vec!["Particulars", "31 March 2020", "31 March 2021"],
//!         vec!["Total income", "100", "120"],
//!     ],
//! )?;
//!
//! let analysis = analyser.analyze_statement(&table, &YearSelection::All)?;
//! let income = analysis.metrics.get("Total income").unwrap();
//! assert_eq!(income.values, vec![Some(100.0), Some(120.0)]);
//! println!("{}", analysis.prompt.render());
//! ```

pub mod chart;
pub mod conversation;
pub mod error;
pub mod extractor;
pub mod ingestion;
pub mod narrative;
pub mod period;
pub mod reshape;
pub mod schema;
pub mod table;
pub mod utils;
pub mod year_filter;

#[cfg(feature = "azure-openai")]
pub mod llm;

pub use chart::{
    CategoryPoint, CategorySeries, ChartBatch, ChartFailure, ChartForm, ChartPoint, ChartSeries,
    ChartSeriesBuilder, ChartStyle,
};
pub use conversation::{
    summarize, ChatContext, ChatMessage, ChatRole, Conversation, GenerationRequest,
    TextGenerator,
};
pub use error::{Result, TrendAnalyserError};
pub use extractor::{MetricExtractor, MetricSet, MetricVector};
pub use ingestion::*;
pub use narrative::{
    report_sections, NarrativePrompt, NarrativePromptBuilder, PromptMetric, ReportSection,
};
pub use period::{AxisColumn, Period, PeriodAxis, PeriodKey, PeriodParser};
pub use reshape::{LongRecord, SeriesPoint, TableReshaper};
pub use schema::*;
pub use table::{Cell, RawTable, Workbook};
pub use year_filter::{YearFilter, YearSelection};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Everything derived from the financial statement sheet for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementAnalysis {
    /// The statement after year filtering, for verbatim display.
    pub table: RawTable,
    pub axis: PeriodAxis,
    pub series: Vec<SeriesPoint>,
    pub metrics: MetricSet,
    pub charts: ChartBatch,
    pub prompt: NarrativePrompt,
}

/// Series and summary prompt for a competitive or demographic sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAnalysis {
    pub series: Vec<CategorySeries>,
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetFailure {
    pub sheet: String,
    pub operation: String,
    pub message: String,
}

/// Per-sheet results of one workbook. A failing sheet never discards the others.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct WorkbookAnalysis {
    pub statement: Option<StatementAnalysis>,
    pub competitive: Option<CategoryAnalysis>,
    pub demographic: Option<CategoryAnalysis>,
    pub failures: Vec<SheetFailure>,
}

impl WorkbookAnalysis {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct TrendAnalyser {
    config: AnalyserConfig,
    parser: PeriodParser,
}

impl TrendAnalyser {
    pub fn new(config: AnalyserConfig) -> Result<Self> {
        config.validate()?;
        let parser = PeriodParser::from_config(&config);
        Ok(Self { config, parser })
    }

    pub fn config(&self) -> &AnalyserConfig {
        &self.config
    }

    pub fn parser(&self) -> &PeriodParser {
        &self.parser
    }

    pub fn analyze_statement(
        &self,
        table: &RawTable,
        selection: &YearSelection,
    ) -> Result<StatementAnalysis> {
        info!(
            "Analyzing statement '{}' ({} rows, {} columns) for {}",
            table.name(),
            table.rows().len(),
            table.columns().len(),
            selection
        );

        let label_column = self.config.line_item_column.as_str();
        let filtered = YearFilter::apply(table, selection, label_column)?;
        let axis = PeriodAxis::from_table(&filtered, &self.parser);
        debug!(
            "'{}' has {} value columns, {} recognized as periods",
            filtered.name(),
            axis.len(),
            axis.recognized_count()
        );

        let series = TableReshaper::reshape(&filtered, &axis);
        let metrics =
            MetricExtractor::new(&self.config.catalogue).extract(&filtered, &axis, label_column)?;
        let charts = ChartSeriesBuilder::new(&self.config.chart_styles).build_batch(
            &filtered,
            &axis,
            label_column,
        )?;
        let prompt = NarrativePromptBuilder::new(&self.config).from_metric_set(&metrics)?;

        Ok(StatementAnalysis {
            table: filtered,
            axis,
            series,
            metrics,
            charts,
            prompt,
        })
    }

    pub fn analyze_competitive(&self, table: &RawTable) -> Result<CategoryAnalysis> {
        let series =
            ChartSeriesBuilder::competitive_series(table, &self.config.sheets.competitive_label)?;
        let prompt = NarrativePromptBuilder::new(&self.config).competitive_prompt(table);
        Ok(CategoryAnalysis { series, prompt })
    }

    pub fn analyze_demographic(&self, table: &RawTable) -> Result<CategoryAnalysis> {
        let series =
            ChartSeriesBuilder::demographic_series(table, &self.config.sheets.demographic_label)?;
        let prompt = NarrativePromptBuilder::new(&self.config).demographic_prompt(table);
        Ok(CategoryAnalysis { series, prompt })
    }

    fn statement_sheet<'w>(&self, workbook: &'w Workbook) -> Option<&'w RawTable> {
        match &self.config.sheets.statement {
            Some(name) => workbook.sheet(name),
            None => workbook.first_sheet(),
        }
    }

    pub fn analyze_workbook(
        &self,
        workbook: &Workbook,
        selection: &YearSelection,
    ) -> WorkbookAnalysis {
        let mut analysis = WorkbookAnalysis::default();

        match self.statement_sheet(workbook) {
            Some(table) => match self.analyze_statement(table, selection) {
                Ok(result) => analysis.statement = Some(result),
                Err(e) => record_failure(&mut analysis, table.name(), "statement analysis", &e),
            },
            None => {
                let sheet = self
                    .config
                    .sheets
                    .statement
                    .clone()
                    .unwrap_or_else(|| "<first sheet>".to_string());
                record_failure(
                    &mut analysis,
                    &sheet,
                    "locate sheet",
                    &TrendAnalyserError::InvalidTable {
                        table: sheet.clone(),
                        details: "sheet not found in workbook".to_string(),
                    },
                );
            }
        }

        let sheets = &self.config.sheets;
        if let Some(table) = workbook.sheet(&sheets.competitive) {
            match self.analyze_competitive(table) {
                Ok(result) => analysis.competitive = Some(result),
                Err(e) => record_failure(&mut analysis, table.name(), "competitive analysis", &e),
            }
        } else {
            debug!("No '{}' sheet; competitive analysis skipped", sheets.competitive);
        }

        if let Some(table) = workbook.sheet(&sheets.demographic) {
            match self.analyze_demographic(table) {
                Ok(result) => analysis.demographic = Some(result),
                Err(e) => record_failure(&mut analysis, table.name(), "demographic analysis", &e),
            }
        } else {
            debug!("No '{}' sheet; demographic analysis skipped", sheets.demographic);
        }

        analysis
    }

    /// Grounding context for chat over the statement (after year filtering) and the
    /// competitive and demographic sheets, when present.
    ///
    /// A statement sheet without the line-item column is an error rather than a
    /// context silently missing the financial data.
    pub fn chat_context(
        &self,
        workbook: &Workbook,
        selection: &YearSelection,
    ) -> Result<ChatContext> {
        let statement = self
            .statement_sheet(workbook)
            .map(|table| YearFilter::apply(table, selection, &self.config.line_item_column))
            .transpose()?;
        if statement.is_none() {
            warn!("No statement sheet; chat context covers the remaining sheets only");
        }

        Ok(ChatContext::new(
            &self.config,
            statement.as_ref(),
            workbook.sheet(&self.config.sheets.competitive),
            workbook.sheet(&self.config.sheets.demographic),
        ))
    }
}

fn record_failure(
    analysis: &mut WorkbookAnalysis,
    sheet: &str,
    operation: &str,
    error: &TrendAnalyserError,
) {
    warn!("{} failed for sheet '{}': {}", operation, sheet, error);
    analysis.failures.push(SheetFailure {
        sheet: sheet.to_string(),
        operation: operation.to_string(),
        message: error.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statement() -> RawTable {
        table_from_records(
            "Results",
            vec![
                vec!["Particulars", "31 March 2020", "31 March 2021", "30 June 2021"],
                vec![TOTAL_INCOME, "100", "120", "130"],
                vec![TOTAL_EXPENSES, "80", "90", ""],
                vec![BASIC_EPS, "1.5", "1.7", "1.9"],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_end_to_end_statement() {
        let analyser = TrendAnalyser::new(AnalyserConfig::quarterly_results_layout()).unwrap();
        let analysis = analyser
            .analyze_statement(&statement(), &YearSelection::All)
            .unwrap();

        assert_eq!(analysis.series.len(), 3 * 3);
        assert_eq!(analysis.metrics.metrics.len(), 6);
        assert_eq!(
            analysis.metrics.get(TOTAL_INCOME).unwrap().values,
            vec![Some(100.0), Some(120.0), Some(130.0)]
        );
        assert_eq!(analysis.metrics.unmatched.len(), 3);
        assert_eq!(analysis.charts.series.len(), 3);
        assert!(analysis.charts.failures.is_empty());
        assert!(analysis
            .prompt
            .render()
            .contains("except the Earnings per share"));
    }

    #[test]
    fn test_year_selection_narrows_everything() {
        let analyser = TrendAnalyser::new(AnalyserConfig::quarterly_results_layout()).unwrap();
        let analysis = analyser
            .analyze_statement(&statement(), &YearSelection::parse("2021"))
            .unwrap();

        assert_eq!(analysis.axis.len(), 2);
        assert_eq!(
            analysis.metrics.get(TOTAL_EXPENSES).unwrap().values,
            vec![Some(90.0), None]
        );
        assert_eq!(analysis.prompt.periods(), &["31 March 2021", "30 June 2021"]);
    }

    #[test]
    fn test_empty_year_yields_empty_vectors() {
        let analyser = TrendAnalyser::new(AnalyserConfig::quarterly_results_layout()).unwrap();
        let analysis = analyser
            .analyze_statement(&statement(), &YearSelection::parse("2099"))
            .unwrap();

        assert_eq!(analysis.table.columns(), &["Particulars"]);
        assert!(analysis.series.is_empty());
        assert!(analysis.metrics.metrics.iter().all(|m| m.is_empty()));
        assert!(analysis.charts.series.iter().all(|s| s.points.is_empty()));
    }

    #[test]
    fn test_chat_context_reports_missing_line_item_column() {
        let analyser = TrendAnalyser::new(AnalyserConfig::quarterly_results_layout()).unwrap();
        let table = table_from_records(
            "Results",
            vec![vec!["Item", "31 March 2020"], vec![TOTAL_INCOME, "100"]],
        )
        .unwrap();
        let workbook = Workbook::new().with_sheet(table);

        let result = analyser.chat_context(&workbook, &YearSelection::All);
        match result {
            Err(TrendAnalyserError::MissingLineItemColumn { table, found, .. }) => {
                assert_eq!(table, "Results");
                assert_eq!(found, "Item");
            }
            other => panic!("expected MissingLineItemColumn, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_chat_context_includes_filtered_statement() {
        let analyser = TrendAnalyser::new(AnalyserConfig::quarterly_results_layout()).unwrap();
        let workbook = Workbook::new().with_sheet(statement());

        let context = analyser
            .chat_context(&workbook, &YearSelection::parse("2020"))
            .unwrap();
        assert!(context.system_prompt().contains("Financial statement"));
        assert!(context.system_prompt().contains("31 March 2020"));
        assert!(!context.system_prompt().contains("30 June 2021"));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AnalyserConfig {
            date_formats: vec![],
            ..AnalyserConfig::default()
        };
        assert!(TrendAnalyser::new(config).is_err());
    }
}
