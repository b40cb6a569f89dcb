use crate::error::{Result, TrendAnalyserError};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct CatalogueEntry {
    #[schemars(
        description = "Exact row label in the statement, including punctuation and footnote text (e.g., 'Net profit /(loss)for the period'). Matching is case-sensitive."
    )]
    pub name: String,

    #[schemars(
        description = "Short heading used in narrative prompts (e.g., 'Income'). Falls back to the full name when absent."
    )]
    #[serde(default)]
    pub heading: Option<String>,

    #[schemars(
        description = "True for per-share ratios such as earnings per share. These are excluded from the currency unit annotation."
    )]
    #[serde(default)]
    pub per_share: bool,
}

impl CatalogueEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            heading: None,
            per_share: false,
        }
    }

    pub fn with_heading(mut self, heading: impl Into<String>) -> Self {
        self.heading = Some(heading.into());
        self
    }

    pub fn per_share(mut self) -> Self {
        self.per_share = true;
        self
    }

    pub fn display_heading(&self) -> &str {
        self.heading.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct ChartStyleEntry {
    #[schemars(description = "Exact row label this style applies to.")]
    pub line_item: String,

    #[schemars(
        description = "Visual form: 'line', 'bar' or 'area'. Other values are rejected when the chart is built."
    )]
    pub form: String,

    #[schemars(description = "Color name or hex code handed to the renderer.")]
    pub color: String,
}

impl ChartStyleEntry {
    pub fn new(
        line_item: impl Into<String>,
        form: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        Self {
            line_item: line_item.into(),
            form: form.into(),
            color: color.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct UnitsConfig {
    #[schemars(description = "Unit every non per-share metric is expressed in (e.g., 'Million rupees').")]
    pub currency_unit: String,

    #[schemars(description = "Unit label for per-share metrics.")]
    pub per_share_unit: String,
}

impl Default for UnitsConfig {
    fn default() -> Self {
        Self {
            currency_unit: "Million rupees".to_string(),
            per_share_unit: "rupees per share".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct NarrativeConfig {
    #[schemars(description = "Persona the text generator is asked to adopt.")]
    pub role: String,

    #[schemars(description = "Task statement placed before the metric listing.")]
    pub task: String,

    #[schemars(description = "Formatting instructions placed after the metric listing.")]
    pub closing: String,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            role: "Act as a financial advisor well equipped in understanding a company's financial statement.".to_string(),
            task: "Your task is to summarize the company's return statement with the details below.".to_string(),
            closing: "Provide the detailed summary with Introduction - A simple introduction, Heading for each particular such as 'Income', 'Expense', 'Tax expense' and so on, and explain if the company has shown improvement or decline, Overall trend followed by Conclusion.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct SheetNames {
    #[schemars(
        description = "Name of the financial statement sheet. When absent the first sheet of the workbook is used."
    )]
    #[serde(default)]
    pub statement: Option<String>,

    #[schemars(description = "Sheet with one row per period and one column per competitor.")]
    pub competitive: String,

    #[schemars(description = "Sheet with one row per age group and one column per company.")]
    pub demographic: String,

    #[schemars(description = "Label column of the competitive sheet.")]
    pub competitive_label: String,

    #[schemars(description = "Label column of the demographic sheet.")]
    pub demographic_label: String,
}

impl Default for SheetNames {
    fn default() -> Self {
        Self {
            statement: None,
            competitive: "Competitive_analysis".to_string(),
            demographic: "demograph".to_string(),
            competitive_label: "Period".to_string(),
            demographic_label: "Age group".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct AnalyserConfig {
    #[schemars(description = "Header of the first column holding line-item labels.")]
    #[serde(default = "default_line_item_column")]
    pub line_item_column: String,

    #[schemars(
        description = "Ordered chrono format strings tried when parsing a column header as a date (e.g., '%d %B %Y' for '31 March 2020')."
    )]
    #[serde(default = "default_date_formats")]
    pub date_formats: Vec<String>,

    #[schemars(description = "Ordered list of line-items extracted for summaries.")]
    #[serde(default)]
    pub catalogue: Vec<CatalogueEntry>,

    #[schemars(description = "Ordered mapping from line-item to chart style.")]
    #[serde(default)]
    pub chart_styles: Vec<ChartStyleEntry>,

    #[serde(default)]
    pub units: UnitsConfig,

    #[serde(default)]
    pub narrative: NarrativeConfig,

    #[serde(default)]
    pub sheets: SheetNames,

    #[schemars(
        description = "Company the competitive, demographic and chat prompts should focus on."
    )]
    #[serde(default)]
    pub focus_company: Option<String>,
}

fn default_line_item_column() -> String {
    "Particulars".to_string()
}

fn default_date_formats() -> Vec<String> {
    [
        "%d %B %Y", "%d %b %Y", "%B %d, %Y", "%b %d, %Y", "%d-%b-%Y", "%d-%m-%Y", "%d/%m/%Y",
        "%Y-%m-%d", "%Y-%m-%d %H:%M:%S",
    ]
    .iter()
    .map(|f| f.to_string())
    .collect()
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        Self {
            line_item_column: default_line_item_column(),
            date_formats: default_date_formats(),
            catalogue: Vec::new(),
            chart_styles: Vec::new(),
            units: UnitsConfig::default(),
            narrative: NarrativeConfig::default(),
            sheets: SheetNames::default(),
            focus_company: None,
        }
    }
}

pub const TOTAL_INCOME: &str = "Total income";
pub const TOTAL_EXPENSES: &str = "Total expenses";
pub const TOTAL_TAX_EXPENSE: &str = "Total tax expense";
pub const NET_PROFIT: &str = "Net profit /(loss)for the period";
pub const BASIC_EPS: &str =
    "Earnings per share (of ` 10/- each) (not annualised for quarters) - Basic";
pub const PAID_UP_CAPITAL: &str = "Paid-up equity share capital (face value of ` 10 each)";

impl AnalyserConfig {
    /// Layout of a listed company's quarterly results statement: six headline
    /// particulars, amounts in million rupees, EPS per share.
    pub fn quarterly_results_layout() -> Self {
        Self {
            catalogue: vec![
                CatalogueEntry::new(TOTAL_INCOME).with_heading("Income"),
                CatalogueEntry::new(TOTAL_EXPENSES).with_heading("Expense"),
                CatalogueEntry::new(TOTAL_TAX_EXPENSE).with_heading("Total Tax expense"),
                CatalogueEntry::new(NET_PROFIT).with_heading("Net profit or loss"),
                CatalogueEntry::new(BASIC_EPS)
                    .with_heading("Earnings per share")
                    .per_share(),
                CatalogueEntry::new(PAID_UP_CAPITAL).with_heading("Paid up share capital"),
            ],
            chart_styles: vec![
                ChartStyleEntry::new(TOTAL_INCOME, "line", "blue"),
                ChartStyleEntry::new(TOTAL_EXPENSES, "bar", "green"),
                ChartStyleEntry::new(TOTAL_TAX_EXPENSE, "area", "orange"),
                ChartStyleEntry::new(NET_PROFIT, "line", "red"),
                ChartStyleEntry::new(BASIC_EPS, "line", "purple"),
                ChartStyleEntry::new(PAID_UP_CAPITAL, "bar", "yellow"),
            ],
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.line_item_column.trim().is_empty() {
            return Err(TrendAnalyserError::InvalidConfig(
                "line_item_column must not be blank".to_string(),
            ));
        }

        if self.date_formats.is_empty() {
            return Err(TrendAnalyserError::InvalidConfig(
                "at least one date format is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for entry in &self.catalogue {
            if entry.name.is_empty() {
                return Err(TrendAnalyserError::InvalidConfig(
                    "catalogue entries must have a name".to_string(),
                ));
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(TrendAnalyserError::InvalidConfig(format!(
                    "catalogue entry '{}' is listed twice",
                    entry.name
                )));
            }
        }

        let mut styled = HashSet::new();
        for style in &self.chart_styles {
            if !styled.insert(style.line_item.as_str()) {
                return Err(TrendAnalyserError::InvalidConfig(format!(
                    "chart style for '{}' is listed twice",
                    style.line_item
                )));
            }
        }

        Ok(())
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(AnalyserConfig)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_generation() {
        let schema_json = AnalyserConfig::schema_as_json().unwrap();
        assert!(schema_json.contains("line_item_column"));
        assert!(schema_json.contains("catalogue"));
        assert!(schema_json.contains("chart_styles"));
    }

    #[test]
    fn test_default_has_no_embedded_layout() {
        let config = AnalyserConfig::default();
        assert!(config.catalogue.is_empty());
        assert!(config.chart_styles.is_empty());
        assert_eq!(config.line_item_column, "Particulars");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_quarterly_layout_marks_eps_per_share() {
        let config = AnalyserConfig::quarterly_results_layout();
        assert_eq!(config.catalogue.len(), 6);
        let per_share: Vec<&str> = config
            .catalogue
            .iter()
            .filter(|e| e.per_share)
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(per_share, vec![BASIC_EPS]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let json = r#"{
            "catalogue": [{ "name": "Revenue" }],
            "chart_styles": [{ "line_item": "Revenue", "form": "bar", "color": "teal" }]
        }"#;
        let config = AnalyserConfig::from_json_str(json).unwrap();
        assert_eq!(config.line_item_column, "Particulars");
        assert_eq!(config.catalogue[0].display_heading(), "Revenue");
        assert!(!config.catalogue[0].per_share);
        assert_eq!(config.sheets.competitive, "Competitive_analysis");
        assert!(!config.date_formats.is_empty());
    }

    #[test]
    fn test_duplicate_catalogue_rejected() {
        let json = r#"{ "catalogue": [{ "name": "Revenue" }, { "name": "Revenue" }] }"#;
        let result = AnalyserConfig::from_json_str(json);
        assert!(matches!(result, Err(TrendAnalyserError::InvalidConfig(_))));
    }

    #[test]
    fn test_empty_formats_rejected() {
        let config = AnalyserConfig {
            date_formats: vec![],
            ..AnalyserConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
