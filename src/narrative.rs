use crate::error::{Result, TrendAnalyserError};
use crate::extractor::{MetricSet, MetricVector};
use crate::schema::AnalyserConfig;
use crate::table::RawTable;
use crate::utils::{format_labels, format_values};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptMetric {
    pub name: String,
    pub heading: String,
    pub values: Vec<Option<f64>>,
    pub unit: String,
    pub per_share: bool,
}

/// Structured summary request for the text generator. Read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativePrompt {
    instruction: String,
    periods: Vec<String>,
    metrics: Vec<PromptMetric>,
    units_note: String,
    closing: String,
}

impl NarrativePrompt {
    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn periods(&self) -> &[String] {
        &self.periods
    }

    pub fn metrics(&self) -> &[PromptMetric] {
        &self.metrics
    }

    pub fn units_note(&self) -> &str {
        &self.units_note
    }

    pub fn closing(&self) -> &str {
        &self.closing
    }

    pub fn render(&self) -> String {
        let mut lines = vec![
            self.instruction.clone(),
            format!(
                "The period for the financial statement is {},",
                format_labels(&self.periods)
            ),
        ];

        for metric in &self.metrics {
            lines.push(format!(
                "The {} for the given period is {},",
                metric.heading,
                format_values(&metric.values)
            ));
        }

        lines.push(self.units_note.clone());
        lines.push(self.closing.clone());
        lines.join("\n")
    }
}

/// A `heading: body` block of a generated report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSection {
    pub heading: String,
    pub body: String,
}

/// Splits generated text into sections on blank lines.
///
/// The heading is the text before the first `:` of a block; blocks without a
/// colon keep an empty heading.
pub fn report_sections(text: &str) -> Vec<ReportSection> {
    text.replace("\r\n", "\n")
        .split("\n\n")
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .map(|block| match block.split_once(':') {
            Some((heading, body)) => ReportSection {
                heading: heading.trim().to_string(),
                body: body.trim().to_string(),
            },
            None => ReportSection {
                heading: String::new(),
                body: block.to_string(),
            },
        })
        .collect()
}

pub struct NarrativePromptBuilder<'a> {
    config: &'a AnalyserConfig,
}

impl<'a> NarrativePromptBuilder<'a> {
    pub fn new(config: &'a AnalyserConfig) -> Self {
        Self { config }
    }

    pub fn build(&self, periods: &[String], metrics: &[MetricVector]) -> Result<NarrativePrompt> {
        let units = &self.config.units;
        let mut prompt_metrics = Vec::with_capacity(metrics.len());

        for metric in metrics {
            if metric.len() != periods.len() {
                return Err(TrendAnalyserError::MisalignedMetric {
                    metric: metric.name.clone(),
                    expected: periods.len(),
                    found: metric.len(),
                });
            }

            let entry = self.config.catalogue.iter().find(|e| e.name == metric.name);
            let per_share = entry.is_some_and(|e| e.per_share);
            prompt_metrics.push(PromptMetric {
                name: metric.name.clone(),
                heading: entry
                    .map(|e| e.display_heading().to_string())
                    .unwrap_or_else(|| metric.name.clone()),
                values: metric.values.clone(),
                unit: if per_share {
                    units.per_share_unit.clone()
                } else {
                    units.currency_unit.clone()
                },
                per_share,
            });
        }

        let per_share_headings: Vec<&str> = prompt_metrics
            .iter()
            .filter(|m| m.per_share)
            .map(|m| m.heading.as_str())
            .collect();
        let units_note = if per_share_headings.is_empty() {
            format!(
                "Make sure that the provided data is in {}.",
                units.currency_unit
            )
        } else {
            format!(
                "Make sure that the provided data is in {} except the {}.",
                units.currency_unit,
                per_share_headings.join(" and the ")
            )
        };

        let narrative = &self.config.narrative;
        Ok(NarrativePrompt {
            instruction: format!("{} {}", narrative.role, narrative.task),
            periods: periods.to_vec(),
            metrics: prompt_metrics,
            units_note,
            closing: narrative.closing.clone(),
        })
    }

    pub fn from_metric_set(&self, set: &MetricSet) -> Result<NarrativePrompt> {
        self.build(&set.axis, &set.metrics)
    }

    fn focus(&self) -> &str {
        self.config.focus_company.as_deref().unwrap_or("the company")
    }

    pub fn competitive_prompt(&self, table: &RawTable) -> String {
        let company = self.focus();
        format!(
            "Prepare a sales summary for {company} with the data given below:\n{}\
             Emphasize how {company} is competing with its peer companies and mention its trend \
             change compared to each quarter and the delta change with its peers.",
            table.to_text()
        )
    }

    pub fn demographic_prompt(&self, table: &RawTable) -> String {
        let company = self.focus();
        format!(
            "You are provided with the demographic data of {company} and its peers, the data is \
             given below:\n{}\
             Provide an analysis of how each company is targeting each age group and emphasize how \
             {company} focuses on the different demographic groups.",
            table.to_text()
        )
    }
}
