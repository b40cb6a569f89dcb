use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrendAnalyserError {
    #[error("Column header '{header}' is not a recognizable period")]
    UnparseablePeriod { header: String },

    #[error("No row labelled '{line_item}' found for catalogue entry")]
    MissingCatalogueMatch { line_item: String },

    #[error("Unsupported chart form '{form}' requested for '{line_item}'")]
    UnsupportedChartForm { line_item: String, form: String },

    #[error("Table '{table}' has no columns for year {year}")]
    EmptyYearSelection { table: String, year: String },

    #[error("Invalid table '{table}': {details}")]
    InvalidTable { table: String, details: String },

    #[error("Table '{table}' must start with line-item column '{expected}', found '{found}'")]
    MissingLineItemColumn {
        table: String,
        expected: String,
        found: String,
    },

    #[error("Metric '{metric}' has {found} values but the period axis has {expected}")]
    MisalignedMetric {
        metric: String,
        expected: usize,
        found: usize,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Text generation failed: {0}")]
    Generation(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[cfg(feature = "azure-openai")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl TrendAnalyserError {
    /// Whether the pipeline recovers from this error locally instead of surfacing it.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::UnparseablePeriod { .. }
                | Self::MissingCatalogueMatch { .. }
                | Self::EmptyYearSelection { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, TrendAnalyserError>;
