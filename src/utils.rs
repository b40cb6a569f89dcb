use regex::Regex;
use std::sync::LazyLock;

static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[^0-9])([0-9]{4})(?:[^0-9]|$)").expect("valid year regex"));

/// Marker used when a missing value is written into prompt text.
pub const MISSING_MARKER: &str = "n/a";

/// Interprets a spreadsheet amount.
///
/// Accepts thousands separators, a leading currency sign or backtick, and
/// accounting negatives written as `(12.5)`. Blank cells and dash placeholders
/// are missing, not zero.
pub fn parse_amount(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == "-" || trimmed == "—" || trimmed == "–" {
        return None;
    }

    let (negative, body) = match trimmed
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
    {
        Some(inner) => (true, inner.trim()),
        None => (false, trimmed),
    };

    let body = body.trim_start_matches(['`', '₹', '$', '€', '£']).trim();
    let cleaned: String = body.chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }

    let value: f64 = cleaned.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(if negative { -value } else { value })
}

/// First standalone four-digit run in `text`, e.g. `2021` in `"FY2021 (Audited)"`.
pub fn find_year(text: &str) -> Option<i32> {
    YEAR_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

pub fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => MISSING_MARKER.to_string(),
    }
}

/// Renders a value vector as a bracketed list: `[100, 120.5, n/a]`.
pub fn format_values(values: &[Option<f64>]) -> String {
    let items: Vec<String> = values.iter().map(|v| format_value(*v)).collect();
    format!("[{}]", items.join(", "))
}

pub fn format_labels(labels: &[String]) -> String {
    let items: Vec<String> = labels.iter().map(|l| format!("'{}'", l)).collect();
    format!("[{}]", items.join(", "))
}
