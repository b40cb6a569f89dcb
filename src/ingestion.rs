use crate::error::{Result, TrendAnalyserError};
use crate::table::{Cell, RawTable, Workbook};
use crate::utils::parse_amount;
use csv::{ReaderBuilder, Trim};
use log::debug;
use std::io::Read;
use std::path::Path;

/// Decodes one value field. Labels (first column) are never converted.
pub fn cell_from_field(field: &str) -> Cell {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Cell::Empty;
    }
    match parse_amount(trimmed) {
        Some(value) => Cell::Number(value),
        None => Cell::Text(trimmed.to_string()),
    }
}

fn label_cell(field: &str) -> Cell {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        Cell::Empty
    } else {
        Cell::Text(trimmed.to_string())
    }
}

/// Builds a table from pre-split records; the first record is the header.
///
/// Rows shorter than the header are padded with empty cells and fully blank
/// rows are dropped. Rows longer than the header are rejected.
pub fn table_from_records<I, R, S>(name: &str, records: I) -> Result<RawTable>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut records = records.into_iter();
    let header: Vec<String> = match records.next() {
        Some(fields) => fields
            .into_iter()
            .map(|f| f.as_ref().trim().to_string())
            .collect(),
        None => {
            return Err(TrendAnalyserError::InvalidTable {
                table: name.to_string(),
                details: "no header row".to_string(),
            })
        }
    };

    let width = header.len();
    let mut rows = Vec::new();
    for record in records {
        let fields: Vec<String> = record.into_iter().map(|f| f.as_ref().to_string()).collect();
        if fields.iter().all(|f| f.trim().is_empty()) {
            continue;
        }

        let mut row: Vec<Cell> = fields
            .iter()
            .enumerate()
            .map(|(i, f)| if i == 0 { label_cell(f) } else { cell_from_field(f) })
            .collect();
        if row.len() < width {
            row.resize(width, Cell::Empty);
        }
        rows.push(row);
    }

    debug!("Decoded '{}' with {} columns and {} rows", name, width, rows.len());
    RawTable::new(name, header, rows)
}

pub fn read_csv_table<R: Read>(name: &str, reader: R) -> Result<RawTable> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        records.push(record.iter().map(str::to_string).collect::<Vec<String>>());
    }

    table_from_records(name, records)
}

/// Reads a CSV export; the sheet is named after the file stem.
pub fn read_csv_path(path: impl AsRef<Path>) -> Result<RawTable> {
    let path = path.as_ref();
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| TrendAnalyserError::InvalidTable {
            table: path.display().to_string(),
            details: "file name is not valid UTF-8".to_string(),
        })?
        .to_string();

    let file = std::fs::File::open(path)?;
    read_csv_table(&name, file)
}

/// One sheet per CSV file, in the order given.
pub fn workbook_from_csv_paths<P: AsRef<Path>>(paths: &[P]) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    for path in paths {
        workbook.insert(read_csv_path(path)?);
    }
    Ok(workbook)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_from_field() {
        assert_eq!(cell_from_field(" 1,250 "), Cell::Number(1250.0));
        assert_eq!(cell_from_field("(3)"), Cell::Number(-3.0));
        assert_eq!(cell_from_field(""), Cell::Empty);
        assert_eq!(cell_from_field("Audited"), Cell::Text("Audited".into()));
    }

    #[test]
    fn test_records_pad_and_skip_blank_rows() {
        let table = table_from_records(
            "Results",
            vec![
                vec!["Particulars", "31 March 2020", "31 March 2021"],
                vec!["Total income", "100", "120"],
                vec!["", "", ""],
                vec!["Total expenses", "80"],
            ],
        )
        .unwrap();

        assert_eq!(table.rows().len(), 2);
        assert_eq!(table.rows()[1][2], Cell::Empty);
        assert_eq!(table.rows()[0][1], Cell::Number(100.0));
    }

    #[test]
    fn test_labels_stay_text() {
        let table = table_from_records(
            "demograph",
            vec![vec!["Age group", "A"], vec!["2020", "5"]],
        )
        .unwrap();
        assert_eq!(table.rows()[0][0], Cell::Text("2020".into()));
    }

    #[test]
    fn test_empty_input_rejected() {
        let result = table_from_records("Empty", Vec::<Vec<&str>>::new());
        assert!(matches!(result, Err(TrendAnalyserError::InvalidTable { .. })));
    }

    #[test]
    fn test_read_csv_quoted_fields() {
        let data = "Particulars,31 March 2020,31 March 2021\n\
                    \"Net profit /(loss)for the period\",\"1,000\",(50)\n";
        let table = read_csv_table("Results", data.as_bytes()).unwrap();
        assert_eq!(table.columns().len(), 3);
        assert_eq!(
            table.row_label(0).as_deref(),
            Some("Net profit /(loss)for the period")
        );
        assert_eq!(table.rows()[0][1], Cell::Number(1000.0));
        assert_eq!(table.rows()[0][2], Cell::Number(-50.0));
    }

    #[test]
    fn test_read_csv_longer_row_rejected() {
        let data = "Particulars,2020\nTotal income,1,2\n";
        let result = read_csv_table("Results", data.as_bytes());
        assert!(matches!(result, Err(TrendAnalyserError::InvalidTable { .. })));
    }
}
