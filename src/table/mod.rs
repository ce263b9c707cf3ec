//! # Validated tables
//!
//! Turns a decoded worksheet into header-keyed rows, enforces the required
//! inspection columns and coerces the timestamp columns cell by cell.
use crate::error::BoardError;
use crate::spreadsheet::read_worksheet;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::Criteria;
use std::collections::HashMap;
use std::collections::HashSet;
use thiserror::Error;

pub mod schema;
pub mod value;

pub use value::Value;

/// Required columns absent from the header row. The whole table is rejected.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Missing columns in Excel file: {}", missing.join(", "))]
pub struct SchemaError {
    pub missing: Vec<String>,
}

static EMPTY: Value = Value::Empty;

/// One spreadsheet record keyed by header name.
#[derive(Clone, Debug, PartialEq)]
pub struct RawRow {
    /// 1-based row number in the worksheet
    pub row: usize,
    fields: HashMap<String, Value>,
}

impl RawRow {
    pub fn new(row: usize, fields: HashMap<String, Value>) -> Self {
        RawRow { row, fields }
    }

    /// Value of `column`; absent columns read as `Value::Empty`.
    pub fn get(&self, column: &str) -> &Value {
        self.fields.get(column).unwrap_or(&EMPTY)
    }

    fn set(&mut self, column: &str, value: Value) {
        self.fields.insert(column.to_owned(), value);
    }
}

/// Rows of one worksheet with header-derived column names.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    pub sheet: String,
    columns: Vec<String>,
    rows: Vec<RawRow>,
    is_1904: bool,
}

impl Table {
    pub fn new(sheet: &str, columns: Vec<String>, rows: Vec<RawRow>) -> Self {
        Table {
            sheet: sheet.to_owned(),
            columns,
            rows,
            is_1904: false,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Builds a table from a worksheet: the first data row is the header,
    /// fully blank rows below it are skipped.
    pub(crate) fn from_sheet(sheet: &Sheet, is_1904: bool) -> Table {
        if sheet.is_empty() {
            tracing::debug!(sheet = %sheet.name, "worksheet has no cells");
        }
        let mut records = sheet.records().into_iter();
        let columns = match records.next() {
            Some((_, header)) => header_names(header.iter().map(|cell| {
                cell.map(|cell| Value::from_cell(cell).to_text().unwrap_or_default())
                    .unwrap_or_default()
            })),
            None => Vec::new(),
        };

        let rows = records
            .filter_map(|(row, record)| {
                let fields: HashMap<String, Value> = columns
                    .iter()
                    .zip(record.iter())
                    .map(|(column, cell)| (column.to_owned(), cell.map(Value::from_cell).unwrap_or_default()))
                    .collect();
                if fields.values().all(Value::is_blank) {
                    None
                } else {
                    Some(RawRow::new(row + 1, fields))
                }
            })
            .collect();

        Table {
            sheet: sheet.name.to_owned(),
            columns,
            rows,
            is_1904,
        }
    }

    /// Checks that every required column is present.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let present: HashSet<&str> = self.columns.iter().map(String::as_str).collect();
        let missing: Vec<String> = schema::REQUIRED_COLUMNS
            .iter()
            .filter(|column| !present.contains(*column))
            .map(|column| column.to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(SchemaError { missing })
        }
    }

    /// Replaces every timestamp column value with `Value::DateTime` or
    /// `Value::Empty`. Unparsable cells are dropped, never reported.
    pub(crate) fn coerce_timestamps(&mut self) {
        let is_1904 = self.is_1904;
        for row in &mut self.rows {
            for column in schema::TIMESTAMP_COLUMNS {
                let value = row.get(column);
                let coerced = match value.coerce_datetime(is_1904) {
                    Some(datetime) => Value::DateTime(datetime),
                    None => {
                        if !value.is_blank() {
                            tracing::trace!(row = row.row, column, value = %value, "unparsable timestamp cell set to null");
                        }
                        Value::Empty
                    }
                };
                row.set(column, coerced);
            }
        }
    }
}

/// Trims header text, names blank headers `Unnamed: <index>` and suffixes
/// repeated names with `.1`, `.2`, ...
fn header_names(raw: impl Iterator<Item = String>) -> Vec<String> {
    let mut names = Vec::<String>::new();
    let mut seen = HashMap::<String, usize>::new();
    for (index, name) in raw.enumerate() {
        let name = name.trim();
        let base = if name.is_empty() {
            format!("Unnamed: {index}")
        } else {
            name.to_owned()
        };
        let mut count = seen.get(&base).copied().unwrap_or(0);
        let mut candidate = base.clone();
        while names.contains(&candidate) {
            count += 1;
            candidate = format!("{base}.{count}");
        }
        seen.insert(base, count);
        names.push(candidate);
    }
    names
}

/// Decodes `bytes` into a validated table with coerced timestamp columns.
///
/// # Arguments
/// * `name` - Source name for diagnostics
/// * `bytes` - Downloaded workbook content
/// * `criteria` - Worksheet selection
///
/// # Returns
/// The table, or a decode error, or `SchemaError` when required columns are missing
pub fn parse(name: &str, bytes: Vec<u8>, criteria: &Criteria) -> Result<Table, BoardError> {
    let (sheet, is_1904) = read_worksheet(name, bytes, criteria)?;
    let mut table = Table::from_sheet(&sheet, is_1904);
    table.validate()?;
    table.coerce_timestamps();
    tracing::debug!(sheet = %table.sheet, rows = table.len(), columns = table.columns.len(), "table validated");
    Ok(table)
}
