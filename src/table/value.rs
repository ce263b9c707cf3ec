use crate::spreadsheet::cell::from_serial;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use chrono::DateTime;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use std::fmt::Display;

/// Timestamp layouts accepted in text cells, tried in order.
/// Month-first wins over day-first for ambiguous slash dates.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%d %b %Y %H:%M",
    "%d-%b-%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y", "%d %b %Y", "%d-%b-%Y"];

/// A typed spreadsheet value as seen by the table layer.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Boolean(bool),
    DateTime(NaiveDateTime),
    /// Spreadsheet error literal such as `#N/A`
    Error(String),
}

impl Value {
    pub(crate) fn from_cell(cell: &Cell) -> Value {
        match cell.kind {
            CellType::Empty => Value::Empty,
            CellType::Boolean => Value::Boolean(cell.value.trim() == "1"),
            CellType::Number => match cell.to_number() {
                Some(number) => Value::Number(number),
                None => Value::Text(cell.value.to_owned()),
            },
            CellType::NumberDateTime1900 | CellType::NumberDateTime1904 | CellType::IsoDateTime => {
                match cell.to_datetime() {
                    Some(datetime) => Value::DateTime(datetime),
                    None => Value::Text(cell.value.to_owned()),
                }
            }
            CellType::Text | CellType::SharedString => Value::Text(cell.value.to_owned()),
            CellType::Error => Value::Error(cell.value.to_owned()),
        }
    }

    /// True for empty cells, whitespace-only text and error literals.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Empty | Value::Error(_) => true,
            Value::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    /// String form used for identifiers and free-text fields. Blank values
    /// give `None`; integral numbers lose their `.0`.
    pub fn to_text(&self) -> Option<String> {
        if self.is_blank() {
            None
        } else {
            Some(self.to_string())
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Value::DateTime(datetime) => Some(*datetime),
            _ => None,
        }
    }

    /// Coerces the value to a timestamp. Plain numbers are read as serial
    /// dates of the workbook's date system; text is tried against the known
    /// layouts. Anything else is `None`.
    pub(crate) fn coerce_datetime(&self, is_1904: bool) -> Option<NaiveDateTime> {
        match self {
            Value::DateTime(datetime) => Some(*datetime),
            Value::Number(serial) => from_serial(*serial, is_1904),
            Value::Text(text) => parse_datetime_text(text),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::Text(text) => write!(f, "{}", text),
            Value::Number(number) if number.fract() == 0.0 && number.abs() < 1e15 => write!(f, "{}", *number as i64),
            Value::Number(number) => write!(f, "{}", number),
            Value::Boolean(value) => write!(f, "{}", if *value { "TRUE" } else { "FALSE" }),
            Value::DateTime(datetime) => write!(f, "{}", datetime.format("%Y-%m-%d %H:%M:%S")),
            Value::Error(error) => write!(f, "{}", error),
        }
    }
}

/// Parses free-text timestamps. RFC 3339 values keep their wall-clock time.
pub(crate) fn parse_datetime_text(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return Some(datetime.naive_local());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
