use crate::spreadsheet::reference::index_to_reference;
use chrono::DateTime;
use chrono::Duration;
use chrono::NaiveDate;
use chrono::NaiveDateTime;

/// How the raw text of a worksheet cell has to be interpreted.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellType {
    #[default]
    Empty,
    /// `1` / `0`
    Boolean,
    /// Plain number without a date-like number format
    Number,
    /// Serial number with a date/time format, 1900 date system
    NumberDateTime1900,
    /// Serial number with a date/time format, 1904 date system
    NumberDateTime1904,
    /// ISO 8601 text written with `t="d"`
    IsoDateTime,
    /// Inline, formula or resolved shared string
    Text,
    /// Shared string table index, resolved before the cell leaves the reader
    SharedString,
    /// `#N/A`, `#REF!` and friends
    Error,
}

impl CellType {
    /// Date-like cell type for the workbook's date system.
    pub(crate) fn datetime(is_1904: bool) -> Self {
        if is_1904 {
            Self::NumberDateTime1904
        } else {
            Self::NumberDateTime1900
        }
    }

    /// Maps built-in number format ids to a cell type. Ids 14-22 and 45-47 are
    /// the built-in date and time formats.
    pub(crate) fn parse_builtin_number_format_id(id: &str, is_1904: bool) -> Option<Self> {
        match id {
            "14" | "15" | "16" | "17" | "18" | "19" | "20" | "21" | "22" | "45" | "46" | "47" => {
                Some(Self::datetime(is_1904))
            }
            _ => None,
        }
    }

    /// Detects date/time custom formats such as `yyyy-mm-dd hh:mm`. Literal
    /// text, escapes and bracketed sections (colors, locales) are skipped.
    pub(crate) fn parse_custom_number_format(format: &str, is_1904: bool) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_bracket = false;
        let mut is_datetime = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' => is_escaped = true,

                '"' if is_literal => is_literal = false,
                '"' if !is_bracket => is_literal = true,

                ']' if is_bracket => is_bracket = false,
                '[' if !is_literal => is_bracket = true,
                _ if is_literal || is_bracket => (),

                'Y' | 'y' | 'D' | 'd' | 'H' | 'h' | 'S' | 's' => is_datetime = true,
                _ => (),
            }
        }

        if is_datetime {
            Self::datetime(is_1904)
        } else {
            Self::Number
        }
    }
}

/// A single worksheet cell with position, type and raw text.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Cell {
    /// Row index (0-based)
    pub(crate) row: usize,
    /// Column index (0-based)
    pub(crate) col: usize,
    pub(crate) kind: CellType,
    pub(crate) value: String,
}

impl Cell {
    /// Returns the A1-style reference of this cell.
    pub(crate) fn reference(&self) -> String {
        index_to_reference(self.row, self.col)
    }

    pub(crate) fn to_number(&self) -> Option<f64> {
        self.value.trim().parse::<f64>().ok().filter(|number| number.is_finite())
    }

    /// Converts date-typed cells to a timestamp. Other kinds return `None`.
    pub(crate) fn to_datetime(&self) -> Option<NaiveDateTime> {
        match self.kind {
            CellType::NumberDateTime1900 => from_serial(self.to_number()?, false),
            CellType::NumberDateTime1904 => from_serial(self.to_number()?, true),
            CellType::IsoDateTime => from_iso(&self.value),
            _ => None,
        }
    }
}

/// Converts a spreadsheet serial number to a timestamp.
///
/// The 1900 system counts from 1899-12-30 but believes 1900 was a leap year,
/// so serials below 60 are shifted by one day. The 1904 system starts 1462
/// days later. The fractional part is the time of day, rounded to the
/// millisecond.
pub(crate) fn from_serial(serial: f64, is_1904: bool) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let days = serial.trunc() as i64;
    let offset = if is_1904 {
        1462
    } else if days < 60 {
        1
    } else {
        0
    };
    let millis = ((serial - serial.trunc()) * 86_400_000f64).round() as i64;
    NaiveDate::from_ymd_opt(1899, 12, 30)?
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::try_days(days + offset)?)?
        .checked_add_signed(Duration::try_milliseconds(millis)?)
}

/// Parses the ISO 8601 forms spreadsheet producers write into `t="d"` cells.
pub(crate) fn from_iso(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Some(datetime.naive_local());
    }
    if value.contains('T') {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").ok()
    } else {
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
    }
}
