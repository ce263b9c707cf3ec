//! # Workbook decoding
//!
//! Reads Office Open XML workbooks (`.xlsx`, `.xlsm`) from an in-memory
//! download: locates the worksheets through the package relationships,
//! resolves number formats to tell dates from plain numbers, resolves the
//! shared string table and yields the cells of one worksheet.
use crate::error::BoardError;
use thiserror::Error;

pub(crate) mod cell;
pub mod criteria;
pub(crate) mod reference;
pub(crate) mod sheet;
pub(crate) mod xlsx;

pub use criteria::Criteria;

#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("Missing part '{0}' in workbook package")]
    FileError(String),

    #[error("'{0}' is not an xlsx workbook: {1}")]
    NotWorkbookError(String, &'static str),

    #[error("'{0}' is an encrypted workbook or a legacy .xls file, save it as .xlsx without a password")]
    CompoundFileError(String),

    #[error("Workbook '{0}' contains no worksheet")]
    SpreadsheetEmptyError(String),

    #[error("No worksheet of '{0}' matches the sheet pattern, available sheets: {1}")]
    SheetNotFoundError(String, String),

    #[error("Sheet '{0}' references missing shared string #{1}")]
    SharedStringError(String, usize),
}

/// Decodes `bytes` and returns the worksheet selected by `criteria`, along
/// with the workbook's date system (`true` for 1904).
pub(crate) fn read_worksheet(name: &str, bytes: Vec<u8>, criteria: &Criteria) -> Result<(sheet::Sheet, bool), BoardError> {
    let mut spreadsheet = xlsx::XlsxSpreadsheet::open(name, bytes)?;
    let sheet = spreadsheet.read_sheet(criteria)?;
    tracing::debug!(
        source = %spreadsheet.name,
        sheet = %sheet.name,
        cells = sheet.cells.len(),
        date1904 = spreadsheet.is_1904,
        "worksheet decoded"
    );
    Ok((sheet, spreadsheet.is_1904))
}
