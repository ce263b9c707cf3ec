use thiserror::Error;

/// Crate-wide error type used inside the workbook decoder and the table parser.
/// Aggregates errors from the standard library, dependencies and internal modules.
#[derive(Error, Debug)]
pub enum BoardError {
    #[error("{0}")]
    WithContextError(String),

    // Standard library errors
    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    // Third-party library errors
    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncodingError(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    // Helper module errors
    #[error("{0}")]
    XmlHelperError(#[from] crate::helpers::xml::XmlError),

    // Pipeline errors
    #[error("{0}")]
    FetchError(#[from] crate::fetch::FetchError),

    #[error("{0}")]
    SpreadsheetError(#[from] crate::spreadsheet::SpreadsheetError),

    #[error("{0}")]
    SchemaError(#[from] crate::table::SchemaError),
}

pub(crate) trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, BoardError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| BoardError::WithContextError(format!("{}: {}", message, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn with_prefix_wraps_message() {
        let result: Result<(), BoardError> = Err(BoardError::from(crate::table::SchemaError {
            missing: vec!["Style".to_owned()],
        }));
        let error = result.with_prefix("sheet1").unwrap_err();
        assert_eq!(error.to_string(), "sheet1: Missing columns in Excel file: Style");
    }

    #[test]
    fn io_failures_arrive_with_their_path() {
        let error = BoardError::from(crate::fetch::FetchError::Io {
            path: "plan.xlsx".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        });
        assert!(matches!(error, BoardError::FetchError(_)));
        assert_eq!(error.to_string(), "Failed to read 'plan.xlsx': missing");
    }
}
