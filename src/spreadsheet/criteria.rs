use glob::Pattern;

/// Selection rules applied while decoding a workbook.
#[derive(Clone, Debug)]
pub struct Criteria {
    /// Sheet name patterns. The first worksheet matching any pattern is read;
    /// with no patterns the first worksheet is read.
    pub sheet_name_patterns: Option<Vec<Pattern>>,

    /// Convert error cells (`#N/A`, `#REF!`, ...) to empty values instead of
    /// keeping their error text.
    pub error_as_null: bool,
}

impl Default for Criteria {
    fn default() -> Self {
        Criteria {
            sheet_name_patterns: None,
            error_as_null: true,
        }
    }
}

impl Criteria {
    /// Checks if a sheet name matches the criteria patterns.
    /// Returns true if no patterns are specified or if name matches any pattern.
    pub(crate) fn accept(&self, sheet_name: &str) -> bool {
        match &self.sheet_name_patterns {
            Some(patterns) => patterns.iter().any(|pattern| pattern.matches(sheet_name)),
            None => true,
        }
    }
}
