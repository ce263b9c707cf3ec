//! In-memory xlsx fixtures for unit tests.

use quick_xml::escape::escape;
use std::io::Cursor;
use std::io::Write;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Style index of a custom `yyyy-mm-dd hh:mm` format (numFmtId 164).
const STYLE_CUSTOM_DATETIME: usize = 1;
/// Style index of the built-in `m/d/yy h:mm` format (numFmtId 22).
const STYLE_BUILTIN_DATETIME: usize = 2;

#[derive(Clone, Debug)]
pub(crate) enum FixtureCell {
    Empty,
    Inline(String),
    Shared(String),
    Number(f64),
    Styled(f64, usize),
    Iso(String),
    Boolean(bool),
    Error(String),
}

pub(crate) mod fixture {
    use super::*;

    pub(crate) fn empty() -> FixtureCell {
        FixtureCell::Empty
    }

    pub(crate) fn text(value: &str) -> FixtureCell {
        FixtureCell::Inline(value.to_owned())
    }

    pub(crate) fn shared(value: &str) -> FixtureCell {
        FixtureCell::Shared(value.to_owned())
    }

    pub(crate) fn number(value: f64) -> FixtureCell {
        FixtureCell::Number(value)
    }

    /// Serial number with a custom date/time format.
    pub(crate) fn datetime(serial: f64) -> FixtureCell {
        FixtureCell::Styled(serial, STYLE_CUSTOM_DATETIME)
    }

    /// Serial number with the built-in date/time format 22.
    pub(crate) fn builtin_datetime(serial: f64) -> FixtureCell {
        FixtureCell::Styled(serial, STYLE_BUILTIN_DATETIME)
    }

    pub(crate) fn iso(value: &str) -> FixtureCell {
        FixtureCell::Iso(value.to_owned())
    }

    pub(crate) fn boolean(value: bool) -> FixtureCell {
        FixtureCell::Boolean(value)
    }

    pub(crate) fn error(value: &str) -> FixtureCell {
        FixtureCell::Error(value.to_owned())
    }
}

/// Builds a minimal but valid xlsx package.
#[derive(Default)]
pub(crate) struct WorkbookBuilder {
    sheets: Vec<(String, Vec<Vec<FixtureCell>>)>,
    date1904: bool,
}

impl WorkbookBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn date1904(mut self) -> Self {
        self.date1904 = true;
        self
    }

    pub(crate) fn sheet(mut self, name: &str, rows: Vec<Vec<FixtureCell>>) -> Self {
        self.sheets.push((name.to_owned(), rows));
        self
    }

    pub(crate) fn build(self) -> Vec<u8> {
        let mut shared_strings = Vec::<String>::new();
        let mut worksheets = Vec::<String>::new();
        for (_, rows) in &self.sheets {
            worksheets.push(worksheet_xml(rows, &mut shared_strings));
        }

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let mut add = |name: &str, content: &str| {
            writer.start_file(name, SimpleFileOptions::default()).expect("start zip entry");
            writer.write_all(content.as_bytes()).expect("write zip entry");
        };

        add("[Content_Types].xml", r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#);
        add("xl/workbook.xml", &self.workbook_xml());
        add("xl/_rels/workbook.xml.rels", &self.relationships_xml());
        add("xl/styles.xml", STYLES_XML);
        add("xl/sharedStrings.xml", &shared_strings_xml(&shared_strings));
        for (index, worksheet) in worksheets.iter().enumerate() {
            add(&format!("xl/worksheets/sheet{}.xml", index + 1), worksheet);
        }
        writer.finish().expect("finish zip").into_inner()
    }

    fn workbook_xml(&self) -> String {
        let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#);
        if self.date1904 {
            xml.push_str(r#"<workbookPr date1904="1"/>"#);
        }
        xml.push_str("<sheets>");
        for (index, (name, _)) in self.sheets.iter().enumerate() {
            xml.push_str(&format!(r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#, escape(name.as_str()), index + 1, index + 1));
        }
        xml.push_str("</sheets></workbook>");
        xml
    }

    fn relationships_xml(&self) -> String {
        let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#);
        for index in 1..=self.sheets.len() {
            xml.push_str(&format!(
                r#"<Relationship Id="rId{index}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{index}.xml"/>"#
            ));
        }
        xml.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
            self.sheets.len() + 1
        ));
        xml.push_str("</Relationships>");
        xml
    }
}

const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?><styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><numFmts count="1"><numFmt numFmtId="164" formatCode="yyyy\-mm\-dd\ hh:mm"/></numFmts><cellStyleXfs count="1"><xf numFmtId="0"/></cellStyleXfs><cellXfs count="3"><xf numFmtId="0" xfId="0"/><xf numFmtId="164" xfId="0" applyNumberFormat="1"/><xf numFmtId="22" xfId="0" applyNumberFormat="1"/></cellXfs></styleSheet>"#;

fn shared_strings_xml(strings: &[String]) -> String {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">"#,
        strings.len()
    );
    for string in strings {
        xml.push_str(&format!("<si><t>{}</t></si>", escape(string.as_str())));
    }
    xml.push_str("</sst>");
    xml
}

fn worksheet_xml(rows: &[Vec<FixtureCell>], shared_strings: &mut Vec<String>) -> String {
    let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#);
    for (row, cells) in rows.iter().enumerate() {
        xml.push_str(&format!(r#"<row r="{}">"#, row + 1));
        for (col, cell) in cells.iter().enumerate() {
            let reference = crate::spreadsheet::reference::index_to_reference(row, col);
            let body = match cell {
                FixtureCell::Empty => continue,
                FixtureCell::Inline(value) => {
                    format!(r#"<c r="{reference}" t="inlineStr"><is><t>{}</t></is></c>"#, escape(value.as_str()))
                }
                FixtureCell::Shared(value) => {
                    let index = match shared_strings.iter().position(|it| it == value) {
                        Some(index) => index,
                        None => {
                            shared_strings.push(value.to_owned());
                            shared_strings.len() - 1
                        }
                    };
                    format!(r#"<c r="{reference}" t="s"><v>{index}</v></c>"#)
                }
                FixtureCell::Number(value) => format!(r#"<c r="{reference}"><v>{value}</v></c>"#),
                FixtureCell::Styled(value, style) => format!(r#"<c r="{reference}" s="{style}"><v>{value}</v></c>"#),
                FixtureCell::Iso(value) => format!(r#"<c r="{reference}" t="d"><v>{value}</v></c>"#),
                FixtureCell::Boolean(value) => format!(r#"<c r="{reference}" t="b"><v>{}</v></c>"#, u8::from(*value)),
                FixtureCell::Error(value) => format!(r#"<c r="{reference}" t="e"><v>{}</v></c>"#, escape(value.as_str())),
            };
            xml.push_str(&body);
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}
