//! # Task normalization
//!
//! Reshapes validated rows into [`Task`] records. Normalization is total:
//! malformed cells degrade to empty strings or `None`, never to an error.
use crate::table::schema;
use crate::table::RawRow;
use crate::table::Table;
use chrono::Duration;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt::Display;

const ID_SEPARATOR: char = '_';
const MEMBER_SEPARATOR: char = ',';

/// One inspection job with its time window and assigned members.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Task {
    /// `<BatchNo>_<Style>`, not unique
    pub id: String,
    pub customer: String,
    pub batch_no: String,
    pub style: String,
    pub submission_type: String,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub exceed_at: Option<NaiveDateTime>,
    pub dye_out_at: Option<NaiveDateTime>,
    /// `end - start` in hours, negative when the window is inverted
    pub duration_hours: Option<f64>,
    pub members: Vec<String>,
    /// 1-based worksheet row
    pub row: usize,
}

impl Task {
    pub fn from_row(row: &RawRow) -> Task {
        let text = |column: &str| row.get(column).to_text().unwrap_or_default();
        let timestamp = |column: &str| row.get(column).as_datetime();

        let batch_no = text(schema::BATCH_NO);
        let style = text(schema::STYLE);
        let start = timestamp(schema::INSPECTION_START);
        let end = timestamp(schema::INSPECTION_END);
        let members = row
            .get(schema::REQUIRED_MEMBERS)
            .to_text()
            .map(|members| parse_members(&members))
            .unwrap_or_default();

        Task {
            id: format!("{batch_no}{ID_SEPARATOR}{style}"),
            customer: text(schema::CUSTOMER),
            batch_no,
            style,
            submission_type: text(schema::SUBMISSION_TYPE),
            start,
            end,
            exceed_at: timestamp(schema::INSPECTION_EXCEED),
            dye_out_at: timestamp(schema::DYE_OUT_AT),
            duration_hours: duration_hours(start, end),
            members,
            row: row.row,
        }
    }

    /// Compares the inspection end with the exceed deadline.
    pub fn exceed_status(&self) -> ExceedStatus {
        match (self.end, self.exceed_at) {
            (Some(end), Some(exceed_at)) => {
                let margin = exceed_at - end;
                if margin > Duration::zero() {
                    ExceedStatus::Exceeded(margin)
                } else {
                    ExceedStatus::WithinTime
                }
            }
            _ => ExceedStatus::Unknown,
        }
    }

    /// Members joined for display.
    pub fn members_display(&self) -> String {
        self.members.join(", ")
    }
}

/// Converts every row of `table`, preserving order and length.
pub fn normalize(table: &Table) -> Vec<Task> {
    table.rows().iter().map(Task::from_row).collect()
}

/// Splits a comma-separated member list, trimming names and dropping blanks.
/// Order and duplicates are kept.
pub fn parse_members(source: &str) -> Vec<String> {
    source
        .split(MEMBER_SEPARATOR)
        .map(str::trim)
        .filter(|member| !member.is_empty())
        .map(str::to_owned)
        .collect()
}

fn duration_hours(start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Option<f64> {
    let (start, end) = (start?, end?);
    Some(span_hours(end - start))
}

/// Length of `span` in hours, exact to the microsecond.
pub(crate) fn span_hours(span: Duration) -> f64 {
    match span.num_microseconds() {
        Some(micros) => micros as f64 / 3_600_000_000.0,
        None => span.num_seconds() as f64 / 3_600.0,
    }
}

/// Outcome of comparing an inspection end time with its exceed time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ExceedStatus {
    /// Either timestamp is missing
    Unknown,
    WithinTime,
    /// The exceed time lies this far after the end time
    Exceeded(Duration),
}

impl Display for ExceedStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExceedStatus::Unknown => write!(f, "N/A"),
            ExceedStatus::WithinTime => write!(f, "Within time"),
            ExceedStatus::Exceeded(by) => write!(f, "Exceeded by {}", format_span(*by)),
        }
    }
}

/// `[D day(s), ]H:MM:SS`
fn format_span(span: Duration) -> String {
    let seconds = span.num_seconds();
    let (days, rest) = (seconds.div_euclid(86_400), seconds.rem_euclid(86_400));
    let clock = format!("{}:{:02}:{:02}", rest / 3600, rest % 3600 / 60, rest % 60);
    match days {
        0 => clock,
        1 | -1 => format!("{days} day, {clock}"),
        _ => format!("{days} days, {clock}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn at(h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(h, min, 0).unwrap()
    }

    fn row(fields: Vec<(&str, Value)>) -> RawRow {
        let fields: HashMap<String, Value> = fields.into_iter().map(|(k, v)| (k.to_owned(), v)).collect();
        RawRow::new(2, fields)
    }

    #[test]
    fn parses_member_lists() {
        assert_eq!(parse_members("Alice, Bob ,  , Carol"), vec!["Alice", "Bob", "Carol"]);
        assert_eq!(parse_members("Bob,Bob"), vec!["Bob", "Bob"]);
        assert!(parse_members("").is_empty());
        assert!(parse_members(" , ,").is_empty());
    }

    #[test]
    fn builds_tasks_from_rows() {
        let task = Task::from_row(&row(vec![
            (schema::CUSTOMER, Value::Text("ABCorp".to_owned())),
            (schema::BATCH_NO, Value::Number(1001.0)),
            (schema::STYLE, Value::Text("Polo".to_owned())),
            (schema::REQUIRED_MEMBERS, Value::Text("Alice, Bob".to_owned())),
            (schema::INSPECTION_START, Value::DateTime(at(8, 0))),
            (schema::INSPECTION_END, Value::DateTime(at(10, 30))),
        ]));
        assert_eq!(task.id, "1001_Polo");
        assert_eq!(task.duration_hours, Some(2.5));
        assert_eq!(task.members, vec!["Alice", "Bob"]);
        assert_eq!(task.submission_type, "");
        assert_eq!(task.exceed_at, None);
        assert_eq!(task.row, 2);
    }

    #[test]
    fn missing_fields_degrade() {
        let task = Task::from_row(&row(vec![(schema::INSPECTION_START, Value::DateTime(at(8, 0)))]));
        assert_eq!(task.id, "_");
        assert_eq!(task.duration_hours, None);
        assert!(task.members.is_empty());
    }

    #[test]
    fn inverted_windows_keep_negative_duration() {
        let task = Task::from_row(&row(vec![
            (schema::INSPECTION_START, Value::DateTime(at(10, 0))),
            (schema::INSPECTION_END, Value::DateTime(at(9, 0))),
        ]));
        assert_eq!(task.duration_hours, Some(-1.0));
    }

    #[test]
    fn durations_keep_sub_millisecond_precision() {
        let task = Task::from_row(&row(vec![
            (schema::INSPECTION_START, Value::DateTime(at(8, 0))),
            (schema::INSPECTION_END, Value::DateTime(at(8, 0) + Duration::microseconds(1_800))),
        ]));
        assert_eq!(task.duration_hours, Some(1_800.0 / 3_600_000_000.0));
        assert_eq!(span_hours(Duration::microseconds(-900)), -900.0 / 3_600_000_000.0);
    }

    #[test]
    fn normalizes_every_row_in_order() {
        let table = Table::new(
            "Sheet1",
            vec![schema::BATCH_NO.to_owned(), schema::STYLE.to_owned()],
            vec![
                row(vec![(schema::BATCH_NO, Value::Text("A".to_owned())), (schema::STYLE, Value::Text("X".to_owned()))]),
                row(vec![(schema::BATCH_NO, Value::Text("A".to_owned())), (schema::STYLE, Value::Text("X".to_owned()))]),
                row(vec![(schema::BATCH_NO, Value::Text("B".to_owned()))]),
            ],
        );
        let ids: Vec<String> = normalize(&table).into_iter().map(|task| task.id).collect();
        assert_eq!(ids, vec!["A_X", "A_X", "B_"]);
    }

    #[test]
    fn exceed_status() {
        let mut task = Task::from_row(&row(vec![]));
        assert_eq!(task.exceed_status(), ExceedStatus::Unknown);
        assert_eq!(task.exceed_status().to_string(), "N/A");

        task.end = Some(at(10, 0));
        task.exceed_at = Some(at(11, 30));
        assert_eq!(task.exceed_status().to_string(), "Exceeded by 1:30:00");

        task.exceed_at = Some(at(10, 0));
        assert_eq!(task.exceed_status(), ExceedStatus::WithinTime);
        assert_eq!(task.exceed_status().to_string(), "Within time");
    }

    #[test]
    fn formats_spans() {
        assert_eq!(format_span(Duration::minutes(5)), "0:05:00");
        assert_eq!(format_span(Duration::hours(26)), "1 day, 2:00:00");
        assert_eq!(format_span(Duration::hours(50)), "2 days, 2:00:00");
    }
}
