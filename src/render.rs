//! # Text rendering
//!
//! Plain-text views of a snapshot for terminals and logs. Each view is a
//! `Display` type, so it can be written straight into any formatter.
use crate::cycle::Snapshot;
use crate::task::Task;
use crate::timeline::time_bounds;
use crate::timeline::Interval;
use chrono::NaiveDateTime;
use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";
const REFRESH_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const NOT_AVAILABLE: &str = "N/A";
const BAR: char = '#';
const NOW_MARKER: char = '|';

fn format_time(time: Option<NaiveDateTime>) -> String {
    match time {
        Some(time) => time.format(TIME_FORMAT).to_string(),
        None => NOT_AVAILABLE.to_owned(),
    }
}

/// Detail card of one task.
pub struct TaskDetails<'a>(pub &'a Task);

impl Display for TaskDetails<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let task = self.0;
        writeln!(f, "Task: {}", task.id)?;
        writeln!(f, "  Customer: {}", task.customer)?;
        writeln!(f, "  Batch No: {}", task.batch_no)?;
        writeln!(f, "  Style: {}", task.style)?;
        writeln!(f, "  Submission Type: {}", task.submission_type)?;
        writeln!(f, "  Members: {}", task.members_display())?;
        writeln!(f, "  Timeline:")?;
        writeln!(f, "    - Start: {}", format_time(task.start))?;
        writeln!(f, "    - End: {}", format_time(task.end))?;
        writeln!(f, "    - Status: {}", task.exceed_status())
    }
}

pub fn task_details(task: &Task) -> String {
    TaskDetails(task).to_string()
}

/// Refresh time and headline counts.
pub struct MetricsPanel<'a>(pub &'a Snapshot);

impl Display for MetricsPanel<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let snapshot = self.0;
        let metrics = &snapshot.metrics;
        writeln!(f, "Last refreshed: {}", snapshot.refreshed_at.format(REFRESH_FORMAT))?;
        writeln!(f, "Total Tasks: {}", metrics.total_tasks)?;
        writeln!(f, "Active Members: {}", metrics.active_members)?;
        writeln!(f, "Roster Members: {}", metrics.roster_members)?;
        let absent: Vec<&str> = snapshot.presence.absent_members.iter().map(String::as_str).collect();
        if absent.is_empty() {
            writeln!(f, "Absent Members: 0")
        } else {
            writeln!(f, "Absent Members: {} ({})", metrics.absent_members, absent.join(", "))
        }
    }
}

pub fn metrics_panel(snapshot: &Snapshot) -> String {
    MetricsPanel(snapshot).to_string()
}

/// Column of `time` on a `width`-wide axis spanning `start..end`, clamped to
/// `0..=width`.
fn column(time: NaiveDateTime, start: NaiveDateTime, end: NaiveDateTime, width: usize) -> usize {
    let span = (end - start).num_milliseconds();
    if span <= 0 {
        return 0;
    }
    let offset = (time - start).num_milliseconds().clamp(0, span);
    (offset as i128 * width as i128 / span as i128) as usize
}

/// Bars grouped by lane in order of first appearance, scaled to `width`
/// columns. A `|` marks `now` when it falls inside the plotted range.
pub struct TimelineChart<'a> {
    pub intervals: &'a [Interval],
    pub now: NaiveDateTime,
    pub width: usize,
}

impl Display for TimelineChart<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let (intervals, now) = (self.intervals, self.now);
        let Some((start, end)) = time_bounds(intervals) else {
            return writeln!(f, "No scheduled inspections");
        };
        let width = self.width.max(1);
        let marker = (start <= now && now <= end).then(|| column(now, start, end, width).min(width - 1));

        let mut lanes: Vec<(&str, Vec<&Interval>)> = Vec::new();
        for interval in intervals {
            match lanes.iter_mut().find(|(lane, _)| *lane == interval.lane) {
                Some((_, members)) => members.push(interval),
                None => lanes.push((interval.lane.as_str(), vec![interval])),
            }
        }
        let label_width = intervals.iter().map(|interval| interval.label.chars().count()).max().unwrap_or(0);

        writeln!(f, "Task Timeline {} .. {}", start.format(TIME_FORMAT), end.format(TIME_FORMAT))?;
        if marker.is_some() {
            writeln!(f, "Current Time: {}", now.format(REFRESH_FORMAT))?;
        }
        for (lane, members) in lanes {
            writeln!(f, "{}", if lane.is_empty() { "(no customer)" } else { lane })?;
            for interval in members {
                let from = column(interval.start, start, end, width).min(width - 1);
                let to = column(interval.end, start, end, width).max(from + 1);
                let bar: String = (0..width)
                    .map(|index| match marker {
                        Some(marker) if marker == index => NOW_MARKER,
                        _ if (from..to).contains(&index) => BAR,
                        _ => ' ',
                    })
                    .collect();
                writeln!(f, "  {:<label_width$} [{}]", interval.label, bar)?;
            }
        }
        Ok(())
    }
}

pub fn timeline_chart(intervals: &[Interval], now: NaiveDateTime, width: usize) -> String {
    TimelineChart { intervals, now, width }.to_string()
}
