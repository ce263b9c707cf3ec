//! # Timeline projection
//!
//! Maps tasks onto drawable bars grouped into one lane per customer. Tasks
//! without a complete time window are left out; overlaps are not resolved.
use crate::task::span_hours;
use crate::task::Task;
use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Interval {
    pub task_id: String,
    pub label: String,
    /// Customer name
    pub lane: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub tooltip: String,
}

impl Interval {
    fn from_task(task: &Task) -> Option<Interval> {
        let (start, end) = (task.start?, task.end?);
        let members = task.members_display();
        Some(Interval {
            task_id: task.id.to_owned(),
            label: format!("{} - Members: {}", task.id, members),
            lane: task.customer.to_owned(),
            start,
            end,
            tooltip: format!("Batch: {}\nStyle: {}\nMembers: {}", task.batch_no, task.style, members),
        })
    }

    pub fn hours(&self) -> f64 {
        span_hours(self.end - self.start)
    }
}

pub fn project(tasks: &[Task]) -> Vec<Interval> {
    tasks.iter().filter_map(Interval::from_task).collect()
}

/// Earliest start and latest end over `intervals`.
pub fn time_bounds(intervals: &[Interval]) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let start = intervals.iter().map(|interval| interval.start).min()?;
    let end = intervals.iter().map(|interval| interval.end).max()?;
    Some((start, end))
}
