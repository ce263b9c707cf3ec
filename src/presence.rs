//! # Member presence
//!
//! Splits the member roster into members busy with at least one task and
//! members without one.
use crate::table::Table;
use crate::task::parse_members;
use crate::task::Task;
use serde::Serialize;
use std::collections::BTreeSet;

/// Columns whose name contains this marker list roster names. Matching is
/// case-sensitive, so a column named `members` is not consulted.
pub const MEMBER_COLUMN_MARKER: &str = "Member";

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PresenceSnapshot {
    /// Roster gathered from every member column
    pub all_members: BTreeSet<String>,
    /// Union of the members of every task
    pub active_members: BTreeSet<String>,
    /// Roster minus active
    pub absent_members: BTreeSet<String>,
}

impl PresenceSnapshot {
    /// Active members that no member column lists.
    pub fn unrostered(&self) -> BTreeSet<String> {
        self.active_members.difference(&self.all_members).cloned().collect()
    }
}

/// Names of the columns contributing to the roster.
pub fn member_columns(table: &Table) -> Vec<&str> {
    table
        .columns()
        .iter()
        .map(String::as_str)
        .filter(|column| {
            let matched = column.contains(MEMBER_COLUMN_MARKER);
            if !matched && column.to_lowercase().contains(&MEMBER_COLUMN_MARKER.to_lowercase()) {
                tracing::debug!(column, "column mentions members in another case and is not part of the roster");
            }
            matched
        })
        .collect()
}

pub fn analyze(table: &Table, tasks: &[Task]) -> PresenceSnapshot {
    let columns = member_columns(table);
    let all_members: BTreeSet<String> = table
        .rows()
        .iter()
        .flat_map(|row| columns.iter().filter_map(move |column| row.get(column).to_text()))
        .flat_map(|cell| parse_members(&cell))
        .collect();

    let active_members: BTreeSet<String> = tasks.iter().flat_map(|task| task.members.iter().cloned()).collect();
    let absent_members: BTreeSet<String> = all_members.difference(&active_members).cloned().collect();

    let snapshot = PresenceSnapshot {
        all_members,
        active_members,
        absent_members,
    };
    let unrostered = snapshot.unrostered();
    if !unrostered.is_empty() {
        tracing::warn!(members = ?unrostered, "active members missing from the roster");
    }
    snapshot
}
