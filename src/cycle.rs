//! # Refresh cycle
//!
//! One refresh is a stateless recomputation: fetch, parse, normalize, then
//! derive presence and timeline. The caller owns the [`RefreshContext`] and
//! decides when to run the next cycle.
use crate::config::DashboardConfig;
use crate::error::BoardError;
use crate::fetch::Fetch;
use crate::fetch::FetchError;
use crate::presence;
use crate::presence::PresenceSnapshot;
use crate::table;
use crate::table::SchemaError;
use crate::task;
use crate::task::Task;
use crate::timeline;
use crate::timeline::Interval;
use chrono::NaiveDateTime;
use serde::Serialize;
use thiserror::Error;

/// Why a cycle produced no snapshot. None of these stop the board.
#[derive(Error, Debug)]
pub enum CycleError {
    #[error("{0}")]
    Fetch(#[from] FetchError),

    #[error("{0}")]
    Schema(#[from] SchemaError),

    #[error("Failed to read spreadsheet: {0}")]
    Decode(BoardError),
}

impl From<BoardError> for CycleError {
    fn from(error: BoardError) -> Self {
        match error {
            BoardError::SchemaError(error) => CycleError::Schema(error),
            BoardError::FetchError(error) => CycleError::Fetch(error),
            error => CycleError::Decode(error),
        }
    }
}

/// Counts shown next to the board.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DashboardMetrics {
    pub total_tasks: usize,
    pub roster_members: usize,
    pub active_members: usize,
    pub absent_members: usize,
}

impl DashboardMetrics {
    pub fn new(tasks: &[Task], presence: &PresenceSnapshot) -> Self {
        DashboardMetrics {
            total_tasks: tasks.len(),
            roster_members: presence.all_members.len(),
            active_members: presence.active_members.len(),
            absent_members: presence.absent_members.len(),
        }
    }
}

/// Everything one successful cycle produces.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Snapshot {
    pub tasks: Vec<Task>,
    pub intervals: Vec<Interval>,
    pub presence: PresenceSnapshot,
    pub metrics: DashboardMetrics,
    pub refreshed_at: NaiveDateTime,
}

/// Caller-owned state carried between cycles.
#[derive(Clone, Debug)]
pub struct RefreshContext {
    pub config: DashboardConfig,
    /// Start time of the latest cycle, successful or not
    pub last_refresh: Option<NaiveDateTime>,
    pub last_error: Option<String>,
    pub cycles: u64,
}

impl RefreshContext {
    pub fn new(config: DashboardConfig) -> Self {
        RefreshContext {
            config,
            last_refresh: None,
            last_error: None,
            cycles: 0,
        }
    }

    /// True before the first cycle, once the refresh interval has elapsed,
    /// and whenever the clock has moved back behind the last refresh.
    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        match self.last_refresh {
            None => true,
            Some(last) => match (now - last).to_std() {
                Ok(elapsed) => elapsed >= self.config.refresh_interval,
                Err(_) => true,
            },
        }
    }
}

fn build_snapshot(context: &RefreshContext, fetcher: &impl Fetch, now: NaiveDateTime) -> Result<Snapshot, CycleError> {
    let bytes = fetcher.fetch(&context.config.url)?;
    let table = table::parse(&context.config.url, bytes, &context.config.criteria)?;
    let tasks = task::normalize(&table);
    let presence = presence::analyze(&table, &tasks);
    let intervals = timeline::project(&tasks);
    let metrics = DashboardMetrics::new(&tasks, &presence);
    Ok(Snapshot {
        tasks,
        intervals,
        presence,
        metrics,
        refreshed_at: now,
    })
}

/// Runs one refresh. The outcome is recorded in `context` either way.
pub fn run_cycle(context: &mut RefreshContext, fetcher: &impl Fetch, now: NaiveDateTime) -> Result<Snapshot, CycleError> {
    context.cycles += 1;
    context.last_refresh = Some(now);
    let result = build_snapshot(context, fetcher, now);
    match &result {
        Ok(snapshot) => {
            context.last_error = None;
            tracing::info!(
                cycle = context.cycles,
                tasks = snapshot.metrics.total_tasks,
                intervals = snapshot.intervals.len(),
                active = snapshot.metrics.active_members,
                "refresh completed"
            );
        }
        Err(error) => {
            context.last_error = Some(error.to_string());
            tracing::warn!(cycle = context.cycles, %error, "refresh failed");
        }
    }
    result
}
