//! # Inspection Board
//!
//! A live board for garment inspection scheduling. Each refresh pulls an
//! xlsx workbook from a URL (SharePoint sharing links included) or a local
//! path, and turns its rows into tasks, timeline bars and a member presence
//! summary.
//!
//! ## Pipeline
//!
//! - [`fetch`]: downloads the workbook bytes
//! - [`table::parse`]: decodes the first (or pattern-selected) worksheet,
//!   checks the required columns and coerces timestamp cells
//! - [`task::normalize`]: builds one [`Task`] per row
//! - [`presence::analyze`]: roster, active and absent members
//! - [`timeline::project`]: one [`Interval`] per task with a full time window
//! - [`search::filter`]: case-insensitive search over customer, batch and style
//! - [`cycle::run_cycle`]: chains the steps above into one refresh
//!
//! Rendering lives in [`render`]; the periodic trigger belongs to the caller.
pub mod config;
pub mod cycle;
pub mod error;
pub mod fetch;
mod helpers;
pub mod presence;
pub mod render;
pub mod search;
pub mod spreadsheet;
pub mod table;
pub mod task;
pub mod timeline;

#[cfg(test)]
pub(crate) mod testing;

pub use config::DashboardConfig;
pub use cycle::run_cycle;
pub use cycle::CycleError;
pub use cycle::RefreshContext;
pub use cycle::Snapshot;
pub use error::BoardError;
pub use fetch::Fetch;
pub use fetch::HttpFetcher;
pub use presence::PresenceSnapshot;
pub use task::Task;
pub use timeline::Interval;
