use crate::spreadsheet::Criteria;
use std::time::Duration;

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Runtime settings of the board. The library reads no environment; callers
/// fill this in.
#[derive(Clone, Debug)]
pub struct DashboardConfig {
    /// Spreadsheet URL or local path
    pub url: String,
    pub refresh_interval: Duration,
    pub request_timeout: Duration,
    pub criteria: Criteria,
}

impl DashboardConfig {
    pub fn new(url: &str) -> Self {
        DashboardConfig {
            url: url.to_owned(),
            ..DashboardConfig::default()
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            url: String::new(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            criteria: Criteria::default(),
        }
    }
}
