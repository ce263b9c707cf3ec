//! inspection-board CLI
//!
//! Polls the inspection workbook and prints the board on every refresh.

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, ValueEnum};
use glob::Pattern;
use inspection_board::config::DEFAULT_REFRESH_INTERVAL;
use inspection_board::config::DEFAULT_REQUEST_TIMEOUT;
use inspection_board::render;
use inspection_board::search;
use inspection_board::spreadsheet::Criteria;
use inspection_board::{run_cycle, DashboardConfig, HttpFetcher, RefreshContext, Snapshot};
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const CHART_WIDTH: usize = 60;
const POLL_STEP: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "inspection-board")]
#[command(author, version, about = "Live inspection task board", long_about = None)]
struct Cli {
    /// Spreadsheet URL or local path
    #[arg(short, long, env = "INSPECTION_BOARD_URL")]
    url: String,

    /// Seconds between refreshes
    #[arg(short, long, default_value_t = DEFAULT_REFRESH_INTERVAL.as_secs())]
    interval: u64,

    /// HTTP request timeout in seconds
    #[arg(short, long, default_value_t = DEFAULT_REQUEST_TIMEOUT.as_secs())]
    timeout: u64,

    /// Glob selecting the worksheet (first sheet if omitted)
    #[arg(short, long)]
    sheet: Option<String>,

    /// Only list tasks whose customer, batch or style contains this text
    #[arg(long, default_value = "")]
    search: String,

    /// Refresh once and exit
    #[arg(long)]
    once: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: Format,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn config(&self) -> Result<DashboardConfig> {
        let sheet_name_patterns = match &self.sheet {
            Some(sheet) => Some(vec![Pattern::new(sheet).with_context(|| format!("invalid sheet pattern '{sheet}'"))?]),
            None => None,
        };
        Ok(DashboardConfig {
            url: self.url.to_owned(),
            refresh_interval: Duration::from_secs(self.interval.max(1)),
            request_timeout: Duration::from_secs(self.timeout.max(1)),
            criteria: Criteria {
                sheet_name_patterns,
                ..Criteria::default()
            },
        })
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn print_snapshot(snapshot: &Snapshot, query: &str, format: Format) -> Result<()> {
    let matches = search::filter(&snapshot.tasks, query);
    match format {
        Format::Text => {
            println!("{}", render::metrics_panel(snapshot));
            println!("{}", render::timeline_chart(&snapshot.intervals, snapshot.refreshed_at, CHART_WIDTH));
            println!("Task Details ({} of {})", matches.len(), snapshot.tasks.len());
            for task in &matches {
                println!("{}", render::task_details(task));
            }
        }
        Format::Json => {
            let report = serde_json::json!({
                "snapshot": snapshot,
                "search": { "query": query, "tasks": matches },
            });
            println!("{}", serde_json::to_string_pretty(&report).context("failed to serialize snapshot")?);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.config()?;
    let fetcher = HttpFetcher::new(config.request_timeout).context("failed to set up the HTTP client")?;
    let mut context = RefreshContext::new(config);

    loop {
        let now = Local::now().naive_local();
        if context.is_due(now) {
            match run_cycle(&mut context, &fetcher, now) {
                Ok(snapshot) => print_snapshot(&snapshot, &cli.search, cli.format)?,
                Err(error) if cli.once => return Err(error).context("refresh failed"),
                Err(error) => eprintln!("Error: {error}"),
            }
            if cli.once {
                return Ok(());
            }
        }
        std::thread::sleep(POLL_STEP);
    }
}
