use anyhow::{Context, Result, bail};
use clap::Parser;
use ratatui::crossterm::style::Stylize;
use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};
use url::Url;

use crate::{
    source::{CsvSource, DEFAULT_EXPORT_URL, FileSource, HttpSource},
    transform::ColumnPolicy,
    view::{SortConfig, SortOrder},
};

#[derive(Debug, Parser, Clone)]
#[command(version, about = "Searchable, sortable dashboard for a published spreadsheet export")]
pub struct Args {
    /// CSV export URL to fetch
    #[arg(short, long)]
    pub url: Option<String>,

    /// Read a local .csv or .csv.gz instead of fetching
    #[arg(short, long, conflicts_with = "url")]
    pub file: Option<PathBuf>,

    /// Refetch on a fixed interval instead of loading once
    #[arg(short, long)]
    pub poll: bool,

    /// Polling interval in seconds
    #[arg(long, default_value_t = 30)]
    pub interval: u64,

    /// JSON file with per-column actions (passthrough, drop, linkify, format)
    #[arg(short, long)]
    pub columns: Option<PathBuf>,

    /// Column to sort by initially
    #[arg(short, long, default_value = "Timestamp")]
    pub sort: String,

    /// Start unsorted
    #[arg(long, conflicts_with = "sort")]
    pub no_sort: bool,

    /// Sort ascending initially (default is descending, newest first)
    #[arg(long)]
    pub ascending: bool,

    /// Show every row instead of pages of ten
    #[arg(long)]
    pub no_pages: bool,

    /// Serve GET /api/csv on this address instead of starting the dashboard
    #[arg(long, value_name = "ADDR")]
    pub relay: Option<SocketAddr>,

    /// Load once and print the visible rows as JSON
    #[arg(long)]
    pub dump: bool,

    /// Search term for --dump
    #[arg(long, requires = "dump")]
    pub search: Option<String>,

    /// Page to print with --dump (1-based)
    #[arg(long, requires = "dump")]
    pub page: Option<usize>,

    /// Log file used while the dashboard runs
    #[arg(long, default_value = "sheetdash.log")]
    pub log_file: PathBuf,
}

/// What the binary should do, after validation.
pub enum Command {
    Dashboard,
    Relay(SocketAddr),
    Dump,
}

impl Args {
    pub fn command(&self) -> Result<Command> {
        match (self.relay, self.dump) {
            (Some(_), true) => bail!(
                "{} Cannot use both --relay and --dump. Choose one.",
                "[PROHIBITED]".red().bold()
            ),
            (Some(addr), false) => {
                if self.file.is_some() {
                    bail!(
                        "{} --relay forwards a remote export; it cannot serve --file",
                        "[ERROR]".red().bold()
                    );
                }
                Ok(Command::Relay(addr))
            }
            (None, true) => Ok(Command::Dump),
            (None, false) => Ok(Command::Dashboard),
        }
    }

    pub fn poll_interval(&self) -> Result<Option<Duration>> {
        if !self.poll {
            return Ok(None);
        }
        if self.interval == 0 {
            bail!("{} --interval must be at least 1 second", "[ERROR]".red().bold());
        }
        Ok(Some(Duration::from_secs(self.interval)))
    }

    pub fn source(&self) -> Result<Arc<dyn CsvSource>> {
        if let Some(path) = &self.file {
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("")
                .to_lowercase();
            if !(name.ends_with(".csv") || name.ends_with(".csv.gz")) {
                bail!(
                    "{} --file must be a .csv or .csv.gz file (found {})",
                    "[ERROR]".red().bold(),
                    path.display()
                );
            }
            return Ok(Arc::new(FileSource::new(path)));
        }

        let raw = self.url.as_deref().unwrap_or(DEFAULT_EXPORT_URL);
        let url = Url::parse(raw).with_context(|| format!("Invalid --url {raw}"))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!(
                "{} --url must be http or https (found {})",
                "[ERROR]".red().bold(),
                url.scheme()
            );
        }
        Ok(Arc::new(HttpSource::new(url)?))
    }

    pub fn policy(&self) -> Result<ColumnPolicy> {
        match &self.columns {
            Some(path) => ColumnPolicy::from_json_file(path),
            None => Ok(ColumnPolicy::dashboard()),
        }
    }

    pub fn sort_config(&self) -> SortConfig {
        if self.no_sort {
            return SortConfig::none();
        }
        let order = if self.ascending {
            SortOrder::Ascending
        } else {
            SortOrder::Descending
        };
        SortConfig::by(self.sort.clone(), order)
    }

    pub fn paginate(&self) -> bool {
        !self.no_pages
    }
}
