//! Load orchestration: one cycle is fetch -> parse -> transform, run either
//! once or on a fixed timer, with results delivered over a channel to the
//! single consumer that owns the current row set.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Local};
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::{
    data::{Cell, Row, Table},
    error::LoadError,
    parse::parse_rows,
    source::CsvSource,
    transform::{ColumnPolicy, Transformer},
};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load data. Please try again later.";

/// Result of one cycle, as seen by the consumer.
#[derive(Debug)]
pub enum LoadEvent {
    Loaded(Table<Cell>),
    Failed(LoadError),
}

/// Source plus validated transform.
pub struct Pipeline {
    source: Arc<dyn CsvSource>,
    transformer: Transformer,
}

impl Pipeline {
    pub fn new(source: Arc<dyn CsvSource>, policy: ColumnPolicy) -> Result<Self, LoadError> {
        Ok(Self {
            source,
            transformer: Transformer::new(policy)?,
        })
    }

    pub fn describe(&self) -> String {
        self.source.describe()
    }

    pub async fn run_cycle(&self) -> Result<Table<Cell>, LoadError> {
        let started = Instant::now();
        let text = self.source.fetch().await?;
        let raw = parse_rows(&text)?;
        let table = self.transformer.apply_table(&raw);
        info!(
            source = %self.source.describe(),
            rows = table.len(),
            columns = table.headers.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "load cycle finished"
        );
        Ok(table)
    }

    async fn cycle_event(&self) -> LoadEvent {
        match self.run_cycle().await {
            Ok(table) => LoadEvent::Loaded(table),
            Err(err) => {
                warn!(source = %self.source.describe(), error = %err, "load cycle failed");
                LoadEvent::Failed(err)
            }
        }
    }
}

/// Run a single cycle in the background. A closed receiver simply drops
/// the result.
pub fn spawn_once(pipeline: Arc<Pipeline>, tx: mpsc::UnboundedSender<LoadEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let event = pipeline.cycle_event().await;
        if tx.send(event).is_err() {
            debug!("consumer gone, discarding single-shot result");
        }
    })
}

/// Owns the polling timer. Cycles run one after another inside the task and
/// ticks that elapse during a slow cycle are skipped, so cycles never
/// overlap. Stopping (explicitly or on drop) cancels the timer once; a cycle
/// already in flight finishes and its result is thrown away.
pub struct Poller {
    stop_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl Poller {
    pub fn spawn(
        pipeline: Arc<Pipeline>,
        period: Duration,
        tx: mpsc::UnboundedSender<LoadEvent>,
    ) -> Self {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    biased;
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {}
                }
                let event = pipeline.cycle_event().await;
                if !matches!(stop_rx.try_recv(), Err(oneshot::error::TryRecvError::Empty)) {
                    debug!("poller stopped during a cycle, discarding result");
                    break;
                }
                if tx.send(event).is_err() {
                    debug!("consumer gone, poller exiting");
                    break;
                }
            }
        });
        info!(period_secs = period.as_secs(), "polling started");
        Self {
            stop_tx: Some(stop_tx),
            task,
        }
    }

    /// Cancel the timer. Returns `true` only for the call that actually
    /// cancelled it.
    pub fn stop(&mut self) -> bool {
        match self.stop_tx.take() {
            Some(stop_tx) => {
                let _ = stop_tx.send(());
                info!("polling stopped");
                true
            }
            None => false,
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stop_tx.is_none()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    Once,
    Polling(Duration),
}

/// The consumer's copy of the current row set plus load status.
#[derive(Debug)]
pub struct LoadState {
    mode: LoadMode,
    table: Table<Cell>,
    loading: bool,
    error: Option<String>,
    stale: Option<String>,
    last_loaded: Option<DateTime<Local>>,
    cycles: usize,
}

impl LoadState {
    /// Starts in the loading state: the first cycle is assumed to be under way.
    pub fn new(mode: LoadMode) -> Self {
        Self {
            mode,
            table: Table::default(),
            loading: true,
            error: None,
            stale: None,
            last_loaded: None,
            cycles: 0,
        }
    }

    /// A user-triggered reload in single-shot mode.
    pub fn begin(&mut self) {
        self.loading = true;
        self.error = None;
    }

    pub fn apply(&mut self, event: LoadEvent) {
        self.cycles += 1;
        self.loading = false;
        match event {
            LoadEvent::Loaded(table) => {
                self.table = table;
                self.error = None;
                self.stale = None;
                self.last_loaded = Some(Local::now());
            }
            LoadEvent::Failed(_) => match self.mode {
                LoadMode::Once => self.error = Some(LOAD_FAILED_MESSAGE.to_string()),
                // The cause is already logged by the cycle; users only see
                // that the refresh failed.
                LoadMode::Polling(_) => {
                    let since = self
                        .last_loaded
                        .map(|t| format!(" Showing data from {}.", t.format("%H:%M:%S")))
                        .unwrap_or_default();
                    self.stale = Some(format!("{LOAD_FAILED_MESSAGE}{since}"));
                }
            },
        }
    }

    pub fn mode(&self) -> LoadMode {
        self.mode
    }

    pub fn rows(&self) -> &[Row] {
        &self.table.rows
    }

    pub fn headers(&self) -> &[String] {
        &self.table.headers
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn stale(&self) -> Option<&str> {
        self.stale.as_deref()
    }

    pub fn last_loaded(&self) -> Option<DateTime<Local>> {
        self.last_loaded
    }

    pub fn cycles(&self) -> usize {
        self.cycles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ParseError, TransportError};

    fn loaded(names: &[&str]) -> LoadEvent {
        LoadEvent::Loaded(Table {
            headers: vec!["Name".into()],
            rows: names
                .iter()
                .map(|n| [("Name", Cell::from(*n))].into_iter().collect())
                .collect(),
        })
    }

    fn not_found() -> LoadEvent {
        LoadEvent::Failed(LoadError::Transport(TransportError::Status {
            status: reqwest::StatusCode::NOT_FOUND,
        }))
    }

    #[test]
    fn single_shot_failure_sets_error_and_keeps_rows_empty() {
        let mut state = LoadState::new(LoadMode::Once);
        assert!(state.is_loading());
        state.apply(not_found());
        assert!(!state.is_loading());
        assert_eq!(state.error(), Some(LOAD_FAILED_MESSAGE));
        assert!(state.rows().is_empty());
    }

    #[test]
    fn retry_clears_error_until_result() {
        let mut state = LoadState::new(LoadMode::Once);
        state.apply(LoadEvent::Failed(LoadError::Parse(
            ParseError::UnterminatedQuote { line: 2 },
        )));
        state.begin();
        assert!(state.is_loading());
        assert!(state.error().is_none());
        state.apply(loaded(&["Ann"]));
        assert_eq!(state.rows().len(), 1);
        assert!(state.last_loaded().is_some());
    }

    #[test]
    fn polling_failure_keeps_last_good_rows() {
        let mut state = LoadState::new(LoadMode::Polling(DEFAULT_POLL_INTERVAL));
        state.apply(loaded(&["Ann", "Bob"]));
        state.apply(not_found());
        assert!(!state.is_loading());
        assert!(state.error().is_none());
        let stale = state.stale().unwrap();
        assert!(stale.starts_with(LOAD_FAILED_MESSAGE));
        assert!(!stale.contains("404"));

        state.apply(LoadEvent::Failed(LoadError::Parse(
            ParseError::UnterminatedQuote { line: 7 },
        )));
        assert!(!state.stale().unwrap().contains("line 7"));
        assert_eq!(state.rows().len(), 2);

        state.apply(loaded(&["Cy"]));
        assert!(state.stale().is_none());
        assert_eq!(state.rows().len(), 1);
        assert_eq!(state.cycles(), 4);
    }
}
