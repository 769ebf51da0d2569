//! The fixed-interval cycle loop.
//!
//! A cycle reads the feeds file and the history file, polls every feed,
//! delivers new entries, records what was delivered and saves the history.
//! Cycles never overlap: the next one starts `check_interval` after the
//! previous one finished.
//!
//! ## Shutdown
//!
//! SIGINT and SIGTERM handlers are installed before the first cycle.  A
//! signal that arrives during a cycle is picked up when the loop goes to
//! sleep, so a cycle is never cut short between delivery and save.

use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use thiserror::Error;

use crate::config::{self, Config, ConfigError};
use crate::history::{History, HistoryError};
use crate::notify::{self, Notifier};
use crate::poll;
use crate::source::DataSource;

/// Pause between messages for different feeds, to stay well clear of the
/// Bot API's flood limits.
const FEED_PAUSE: Duration = Duration::from_secs(1);

/// Errors that abort a single cycle.  The loop logs them and tries again at
/// the next interval.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    History(#[from] HistoryError),
}

/// Counters for one cycle, logged when it completes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub feeds: usize,
    pub failed_feeds: usize,
    pub new_entries: usize,
    pub delivered_entries: usize,
    pub failed_messages: usize,
    /// Whether the history file was written successfully.
    pub saved: bool,
}

pub struct Scheduler {
    config: Config,
    source: Box<dyn DataSource>,
    notifier: Box<dyn Notifier>,
    feed_pause: Duration,
}

impl Scheduler {
    pub fn new(config: Config, source: Box<dyn DataSource>, notifier: Box<dyn Notifier>) -> Self {
        Self {
            config,
            source,
            notifier,
            feed_pause: FEED_PAUSE,
        }
    }

    pub fn with_feed_pause(mut self, pause: Duration) -> Self {
        self.feed_pause = pause;
        self
    }

    /// Run one poll → diff → notify → persist pass.
    pub fn run_cycle(&self) -> Result<CycleReport, CycleError> {
        let urls = config::load_feeds(&self.config.feeds_file)?;
        let mut history = History::load(&self.config.history_file)?;
        tracing::debug!(path = %history.path().display(), "history loaded");

        let mut report = CycleReport {
            feeds: urls.len(),
            ..CycleReport::default()
        };

        if urls.is_empty() {
            tracing::warn!(
                path = %self.config.feeds_file.display(),
                "no feeds to check, add feeds to the configuration file"
            );
            return Ok(report);
        }
        tracing::info!(feeds = urls.len(), "loaded feeds");

        let outcome = poll::poll_feeds(self.source.as_ref(), &urls, &history);
        report.failed_feeds = outcome.failed;
        report.new_entries = outcome.batches.iter().map(|b| b.items.len()).sum();

        if outcome.batches.is_empty() {
            tracing::info!("no new content to notify");
        }

        for (i, batch) in outcome.batches.iter().enumerate() {
            if i > 0 && !self.feed_pause.is_zero() {
                thread::sleep(self.feed_pause);
            }

            let delivery = notify::deliver_batch(
                self.notifier.as_ref(),
                batch,
                self.config.include_description,
            );
            report.delivered_entries += delivery.delivered.len();
            report.failed_messages += delivery.failed_messages;
            history.record(&batch.url, delivery.delivered);
        }

        match history.save() {
            Ok(()) => report.saved = true,
            Err(e) => tracing::error!(
                "{e}; entries from this cycle may be notified again"
            ),
        }

        Ok(report)
    }

    /// Announce startup, then run cycles until SIGINT/SIGTERM.
    pub fn run(&self) -> Result<()> {
        let mut shutdown = Shutdown::install().context("failed to install signal handlers")?;

        if let Err(e) = self.notifier.send(&notify::startup_message()) {
            tracing::error!("error sending startup message: {e}");
        }

        loop {
            match self.run_cycle() {
                Ok(report) => tracing::info!(
                    feeds = report.feeds,
                    failed_feeds = report.failed_feeds,
                    new = report.new_entries,
                    delivered = report.delivered_entries,
                    failed_messages = report.failed_messages,
                    saved = report.saved,
                    "cycle complete"
                ),
                Err(e) => tracing::error!("cycle aborted: {e}"),
            }

            tracing::info!("next check in {} seconds", self.config.check_interval.as_secs());
            if shutdown.sleep(self.config.check_interval) {
                tracing::info!("shutdown signal received, exiting");
                return Ok(());
            }
        }
    }
}

/// Races the inter-cycle sleep against process signals.
struct Shutdown {
    runtime: tokio::runtime::Runtime,
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
}

impl Shutdown {
    #[cfg(unix)]
    fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        let runtime = Self::runtime()?;
        let (interrupt, terminate) = {
            let _guard = runtime.enter();
            (signal(SignalKind::interrupt())?, signal(SignalKind::terminate())?)
        };
        Ok(Self {
            runtime,
            interrupt,
            terminate,
        })
    }

    #[cfg(not(unix))]
    fn install() -> std::io::Result<Self> {
        Ok(Self {
            runtime: Self::runtime()?,
        })
    }

    fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
    }

    /// Sleep for `interval`.  Returns `true` if a shutdown signal came first.
    #[cfg(unix)]
    fn sleep(&mut self, interval: Duration) -> bool {
        let Self {
            runtime,
            interrupt,
            terminate,
        } = self;
        runtime.block_on(async {
            tokio::select! {
                _ = tokio::time::sleep(interval) => false,
                _ = interrupt.recv() => true,
                _ = terminate.recv() => true,
            }
        })
    }

    #[cfg(not(unix))]
    fn sleep(&mut self, interval: Duration) -> bool {
        self.runtime.block_on(async {
            tokio::select! {
                _ = tokio::time::sleep(interval) => false,
                _ = tokio::signal::ctrl_c() => true,
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
