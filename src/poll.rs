//! The poll → dedup → deliver loop.
//!
//! The scheduler alternates between two states forever:
//!
//! * **checking**: every configured pair is processed to completion, in
//!   config order: fetch, pick the unseen entries, then for each of them,
//!   oldest first, format, notify and (only once the webhook accepted it)
//!   record the id.
//! * **idle**: sleep for the configured interval.
//!
//! Nothing one pair does can stop another: fetch, delivery and storage
//! errors are logged and end at most that pair's work for the cycle, and a
//! panic inside a pair is caught here as well.
//!
//! ## For contributors
//!
//! Pairs are processed sequentially.  If you make them concurrent, keep
//! each pair's deliveries strictly one at a time and in order, and give
//! every storage key a single writer.

use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, info_span, warn};

use crate::config::{self, FeedConfig};
use crate::error::RelayError;
use crate::format::Formatter;
use crate::history::HistoryStore;
use crate::normalize::select_new;
use crate::notify::Notifier;
use crate::source::{self, FeedFetcher};

/// What happened to one pair during a cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedReport {
    pub source_name: String,
    /// Unseen entries found in the window.
    pub new: usize,
    /// Entries the webhook accepted and that were recorded.
    pub delivered: usize,
    /// Entries the webhook refused; they stay eligible next cycle.
    pub failed: usize,
}

impl FeedReport {
    pub fn summary(&self) -> String {
        if self.new == 0 {
            format!("No new entries from {}.", self.source_name)
        } else if self.failed == 0 {
            format!("Sent {} new entries from {}.", self.delivered, self.source_name)
        } else {
            format!(
                "Sent {} of {} new entries from {}; {} will be retried.",
                self.delivered, self.new, self.source_name, self.failed
            )
        }
    }
}

/// Totals for one full pass over the configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub feeds: usize,
    /// Pairs whose processing stopped on an error or panic.
    pub failed_feeds: usize,
    pub delivered: usize,
}

pub struct Scheduler {
    fetcher: Box<dyn FeedFetcher>,
    notifier: Box<dyn Notifier>,
    history: Box<dyn HistoryStore>,
}

impl Scheduler {
    pub fn new(
        fetcher: Box<dyn FeedFetcher>,
        notifier: Box<dyn Notifier>,
        history: Box<dyn HistoryStore>,
    ) -> Self {
        Self {
            fetcher,
            notifier,
            history,
        }
    }

    /// Run forever.  The first cycle uses `configs`; every later cycle
    /// re-reads `config_path` so edits take effect without a restart.
    pub fn run(&self, config_path: &Path, configs: Vec<FeedConfig>, interval: Duration) -> ! {
        let mut pending = Some(configs);

        loop {
            self.tick(config_path, &mut pending);
            info!("Waiting {} seconds before next check...", interval.as_secs());
            thread::sleep(interval);
        }
    }

    /// One checking state.  `pending` configs are used once and taken;
    /// without them the file is reloaded.  A reload that fails skips the
    /// cycle and returns `None`.
    pub fn tick(
        &self,
        config_path: &Path,
        pending: &mut Option<Vec<FeedConfig>>,
    ) -> Option<CycleReport> {
        let configs = match pending.take() {
            Some(configs) => configs,
            None => match config::load_configs(config_path) {
                Ok(configs) => configs,
                Err(e) => {
                    error!("Skipping cycle, config reload failed: {e}");
                    return None;
                }
            },
        };

        debug!("Loaded {} feed(s) from {}", configs.len(), config_path.display());
        let report = self.run_cycle(&configs);
        debug!(
            "Cycle finished: {} delivered, {} of {} feed(s) failed",
            report.delivered, report.failed_feeds, report.feeds
        );
        Some(report)
    }

    /// One pass over every pair, in order.
    pub fn run_cycle(&self, configs: &[FeedConfig]) -> CycleReport {
        let mut report = CycleReport {
            feeds: configs.len(),
            ..CycleReport::default()
        };

        for config in configs {
            let _span = info_span!("feed", source = %config.source_name).entered();

            match panic::catch_unwind(AssertUnwindSafe(|| self.check_feed(config))) {
                Ok(Ok(feed)) => {
                    info!("{}", feed.summary());
                    report.delivered += feed.delivered;
                }
                Ok(Err(e)) => {
                    error!("Failed to check feed {}: {e}", config.source_name);
                    report.failed_feeds += 1;
                }
                Err(_) => {
                    error!("Panic while checking feed {}", config.source_name);
                    report.failed_feeds += 1;
                }
            }
        }

        report
    }

    /// Process a single pair.
    pub fn check_feed(&self, config: &FeedConfig) -> Result<FeedReport, RelayError> {
        info!("Checking feed: {}", config.source_name);
        debug!("RSS URL: {}", config.source_rss);

        let key = config.storage_key();
        let credentials = config.credentials();

        let body = self.fetcher.fetch(&config.source_rss, credentials.as_ref())?;
        let entries = source::parse_feed(&body)?;
        debug!("Parsed {} entries", entries.len());

        // An unreadable history risks a repeat, which beats dropping entries.
        let mut sent = match self.history.load(&key) {
            Ok(sent) => sent,
            Err(e) => {
                warn!("Treating history as empty: {e}");
                HashSet::new()
            }
        };

        let new_entries = select_new(&entries, config.last_entries, &sent);
        let formatter = Formatter::for_feed(config);
        let mut report = FeedReport {
            source_name: config.source_name.clone(),
            new: new_entries.len(),
            ..FeedReport::default()
        };

        for entry in &new_entries {
            // A feed may repeat an id inside its window.
            if sent.contains(&entry.id) {
                continue;
            }

            let message = formatter.format(entry, &config.source_name);
            match self.notifier.notify(&config.destination_webhook, &message) {
                Ok(()) => {
                    self.history.record(&key, &entry.id)?;
                    sent.insert(entry.id.clone());
                    report.delivered += 1;
                }
                Err(e) => {
                    error!("Failed to deliver entry {}: {e}", entry.id);
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}
