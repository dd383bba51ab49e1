//! feed-relay: relays new RSS entries to chat webhooks.
//!
//! ## Architecture overview
//!
//! ```text
//! config ──► poll.rs (Scheduler, once per --interval)
//!              ├─ source/     fetch and parse each feed
//!              ├─ normalize   pick unseen entries, oldest first
//!              ├─ format      one entry → one message
//!              ├─ notify      POST the message to the webhook
//!              └─ history     record the delivered id
//! ```
//!
//! * **`config`**: the JSON list of feed/destination pairs.
//! * **`source/`**: the `FeedFetcher` trait, the HTTP fetcher and feed parsing.
//! * **`normalize`**: which entries of a feed are new.
//! * **`format`**: one entry → one chat message.
//! * **`notify`**: the `Notifier` trait and the webhook implementation.
//! * **`history`**: per-feed record of delivered ids on disk.
//! * **`poll`**: the cycle that ties these together, forever.
//! * **`main`**: parses arguments, sets up logging and starts the loop.

mod config;
mod error;
mod format;
mod history;
mod logging;
mod normalize;
mod notify;
mod poll;
mod source;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use history::FileHistoryStore;
use notify::WebhookNotifier;
use poll::Scheduler;
use source::{HttpFetcher, HttpOptions};

/// Sent with every feed fetch and webhook delivery.
pub const USER_AGENT: &str = concat!("feed-relay/", env!("CARGO_PKG_VERSION"));

/// Poll RSS feeds and post new entries to chat webhooks.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the JSON config file listing feeds and their webhooks
    #[arg(long)]
    config: PathBuf,

    /// Seconds to wait between polling cycles
    #[arg(long, default_value_t = 300, value_parser = clap::value_parser!(u64).range(1..))]
    interval: u64,

    /// Log verbosity
    #[arg(long, default_value = "INFO", value_parser = logging::LEVELS, ignore_case = true)]
    loglevel: String,

    /// Directory holding one delivered-id file per feed
    #[arg(long, default_value = "sent_entries")]
    state_dir: PathBuf,

    /// HTTP timeout in seconds for fetches and deliveries
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,

    /// Do not verify TLS certificates when fetching feeds (insecure)
    #[arg(long)]
    accept_invalid_certs: bool,

    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(&args.loglevel);

    // A bad config at startup is the one failure worth exiting for.
    let configs = config::load_configs(&args.config)
        .with_context(|| format!("cannot start with config {}", args.config.display()))?;
    info!(
        "Loaded {} feed(s) from {}",
        configs.len(),
        args.config.display()
    );

    let options = HttpOptions {
        timeout: Duration::from_secs(args.timeout),
        accept_invalid_certs: args.accept_invalid_certs,
    };
    let fetcher = HttpFetcher::new(&options).context("failed to build feed HTTP client")?;
    let notifier = WebhookNotifier::new(&options).context("failed to build webhook HTTP client")?;
    let history = FileHistoryStore::new(&args.state_dir);

    let scheduler = Scheduler::new(Box::new(fetcher), Box::new(notifier), Box::new(history));

    if args.once {
        let report = scheduler.run_cycle(&configs);
        if report.failed_feeds > 0 {
            bail!("{} of {} feeds failed", report.failed_feeds, report.feeds);
        }
        return Ok(());
    }

    scheduler.run(&args.config, configs, Duration::from_secs(args.interval))
}
