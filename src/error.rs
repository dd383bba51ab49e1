//! Error types for every stage of the relay.
//!
//! Each component has its own error so the scheduler can decide what a
//! failure means for the current cycle: a [`FetchError`] skips the feed, a
//! [`NotifyError`] leaves one entry unrecorded, a [`StorageError`] on write
//! stops the feed's batch.  Only a [`ConfigError`] at startup is fatal.

use std::path::PathBuf;

use thiserror::Error;

/// Loading or validating the feed configuration file failed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid feed #{index}: {reason}")]
    Invalid { index: usize, reason: String },
}

/// Retrieving or parsing a feed failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} when fetching {url}")]
    Status { url: String, status: u16 },

    #[error("failed to parse RSS feed: {0}")]
    Parse(#[from] rss::Error),

    #[error("failed to parse feed: {0}")]
    Syndication(#[from] feed_rs::parser::ParseFeedError),
}

/// Delivering one message to a webhook failed.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("webhook request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("webhook answered {status}: {body}")]
    Status { status: u16, body: String },
}

/// Reading or appending delivery history failed.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("cannot read history {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot append to history {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Why processing a single feed/destination pair stopped early.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
