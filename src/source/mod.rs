//! Feed retrieval and parsing.
//!
//! This module defines the [`FeedFetcher`] trait and the common [`Entry`]
//! type.  [`HttpFetcher`] is the production fetcher; [`parse_feed`] turns
//! the fetched bytes into entries.
//!
//! ## For contributors: adding a feed format
//!
//! Fetching is format-agnostic: it only returns bytes.  RSS 2.0 goes
//! through the `rss` crate; everything else (Atom, RSS 1.0, JSON Feed) goes
//! through `feed-rs`.  A new parser module must produce `Vec<Entry>` in
//! document order and be dispatched to from [`parse_feed`].

mod atom;
mod entry;
mod http;
mod rss;

pub use self::entry::Entry;
pub use self::http::{HttpFetcher, HttpOptions};

#[cfg(test)]
pub(crate) use entry::tests::make_entry;

use crate::config::Credentials;
use crate::error::FetchError;

/// Retrieves the raw bytes of a feed.
///
/// The scheduler calls [`fetch()`](FeedFetcher::fetch) once per configured
/// pair per cycle.  Ordinary network trouble (timeouts, DNS, non-2xx
/// statuses) must come back as a [`FetchError`], never a panic.
pub trait FeedFetcher {
    fn fetch(&self, url: &str, credentials: Option<&Credentials>) -> Result<Vec<u8>, FetchError>;
}

/// Parse raw feed bytes into entries, newest first as the feed lists them.
pub fn parse_feed(bytes: &[u8]) -> Result<Vec<Entry>, FetchError> {
    match self::rss::parse(bytes) {
        Ok(entries) => Ok(entries),
        // Not an <rss> document at all.
        Err(::rss::Error::InvalidStartTag | ::rss::Error::Eof) => Ok(atom::parse(bytes)?),
        Err(e) => Err(e.into()),
    }
}
