//! Atom (and JSON Feed) parsing through `feed-rs`.
//!
//! Produces the same [`Entry`] values as the RSS parser, in document order.

use feed_rs::model;
use feed_rs::parser::{self, ParseFeedError};
use tracing::warn;

use super::entry::normalize_id;
use super::Entry;

pub(super) fn parse(bytes: &[u8]) -> Result<Vec<Entry>, ParseFeedError> {
    let feed = parser::parse(bytes)?;
    Ok(feed.entries.into_iter().filter_map(convert).collect())
}

fn convert(entry: model::Entry) -> Option<Entry> {
    let link = entry
        .links
        .iter()
        .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
        .or_else(|| entry.links.first())
        .map(|l| l.href.trim().to_string())
        .unwrap_or_default();

    let title = entry
        .title
        .map(|t| t.content)
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| "(untitled)".to_string());

    // Prefer <id>, fall back to the link.
    let id = Some(normalize_id(&entry.id))
        .filter(|id| !id.is_empty())
        .or_else(|| Some(normalize_id(&link)).filter(|id| !id.is_empty()));
    let Some(id) = id else {
        warn!("Skipping entry without id or link: {title:?}");
        return None;
    };

    let author = entry
        .authors
        .iter()
        .map(|p| p.name.trim())
        .find(|name| !name.is_empty())
        .map(String::from);

    Some(Entry {
        id,
        title,
        link,
        published: entry.published.or(entry.updated).map(|d| d.to_rfc3339()),
        author,
    })
}
