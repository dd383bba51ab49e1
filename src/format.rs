//! Rendering one entry into a chat message.
//!
//! Feed text is passed through as-is unless `escape_markdown` is set for
//! the feed, in which case Markdown control characters in the title,
//! author and source name are backslash-escaped.  Links are never escaped.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::config::FeedConfig;
use crate::source::Entry;

/// Shown when an entry has no date, or one we cannot read.
pub const UNKNOWN_DATE: &str = "Unknown Date";

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Characters with meaning in chat Markdown.
const MARKDOWN_SPECIAL: &[char] = &['\\', '*', '_', '~', '`', '|', '>', '[', ']', '#'];

/// Message layout, chosen per feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStyle {
    /// Banner naming the source, then date, title and link lines.
    #[default]
    Digest,
    /// One line: `📢 @author posted new [entry](link) on date`.
    Author,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Formatter {
    pub style: MessageStyle,
    pub escape_markdown: bool,
}

impl Formatter {
    pub fn for_feed(config: &FeedConfig) -> Self {
        Self {
            style: config.message_style,
            escape_markdown: config.escape_markdown,
        }
    }

    pub fn format(&self, entry: &Entry, source_name: &str) -> String {
        let date = display_date(entry.published.as_deref());
        let link = entry_link(entry);

        match self.style {
            MessageStyle::Digest => format!(
                "📢 New entry from {}\n📅 {}\n📝 {}\n🔗 {}",
                self.text(source_name),
                date,
                self.text(&entry.title),
                link,
            ),
            MessageStyle::Author => {
                let author = entry
                    .author
                    .as_deref()
                    .unwrap_or(source_name)
                    .trim()
                    .trim_start_matches('@');
                format!(
                    "📢 @{} posted new [entry]({}) on {}",
                    self.text(author),
                    link,
                    date
                )
            }
        }
    }

    fn text(&self, raw: &str) -> String {
        if self.escape_markdown {
            escape_markdown(raw)
        } else {
            raw.to_string()
        }
    }
}

/// The entry's link, or its id when the feed gave no link but the id is
/// itself a URL (RSS permalink guids).
fn entry_link(entry: &Entry) -> &str {
    if entry.link.is_empty() && entry.id.starts_with("http") {
        &entry.id
    } else {
        &entry.link
    }
}

/// Render a feed date as `YYYY-MM-DD HH:MM` UTC.
///
/// RSS dates are RFC 2822, Atom-style ones RFC 3339; anything else is
/// [`UNKNOWN_DATE`].
pub fn display_date(published: Option<&str>) -> String {
    published
        .map(str::trim)
        .and_then(|raw| {
            DateTime::parse_from_rfc2822(raw)
                .or_else(|_| DateTime::parse_from_rfc3339(raw))
                .ok()
        })
        .map(|dt| dt.with_timezone(&Utc).format(DATE_FORMAT).to_string())
        .unwrap_or_else(|| UNKNOWN_DATE.to_string())
}

pub fn escape_markdown(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if MARKDOWN_SPECIAL.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
