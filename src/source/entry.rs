//! The entry type every feed is reduced to.

/// A single feed entry, as relayed to a destination.
///
/// Entries are never mutated after parsing.  `published` is kept as the
/// raw string the feed carried; turning it into a display date is the
/// formatter's job, so an unparsable date still reaches it intact.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Entry {
    /// Feed-provided unique identifier, used for de-duplication.
    ///
    /// For RSS this is the `<guid>` element and for Atom the `<id>`, each
    /// falling back to the entry's link.
    pub id: String,

    /// Human-readable headline.
    pub title: String,

    /// URL of the full content.  Empty if the feed gave none.
    pub link: String,

    /// Publication date as written in the feed.
    pub published: Option<String>,

    /// Author or creator, if the feed names one.
    pub author: Option<String>,
}

/// History files hold one id per line, so an id must be a single trimmed
/// line to round-trip.
pub(super) fn normalize_id(raw: &str) -> String {
    raw.trim().replace(['\r', '\n'], " ")
}
