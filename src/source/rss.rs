//! RSS 2.0 parsing.
//!
//! Converts a fetched document into [`Entry`] values in the order the feed
//! lists them (newest first, by syndication convention).

use ::rss::Channel;
use tracing::warn;

use super::entry::normalize_id;
use super::Entry;

/// Read an `<rss>` document.  Anything else, including Atom, is an error
/// here; the caller decides whether to try another format.
pub(super) fn parse(bytes: &[u8]) -> Result<Vec<Entry>, ::rss::Error> {
    let channel = Channel::read_from(bytes)?;
    Ok(parse_channel(&channel))
}

/// Convert an already-parsed channel.  Items without any usable identifier
/// are dropped, since they could never be de-duplicated.
fn parse_channel(channel: &Channel) -> Vec<Entry> {
    channel
        .items()
        .iter()
        .filter_map(|item| {
            // Prefer <guid>, fall back to <link>.
            let id = item
                .guid()
                .map(|g| normalize_id(g.value()))
                .filter(|id| !id.is_empty())
                .or_else(|| item.link().map(normalize_id).filter(|id| !id.is_empty()));

            let Some(id) = id else {
                warn!(
                    "Skipping entry without guid or link: {:?}",
                    item.title().unwrap_or("(untitled)")
                );
                return None;
            };

            let author = item
                .author()
                .map(String::from)
                .or_else(|| {
                    item.dublin_core_ext()
                        .and_then(|dc| dc.creators().first().cloned())
                })
                .filter(|a| !a.trim().is_empty());

            Some(Entry {
                id,
                title: item.title().unwrap_or("(untitled)").to_string(),
                link: item.link().unwrap_or_default().to_string(),
                published: item.pub_date().map(String::from),
                author,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_items_in_feed_order() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test Feed</title>
    <item>
      <title>Second Post</title>
      <link>https://example.com/2</link>
      <guid>guid-2</guid>
      <pubDate>Tue, 02 Jan 2024 12:00:00 +0000</pubDate>
      <author>writer@example.com</author>
    </item>
    <item>
      <title>First Post</title>
      <link>https://example.com/1</link>
      <guid>guid-1</guid>
    </item>
  </channel>
</rss>"#;

        let entries = parse(xml.as_bytes()).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "guid-2");
        assert_eq!(entries[0].title, "Second Post");
        assert_eq!(entries[0].link, "https://example.com/2");
        assert_eq!(
            entries[0].published.as_deref(),
            Some("Tue, 02 Jan 2024 12:00:00 +0000")
        );
        assert_eq!(entries[0].author.as_deref(), Some("writer@example.com"));

        assert_eq!(entries[1].id, "guid-1");
        assert!(entries[1].published.is_none());
        assert!(entries[1].author.is_none());
    }

    #[test]
    fn link_stands_in_for_missing_guid() {
        // Release feeds often give only the newest item a guid.
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>feed-relay releases</title>
    <item>
      <title>feed-relay 0.2.0</title>
      <link>
        https://crates.io/crates/feed-relay/0.2.0
      </link>
      <pubDate>Fri, 05 Apr 2024 09:30:00 +0000</pubDate>
    </item>
    <item>
      <title>feed-relay 0.1.0</title>
      <guid isPermaLink="false">crate:feed-relay:0.1.0</guid>
      <link>https://crates.io/crates/feed-relay/0.1.0</link>
    </item>
  </channel>
</rss>"#;

        let entries = parse(xml.as_bytes()).unwrap();

        let ids: Vec<_> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(
            ids,
            ["https://crates.io/crates/feed-relay/0.2.0", "crate:feed-relay:0.1.0"]
        );
        assert_eq!(entries[1].link, "https://crates.io/crates/feed-relay/0.1.0");
    }

    #[test]
    fn skips_items_without_identity() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test</title>
    <item><title>Nameless</title></item>
    <item><guid>   </guid><title>Blank guid</title></item>
    <item><guid>kept</guid></item>
  </channel>
</rss>"#;

        let entries = parse(xml.as_bytes()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "kept");
        assert_eq!(entries[0].title, "(untitled)");
        assert_eq!(entries[0].link, "");
    }

    #[test]
    fn uses_dublin_core_creator_as_author() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <channel>
    <title>Nitter</title>
    <item>
      <title>hello</title>
      <dc:creator>@rustlang</dc:creator>
      <guid>https://nitter.example/rustlang/status/123#m</guid>
      <link>https://nitter.example/rustlang/status/123#m</link>
    </item>
  </channel>
</rss>"#;

        let entries = parse(xml.as_bytes()).unwrap();
        assert_eq!(entries[0].author.as_deref(), Some("@rustlang"));
    }

    #[test]
    fn atom_document_is_not_rss() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>t</title></feed>"#;
        assert!(matches!(
            parse(xml.as_bytes()),
            Err(::rss::Error::InvalidStartTag)
        ));
    }
}
