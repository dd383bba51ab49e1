//! Picking which entries of a fetched feed still need delivering.

use std::collections::HashSet;

use crate::source::Entry;

/// Take the newest `last_n` entries (feeds list newest first), put them in
/// chronological order and drop every id already in `already_sent`.
///
/// The result is oldest-first so deliveries arrive in the order they were
/// published.  A feed shorter than `last_n` is used whole.
pub fn select_new(entries: &[Entry], last_n: usize, already_sent: &HashSet<String>) -> Vec<Entry> {
    entries
        .iter()
        .take(last_n)
        .rev()
        .filter(|entry| !already_sent.contains(&entry.id))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::make_entry;

    fn ids(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.id.as_str()).collect()
    }

    fn feed(ids: &[&str]) -> Vec<Entry> {
        ids.iter().map(|id| make_entry(id)).collect()
    }

    #[test]
    fn reverses_to_oldest_first() {
        let entries = feed(&["e1", "e2", "e3", "e4", "e5"]);
        let picked = select_new(&entries, 5, &HashSet::new());
        assert_eq!(ids(&picked), ["e5", "e4", "e3", "e2", "e1"]);
    }

    #[test]
    fn only_looks_at_newest_window() {
        let entries = feed(&["e1", "e2", "e3", "e4", "e5", "e6", "e7"]);
        let picked = select_new(&entries, 3, &HashSet::new());
        assert_eq!(ids(&picked), ["e3", "e2", "e1"]);
    }

    #[test]
    fn short_feed_uses_everything() {
        let entries = feed(&["a", "b"]);
        let picked = select_new(&entries, 5, &HashSet::new());
        assert_eq!(ids(&picked), ["b", "a"]);
    }

    #[test]
    fn drops_already_sent_keeping_order() {
        let entries = feed(&["e1", "e2", "e3", "e4", "e5"]);
        let sent = HashSet::from(["e2".to_string(), "e4".to_string()]);
        let picked = select_new(&entries, 5, &sent);
        assert_eq!(ids(&picked), ["e5", "e3", "e1"]);
    }

    #[test]
    fn everything_sent_yields_nothing() {
        let entries = feed(&["x", "y"]);
        let sent = HashSet::from(["x".to_string(), "y".to_string()]);
        assert!(select_new(&entries, 5, &sent).is_empty());
    }

    #[test]
    fn empty_feed_yields_nothing() {
        assert!(select_new(&[], 5, &HashSet::new()).is_empty());
    }

    #[test]
    fn sent_ids_outside_window_do_not_matter() {
        // e1 fell out of the window; the new e0 must still be picked.
        let entries = feed(&["e0", "e1"]);
        let sent = HashSet::from(["e1".to_string()]);
        let picked = select_new(&entries, 1, &sent);
        assert_eq!(ids(&picked), ["e0"]);
    }
}
