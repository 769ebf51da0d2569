//! Poll-and-diff pass over the configured feeds.
//!
//! Feeds are fetched one after another on the calling thread.  A feed that
//! fails to fetch or parse is logged and skipped; it never aborts the pass.
//! Entries already present in [`History`] are filtered out, leaving one
//! [`FeedBatch`] per feed that has something new.

use std::collections::HashSet;

use crate::history::History;
use crate::source::{DataSource, FeedItem};

/// New entries of one feed, in the order the feed listed them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedBatch {
    /// The configured feed URL (the history key).
    pub url: String,
    /// Display name used in the message header.
    pub title: String,
    pub items: Vec<FeedItem>,
}

/// Result of one poll pass.
#[derive(Debug, Default)]
pub struct PollOutcome {
    pub batches: Vec<FeedBatch>,
    /// Number of feeds that could not be fetched.
    pub failed: usize,
}

/// Fetch every URL in `urls` and keep the entries `history` has not seen.
pub fn poll_feeds(source: &dyn DataSource, urls: &[String], history: &History) -> PollOutcome {
    let mut outcome = PollOutcome::default();

    for url in urls {
        tracing::info!(feed = %url, "checking feed");

        let feed = match source.fetch(url) {
            Ok(feed) => feed,
            Err(e) => {
                tracing::error!(feed = %url, "error checking feed: {e:#}");
                outcome.failed += 1;
                continue;
            }
        };

        if feed.items.is_empty() {
            tracing::warn!(feed = %url, "no entries found in feed");
            continue;
        }

        let total = feed.items.len();
        let items = new_items(url, feed.items, history);
        tracing::info!(feed = %url, total, new = items.len(), "feed checked");

        if !items.is_empty() {
            outcome.batches.push(FeedBatch {
                url: url.clone(),
                title: feed.title,
                items,
            });
        }
    }

    outcome
}

/// Drop entries recorded in history and repeats within the same fetch.
fn new_items(url: &str, items: Vec<FeedItem>, history: &History) -> Vec<FeedItem> {
    let mut seen_now = HashSet::new();
    items
        .into_iter()
        .filter(|item| !history.contains(url, &item.id))
        .filter(|item| seen_now.insert(item.id.clone()))
        .collect()
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::testing::{linked, StaticSource};
    use super::*;

    const A: &str = "https://a.example/rss";
    const B: &str = "https://b.example/rss";

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_history_treats_everything_as_new() {
        let source = StaticSource::default().with_feed(A, "Feed A", vec![linked(1), linked(2)]);
        let history = History::empty("unused.json");

        let outcome = poll_feeds(&source, &urls(&[A]), &history);

        assert_eq!(outcome.batches.len(), 1);
        assert_eq!(outcome.batches[0].title, "Feed A");
        assert_eq!(outcome.batches[0].items.len(), 2);
    }

    #[test]
    fn known_entries_are_filtered_and_order_is_kept() {
        let source = StaticSource::default()
            .with_feed(A, "A", vec![linked(3), linked(2), linked(1)]);
        let mut history = History::empty("unused.json");
        history.record(A, [linked(2).id]);

        let outcome = poll_feeds(&source, &urls(&[A]), &history);
        let ids: Vec<_> = outcome.batches[0].items.iter().map(|i| i.id.as_str()).collect();

        assert_eq!(ids, vec!["https://example.com/3", "https://example.com/1"]);
    }

    #[test]
    fn rerun_over_recorded_entries_is_empty() {
        let source = StaticSource::default().with_feed(A, "A", vec![linked(1), linked(2)]);
        let mut history = History::empty("unused.json");

        let first = poll_feeds(&source, &urls(&[A]), &history);
        for batch in &first.batches {
            history.record(&batch.url, batch.items.iter().map(|i| i.id.clone()));
        }

        let second = poll_feeds(&source, &urls(&[A]), &history);
        assert!(second.batches.is_empty());
    }

    #[test]
    fn history_is_per_feed() {
        let source = StaticSource::default()
            .with_feed(A, "A", vec![linked(1)])
            .with_feed(B, "B", vec![linked(1)]);
        let mut history = History::empty("unused.json");
        history.record(A, [linked(1).id]);

        let outcome = poll_feeds(&source, &urls(&[A, B]), &history);

        assert_eq!(outcome.batches.len(), 1);
        assert_eq!(outcome.batches[0].url, B);
    }

    #[test]
    fn failing_feed_does_not_abort_the_pass() {
        let source = StaticSource::default().with_feed(B, "B", vec![linked(1)]);
        let history = History::empty("unused.json");

        let outcome = poll_feeds(&source, &urls(&["https://down.example/rss", B]), &history);

        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.batches.len(), 1);
        assert_eq!(outcome.batches[0].url, B);
    }

    #[test]
    fn duplicates_within_one_fetch_are_collapsed() {
        let source = StaticSource::default().with_feed(A, "A", vec![linked(1), linked(1)]);
        let history = History::empty("unused.json");

        let outcome = poll_feeds(&source, &urls(&[A]), &history);
        assert_eq!(outcome.batches[0].items.len(), 1);
    }

    #[test]
    fn empty_feed_produces_no_batch() {
        let source = StaticSource::default().with_feed(A, "A", vec![]);
        let history = History::empty("unused.json");

        let outcome = poll_feeds(&source, &urls(&[A]), &history);
        assert!(outcome.batches.is_empty());
        assert_eq!(outcome.failed, 0);
    }
}
