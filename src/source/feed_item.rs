//! The entry type shared by every feed source.
//!
//! `FeedItem` represents a single entry from a feed.  Source implementations
//! convert their native format into `FeedItem`s so that diffing and message
//! formatting stay source-agnostic.

use chrono::{DateTime, Utc};

/// Title used when a feed entry carries none.
pub const UNTITLED: &str = "No title";

/// A single feed entry, normalised from any data source.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FeedItem {
    /// Stable identifier used for history lookups.  See [`FeedItem::derive_id`].
    pub id: String,

    /// Human-readable headline.
    pub title: String,

    /// URL to the full content.
    pub link: Option<String>,

    /// Publication timestamp, if the feed provided a parseable one.
    pub published: Option<DateTime<Utc>>,

    /// Optional longer description or summary text (may contain HTML).
    pub summary: Option<String>,
}

impl FeedItem {
    /// Build an item, deriving its identifier from the other fields.
    pub fn new(
        title: Option<&str>,
        link: Option<&str>,
        guid: Option<&str>,
        published: Option<DateTime<Utc>>,
        summary: Option<&str>,
    ) -> Self {
        let title = non_blank(title).unwrap_or(UNTITLED).to_string();
        let link = non_blank(link).map(String::from);
        let id = Self::derive_id(&title, link.as_deref(), non_blank(guid), published);

        Self {
            id,
            title,
            link,
            published,
            summary: non_blank(summary).map(String::from),
        }
    }

    /// Compute the identifier for an entry.
    ///
    /// The link wins when present, then the `<guid>`.  Entries with neither
    /// are keyed on `title|timestamp`, so two link-less entries with
    /// different titles never collide.
    pub fn derive_id(
        title: &str,
        link: Option<&str>,
        guid: Option<&str>,
        published: Option<DateTime<Utc>>,
    ) -> String {
        if let Some(link) = link {
            return link.to_string();
        }
        if let Some(guid) = guid {
            return guid.to_string();
        }
        let stamp = published.map(|p| p.to_rfc3339()).unwrap_or_default();
        format!("{title}|{stamp}")
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn id_prefers_link() {
        let item = FeedItem::new(
            Some("Post"),
            Some("https://example.com/a"),
            Some("guid-a"),
            None,
            None,
        );
        assert_eq!(item.id, "https://example.com/a");
    }

    #[test]
    fn id_falls_back_to_guid() {
        let item = FeedItem::new(Some("Post"), None, Some("guid-a"), None, None);
        assert_eq!(item.id, "guid-a");
    }

    #[test]
    fn linkless_entries_with_different_titles_get_different_ids() {
        let a = FeedItem::new(Some("First"), None, None, None, None);
        let b = FeedItem::new(Some("Second"), None, None, None, None);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn linkless_id_includes_timestamp() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let dated = FeedItem::new(Some("Same"), None, None, Some(ts), None);
        let undated = FeedItem::new(Some("Same"), None, None, None, None);

        assert_ne!(dated.id, undated.id);
        assert_eq!(dated.id, "Same|2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn id_is_stable_across_constructions() {
        let ts = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let a = FeedItem::new(Some("T"), None, None, Some(ts), Some("x"));
        let b = FeedItem::new(Some("T"), None, None, Some(ts), Some("y"));
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn blank_fields_are_treated_as_missing() {
        let item = FeedItem::new(Some("  "), Some(""), Some(" "), None, Some(""));
        assert_eq!(item.title, UNTITLED);
        assert!(item.link.is_none());
        assert!(item.summary.is_none());
        assert_eq!(item.id, "No title|");
    }
}
