//! RSS feed source implementation.
//!
//! Fetches a feed over HTTP with a blocking [`reqwest`] client.  RSS 2.0 is
//! parsed with the [`rss`] crate; documents it rejects (Atom, RSS 1.0/RDF)
//! are handed to [`feed_rs`].  Parsing is split out into
//! [`RssSource::parse_document`] so tests can exercise it without the network.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use reqwest::blocking::Client;

use super::{DataSource, Feed, FeedItem};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Per-request ceiling.  A hanging feed delays the cycle by at most this much.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// A syndication-feed data source backed by a shared HTTP client.
pub struct RssSource {
    client: Client,
}

impl RssSource {
    /// Create a new RSS source with its own HTTP client.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(FETCH_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client })
    }

    /// Parse a fetched document into a [`Feed`].
    pub fn parse_document(body: &[u8], url: &str) -> Result<Feed> {
        match rss::Channel::read_from(body) {
            Ok(channel) => Ok(Self::parse_channel(&channel, url)),
            Err(rss_err) => {
                let feed = feed_rs::parser::parse(body)
                    .map_err(|e| anyhow!("{url} is neither RSS ({rss_err}) nor Atom ({e})"))?;
                Ok(Self::parse_syndication(feed, url))
            }
        }
    }

    /// Convert a [`feed_rs`] feed.  The entry `<id>` plays the role of the
    /// RSS `<guid>` and the first `<link>` is the entry link.
    pub fn parse_syndication(feed: feed_rs::model::Feed, url: &str) -> Feed {
        let items = feed
            .entries
            .into_iter()
            .map(|entry| {
                let summary = entry
                    .summary
                    .map(|s| s.content)
                    .or_else(|| entry.content.and_then(|c| c.body));

                FeedItem::new(
                    entry.title.as_ref().map(|t| t.content.as_str()),
                    entry.links.first().map(|l| l.href.as_str()),
                    Some(entry.id.as_str()),
                    entry.published.or(entry.updated),
                    summary.as_deref(),
                )
            })
            .collect();

        let title = feed
            .title
            .map(|t| t.content.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| url.to_string());
        Feed { title, items }
    }

    /// Parse an already-fetched [`rss::Channel`] into a [`Feed`].
    ///
    /// This is a pure function (no I/O).  `url` only serves as the title
    /// fallback.
    pub fn parse_channel(channel: &rss::Channel, url: &str) -> Feed {
        let items = channel
            .items()
            .iter()
            .map(|item| {
                // Parse RFC-2822 date; gracefully degrade to None on failure.
                let published = item
                    .pub_date()
                    .and_then(|d| DateTime::parse_from_rfc2822(d.trim()).ok())
                    .map(|dt| dt.with_timezone(&Utc));

                let summary = item.description().or_else(|| item.content());

                FeedItem::new(
                    item.title(),
                    item.link(),
                    item.guid().map(|g| g.value()),
                    published,
                    summary,
                )
            })
            .collect();

        let title = channel.title().trim();
        Feed {
            title: (if title.is_empty() { url } else { title }).to_string(),
            items,
        }
    }
}

impl DataSource for RssSource {
    fn fetch(&self, url: &str) -> Result<Feed> {
        let body = self
            .client
            .get(url)
            .send()?
            .error_for_status()?
            .bytes()?;
        Self::parse_document(body.as_ref(), url)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
