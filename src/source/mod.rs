//! Feed fetching abstraction.
//!
//! This module defines the [`DataSource`] trait, the [`Feed`] it returns and
//! the common [`FeedItem`] type.  Concrete implementations live in
//! sub-modules (currently only [`rss`]).
//!
//! ## For contributors — adding a new source
//!
//! 1. Create a new file in this directory (e.g. `atom.rs`).
//! 2. Define a struct and implement [`DataSource`] for it.
//! 3. Add `mod atom;` below and re-export your struct.
//! 4. Construct it in `main.rs` instead of (or alongside) [`RssSource`].
//!
//! The poll engine, history and notifier never look past this trait.

mod feed_item;
mod rss;

pub use feed_item::FeedItem;
pub use rss::RssSource;

use anyhow::Result;

/// The result of fetching one feed URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feed {
    /// Display name of the feed.  Falls back to the URL when the feed has no
    /// title of its own.
    pub title: String,
    /// Entries in document order.
    pub items: Vec<FeedItem>,
}

/// Trait that every feed fetcher must implement.
///
/// The poll engine calls [`fetch()`](DataSource::fetch) once per configured
/// URL per cycle.  A returned error only affects that URL.
pub trait DataSource {
    /// Fetch and parse the feed at `url`.
    fn fetch(&self, url: &str) -> Result<Feed>;
}
