//! Durable record of which entries have already been notified.
//!
//! The file is a JSON object mapping each feed URL to an array of entry
//! identifiers.  Identifiers are only ever added; [`History::save`] rewrites
//! the whole file atomically (temp file + rename) so a crash mid-write never
//! leaves a truncated history behind.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("cannot read history file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("history file {} is not valid JSON: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot write history file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// In-memory view of the history file.
#[derive(Debug)]
pub struct History {
    path: PathBuf,
    seen: HashMap<String, HashSet<String>>,
}

impl History {
    /// An empty history that will be saved to `path`.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            seen: HashMap::new(),
        }
    }

    /// Load the history stored at `path`.
    ///
    /// A missing file is a first run and yields an empty history.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, HistoryError> {
        let path = path.into();
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no history file yet, starting fresh");
                return Ok(Self::empty(path));
            }
            Err(source) => return Err(HistoryError::Read { path, source }),
        };

        let stored: HashMap<String, Vec<String>> = match serde_json::from_str(&raw) {
            Ok(stored) => stored,
            Err(source) => return Err(HistoryError::Corrupt { path, source }),
        };
        let seen = stored
            .into_iter()
            .map(|(url, ids)| (url, ids.into_iter().collect()))
            .collect();

        Ok(Self { path, seen })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Has `id` already been notified for `source`?
    pub fn contains(&self, source: &str, id: &str) -> bool {
        self.seen.get(source).is_some_and(|ids| ids.contains(id))
    }

    /// Number of identifiers recorded for `source`.
    pub fn len_for(&self, source: &str) -> usize {
        self.seen.get(source).map_or(0, HashSet::len)
    }

    /// Add `ids` to the set recorded for `source`.
    pub fn record<I, S>(&mut self, source: &str, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = self.seen.entry(source.to_string()).or_default();
        entry.extend(ids.into_iter().map(Into::into));
    }

    /// Atomically overwrite the history file with the in-memory state.
    pub fn save(&self) -> Result<(), HistoryError> {
        self.write_atomically().map_err(|source| HistoryError::Write {
            path: self.path.clone(),
            source,
        })
    }

    fn write_atomically(&self) -> io::Result<()> {
        // Sorted output keeps the file diff-friendly between runs.
        let sorted: BTreeMap<&str, BTreeSet<&str>> = self
            .seen
            .iter()
            .map(|(url, ids)| (url.as_str(), ids.iter().map(String::as_str).collect()))
            .collect();
        let json = serde_json::to_vec_pretty(&sorted)?;

        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
