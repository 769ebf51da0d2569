//! Startup configuration.
//!
//! Notification settings come from the process environment (after `.env` is
//! loaded in `main`); the list of feeds comes from a line-oriented text file
//! that is re-read at the start of every cycle.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 3600;
pub const DEFAULT_FEEDS_FILE: &str = "feeds.txt";
pub const HISTORY_FILE_NAME: &str = "sent_items.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("invalid value {value:?} for {name}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("cannot read feeds file {}: {source}", .path.display())]
    FeedsFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bot_token: String,
    pub chat_id: String,
    pub check_interval: Duration,
    pub feeds_file: PathBuf,
    pub history_file: PathBuf,
    /// Append each entry's summary below its title.
    pub include_description: bool,
    /// Deliver messages silently.
    pub disable_notification: bool,
    /// Alternative Bot API server, e.g. a self-hosted one.
    pub telegram_api_url: Option<String>,
}

impl Config {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| optional(name).ok_or(ConfigError::MissingVar(name));

        let bot_token = required("TELEGRAM_BOT_TOKEN")?;
        let chat_id = required("TELEGRAM_CHAT_ID")?;

        let check_interval = match optional("CHECK_INTERVAL") {
            Some(raw) => parse_interval(&raw)?,
            None => Duration::from_secs(DEFAULT_CHECK_INTERVAL_SECS),
        };

        let feeds_file = PathBuf::from(
            optional("FEEDS_FILE").unwrap_or_else(|| DEFAULT_FEEDS_FILE.into()),
        );
        let history_file = optional("HISTORY_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| default_history_path(&feeds_file));

        let include_description = optional("INCLUDE_DESCRIPTION")
            .map(|v| parse_bool("INCLUDE_DESCRIPTION", &v))
            .transpose()?
            .unwrap_or(false);
        let disable_notification = optional("DISABLE_NOTIFICATION")
            .map(|v| parse_bool("DISABLE_NOTIFICATION", &v))
            .transpose()?
            .unwrap_or(false);
        let telegram_api_url = optional("TELEGRAM_API_URL").map(|v| v.trim().to_string());

        Ok(Config {
            bot_token: bot_token.trim().to_string(),
            chat_id: chat_id.trim().to_string(),
            check_interval,
            feeds_file,
            history_file,
            include_description,
            disable_notification,
            telegram_api_url,
        })
    }
}

/// The history file lives next to the feeds file unless configured otherwise.
fn default_history_path(feeds_file: &Path) -> PathBuf {
    match feeds_file.parent() {
        Some(dir) => dir.join(HISTORY_FILE_NAME),
        None => PathBuf::from(HISTORY_FILE_NAME),
    }
}

fn parse_interval(raw: &str) -> Result<Duration, ConfigError> {
    let invalid = |reason| ConfigError::Invalid {
        name: "CHECK_INTERVAL",
        value: raw.to_string(),
        reason,
    };
    let secs: u64 = raw
        .trim()
        .parse()
        .map_err(|_| invalid("expected a whole number of seconds"))?;
    if secs == 0 {
        return Err(invalid("must be greater than zero"));
    }
    Ok(Duration::from_secs(secs))
}

fn parse_bool(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            value: raw.to_string(),
            reason: "expected true or false",
        }),
    }
}

/// Read feed URLs from `path`, one per line.
///
/// Blank lines and lines starting with `#` are skipped; order is preserved.
pub fn load_feeds(path: &Path) -> Result<Vec<String>, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::FeedsFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_feeds(&contents))
}

fn parse_feeds(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    const REQUIRED: [(&str, &str); 2] = [("TELEGRAM_BOT_TOKEN", "123:abc"), ("TELEGRAM_CHAT_ID", "-42")];

    #[test]
    fn defaults_apply_when_optional_vars_are_absent() {
        let config = Config::from_lookup(lookup(&REQUIRED)).unwrap();

        assert_eq!(config.bot_token, "123:abc");
        assert_eq!(config.chat_id, "-42");
        assert_eq!(config.check_interval, Duration::from_secs(3600));
        assert_eq!(config.feeds_file, PathBuf::from("feeds.txt"));
        assert_eq!(config.history_file, PathBuf::from("sent_items.json"));
        assert!(!config.include_description);
        assert!(!config.disable_notification);
        assert!(config.telegram_api_url.is_none());
    }

    #[test]
    fn missing_token_is_an_error() {
        let err = Config::from_lookup(lookup(&[("TELEGRAM_CHAT_ID", "1")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("TELEGRAM_BOT_TOKEN")));
    }

    #[test]
    fn blank_chat_id_counts_as_missing() {
        let err = Config::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("TELEGRAM_CHAT_ID", "   "),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("TELEGRAM_CHAT_ID")));
    }

    #[test]
    fn optional_values_are_parsed() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("CHECK_INTERVAL", "600"),
            ("FEEDS_FILE", "/app/data/feeds.txt"),
            ("INCLUDE_DESCRIPTION", "TRUE"),
            ("DISABLE_NOTIFICATION", "yes"),
        ]);
        let config = Config::from_lookup(lookup(&vars)).unwrap();

        assert_eq!(config.check_interval, Duration::from_secs(600));
        assert_eq!(config.feeds_file, PathBuf::from("/app/data/feeds.txt"));
        assert_eq!(config.history_file, PathBuf::from("/app/data/sent_items.json"));
        assert!(config.include_description);
        assert!(config.disable_notification);
    }

    #[test]
    fn history_file_can_be_overridden() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("HISTORY_FILE", "/var/lib/rss/history.json"));
        let config = Config::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.history_file, PathBuf::from("/var/lib/rss/history.json"));
    }

    #[test]
    fn bad_interval_is_rejected() {
        for raw in ["soon", "0", "-5"] {
            let mut vars = REQUIRED.to_vec();
            vars.push(("CHECK_INTERVAL", raw));
            let err = Config::from_lookup(lookup(&vars)).unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid { name: "CHECK_INTERVAL", .. }),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn bad_bool_is_rejected() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("INCLUDE_DESCRIPTION", "maybe"));
        let err = Config::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "INCLUDE_DESCRIPTION", .. }));
    }

    #[test]
    fn feeds_file_skips_comments_and_blank_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "# my feeds\n\nhttps://a.example/rss\n  https://b.example/feed.xml  \n"
        )
        .unwrap();

        let feeds = load_feeds(file.path()).unwrap();
        assert_eq!(feeds, vec!["https://a.example/rss", "https://b.example/feed.xml"]);
    }

    #[test]
    fn indented_comment_is_skipped() {
        assert_eq!(parse_feeds("   # nope\nhttps://x\n"), vec!["https://x"]);
    }

    #[test]
    fn missing_feeds_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_feeds(&dir.path().join("absent.txt")).unwrap_err();
        assert!(matches!(err, ConfigError::FeedsFile { .. }));
    }
}
