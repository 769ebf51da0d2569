//! rss-telegram — pushes new RSS entries to a Telegram chat.
//!
//! ## Architecture overview
//!
//! ```text
//!  feeds.txt ──► config ──► poll ──► notify ──► Telegram
//!                            ▲  │       │
//!                    source ─┘  └─ history ◄┘ (record delivered ids, save)
//!                                     ▲
//!                              scheduler (sleep loop)
//! ```
//!
//! * **`config`** — environment settings and the feeds file.
//! * **`source/`** — the `DataSource` trait and the RSS implementation.
//! * **`history`** — which entry identifiers were already sent, per feed.
//! * **`poll`** — fetches every feed and keeps the entries history lacks.
//! * **`notify`** — renders batches into messages and sends them.
//! * **`scheduler`** — runs one cycle, sleeps, repeats until a signal.
//! * **`main`** — wires everything together.

mod config;
mod history;
mod notify;
mod poll;
mod scheduler;
mod source;

use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use config::Config;
use history::History;
use notify::TelegramNotifier;
use scheduler::Scheduler;
use source::RssSource;

/// Prefixed to every configuration error.  The error itself names the
/// offending variable.
const CONFIG_CONTEXT: &str = "invalid configuration";

fn main() -> ExitCode {
    setup_env_and_tracing();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    tracing::info!("starting RSS feed monitoring");

    let config = Config::from_env().context(CONFIG_CONTEXT)?;
    tracing::info!(
        feeds_file = %config.feeds_file.display(),
        history_file = %config.history_file.display(),
        interval_secs = config.check_interval.as_secs(),
        include_description = config.include_description,
        disable_notification = config.disable_notification,
        "configuration loaded"
    );

    // Fail fast on anything that would make every cycle fail.
    let feeds = config::load_feeds(&config.feeds_file)?;
    tracing::info!(count = feeds.len(), "feeds file readable");
    History::load(&config.history_file)?;

    let source = RssSource::new()?;
    let mut notifier = TelegramNotifier::new(
        config.bot_token.clone(),
        config.chat_id.clone(),
        config.disable_notification,
    )?;
    if let Some(api_url) = &config.telegram_api_url {
        notifier = notifier.with_api_base(api_url.clone());
    }

    Scheduler::new(config, Box::new(source), Box::new(notifier)).run()
}

pub fn setup_env_and_tracing() {
    dotenv::dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;

    #[test]
    fn config_error_names_the_offending_variable() {
        let err: anyhow::Error = ConfigError::Invalid {
            name: "CHECK_INTERVAL",
            value: "soon".into(),
            reason: "expected a number of seconds",
        }
        .into();
        let shown = format!("{:#}", err.context(CONFIG_CONTEXT));

        assert!(shown.starts_with("invalid configuration: "));
        assert!(shown.contains("CHECK_INTERVAL"));
        assert!(!shown.contains("TELEGRAM_BOT_TOKEN"));
    }
}
