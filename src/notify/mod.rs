//! Formatting and delivery of new-entry notifications.
//!
//! [`Notifier`] is the seam to the chat transport (currently only
//! [`TelegramNotifier`]).  [`deliver_batch`] turns one feed's new entries into
//! messages and makes a single best-effort attempt per message, reporting
//! which entry identifiers actually reached the chat.

mod format;
mod telegram;

pub use format::startup_message;
pub use telegram::TelegramNotifier;

use thiserror::Error;

use format::{format_batch, MAX_MESSAGE_LENGTH};

use crate::poll::FeedBatch;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("chat API rejected the message (status {status}): {description}")]
    Api { status: u16, description: String },
}

/// Something that can deliver a formatted text message.
pub trait Notifier {
    fn send(&self, text: &str) -> Result<(), NotifyError>;
}

/// Outcome of delivering one feed's batch.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Identifiers carried by messages that were accepted.
    pub delivered: Vec<String>,
    /// Messages that failed; their entries stay out of history.
    pub failed_messages: usize,
}

/// Format `batch` and send each resulting message once.
pub fn deliver_batch(
    notifier: &dyn Notifier,
    batch: &FeedBatch,
    include_description: bool,
) -> Delivery {
    let mut delivery = Delivery::default();

    for message in format_batch(batch, include_description, MAX_MESSAGE_LENGTH) {
        match notifier.send(&message.text) {
            Ok(()) => {
                tracing::debug!(feed = %batch.url, entries = message.ids.len(), "message delivered");
                delivery.delivered.extend(message.ids);
            }
            Err(e) => {
                tracing::error!(
                    feed = %batch.url,
                    entries = message.ids.len(),
                    "error sending notification: {e}"
                );
                delivery.failed_messages += 1;
            }
        }
    }

    delivery
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;

    use super::{Notifier, NotifyError};

    /// Records every message; fails those whose text contains `fail_on`.
    #[derive(Default)]
    pub struct RecordingNotifier {
        pub sent: RefCell<Vec<String>>,
        pub fail_on: Option<String>,
    }

    impl RecordingNotifier {
        pub fn failing_on(needle: &str) -> Self {
            Self {
                sent: RefCell::default(),
                fail_on: Some(needle.to_string()),
            }
        }
    }

    impl Notifier for RecordingNotifier {
        fn send(&self, text: &str) -> Result<(), NotifyError> {
            if self.fail_on.as_deref().is_some_and(|n| text.contains(n)) {
                return Err(NotifyError::Api {
                    status: 500,
                    description: "injected failure".into(),
                });
            }
            self.sent.borrow_mut().push(text.to_string());
            Ok(())
        }
    }
}
