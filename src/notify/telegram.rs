//! Telegram Bot API transport.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{Notifier, NotifyError};

const API_BASE: &str = "https://api.telegram.org";
const SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Sends messages to one chat through `sendMessage`.
pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
    disable_notification: bool,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramNotifier {
    pub fn new(
        bot_token: impl Into<String>,
        chat_id: impl Into<String>,
        disable_notification: bool,
    ) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .map_err(|e| NotifyError::Http(e.without_url()))?;
        Ok(Self {
            client,
            api_base: API_BASE.to_string(),
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            disable_notification,
        })
    }

    /// Point the notifier at a different Bot API server.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.bot_token)
    }

    fn request_body(&self, text: &str) -> Value {
        json!({
            "chat_id": self.chat_id,
            "text": text,
            "parse_mode": "HTML",
            "disable_notification": self.disable_notification,
            "disable_web_page_preview": false,
        })
    }
}

impl Notifier for TelegramNotifier {
    fn send(&self, text: &str) -> Result<(), NotifyError> {
        // The endpoint embeds the bot token; keep it out of error messages.
        let resp = self
            .client
            .post(self.endpoint())
            .json(&self.request_body(text))
            .send()
            .map_err(|e| NotifyError::Http(e.without_url()))?;

        let status = resp.status();
        let body = resp.text().map_err(|e| NotifyError::Http(e.without_url()))?;
        let parsed: Option<ApiResponse> = serde_json::from_str(&body).ok();

        match parsed {
            Some(ApiResponse { ok: true, .. }) if status.is_success() => Ok(()),
            Some(ApiResponse { description, .. }) => Err(NotifyError::Api {
                status: status.as_u16(),
                description: description.unwrap_or_else(|| "no description".into()),
            }),
            None => Err(NotifyError::Api {
                status: status.as_u16(),
                description: body.chars().take(200).collect(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
