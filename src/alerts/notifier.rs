use crate::config::TelegramCredentials;
use crate::error::AlertError;
use log::{debug, info};
use reqwest::Client;
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Delivery channel for alert messages
pub trait Notifier: Send + Sync {
    fn send<'a>(
        &'a self,
        message: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), AlertError>> + Send + 'a>>;
}

/// Sends messages to a Telegram chat through the Bot API
pub struct TelegramNotifier {
    client: Client,
    credentials: TelegramCredentials,
    api_base: String,
}

/// Request body for `sendMessage`
#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    disable_web_page_preview: bool,
}

impl TelegramNotifier {
    /// Create a notifier for the public Bot API
    ///
    /// # Errors
    ///
    /// Returns `AlertError::HttpError` if the HTTP client cannot be built.
    pub fn new(credentials: TelegramCredentials, timeout: Duration) -> Result<Self, AlertError> {
        Self::with_api_base(credentials, timeout, "https://api.telegram.org".to_string())
    }

    /// Create a notifier against a custom Bot API server
    pub fn with_api_base(
        credentials: TelegramCredentials,
        timeout: Duration,
        api_base: String,
    ) -> Result<Self, AlertError> {
        let client = Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .map_err(|e| AlertError::HttpError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            credentials,
            api_base,
        })
    }

    /// Format the `sendMessage` endpoint URL
    fn api_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base.trim_end_matches('/'),
            self.credentials.bot_token
        )
    }
}

impl Notifier for TelegramNotifier {
    fn send<'a>(
        &'a self,
        message: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), AlertError>> + Send + 'a>> {
        Box::pin(async move {
            let request = SendMessageRequest {
                chat_id: &self.credentials.chat_id,
                text: message,
                disable_web_page_preview: true,
            };

            // The URL carries the bot token, keep it out of error messages.
            let response = self
                .client
                .post(self.api_url())
                .json(&request)
                .send()
                .await
                .map_err(|e| {
                    AlertError::HttpError(format!("HTTP request failed: {}", e.without_url()))
                })?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(AlertError::NotificationFailed(format!(
                    "Telegram send failed: {} {}",
                    status, body
                )));
            }

            debug!("Telegram message delivered to chat {}", self.credentials.chat_id);
            Ok(())
        })
    }
}

/// Logs messages instead of delivering them, for dry runs
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send<'a>(
        &'a self,
        message: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), AlertError>> + Send + 'a>> {
        Box::pin(async move {
            info!("DRY RUN NOTIFICATION:\n{}", message);
            Ok(())
        })
    }
}

/// Recording notifier for tests
///
/// Every message is recorded, including ones that are made to fail.
#[derive(Debug, Default)]
pub struct MockNotifier {
    sent: Arc<Mutex<Vec<String>>>,
    fail_when_contains: Option<String>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every message containing `needle`
    pub fn failing_on(needle: &str) -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            fail_when_contains: Some(needle.to_string()),
        }
    }

    /// Messages passed to `send`, in order
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    pub fn sent_count(&self) -> usize {
        self.sent().len()
    }
}

impl Notifier for MockNotifier {
    fn send<'a>(
        &'a self,
        message: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), AlertError>> + Send + 'a>> {
        Box::pin(async move {
            if let Ok(mut sent) = self.sent.lock() {
                sent.push(message.to_string());
            }

            match &self.fail_when_contains {
                Some(needle) if message.contains(needle.as_str()) => Err(
                    AlertError::NotificationFailed("Telegram send failed: 500 mock".to_string()),
                ),
                _ => Ok(()),
            }
        })
    }
}
