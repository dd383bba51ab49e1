//! Delivering messages to chat webhooks.

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Serialize;

use crate::error::NotifyError;
use crate::source::HttpOptions;

/// Sends one formatted message to one destination.
///
/// Failures are returned, never raised; the scheduler decides what an
/// undelivered entry means.
pub trait Notifier {
    fn notify(&self, destination: &str, message: &str) -> Result<(), NotifyError>;
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
}

/// Discord-style webhook: `POST {"content": …}`, answered with
/// `204 No Content` on success.
pub struct WebhookNotifier {
    client: Client,
}

impl WebhookNotifier {
    /// Certificate checks always stay on for deliveries, whatever the
    /// fetch side is configured with.
    pub fn new(options: &HttpOptions) -> reqwest::Result<Self> {
        let client = Client::builder()
            .user_agent(crate::USER_AGENT)
            .timeout(options.timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl Notifier for WebhookNotifier {
    fn notify(&self, destination: &str, message: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(destination)
            .json(&WebhookPayload { content: message })
            .send()?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(());
        }

        let body = response.text().unwrap_or_default();
        Err(NotifyError::Status {
            status: status.as_u16(),
            body,
        })
    }
}
