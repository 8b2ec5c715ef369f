//! ntfy notification delivery.
//!
//! Delivery is strictly fire-and-forget: a failed or slow notification is
//! logged and dropped, and must never alter an already-computed decision.

use serde_json::json;
use std::time::Duration;
use tracing::{error, info};

use crate::models::NotificationIntent;

pub struct Notifier {
    http: reqwest::Client,
    /// Unset disables delivery entirely.
    url: Option<String>,
    topic: String,
}

impl Notifier {
    pub fn new(url: Option<String>, topic: String) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Notifier { http, url, topic })
    }

    pub fn is_enabled(&self) -> bool {
        self.url.is_some()
    }

    /// Deliver one intent. Errors are swallowed after logging.
    pub async fn send(&self, intent: &NotificationIntent) {
        let Some(url) = &self.url else {
            return;
        };

        let mut payload = json!({
            "topic": self.topic,
            "title": intent.title,
            "message": intent.message,
            "priority": intent.priority.as_level(),
        });
        if !intent.tags.is_empty() {
            payload["tags"] = json!(intent.tags);
        }

        match self.http.post(url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                info!("Notification sent: {}", intent.title);
            }
            Ok(response) => {
                error!(
                    "Failed to send notification (HTTP {})",
                    response.status().as_u16()
                );
            }
            Err(e) => {
                error!("Failed to send notification: {}", e);
            }
        }
    }
}
