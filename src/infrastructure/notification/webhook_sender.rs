//! Delivers notifications by POSTing them to the portal's notification endpoint

use std::time::Duration;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use sha2::Sha256;
use tracing::debug;

use crate::domain::notification::{Notification, NotificationSender};
use crate::domain::DomainError;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying `sha256=<hex>` of the request body
pub const SIGNATURE_HEADER: &str = "X-Review-Signature";

/// Hex HMAC-SHA256 of `payload` under `secret`
pub fn sign_payload(secret: &str, payload: &[u8]) -> Result<String, DomainError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| DomainError::configuration(format!("Invalid signing key: {}", e)))?;
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

#[derive(Debug, Clone)]
pub struct WebhookNotificationSender {
    client: Client,
    url: String,
    secret: Option<String>,
}

impl WebhookNotificationSender {
    pub fn new(
        url: impl Into<String>,
        secret: Option<String>,
        timeout: Duration,
    ) -> Result<Self, DomainError> {
        let url = url.into();

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(DomainError::configuration(
                "Notification webhook URL must start with http:// or https://",
            ));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url,
            secret,
        })
    }
}

#[async_trait]
impl NotificationSender for WebhookNotificationSender {
    async fn send(&self, notification: &Notification) -> Result<(), DomainError> {
        let body = serde_json::to_vec(notification).map_err(|e| {
            DomainError::notification(format!("Failed to serialize notification: {}", e))
        })?;

        let mut request = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json");

        if let Some(ref secret) = self.secret {
            let signature = sign_payload(secret, &body)?;
            request = request.header(SIGNATURE_HEADER, format!("sha256={}", signature));
        }

        let response = request.body(body).send().await.map_err(|e| {
            if e.is_timeout() {
                DomainError::notification("Notification request timed out")
            } else {
                DomainError::notification(format!("Notification request failed: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DomainError::notification(format!(
                "Notification endpoint answered HTTP {}",
                status.as_u16()
            )));
        }

        debug!(status = status.as_u16(), kind = %notification.kind, "Notification delivered");
        Ok(())
    }
}
