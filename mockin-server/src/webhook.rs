//! Fire-and-forget webhook notifications to registered clients.

use crate::clients::ClientRegistry;
use crate::config::WebhookConfig;
use chrono::{SecondsFormat, Utc};
use http::header::CONTENT_TYPE;
use http::StatusCode;
use log::{info, warn};
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use uuid::Uuid;

pub const WEBHOOK_BASE_PATH: &str = "/open-insurance/webhook/v1";
pub const WEBHOOK_INTERACTION_ID: &str = "x-webhook-interaction-id";

#[derive(Clone)]
pub struct WebhookNotifier {
    http: Client,
    clients: Arc<ClientRegistry>,
    delay: Duration,
}

impl WebhookNotifier {
    pub fn new(config: &WebhookConfig, clients: Arc<ClientRegistry>) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.timeout())
            .build()?;
        Ok(Self {
            http,
            clients,
            delay: config.delay(),
        })
    }

    /// Schedules a single delivery attempt after the configured delay.
    ///
    /// Returns `None` when the client has no webhook URI. Delivery failures
    /// are logged and never reported to the caller.
    pub fn notify(&self, client_id: &str, path: &str) -> Option<JoinHandle<()>> {
        let Some(base) = self
            .clients
            .client(client_id)
            .and_then(|client| client.webhook_uri.as_deref())
        else {
            info!("Client {} has no webhook URI, skipping notification", client_id);
            return None;
        };

        let url = format!("{}{}{}", base.trim_end_matches('/'), WEBHOOK_BASE_PATH, path);
        let http = self.http.clone();
        let delay = self.delay;
        Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            deliver(&http, &url).await;
        }))
    }
}

async fn deliver(http: &Client, url: &str) {
    let body = json!({
        "data": {
            "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    });

    info!("Sending webhook notification to {}", url);
    let result = http
        .post(url)
        .header(CONTENT_TYPE, "application/json")
        .header(WEBHOOK_INTERACTION_ID, Uuid::new_v4().to_string())
        .json(&body)
        .send()
        .await;

    match result {
        Ok(response) if response.status() == StatusCode::ACCEPTED => {}
        Ok(response) => warn!(
            "Webhook notification to {} answered with status {}",
            url,
            response.status()
        ),
        Err(err) => warn!("Failed to send webhook notification to {}: {}", url, err),
    }
}
