use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct WebhookConfig {
    /// Delay before a notification is sent (default: 10 seconds)
    pub delay_secs: u64,

    /// HTTP timeout for a single delivery attempt
    pub timeout_secs: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            delay_secs: 10,
            timeout_secs: 5,
        }
    }
}

impl WebhookConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
