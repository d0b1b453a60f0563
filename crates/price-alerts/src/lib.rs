mod evaluator;
mod templates;
mod thresholds;

pub use evaluator::{AlertEvaluator, AlertHistory, HISTORY_CAPACITY};
pub use templates::AlertTemplate;
pub use thresholds::{ThresholdBook, ThresholdRule};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Which side of the band a price crossed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Lower,
    Upper,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Lower => "lower",
            AlertKind::Upper => "upper",
        }
    }
}

/// A threshold crossing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Alert {
    /// Creation time in epoch milliseconds, strictly increasing
    pub id: i64,
    pub symbol: String,
    pub price: f64,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub threshold: f64,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Errors from threshold rule construction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AlertError {
    #[error("Lower bound {lower} is above upper bound {upper}")]
    InvertedRange { lower: f64, upper: f64 },
    #[error("At least one of lower or upper bound is required")]
    MissingBounds,
    #[error("Invalid bound: {0}")]
    InvalidBound(String),
}

/// Trait for notification channels.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(&self, alert: &Alert) -> Result<(), NotificationError>;
    fn name(&self) -> &str;
}

/// Errors from the notification system.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Webhook error: {0}")]
    Webhook(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result of delivering one alert through one channel
#[derive(Debug)]
pub struct DeliveryOutcome {
    pub channel: String,
    pub result: Result<(), NotificationError>,
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        self.result.is_ok()
    }
}

/// Configuration for the notification service.
#[derive(Debug, Clone, Default)]
pub struct NotificationConfig {
    pub webhook_url: Option<String>,
}

/// Dispatches alerts to all configured channels and reports per-channel outcomes.
#[derive(Clone)]
pub struct NotificationService {
    channels: Arc<Vec<Box<dyn NotificationChannel>>>,
}

impl NotificationService {
    pub fn new(config: &NotificationConfig) -> Self {
        let mut channels: Vec<Box<dyn NotificationChannel>> = Vec::new();

        if let Some(ref webhook_url) = config.webhook_url {
            channels.push(Box::new(WebhookNotifier {
                webhook_url: webhook_url.clone(),
                client: reqwest::Client::new(),
            }));
            tracing::info!("Webhook alert notifications enabled");
        }

        if channels.is_empty() {
            tracing::info!("No notification channels configured (set ALERT_WEBHOOK_URL)");
        }

        Self {
            channels: Arc::new(channels),
        }
    }

    pub fn with_channels(channels: Vec<Box<dyn NotificationChannel>>) -> Self {
        Self {
            channels: Arc::new(channels),
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Send an alert to every channel, awaiting completion.
    pub async fn dispatch(&self, alert: &Alert) -> Vec<DeliveryOutcome> {
        let mut outcomes = Vec::with_capacity(self.channels.len());
        for channel in self.channels.iter() {
            let result = channel.send(alert).await;
            match &result {
                Ok(()) => tracing::debug!("Sent alert notification via {}", channel.name()),
                Err(e) => tracing::warn!("Failed to send alert notification via {}: {}", channel.name(), e),
            }
            outcomes.push(DeliveryOutcome {
                channel: channel.name().to_string(),
                result,
            });
        }
        outcomes
    }

    /// Dispatch in the background. The handle yields the outcomes; dropping it
    /// is fine, failures are already logged.
    pub fn send_alert(&self, alert: Alert) -> tokio::task::JoinHandle<Vec<DeliveryOutcome>> {
        let service = self.clone();
        tokio::spawn(async move { service.dispatch(&alert).await })
    }
}

/// Discord-compatible webhook notifier.
struct WebhookNotifier {
    webhook_url: String,
    client: reqwest::Client,
}

#[async_trait]
impl NotificationChannel for WebhookNotifier {
    async fn send(&self, alert: &Alert) -> Result<(), NotificationError> {
        let payload = AlertTemplate::webhook_payload(alert);

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotificationError::Webhook(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NotificationError::Webhook(format!("HTTP {}", response.status())));
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "webhook"
    }
}
