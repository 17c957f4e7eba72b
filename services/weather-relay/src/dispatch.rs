//! Delivery of weather summaries to the ingestion API.
//!
//! Each summary gets at most two POSTs: the first attempt and one retry
//! after a fixed delay. Anything below 300 counts as accepted. Redirects are
//! not followed so that a 3xx answer counts as a failed attempt.

use std::time::Duration;

use anyhow::{Context, Result};
use bytes::Bytes;
use reqwest::{header, redirect, Client};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use weather_common::WeatherSummary;

/// Total POSTs per message: the first attempt plus a single retry.
pub const MAX_DELIVERY_ATTEMPTS: u32 = 2;

/// Configuration for the delivery dispatcher.
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    /// Wait before the retry
    pub retry_delay: Duration,
    /// HTTP request timeout
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_secs(2),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Why a single POST did not count as delivered.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("endpoint answered with status {0}")]
    Rejected(u16),
}

/// Final result of delivering one summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered { attempts: u32, status: u16 },
    Undeliverable { attempts: u32, reason: String },
}

impl DeliveryOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            DeliveryOutcome::Delivered { attempts, .. }
            | DeliveryOutcome::Undeliverable { attempts, .. } => *attempts,
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered { .. })
    }
}

/// Posts summaries to the configured endpoint.
///
/// Holds one `reqwest::Client`; its connection pool is shared by every
/// worker.
pub struct Dispatcher {
    client: Client,
    endpoint: String,
    config: DeliveryConfig,
}

impl Dispatcher {
    pub fn new(endpoint: impl Into<String>, config: DeliveryConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .redirect(redirect::Policy::none())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            config,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Deliver a summary, retrying once after `retry_delay` on failure.
    #[instrument(skip_all, fields(endpoint = %self.endpoint))]
    pub async fn deliver(&self, summary: &WeatherSummary) -> DeliveryOutcome {
        let body = match summary.to_json_bytes() {
            Ok(body) => Bytes::from(body),
            Err(e) => {
                return DeliveryOutcome::Undeliverable {
                    attempts: 0,
                    reason: e.to_string(),
                }
            }
        };

        let mut attempt = 1;
        loop {
            match self.post(body.clone()).await {
                Ok(status) => {
                    debug!(attempt, status, "Summary accepted");
                    return DeliveryOutcome::Delivered {
                        attempts: attempt,
                        status,
                    };
                }
                Err(e) if attempt < MAX_DELIVERY_ATTEMPTS => {
                    warn!(
                        attempt,
                        retry_in_secs = self.config.retry_delay.as_secs_f64(),
                        error = %e,
                        "Delivery failed, retrying"
                    );
                    tokio::time::sleep(self.config.retry_delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Delivery retry failed");
                    return DeliveryOutcome::Undeliverable {
                        attempts: attempt,
                        reason: e.to_string(),
                    };
                }
            }
        }
    }

    /// One POST. Returns the status code when it is below 300.
    async fn post(&self, body: Bytes) -> Result<u16, AttemptError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        if is_accepted(status) {
            Ok(status)
        } else {
            Err(AttemptError::Rejected(status))
        }
    }
}

/// Whether the ingestion API accepted the summary.
pub fn is_accepted(status: u16) -> bool {
    status < 300
}
