//! Relay outcome counters.
//!
//! Kept as atomics for the status API and mirrored into the `metrics`
//! facade for Prometheus scraping.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use metrics::counter;
use serde::Serialize;

use crate::relay::Outcome;

#[derive(Debug)]
pub struct RelayStats {
    pub received: AtomicU64,
    pub confirmed: AtomicU64,
    pub rejected_malformed: AtomicU64,
    pub rejected_undeliverable: AtomicU64,
    /// Second delivery attempts made.
    pub delivery_retries: AtomicU64,
    /// Confirm/reject calls the broker did not accept.
    pub ack_failures: AtomicU64,
    started_at: DateTime<Utc>,
}

/// Point-in-time copy of [`RelayStats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub received: u64,
    pub confirmed: u64,
    pub rejected_malformed: u64,
    pub rejected_undeliverable: u64,
    pub delivery_retries: u64,
    pub ack_failures: u64,
    /// Received but not yet resolved.
    pub in_flight: u64,
}

impl Default for RelayStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RelayStats {
    pub fn new() -> Self {
        Self {
            received: AtomicU64::new(0),
            confirmed: AtomicU64::new(0),
            rejected_malformed: AtomicU64::new(0),
            rejected_undeliverable: AtomicU64::new(0),
            delivery_retries: AtomicU64::new(0),
            ack_failures: AtomicU64::new(0),
            started_at: Utc::now(),
        }
    }

    pub fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
        counter!("relay_messages_received_total").increment(1);
    }

    pub fn record_outcome(&self, outcome: Outcome) {
        let slot = match outcome {
            Outcome::Confirmed => &self.confirmed,
            Outcome::RejectedMalformed => &self.rejected_malformed,
            Outcome::RejectedUndeliverable => &self.rejected_undeliverable,
        };
        slot.fetch_add(1, Ordering::Relaxed);
        counter!("relay_messages_total", "outcome" => outcome.as_str()).increment(1);
    }

    pub fn record_retry(&self) {
        self.delivery_retries.fetch_add(1, Ordering::Relaxed);
        counter!("relay_delivery_retries_total").increment(1);
    }

    pub fn record_ack_failure(&self) {
        self.ack_failures.fetch_add(1, Ordering::Relaxed);
        counter!("relay_ack_failures_total").increment(1);
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let received = self.received.load(Ordering::Relaxed);
        let confirmed = self.confirmed.load(Ordering::Relaxed);
        let rejected_malformed = self.rejected_malformed.load(Ordering::Relaxed);
        let rejected_undeliverable = self.rejected_undeliverable.load(Ordering::Relaxed);

        StatsSnapshot {
            received,
            confirmed,
            rejected_malformed,
            rejected_undeliverable,
            delivery_retries: self.delivery_retries.load(Ordering::Relaxed),
            ack_failures: self.ack_failures.load(Ordering::Relaxed),
            in_flight: received
                .saturating_sub(confirmed + rejected_malformed + rejected_undeliverable),
        }
    }
}
