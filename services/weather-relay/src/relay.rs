//! One unit of work: transform a delivery, post it, resolve its ack.
//!
//! ```text
//! RECEIVED -> DECODING -> REJECTED_MALFORMED
//!                      -> TRANSFORMED -> DELIVERING -> CONFIRMED
//!                                                   -> REJECTED_UNDELIVERABLE
//! ```
//!
//! Every path ends in exactly one confirm or reject. Errors never leave the
//! unit of work; they only decide which of the two it is.

use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use crate::dispatch::{DeliveryOutcome, Dispatcher};
use crate::envelope::Envelope;
use crate::stats::RelayStats;

/// Terminal state of one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Delivered downstream and acked.
    Confirmed,
    /// Payload could not be decoded; nacked without requeue.
    RejectedMalformed,
    /// Both delivery attempts failed; nacked without requeue.
    RejectedUndeliverable,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Confirmed => "confirmed",
            Outcome::RejectedMalformed => "rejected_malformed",
            Outcome::RejectedUndeliverable => "rejected_undeliverable",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared by all workers behind an `Arc`. Holds no per-message state.
pub struct Relay {
    dispatcher: Dispatcher,
    stats: Arc<RelayStats>,
}

impl Relay {
    pub fn new(dispatcher: Dispatcher, stats: Arc<RelayStats>) -> Self {
        Self { dispatcher, stats }
    }

    pub fn stats(&self) -> &Arc<RelayStats> {
        &self.stats
    }

    /// Process one envelope end to end.
    #[instrument(
        skip_all,
        fields(delivery_tag = envelope.delivery_tag(), redelivered = envelope.redelivered())
    )]
    pub async fn handle(&self, envelope: Envelope) -> Outcome {
        self.stats.record_received();

        let summary = match weather_common::transform(envelope.payload()) {
            Ok(summary) => summary,
            Err(e) => {
                warn!(error = %e, bytes = envelope.payload().len(), "Discarding malformed payload");
                return self.reject(envelope, Outcome::RejectedMalformed, 0).await;
            }
        };

        let delivery = self.dispatcher.deliver(&summary).await;
        if delivery.attempts() > 1 {
            self.stats.record_retry();
        }

        match delivery {
            DeliveryOutcome::Delivered { attempts, status } => {
                if let Err(e) = envelope.confirm().await {
                    error!(error = %e, "Failed to confirm delivered message");
                    self.stats.record_ack_failure();
                }
                info!(
                    outcome = %Outcome::Confirmed,
                    attempts,
                    status,
                    "Summary delivered"
                );
                self.stats.record_outcome(Outcome::Confirmed);
                Outcome::Confirmed
            }
            DeliveryOutcome::Undeliverable { attempts, reason } => {
                warn!(attempts, reason = %reason, "Summary undeliverable, dropping message");
                self.reject(envelope, Outcome::RejectedUndeliverable, attempts)
                    .await
            }
        }
    }

    async fn reject(&self, envelope: Envelope, outcome: Outcome, attempts: u32) -> Outcome {
        if let Err(e) = envelope.reject().await {
            error!(error = %e, "Failed to reject message");
            self.stats.record_ack_failure();
        }
        info!(outcome = %outcome, attempts, "Message rejected without requeue");
        self.stats.record_outcome(outcome);
        outcome
    }
}
