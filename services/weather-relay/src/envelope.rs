//! Message envelopes and their acknowledgment capability.

use anyhow::{Context, Result};
use async_trait::async_trait;
use lapin::{
    acker::Acker,
    message::Delivery,
    options::{BasicAckOptions, BasicNackOptions},
};

/// Resolves the broker-side state of one delivery.
///
/// Implementations must be safe to call from many tasks at once; every
/// envelope carries its own handle.
#[async_trait]
pub trait Acknowledge: Send + Sync {
    /// Remove the message from the queue.
    async fn confirm(&self) -> Result<()>;

    /// Discard the message without requeueing it.
    async fn reject(&self) -> Result<()>;
}

#[async_trait]
impl Acknowledge for Acker {
    async fn confirm(&self) -> Result<()> {
        self.ack(BasicAckOptions::default())
            .await
            .context("basic.ack failed")
    }

    async fn reject(&self) -> Result<()> {
        self.nack(BasicNackOptions {
            multiple: false,
            requeue: false,
        })
        .await
        .context("basic.nack failed")
    }
}

/// One delivery from the queue, owned by exactly one unit of work.
///
/// `confirm` and `reject` consume the envelope, so a delivery cannot be
/// acknowledged twice.
pub struct Envelope {
    delivery_tag: u64,
    redelivered: bool,
    payload: Vec<u8>,
    acker: Box<dyn Acknowledge>,
}

impl Envelope {
    pub fn new(
        delivery_tag: u64,
        redelivered: bool,
        payload: Vec<u8>,
        acker: Box<dyn Acknowledge>,
    ) -> Self {
        Self {
            delivery_tag,
            redelivered,
            payload,
            acker,
        }
    }

    pub fn delivery_tag(&self) -> u64 {
        self.delivery_tag
    }

    pub fn redelivered(&self) -> bool {
        self.redelivered
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub async fn confirm(self) -> Result<()> {
        self.acker.confirm().await
    }

    pub async fn reject(self) -> Result<()> {
        self.acker.reject().await
    }
}

impl std::fmt::Debug for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Envelope")
            .field("delivery_tag", &self.delivery_tag)
            .field("redelivered", &self.redelivered)
            .field("payload_len", &self.payload.len())
            .finish()
    }
}

impl From<Delivery> for Envelope {
    fn from(delivery: Delivery) -> Self {
        Self::new(
            delivery.delivery_tag,
            delivery.redelivered,
            delivery.data,
            Box::new(delivery.acker),
        )
    }
}
