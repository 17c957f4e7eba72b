//! In-memory acknowledgment for driving the relay without a broker.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;

use weather_relay::{Acknowledge, DeliveryConfig, Dispatcher, Envelope, Relay, RelayStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    Confirmed,
    Rejected,
}

/// Shared log of every acknowledgment made, in call order.
#[derive(Debug, Clone, Default)]
pub struct AckLog {
    entries: Arc<Mutex<Vec<(u64, Ack)>>>,
}

impl AckLog {
    pub fn entries(&self) -> Vec<(u64, Ack)> {
        self.entries.lock().unwrap().clone()
    }

    pub fn for_tag(&self, tag: u64) -> Vec<Ack> {
        self.entries()
            .into_iter()
            .filter(|(t, _)| *t == tag)
            .map(|(_, ack)| ack)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Build an envelope whose acknowledgments land in this log.
    pub fn envelope(&self, tag: u64, payload: &str) -> Envelope {
        Envelope::new(
            tag,
            false,
            payload.as_bytes().to_vec(),
            Box::new(RecordingAcker {
                tag,
                log: self.clone(),
                fail: false,
            }),
        )
    }

    /// Envelope whose acknowledgment calls fail, as with a closed channel.
    pub fn failing_envelope(&self, tag: u64, payload: &str) -> Envelope {
        Envelope::new(
            tag,
            false,
            payload.as_bytes().to_vec(),
            Box::new(RecordingAcker {
                tag,
                log: self.clone(),
                fail: true,
            }),
        )
    }

    fn push(&self, tag: u64, ack: Ack) {
        self.entries.lock().unwrap().push((tag, ack));
    }
}

struct RecordingAcker {
    tag: u64,
    log: AckLog,
    fail: bool,
}

#[async_trait]
impl Acknowledge for RecordingAcker {
    async fn confirm(&self) -> Result<()> {
        self.log.push(self.tag, Ack::Confirmed);
        if self.fail {
            bail!("channel closed");
        }
        Ok(())
    }

    async fn reject(&self) -> Result<()> {
        self.log.push(self.tag, Ack::Rejected);
        if self.fail {
            bail!("channel closed");
        }
        Ok(())
    }
}

pub fn fast_delivery() -> DeliveryConfig {
    DeliveryConfig {
        retry_delay: Duration::from_millis(10),
        request_timeout: Duration::from_secs(5),
        connect_timeout: Duration::from_secs(2),
    }
}

pub fn relay_for(endpoint: String) -> Relay {
    let dispatcher = Dispatcher::new(endpoint, fast_delivery()).unwrap();
    Relay::new(dispatcher, Arc::new(RelayStats::new()))
}
