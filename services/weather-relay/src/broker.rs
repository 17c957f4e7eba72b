//! Broker connection management.
//!
//! Opens the AMQP connection with bounded retry at startup and hands out a
//! manual-acknowledgment subscription. There is no reconnection once the
//! relay is running: losing the broker ends the consumer loop and the process.

use std::future::Future;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use futures::{Stream, StreamExt};
use lapin::{
    options::{BasicConsumeOptions, BasicQosOptions, QueueDeclareOptions},
    types::FieldTable,
    Channel, Connection, ConnectionProperties,
};
use tracing::{info, warn};

use crate::envelope::Envelope;

/// How hard to try reaching the broker before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectPolicy {
    pub max_attempts: u32,
    /// Fixed wait between failed attempts.
    pub retry_interval: Duration,
}

impl Default for ConnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            retry_interval: Duration::from_secs(2),
        }
    }
}

/// Run `attempt` until it succeeds or `policy.max_attempts` is exhausted.
///
/// The closure receives the 1-based attempt number. The sleep only happens
/// between attempts, never after the last one.
pub async fn connect_with_retry<T, F, Fut>(policy: &ConnectPolicy, mut attempt: F) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_error = None;

    for n in 1..=policy.max_attempts {
        match attempt(n).await {
            Ok(value) => {
                info!(attempt = n, "Connected to broker");
                return Ok(value);
            }
            Err(e) => {
                if n < policy.max_attempts {
                    warn!(
                        attempt = n,
                        max_attempts = policy.max_attempts,
                        retry_in_secs = policy.retry_interval.as_secs_f64(),
                        error = %e,
                        "Broker connection attempt failed, retrying"
                    );
                    tokio::time::sleep(policy.retry_interval).await;
                } else {
                    warn!(
                        attempt = n,
                        max_attempts = policy.max_attempts,
                        error = %e,
                        "Broker connection attempt failed"
                    );
                }
                last_error = Some(e);
            }
        }
    }

    let cause = last_error.unwrap_or_else(|| anyhow!("no connection attempts were made"));
    Err(cause.context(format!(
        "Broker unreachable after {} attempts",
        policy.max_attempts
    )))
}

/// Process-wide broker connection and the channel used for consuming and
/// acknowledging.
///
/// Acknowledgments go through per-delivery `Acker` handles that lapin
/// serializes onto the channel internally, so workers never need to lock the
/// channel themselves.
pub struct BrokerSession {
    connection: Connection,
    channel: Channel,
}

impl BrokerSession {
    /// Connect with retry and open a channel.
    pub async fn connect(url: &str, policy: &ConnectPolicy) -> Result<Self> {
        let connection = connect_with_retry(policy, |attempt| async move {
            info!(attempt, "Connecting to broker");
            Connection::connect(url, ConnectionProperties::default())
                .await
                .context("AMQP connection failed")
        })
        .await?;

        let channel = connection
            .create_channel()
            .await
            .context("Failed to open AMQP channel")?;

        Ok(Self {
            connection,
            channel,
        })
    }

    /// Start consuming `queue` with manual acknowledgment.
    ///
    /// `prefetch` caps unacknowledged deliveries held by this consumer. When
    /// `declare` is set the queue is declared durable first, which is a no-op
    /// if the publisher already created it.
    pub async fn subscribe(
        &self,
        queue: &str,
        consumer_tag: &str,
        prefetch: u16,
        declare: bool,
    ) -> Result<impl Stream<Item = Result<Envelope, lapin::Error>>> {
        self.channel
            .basic_qos(prefetch, BasicQosOptions::default())
            .await
            .context("Failed to set prefetch count")?;

        if declare {
            self.channel
                .queue_declare(
                    queue,
                    QueueDeclareOptions {
                        durable: true,
                        ..QueueDeclareOptions::default()
                    },
                    FieldTable::default(),
                )
                .await
                .with_context(|| format!("Failed to declare queue '{}'", queue))?;
        }

        let consumer = self
            .channel
            .basic_consume(
                queue,
                consumer_tag,
                BasicConsumeOptions {
                    no_ack: false,
                    ..BasicConsumeOptions::default()
                },
                FieldTable::default(),
            )
            .await
            .with_context(|| format!("Failed to consume queue '{}'", queue))?;

        info!(
            queue = %queue,
            consumer_tag = %consumer_tag,
            prefetch,
            "Subscribed to queue"
        );

        Ok(consumer.map(|delivery| delivery.map(Envelope::from)))
    }

    /// Close the channel, then the connection.
    pub async fn close(self) {
        if let Err(e) = self.channel.close(200, "relay shutting down").await {
            warn!(error = %e, "Failed to close AMQP channel");
        }
        if let Err(e) = self.connection.close(200, "relay shutting down").await {
            warn!(error = %e, "Failed to close AMQP connection");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> ConnectPolicy {
        ConnectPolicy {
            max_attempts,
            retry_interval: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_failures() {
        let calls = AtomicU32::new(0);

        let value = connect_with_retry(&fast_policy(5), |n| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 3 {
                    Err(anyhow!("connection refused"))
                } else {
                    Ok(n)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(value, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);

        let err = connect_with_retry(&fast_policy(5), |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(anyhow!("connection refused")) }
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 5);
        let message = format!("{:#}", err);
        assert!(message.contains("after 5 attempts"));
        assert!(message.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_first_success_makes_one_call() {
        let calls = AtomicU32::new(0);

        connect_with_retry(&fast_policy(5), |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        })
        .await
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_default_policy() {
        let policy = ConnectPolicy::default();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.retry_interval, Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_unreachable_broker_fails_startup() {
        let err = BrokerSession::connect("amqp://127.0.0.1:1/%2f", &fast_policy(2))
            .await
            .err()
            .unwrap();

        assert!(format!("{:#}", err).contains("after 2 attempts"));
    }
}
