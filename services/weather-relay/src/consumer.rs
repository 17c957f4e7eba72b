//! Consumer loop and worker pool.
//!
//! The subscription feeds a bounded queue drained by a fixed number of
//! workers. A full queue stops the loop from pulling more deliveries, and
//! the broker prefetch limit stops the broker from pushing more, so memory
//! stays bounded under bursts.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use futures::{Stream, StreamExt};
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::envelope::Envelope;
use crate::relay::Relay;

/// Fixed set of workers sharing one bounded queue.
pub struct WorkerPool {
    sender: mpsc::Sender<Envelope>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Start `size` workers behind a queue holding up to `capacity` envelopes.
    ///
    /// Both values must be non-zero; [`RelayConfig::validate`] enforces this.
    ///
    /// [`RelayConfig::validate`]: crate::config::RelayConfig::validate
    pub fn spawn(size: usize, capacity: usize, relay: Arc<Relay>) -> Self {
        let (sender, receiver) = mpsc::channel(capacity);
        let receiver = Arc::new(Mutex::new(receiver));

        let workers: Vec<_> = (0..size)
            .map(|id| tokio::spawn(worker_loop(id, receiver.clone(), relay.clone())))
            .collect();

        info!(workers = workers.len(), capacity, "Worker pool started");

        Self { sender, workers }
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Queue an envelope, waiting for space if every slot is taken.
    pub async fn submit(&self, envelope: Envelope) -> Result<()> {
        self.sender
            .send(envelope)
            .await
            .map_err(|_| anyhow!("Worker pool is no longer accepting messages"))
    }

    /// Close the queue and wait for the workers to drain it.
    pub async fn shutdown(self) {
        drop(self.sender);
        for worker in self.workers {
            if let Err(e) = worker.await {
                error!(error = %e, "Worker task ended abnormally");
            }
        }
        info!("Worker pool drained");
    }
}

async fn worker_loop(id: usize, receiver: Arc<Mutex<mpsc::Receiver<Envelope>>>, relay: Arc<Relay>) {
    debug!(worker = id, "Worker started");
    loop {
        // Only the receive is under the lock; processing runs unlocked.
        let next = receiver.lock().await.recv().await;
        match next {
            Some(envelope) => {
                relay.handle(envelope).await;
            }
            None => break,
        }
    }
    debug!(worker = id, "Worker stopped");
}

/// Forward deliveries into the pool until the subscription ends or a
/// shutdown signal arrives.
///
/// The subscription ending or failing is fatal and returned as an error;
/// there is no reconnection. In every case the pool is drained before this
/// returns, so no accepted envelope is left unresolved.
pub async fn run_consumer<S, E>(
    deliveries: S,
    pool: WorkerPool,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()>
where
    S: Stream<Item = Result<Envelope, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    tokio::pin!(deliveries);
    info!(workers = pool.size(), "Waiting for messages");

    let result = loop {
        tokio::select! {
            _ = shutdown.recv() => {
                info!("Received shutdown signal, stopping consumer");
                break Ok(());
            }
            next = deliveries.next() => {
                match next {
                    Some(Ok(envelope)) => {
                        debug!(delivery_tag = envelope.delivery_tag(), "Received message");
                        if let Err(e) = pool.submit(envelope).await {
                            break Err(e);
                        }
                    }
                    Some(Err(e)) => {
                        error!(error = %e, "Subscription failed");
                        break Err(anyhow::Error::new(e).context("Broker subscription failed"));
                    }
                    None => {
                        error!("Subscription closed by broker");
                        break Err(anyhow!("Broker subscription closed"));
                    }
                }
            }
        }
    };

    pool.shutdown().await;
    result
}
