//! Weather relay entry point.
//!
//! Startup failures (bad configuration, broker unreachable after the
//! configured attempts) are returned from `main` and end the process with a
//! non-zero exit code. So does losing the subscription later on.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::broadcast;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use weather_relay::server::{self, ServerState};
use weather_relay::{
    run_consumer, BrokerSession, Dispatcher, Relay, RelayArgs, RelayConfig, RelayStats, WorkerPool,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = RelayArgs::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    let status_port = args.status_port;
    let status_server = !args.no_status_server;

    let config = RelayConfig::from(args);
    config.validate().context("Invalid configuration")?;

    info!(
        broker = %config.broker_display(),
        queue = %config.queue_name,
        endpoint = %config.endpoint_display(),
        workers = config.pool.workers,
        prefetch = config.pool.prefetch,
        "Starting weather relay"
    );

    let session = BrokerSession::connect(&config.broker_url, &config.connect).await?;

    // validate() bounds prefetch to u16
    let prefetch = u16::try_from(config.pool.prefetch).context("Prefetch out of range")?;
    let deliveries = session
        .subscribe(
            &config.queue_name,
            &config.consumer_tag,
            prefetch,
            config.declare_queue,
        )
        .await?;

    let stats = Arc::new(RelayStats::new());
    let dispatcher = Dispatcher::new(config.endpoint_url.clone(), config.delivery.clone())?;
    let relay = Arc::new(Relay::new(dispatcher, stats.clone()));

    if status_server {
        let server_state = Arc::new(ServerState {
            stats: stats.clone(),
            queue: config.queue_name.clone(),
            endpoint: config.endpoint_display(),
            workers: config.pool.workers,
            prefetch: config.pool.prefetch,
            prometheus: Some(prometheus_handle),
        });
        tokio::spawn(async move {
            if let Err(e) = server::run_server(server_state, status_port).await {
                error!(error = %e, "Status server failed");
            }
        });
    }

    // Shutdown signal
    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let shutdown_tx_clone = shutdown_tx.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        shutdown_tx_clone.send(()).ok();
    });

    let pool = WorkerPool::spawn(config.pool.workers, config.pool.queue_capacity, relay);
    let result = run_consumer(deliveries, pool, shutdown_tx.subscribe()).await;

    session.close().await;

    let snapshot = stats.snapshot();
    info!(
        received = snapshot.received,
        confirmed = snapshot.confirmed,
        rejected_malformed = snapshot.rejected_malformed,
        rejected_undeliverable = snapshot.rejected_undeliverable,
        ack_failures = snapshot.ack_failures,
        "Relay session complete"
    );

    result
}
