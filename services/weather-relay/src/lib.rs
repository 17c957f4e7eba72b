//! Weather relay service.
//!
//! Consumes OpenWeatherMap observations from a RabbitMQ queue, reduces each
//! one to a weather summary and posts it to the ingestion API. Messages are
//! acked only after the API accepts the summary; malformed or undeliverable
//! messages are nacked without requeue.

pub mod broker;
pub mod config;
pub mod consumer;
pub mod dispatch;
pub mod envelope;
pub mod relay;
pub mod server;
pub mod stats;

pub use broker::{BrokerSession, ConnectPolicy};
pub use config::{PoolConfig, RelayArgs, RelayConfig};
pub use consumer::{run_consumer, WorkerPool};
pub use dispatch::{DeliveryConfig, DeliveryOutcome, Dispatcher};
pub use envelope::{Acknowledge, Envelope};
pub use relay::{Outcome, Relay};
pub use stats::{RelayStats, StatsSnapshot};
