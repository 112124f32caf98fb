//! Message broker subsystem.
//!
//! # Data Flow
//! ```text
//! BrokerConfig
//!     → connect() (amqp.rs or memory.rs, picked by backend)
//!     → Arc<dyn MessageBroker> (one handle per process)
//!     → publisher.rs (publish to the configured exchange, per Route)
//!     → consumer.rs (pull / drain the relay queue)
//! ```
//!
//! # Design Decisions
//! - The handle is owned and injected, never a global
//! - Exchange, queues and routing keys come from one `BrokerConfig`
//! - Event-log records have their own queue, so consumers only see relay messages
//! - Publishing shares the handle freely; consuming is serialized by `Consumer`
//! - No retry or reconnection: failures surface to the caller

pub mod amqp;
pub mod consumer;
pub mod memory;
pub mod publisher;
pub mod types;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{BrokerBackend, BrokerConfig};

pub use amqp::AmqpBroker;
pub use consumer::Consumer;
pub use memory::InMemoryBroker;
pub use publisher::Publisher;
pub use types::{BrokerError, BrokerResult, Route, Topology};

/// Operations every broker backend provides.
#[async_trait]
pub trait MessageBroker: Send + Sync + std::fmt::Debug {
    /// Publish a payload to the bound exchange under `route`'s routing key.
    async fn publish(&self, route: Route, payload: &[u8]) -> BrokerResult<()>;

    /// Number of relay messages currently ready.
    async fn queue_depth(&self) -> BrokerResult<u32>;

    /// Take one relay message off the queue and acknowledge it.
    ///
    /// `None` when the queue turned out to be empty.
    async fn fetch_one(&self) -> BrokerResult<Option<Vec<u8>>>;

    /// Release the connection. Further operations fail.
    async fn close(&self) -> BrokerResult<()> {
        Ok(())
    }

    /// The exchange and queues this handle was set up with.
    fn topology(&self) -> &Topology;
}

/// Stand-in handle used when the broker could not be reached at startup.
#[derive(Debug)]
pub struct Disconnected {
    topology: Topology,
    reason: String,
}

impl Disconnected {
    pub fn new(topology: Topology, reason: impl Into<String>) -> Self {
        Self {
            topology,
            reason: reason.into(),
        }
    }

    fn error(&self) -> BrokerError {
        BrokerError::NotAvailable(self.reason.clone())
    }
}

#[async_trait]
impl MessageBroker for Disconnected {
    async fn publish(&self, _route: Route, _payload: &[u8]) -> BrokerResult<()> {
        Err(self.error())
    }

    async fn queue_depth(&self) -> BrokerResult<u32> {
        Err(self.error())
    }

    async fn fetch_one(&self) -> BrokerResult<Option<Vec<u8>>> {
        Err(self.error())
    }

    fn topology(&self) -> &Topology {
        &self.topology
    }
}

/// Set up the broker described by `config`.
///
/// Errors are returned as-is; see [`connect_or_disconnected`] for the
/// non-fatal startup path.
pub async fn connect(config: &BrokerConfig) -> BrokerResult<Arc<dyn MessageBroker>> {
    match config.backend {
        BrokerBackend::Amqp => Ok(Arc::new(AmqpBroker::connect(config).await?)),
        BrokerBackend::Memory => Ok(Arc::new(InMemoryBroker::new(Topology::from(config)))),
    }
}

/// Set up the broker, falling back to a [`Disconnected`] handle on failure.
///
/// Losing the broker must not take the process down; every later broker
/// operation reports the original connection failure instead.
pub async fn connect_or_disconnected(config: &BrokerConfig) -> Arc<dyn MessageBroker> {
    match connect(config).await {
        Ok(broker) => broker,
        Err(e) => {
            tracing::error!(
                error = %e,
                exchange = %config.exchange,
                queue = %config.queue,
                "Error setting up message broker; continuing without it"
            );
            Arc::new(Disconnected::new(Topology::from(config), e.to_string()))
        }
    }
}
