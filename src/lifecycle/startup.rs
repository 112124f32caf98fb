//! Startup orchestration.
//!
//! # Responsibilities
//! - Connect the broker (failure degrades, never aborts)
//! - Build the event logger, the dispatch channel and the HTTP server
//! - Run server and dispatcher until shutdown, then flush and close the broker

use std::sync::Arc;

use tokio::net::TcpListener;

use crate::broker::{self, MessageBroker, Publisher};
use crate::config::RelayConfig;
use crate::events::{dispatcher, EventDispatcher, EventLogger};
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;

/// A fully wired relay, ready to serve.
pub struct Service {
    server: HttpServer,
    dispatcher: EventDispatcher,
    broker: Arc<dyn MessageBroker>,
    shutdown: Shutdown,
}

impl Service {
    /// Connect to the configured broker and wire everything around it.
    pub async fn build(config: RelayConfig) -> Self {
        let broker = broker::connect_or_disconnected(&config.broker).await;
        Self::with_broker(config, broker)
    }

    /// Wire the service around an existing broker handle.
    pub fn with_broker(config: RelayConfig, broker: Arc<dyn MessageBroker>) -> Self {
        let logger = EventLogger::new(
            Publisher::for_events(broker.clone()),
            config.event_log.application_name.clone(),
        );
        let (events, dispatcher) =
            dispatcher::channel(logger.clone(), config.event_log.queue_capacity);
        let events = events.with_enabled(config.event_log.enabled);
        let server = HttpServer::new(config, broker.clone(), logger, events);

        Self {
            server,
            dispatcher,
            broker,
            shutdown: Shutdown::new(),
        }
    }

    /// Handle that stops [`Service::run`] when triggered.
    pub fn shutdown(&self) -> Shutdown {
        self.shutdown.clone()
    }

    pub fn config(&self) -> &RelayConfig {
        self.server.config()
    }

    /// Serve until shutdown, then drain pending events and close the broker.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let Self {
            server,
            dispatcher,
            broker,
            shutdown,
        } = self;

        let dispatcher_task = tokio::spawn(dispatcher.run(shutdown.subscribe()));
        let served = server.run(listener, shutdown.subscribe()).await;

        // The server may have stopped on its own; make sure the dispatcher follows.
        shutdown.trigger();
        if let Err(e) = dispatcher_task.await {
            tracing::error!(error = %e, "Event dispatcher task failed");
        }
        if let Err(e) = broker.close().await {
            tracing::warn!(error = %e, "Error closing message broker");
        }

        served
    }
}
