//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the relay handlers
//! - Wire up middleware (tracing, correlation ID, timeout, event logging)
//! - Serve on a bound listener until shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::middleware;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::broker::{Consumer, MessageBroker, Publisher};
use crate::config::RelayConfig;
use crate::events::{EventLogger, EventSink};
use crate::http::middleware::{event_log_middleware, EventLogState};
use crate::http::relay::{self, RelayState};
use crate::http::request::{propagate_correlation_id_layer, set_correlation_id_layer};
use crate::lifecycle::shutdown;

/// HTTP server for the broker relay.
pub struct HttpServer {
    router: Router,
    config: RelayConfig,
}

impl HttpServer {
    /// Create a server around an already connected broker handle.
    ///
    /// `events` is the detached sink used by handlers; the middleware logs
    /// through `logger` directly so it can see publish failures.
    pub fn new(
        config: RelayConfig,
        broker: Arc<dyn MessageBroker>,
        logger: EventLogger,
        events: EventSink,
    ) -> Self {
        let state = RelayState {
            publisher: Publisher::new(broker.clone()),
            consumer: Arc::new(Consumer::new(broker)),
            events,
            application_name: Arc::from(config.event_log.application_name.as_str()),
        };
        let event_log = config
            .event_log
            .enabled
            .then(|| EventLogState::from_config(logger, &config.event_log));

        let router = Self::build_router(&config, state, event_log);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(
        config: &RelayConfig,
        state: RelayState,
        event_log: Option<EventLogState>,
    ) -> Router {
        let mut relay_routes = Router::new()
            .route("/", get(relay::root))
            .route(
                "/api/messages",
                get(relay::drain_messages).post(relay::publish_message),
            )
            .route("/api/messages/next", get(relay::pull_message))
            .with_state(state.clone());

        if let Some(event_log) = event_log {
            relay_routes =
                relay_routes.layer(middleware::from_fn_with_state(event_log, event_log_middleware));
        }

        // Health checks stay out of the event log.
        let health_routes = Router::new()
            .route("/health", get(relay::health))
            .with_state(state);

        relay_routes
            .merge(health_routes)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(propagate_correlation_id_layer())
            .layer(set_correlation_id_layer())
            .layer(TraceLayer::new_for_http())
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }
}
