//! Broker topology and error definitions.

use thiserror::Error;

use crate::config::BrokerConfig;

/// Routing key event-log records use unless configured otherwise.
pub const DEFAULT_EVENT_ROUTING_KEY: &str = "event_log";

/// Which binding a publish is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Relay messages, consumed from `Topology::queue`.
    Messages,
    /// Event-log records, kept apart in `Topology::event_queue`.
    Events,
}

/// Exchange and queues a broker handle is bound to.
///
/// Both queues hang off the same direct exchange under different routing
/// keys, so relay consumers never see event-log records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    /// Durable exchange messages are published to.
    pub exchange: String,
    /// Durable queue holding relay messages.
    pub queue: String,
    /// Routing key binding `queue`.
    pub routing_key: String,
    /// Durable queue holding event-log records.
    pub event_queue: String,
    /// Routing key binding `event_queue`.
    pub event_routing_key: String,
}

impl Topology {
    /// Relay binding as given; the event binding defaults to
    /// `<queue>.events` under [`DEFAULT_EVENT_ROUTING_KEY`].
    pub fn new(
        exchange: impl Into<String>,
        queue: impl Into<String>,
        routing_key: impl Into<String>,
    ) -> Self {
        let queue = queue.into();
        Self {
            exchange: exchange.into(),
            event_queue: format!("{}.events", queue),
            event_routing_key: DEFAULT_EVENT_ROUTING_KEY.to_string(),
            queue,
            routing_key: routing_key.into(),
        }
    }

    pub fn with_event_route(
        mut self,
        event_queue: impl Into<String>,
        event_routing_key: impl Into<String>,
    ) -> Self {
        self.event_queue = event_queue.into();
        self.event_routing_key = event_routing_key.into();
        self
    }

    pub fn routing_key_for(&self, route: Route) -> &str {
        match route {
            Route::Messages => &self.routing_key,
            Route::Events => &self.event_routing_key,
        }
    }
}

impl From<&BrokerConfig> for Topology {
    fn from(config: &BrokerConfig) -> Self {
        Self::new(&config.exchange, &config.queue, &config.routing_key)
            .with_event_route(&config.event_queue, &config.event_routing_key)
    }
}

/// Errors that can occur during broker operations.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// The AMQP client reported a connection, channel or protocol failure.
    #[error("AMQP error: {0}")]
    Amqp(#[from] lapin::Error),

    /// A broker operation did not complete in time.
    #[error("Broker operation '{operation}' timed out after {timeout_ms} ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    /// No usable broker connection.
    #[error("Broker not available: {0}")]
    NotAvailable(String),

    /// The broker refused a publish it had been asked to confirm.
    #[error("Broker rejected message published to exchange '{exchange}'")]
    Rejected { exchange: String },

    /// A payload could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for broker operations.
pub type BrokerResult<T> = Result<T, BrokerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topology_from_config() {
        let config = BrokerConfig {
            exchange: "ex".into(),
            queue: "q".into(),
            ..BrokerConfig::default()
        };
        let topology = Topology::from(&config);
        assert_eq!(
            topology,
            Topology::new("ex", "q", "").with_event_route("rv1_sipia_4.events", "event_log")
        );
    }

    #[test]
    fn test_routes_use_distinct_keys() {
        let topology = Topology::new("ex", "q", "");
        assert_eq!(topology.event_queue, "q.events");
        assert_eq!(topology.routing_key_for(Route::Messages), "");
        assert_eq!(topology.routing_key_for(Route::Events), DEFAULT_EVENT_ROUTING_KEY);
    }

    #[test]
    fn test_error_display() {
        let err = BrokerError::Timeout {
            operation: "publish",
            timeout_ms: 250,
        };
        assert_eq!(
            err.to_string(),
            "Broker operation 'publish' timed out after 250 ms"
        );

        let err = BrokerError::NotAvailable("connection refused".into());
        assert_eq!(err.to_string(), "Broker not available: connection refused");

        let err = BrokerError::Rejected {
            exchange: "rv1_sipia_4".into(),
        };
        assert_eq!(
            err.to_string(),
            "Broker rejected message published to exchange 'rv1_sipia_4'"
        );
    }
}
