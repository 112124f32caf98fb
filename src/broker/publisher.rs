//! Publishing to the configured exchange.
//!
//! A publisher is tied to one [`Route`]: relay handlers publish messages,
//! the event logger publishes records to the event queue.

use std::sync::Arc;

use serde::Serialize;

use crate::broker::types::{BrokerResult, Route};
use crate::broker::MessageBroker;
use crate::observability::metrics;

/// Publishes payloads through a shared broker handle.
#[derive(Debug, Clone)]
pub struct Publisher {
    broker: Arc<dyn MessageBroker>,
    route: Route,
}

impl Publisher {
    /// Publisher for relay messages.
    pub fn new(broker: Arc<dyn MessageBroker>) -> Self {
        Self {
            broker,
            route: Route::Messages,
        }
    }

    /// Publisher for event-log records.
    pub fn for_events(broker: Arc<dyn MessageBroker>) -> Self {
        Self {
            broker,
            route: Route::Events,
        }
    }

    /// Publish a raw string exactly as given.
    pub async fn publish_text(&self, message: &str) -> BrokerResult<()> {
        self.publish_bytes(message.as_bytes()).await
    }

    /// Publish the JSON encoding of `value`.
    pub async fn publish_json<T: Serialize>(&self, value: &T) -> BrokerResult<()> {
        let payload = serde_json::to_vec(value)?;
        self.publish_bytes(&payload).await
    }

    async fn publish_bytes(&self, payload: &[u8]) -> BrokerResult<()> {
        let topology = self.broker.topology();
        let routing_key = topology.routing_key_for(self.route);
        match self.broker.publish(self.route, payload).await {
            Ok(()) => {
                metrics::record_published(&topology.exchange);
                tracing::debug!(
                    exchange = %topology.exchange,
                    routing_key = %routing_key,
                    bytes = payload.len(),
                    "Message sent to broker"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    exchange = %topology.exchange,
                    routing_key = %routing_key,
                    error = %e,
                    "Error sending message to broker"
                );
                Err(e)
            }
        }
    }

    pub fn route(&self) -> Route {
        self.route
    }

    /// The broker handle this publisher writes to.
    pub fn broker(&self) -> &Arc<dyn MessageBroker> {
        &self.broker
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::{InMemoryBroker, Topology};

    #[tokio::test]
    async fn test_text_is_published_verbatim() {
        let broker = Arc::new(InMemoryBroker::new(Topology::new("ex", "q", "")));
        let publisher = Publisher::new(broker.clone());

        publisher.publish_text("héllo wörld").await.unwrap();
        let payload = broker.fetch_one().await.unwrap().unwrap();
        assert_eq!(payload, "héllo wörld".as_bytes());
    }

    #[tokio::test]
    async fn test_json_payload() {
        let broker = Arc::new(InMemoryBroker::new(Topology::new("ex", "q", "")));
        let publisher = Publisher::new(broker.clone());

        publisher
            .publish_json(&serde_json::json!({ "bookId": "2" }))
            .await
            .unwrap();
        let payload = broker.fetch_one().await.unwrap().unwrap();
        assert_eq!(payload, br#"{"bookId":"2"}"#);
    }

    #[tokio::test]
    async fn test_event_publisher_uses_event_queue() {
        let broker = Arc::new(InMemoryBroker::new(Topology::new("ex", "q", "")));
        let publisher = Publisher::for_events(broker.clone());

        publisher.publish_text("record").await.unwrap();
        assert_eq!(publisher.route(), Route::Events);
        assert!(broker.is_empty());
        assert_eq!(broker.take_event().unwrap(), b"record");
    }

    #[tokio::test]
    async fn test_failure_propagates() {
        let broker = Arc::new(InMemoryBroker::new(Topology::new("ex", "q", "")));
        broker.set_offline(true);
        let publisher = Publisher::new(broker);

        assert!(publisher.publish_text("x").await.is_err());
    }
}
