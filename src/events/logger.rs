//! Event logger: builds log records and publishes them.

use std::sync::Arc;

use crate::broker::{BrokerResult, Publisher};
use crate::events::record::{LogRecord, LogType, MonotonicClock};
use crate::observability::metrics;

/// Publishes structured log records on behalf of one application.
#[derive(Debug, Clone)]
pub struct EventLogger {
    publisher: Publisher,
    application_name: Arc<str>,
    clock: Arc<MonotonicClock>,
}

impl EventLogger {
    pub fn new(publisher: Publisher, application_name: impl Into<String>) -> Self {
        Self {
            publisher,
            application_name: Arc::from(application_name.into()),
            clock: Arc::new(MonotonicClock::new()),
        }
    }

    /// Build a record stamped with the current time.
    pub fn record(
        &self,
        log_type: LogType,
        url: &str,
        correlation_id: &str,
        message: impl Into<String>,
    ) -> LogRecord {
        LogRecord::new(
            self.clock.now(),
            log_type,
            url,
            correlation_id,
            self.application_name.as_ref(),
            message,
        )
    }

    /// Publish an already built record, propagating any failure.
    pub async fn publish(&self, record: &LogRecord) -> BrokerResult<()> {
        self.publisher.publish_json(record).await
    }

    /// Build and publish a record, propagating any failure.
    pub async fn try_log(
        &self,
        log_type: LogType,
        url: &str,
        correlation_id: &str,
        message: impl Into<String>,
    ) -> BrokerResult<()> {
        let record = self.record(log_type, url, correlation_id, message);
        self.publish(&record).await
    }

    /// Build and publish a record. Failures are reported locally and dropped.
    pub async fn log(
        &self,
        log_type: LogType,
        url: &str,
        correlation_id: &str,
        message: impl Into<String>,
    ) {
        if let Err(e) = self.try_log(log_type, url, correlation_id, message).await {
            metrics::record_event_log_failure();
            tracing::warn!(
                correlation_id = %correlation_id,
                url = %url,
                error = %e,
                "Error logging event"
            );
        }
    }

    pub fn application_name(&self) -> &str {
        &self.application_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::{InMemoryBroker, MessageBroker, Topology};

    fn setup() -> (Arc<InMemoryBroker>, EventLogger) {
        let broker = Arc::new(InMemoryBroker::new(Topology::new("ex", "q", "")));
        let logger = EventLogger::new(Publisher::new(broker.clone()), "Recommendation service");
        (broker, logger)
    }

    async fn next_record(broker: &InMemoryBroker) -> LogRecord {
        let payload = broker.fetch_one().await.unwrap().unwrap();
        serde_json::from_slice(&payload).unwrap()
    }

    #[tokio::test]
    async fn test_try_log_publishes_record() {
        let (broker, logger) = setup();
        logger
            .try_log(LogType::Warning, "/api/messages", "abc-123", "slow consumer")
            .await
            .unwrap();

        let record = next_record(&broker).await;
        assert_eq!(record.log_type(), &LogType::Warning);
        assert_eq!(record.url(), "/api/messages");
        assert_eq!(record.correlation_id(), "abc-123");
        assert_eq!(record.application_name(), "Recommendation service");
        assert_eq!(record.message(), "slow consumer");
    }

    #[tokio::test]
    async fn test_timestamps_non_decreasing() {
        let (broker, logger) = setup();
        for i in 0..20 {
            logger.log(LogType::Info, "/", "c", format!("event {}", i)).await;
        }

        let mut previous = None;
        for _ in 0..20 {
            let record = next_record(&broker).await;
            if let Some(prev) = previous {
                assert!(record.timestamp() >= prev);
            }
            previous = Some(record.timestamp());
        }
    }

    #[tokio::test]
    async fn test_log_swallows_failure() {
        let (broker, logger) = setup();
        broker.set_offline(true);

        // Must return normally.
        logger.log(LogType::Info, "/", "c", "dropped").await;
        assert!(logger.try_log(LogType::Info, "/", "c", "dropped").await.is_err());

        broker.set_offline(false);
        assert!(broker.is_empty());
    }
}
