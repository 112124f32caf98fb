//! Configuration validation.
//!
//! Serde handles syntax; this module checks values that parse but cannot work.
//! Every failed check is reported, not just the first one.

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::{BrokerBackend, RelayConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    /// What is wrong with it.
    pub reason: String,
}

impl ValidationError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    let broker = &config.broker;
    if broker.backend == BrokerBackend::Amqp
        && !(broker.url.starts_with("amqp://") || broker.url.starts_with("amqps://"))
    {
        errors.push(ValidationError::new(
            "broker.url",
            "must start with amqp:// or amqps://",
        ));
    }
    if broker.exchange.trim().is_empty() {
        errors.push(ValidationError::new("broker.exchange", "must not be empty"));
    }
    if broker.queue.trim().is_empty() {
        errors.push(ValidationError::new("broker.queue", "must not be empty"));
    }
    if broker.event_queue.trim().is_empty() {
        errors.push(ValidationError::new("broker.event_queue", "must not be empty"));
    } else if broker.event_queue == broker.queue {
        errors.push(ValidationError::new(
            "broker.event_queue",
            "must differ from broker.queue",
        ));
    }
    if broker.event_routing_key == broker.routing_key {
        errors.push(ValidationError::new(
            "broker.event_routing_key",
            "must differ from broker.routing_key",
        ));
    }
    if broker.operation_timeout_ms == 0 {
        errors.push(ValidationError::new(
            "broker.operation_timeout_ms",
            "must be greater than zero",
        ));
    }

    let event_log = &config.event_log;
    if event_log.application_name.trim().is_empty() {
        errors.push(ValidationError::new(
            "event_log.application_name",
            "must not be empty",
        ));
    }
    if event_log.success_log_type.trim().is_empty() {
        errors.push(ValidationError::new(
            "event_log.success_log_type",
            "must not be empty",
        ));
    }
    if event_log.error_log_type.trim().is_empty() {
        errors.push(ValidationError::new(
            "event_log.error_log_type",
            "must not be empty",
        ));
    }
    if event_log.queue_capacity == 0 {
        errors.push(ValidationError::new(
            "event_log.queue_capacity",
            "must be greater than zero",
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            "must be greater than zero",
        ));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!(
                "'{}' is not a socket address",
                config.observability.metrics_address
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&RelayConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = RelayConfig::default();
        config.broker.url = "http://localhost".into();
        config.broker.queue = "  ".into();
        config.event_log.queue_capacity = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["broker.url", "broker.queue", "event_log.queue_capacity"]
        );
    }

    #[test]
    fn test_event_binding_must_be_separate() {
        let mut config = RelayConfig::default();
        config.broker.event_queue = config.broker.queue.clone();
        config.broker.event_routing_key = config.broker.routing_key.clone();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, ["broker.event_queue", "broker.event_routing_key"]);
    }

    #[test]
    fn test_memory_backend_ignores_url() {
        let mut config = RelayConfig::default();
        config.broker.backend = BrokerBackend::Memory;
        config.broker.url = String::new();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_error_display() {
        let err = ValidationError::new("broker.exchange", "must not be empty");
        assert_eq!(err.to_string(), "broker.exchange: must not be empty");
    }
}
