//! Request event logging middleware.
//!
//! Publishes an "Incoming request" record for every request before it reaches
//! its handler. The handler always runs. When the record cannot be published,
//! an error record is attempted and the original failure is attached to the
//! request as [`EventLogFailure`] for the steps further down the chain.

use std::fmt;
use std::sync::Arc;

use axum::extract::{OriginalUri, Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::broker::BrokerError;
use crate::config::EventLogConfig;
use crate::events::{EventLogger, LogType};
use crate::http::request::CorrelationId;

/// Middleware state.
#[derive(Debug, Clone)]
pub struct EventLogState {
    logger: EventLogger,
    success_log_type: LogType,
    error_log_type: LogType,
}

impl EventLogState {
    pub fn new(logger: EventLogger, success_log_type: LogType, error_log_type: LogType) -> Self {
        Self {
            logger,
            success_log_type,
            error_log_type,
        }
    }

    pub fn from_config(logger: EventLogger, config: &EventLogConfig) -> Self {
        Self::new(
            logger,
            LogType::from(config.success_log_type.as_str()),
            LogType::from(config.error_log_type.as_str()),
        )
    }
}

/// The error that stopped the incoming-request event from being published.
#[derive(Debug, Clone)]
pub struct EventLogFailure(Arc<BrokerError>);

impl EventLogFailure {
    pub fn error(&self) -> &BrokerError {
        &self.0
    }
}

impl fmt::Display for EventLogFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

pub async fn event_log_middleware(
    State(state): State<EventLogState>,
    mut request: Request,
    next: Next,
) -> Response {
    let correlation_id = CorrelationId::from_headers(request.headers());
    let url = source_url(&request);

    let logged = state
        .logger
        .try_log(
            state.success_log_type.clone(),
            &url,
            correlation_id.as_str(),
            "Incoming request",
        )
        .await;

    if let Err(err) = logged {
        tracing::warn!(
            correlation_id = %correlation_id,
            url = %url,
            error = %err,
            "Incoming request event not published"
        );
        state
            .logger
            .log(
                state.error_log_type.clone(),
                &url,
                correlation_id.as_str(),
                format!("Error: {}", err),
            )
            .await;
        request
            .extensions_mut()
            .insert(EventLogFailure(Arc::new(err)));
    }

    next.run(request).await
}

/// Path and query as the client sent them, before any router nesting.
fn source_url(request: &Request) -> String {
    let uri = request
        .extensions()
        .get::<OriginalUri>()
        .map(|original| &original.0)
        .unwrap_or_else(|| request.uri());
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}
