//! Mapping broker failures onto HTTP responses.
//!
//! Clients only ever see a generic message; the broker error itself goes to
//! the log.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::broker::BrokerError;

/// Text returned in place of a payload when the queue is empty.
pub const EMPTY_QUEUE_NOTICE: &str = "No messages available";

/// Error returned by relay handlers.
#[derive(Debug)]
pub struct ApiError(BrokerError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            BrokerError::NotAvailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            BrokerError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            BrokerError::Amqp(_)
            | BrokerError::Rejected { .. }
            | BrokerError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<BrokerError> for ApiError {
    fn from(err: BrokerError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::error!(status = %status, error = %self.0, "Broker request failed");
        let message = match status {
            StatusCode::SERVICE_UNAVAILABLE => "Message broker unavailable",
            StatusCode::GATEWAY_TIMEOUT => "Message broker timed out",
            _ => "Internal server error",
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
