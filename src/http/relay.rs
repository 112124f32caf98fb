//! Relay handlers: publish, pull and drain through the shared broker handle.

use std::sync::Arc;

use axum::extract::{OriginalUri, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::broker::{Consumer, Publisher};
use crate::events::{DispatchStats, EventSink, LogType};
use crate::http::request::CorrelationId;
use crate::http::response::{ApiError, EMPTY_QUEUE_NOTICE};

/// Shared state injected into relay handlers.
#[derive(Debug, Clone)]
pub struct RelayState {
    pub publisher: Publisher,
    pub consumer: Arc<Consumer>,
    pub events: EventSink,
    pub application_name: Arc<str>,
}

#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct PublishResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct PullResponse {
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct DrainResponse {
    pub messages: Vec<String>,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub queue_depth: Option<u32>,
    pub event_log: DispatchStats,
}

pub async fn root(
    State(state): State<RelayState>,
    OriginalUri(uri): OriginalUri,
    correlation_id: CorrelationId,
) -> String {
    state.events.emit(
        LogType::Info,
        uri.path(),
        correlation_id.as_str(),
        "Request to the root endpoint.",
    );
    format!(
        "Hello, this is your {}! Correlation ID: {}",
        state.application_name.to_lowercase(),
        correlation_id
    )
}

pub async fn publish_message(
    State(state): State<RelayState>,
    correlation_id: CorrelationId,
    Json(body): Json<PublishRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.publisher.publish_text(&body.message).await?;
    tracing::info!(
        correlation_id = %correlation_id,
        bytes = body.message.len(),
        "Message relayed"
    );
    Ok((
        StatusCode::CREATED,
        Json(PublishResponse {
            status: "Message sent",
        }),
    ))
}

pub async fn pull_message(State(state): State<RelayState>) -> Result<Json<PullResponse>, ApiError> {
    let message = state.consumer.pull().await?;
    let notice = message.is_none().then_some(EMPTY_QUEUE_NOTICE);
    Ok(Json(PullResponse { message, notice }))
}

pub async fn drain_messages(
    State(state): State<RelayState>,
) -> Result<Json<DrainResponse>, ApiError> {
    let messages = state.consumer.drain().await?;
    let notice = messages.is_empty().then_some(EMPTY_QUEUE_NOTICE);
    Ok(Json(DrainResponse {
        count: messages.len(),
        messages,
        notice,
    }))
}

pub async fn health(State(state): State<RelayState>) -> impl IntoResponse {
    let event_log = state.events.stats();
    match state.consumer.depth().await {
        Ok(depth) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                queue_depth: Some(depth),
                event_log,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not reach the broker");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "broker_unavailable",
                    queue_depth: None,
                    event_log,
                }),
            )
        }
    }
}
