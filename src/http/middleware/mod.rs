//! HTTP middleware.

pub mod event_log;

pub use event_log::{event_log_middleware, EventLogFailure, EventLogState};
