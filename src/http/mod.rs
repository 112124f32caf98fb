//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, trace + timeout layers)
//!     → request.rs (assign / read x-correlation-id)
//!     → middleware/event_log.rs ("Incoming request" record to the broker)
//!     → relay.rs (publish / pull / drain)
//!     → response.rs (broker errors → status codes)
//! ```

pub mod middleware;
pub mod relay;
pub mod request;
pub mod response;
pub mod server;

pub use request::{CorrelationId, X_CORRELATION_ID};
pub use response::{ApiError, EMPTY_QUEUE_NOTICE};
pub use server::HttpServer;
