//! Event logging subsystem.
//!
//! # Data Flow
//! ```text
//! middleware / handler
//!     → logger.rs (stamp LogRecord with the monotonic clock)
//!     → awaited:  EventLogger::try_log / log → Publisher
//!     → detached: EventSink::emit → dispatcher.rs task → Publisher
//! ```
//!
//! # Design Decisions
//! - Records are immutable and serialized as camelCase JSON
//! - Only `try_log` reports failures to its caller

pub mod dispatcher;
pub mod logger;
pub mod record;

pub use dispatcher::{DispatchStats, EventDispatcher, EventSink};
pub use logger::EventLogger;
pub use record::{LogRecord, LogType, MonotonicClock};
