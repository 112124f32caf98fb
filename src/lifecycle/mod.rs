//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Connect broker → Build logger/dispatcher/server → Serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Flush event queue → Close broker
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Broker connection failure is logged, the service starts anyway
//! - Queued events are flushed before the broker is closed

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::Service;
