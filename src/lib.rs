//! Message broker relay with request event logging.

pub mod broker;
pub mod config;
pub mod events;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::schema::RelayConfig;
pub use http::HttpServer;
pub use lifecycle::{Service, Shutdown};
