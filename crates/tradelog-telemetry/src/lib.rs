//! Prometheus metrics and structured logging for the trade list engine.
//!
//! - Prometheus counters for intents, fetches, cache and storage behaviour
//! - Structured logging with tracing (JSON in production)

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
