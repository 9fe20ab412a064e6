//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (structured fields)
//!     → access_log.rs (one line per request: status, cache, latency)
//!
//! Consumers:
//!     → stdout, pretty or JSON lines (logging.rs)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through every log line of a request
//! - No metrics endpoint; logs are the only output

pub mod access_log;
pub mod logging;

pub use access_log::access_log_middleware;
pub use logging::init_logging;
