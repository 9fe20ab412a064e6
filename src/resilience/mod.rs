//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to upstream (inside the upstream deadline):
//!     → attempt
//!     → On failure: retries.rs (check if retryable)
//!     → backoff.rs (sleep with jitter) → next attempt
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every upstream call has a deadline
//! - Retries only for idempotent reads
//! - Jittered backoff prevents thundering herd

pub mod backoff;
pub mod retries;

pub use backoff::calculate_backoff;
pub use retries::is_retryable;
