//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (check per-client limits)
//!     → methods.rs (verb whitelist)
//!     → limits.rs (body size, content type)
//!     → path.rs (stay on the upstream origin)
//!     → headers.rs (allowlisted headers + credential)
//!     → Forward to upstream
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - No trust in client input

pub mod headers;
pub mod limits;
pub mod methods;
pub mod path;
pub mod rate_limit;

pub use limits::{BodySizeGuard, ContentTypeGuard};
pub use methods::MethodGuard;
pub use path::PathGuard;
pub use rate_limit::{rate_limit_middleware, RateLimiter};
