//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID)
//!     → pipeline (guards) → cache → upstream
//!     → response.rs (x-cache, relayed headers)
//!     → cors.rs / access log on the way out
//!     → Send to client
//! ```

pub mod cors;
pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuidV4, X_REQUEST_ID};
pub use response::{CacheStatus, ProxiedResponse, X_CACHE};
pub use server::{AppState, HttpServer};
