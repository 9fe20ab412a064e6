//! Upstream subsystem: where requests go and how they get there.

pub mod client;
pub mod target;

pub use client::UpstreamClient;
pub use target::UpstreamTarget;
