//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod stats;
pub mod subscriptions;

// Re-export all handlers for use in router
pub use stats::*;
pub use subscriptions::*;
