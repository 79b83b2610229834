//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Core commands (init, seed) and shared utilities (open_db)
//! - `serve` - Web server command
//! - `stats` - Portfolio statistics and categories
//! - `subscriptions` - Subscription management commands

pub mod core;
pub mod serve;
pub mod stats;
pub mod subscriptions;

// Re-export command functions for main.rs
pub use self::core::*;
pub use serve::*;
pub use stats::*;
pub use subscriptions::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
