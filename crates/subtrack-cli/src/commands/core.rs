//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `cmd_init` - Initialize the database
//! - `cmd_seed` - Load the sample portfolio

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use subtrack_core::Database;
use tracing::debug;

/// Open (or create) the database at `db_path`
pub fn open_db(db_path: &Path) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path must be valid UTF-8")?;
    debug!(path = path_str, "Opening database");
    Database::new(path_str).context("Failed to open database")
}

pub fn cmd_init(db_path: &Path) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let db = open_db(db_path)?;
    let existing = db.all_subscriptions()?.len();
    if existing > 0 {
        println!("   Found {} existing subscription(s)", existing);
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Add a subscription: subtrack add Netflix --monthly 15.99");
    println!("  2. Or load examples:   subtrack seed");
    println!("  3. Start web UI:       subtrack serve");

    Ok(())
}

pub fn cmd_seed(db: &Database, today: NaiveDate) -> Result<()> {
    let created = db
        .seed_sample_subscriptions(today)
        .context("Failed to load sample subscriptions")?;

    if created == 0 {
        println!("ℹ️  Sample subscriptions already present");
    } else {
        println!("✅ Added {} sample subscription(s)", created);
        println!("   View them with: subtrack list");
    }

    Ok(())
}
