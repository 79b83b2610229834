//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use subtrack_core::BillingCycle;

/// Subtrack - Keep track of what your subscriptions really cost
#[derive(Parser)]
#[command(name = "subtrack")]
#[command(about = "Self-hosted subscription tracker", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "subtrack.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Add a subscription
    Add {
        /// Service name
        name: String,

        /// Price per month
        #[arg(long)]
        monthly: Option<Decimal>,

        /// Price per year
        #[arg(long)]
        yearly: Option<Decimal>,

        /// Billing cycle: monthly or yearly
        #[arg(short, long, default_value = "monthly")]
        cycle: BillingCycle,

        /// First billing date, YYYY-MM-DD (defaults to today)
        #[arg(short, long)]
        start: Option<NaiveDate>,

        /// Category (e.g., Entertainment, Software)
        #[arg(long)]
        category: Option<String>,
    },

    /// List subscriptions in renewal order
    List {
        /// Only this category
        #[arg(long)]
        category: Option<String>,

        /// Only this billing cycle
        #[arg(short, long)]
        cycle: Option<BillingCycle>,

        /// Include removed subscriptions
        #[arg(short, long)]
        all: bool,
    },

    /// Show one subscription with its cost breakdown
    Show {
        /// Subscription ID
        id: i64,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change a subscription (only the given fields)
    Update {
        /// Subscription ID
        id: i64,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New monthly price
        #[arg(long)]
        monthly: Option<Decimal>,

        /// New yearly price
        #[arg(long)]
        yearly: Option<Decimal>,

        /// New billing cycle
        #[arg(short, long)]
        cycle: Option<BillingCycle>,

        /// New start date, YYYY-MM-DD
        #[arg(short, long)]
        start: Option<NaiveDate>,

        /// New category (empty string clears it)
        #[arg(long)]
        category: Option<String>,
    },

    /// Recompute the renewal date, or pin it with --date
    Renew {
        /// Subscription ID
        id: i64,

        /// Manual renewal date, YYYY-MM-DD (must not be in the past)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Remove a subscription (kept for lifetime spend)
    Remove {
        /// Subscription ID
        id: i64,
    },

    /// Show portfolio statistics
    Stats {
        /// Compute as of this date instead of today, YYYY-MM-DD
        #[arg(long)]
        today: Option<NaiveDate>,

        /// Upcoming renewal window in days (0-366)
        #[arg(short, long, default_value = "7", value_parser = clap::value_parser!(i64).range(0..=366))]
        window: i64,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// List categories in use
    Categories,

    /// Load a sample portfolio
    Seed,

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Directory containing static files to serve (e.g., ui/dist)
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },
}
