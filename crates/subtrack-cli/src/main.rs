//! Subtrack CLI - Subscription tracker
//!
//! Usage:
//!   subtrack init                          Initialize database
//!   subtrack add Netflix --monthly 15.99   Track a subscription
//!   subtrack stats                         Portfolio statistics
//!   subtrack serve --port 3000             Start web server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use subtrack_core::{Clock, SubscriptionFilter, SubscriptionInput, SystemClock};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    // Read the clock once per command
    let today = SystemClock.today();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db),
        Commands::Add {
            name,
            monthly,
            yearly,
            cycle,
            start,
            category,
        } => {
            let db = commands::open_db(&cli.db)?;
            let input = SubscriptionInput {
                name,
                monthly_price: monthly,
                yearly_price: yearly,
                billing_cycle: cycle,
                start_date: start.unwrap_or(today),
                category,
            };
            commands::cmd_add(&db, &input, today)
        }
        Commands::List {
            category,
            cycle,
            all,
        } => {
            let db = commands::open_db(&cli.db)?;
            let filter = SubscriptionFilter {
                category,
                billing_cycle: cycle,
                include_inactive: all,
            };
            commands::cmd_list(&db, &filter, today)
        }
        Commands::Show { id, json } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_show(&db, id, json, today)
        }
        Commands::Update {
            id,
            name,
            monthly,
            yearly,
            cycle,
            start,
            category,
        } => {
            let db = commands::open_db(&cli.db)?;
            let changes = commands::SubscriptionChanges {
                name,
                monthly_price: monthly,
                yearly_price: yearly,
                billing_cycle: cycle,
                start_date: start,
                category,
            };
            commands::cmd_update(&db, id, changes, today)
        }
        Commands::Renew { id, date } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_renew(&db, id, date, today)
        }
        Commands::Remove { id } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_remove(&db, id)
        }
        Commands::Stats {
            today: as_of,
            window,
            json,
        } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_stats(&db, as_of.unwrap_or(today), window, json)
        }
        Commands::Categories => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_categories(&db)
        }
        Commands::Seed => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_seed(&db, today)
        }
        Commands::Serve {
            port,
            host,
            static_dir,
        } => commands::cmd_serve(&cli.db, &host, port, static_dir.as_deref()).await,
    }
}
