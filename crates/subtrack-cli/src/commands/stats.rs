//! Portfolio statistics commands (stats, categories)

use anyhow::Result;
use chrono::NaiveDate;
use subtrack_core::{Database, StatsConfig};

use super::truncate;

pub fn cmd_stats(db: &Database, today: NaiveDate, window_days: i64, json: bool) -> Result<()> {
    let config = StatsConfig {
        upcoming_window_days: window_days,
        ..Default::default()
    };
    let stats = db.portfolio_stats_with_config(today, &config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!();
    println!("📊 Subscription Portfolio ({})", today);
    println!("   ─────────────────────────────────────────────");
    println!(
        "   Active subscriptions: {}",
        stats.total_active_subscriptions
    );
    println!("   Per month:            ${:.2}", stats.total_monthly_cost);
    println!("   Per year:             ${:.2}", stats.total_yearly_cost);
    println!("   Total spent (est.):   ${:.2}", stats.total_spent);
    if let Some(days) = stats.time_since_first_subscription {
        println!("   Tracking for:         {} days", days);
    }

    if !stats.category_breakdown.is_empty() {
        println!();
        println!("   📁 By category (monthly)");
        for (category, amount) in &stats.category_breakdown {
            println!("      {:20} ${:>9.2}", truncate(category, 20), amount);
        }
    }

    println!();
    if stats.upcoming_renewals.is_empty() {
        println!("   No renewals in the next {} days", window_days);
    } else {
        println!("   ⏰ Renewing in the next {} days", window_days);
        for renewal in &stats.upcoming_renewals {
            let when = match renewal.days_until_renewal {
                0 => "today".to_string(),
                1 => "tomorrow".to_string(),
                n => format!("in {} days", n),
            };
            println!(
                "      {:20} ${:>9.2} {} ({})",
                truncate(&renewal.name, 20),
                renewal.cost,
                renewal.renewal_date,
                when
            );
        }
    }

    Ok(())
}

pub fn cmd_categories(db: &Database) -> Result<()> {
    let categories = db.list_categories()?;

    if categories.is_empty() {
        println!("No categories in use");
        return Ok(());
    }

    println!("📁 Categories");
    for category in categories {
        println!("   {}", category);
    }

    Ok(())
}
