//! Subscription command implementations

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use subtrack_core::{
    BillingCycle, Database, Equivalent, Subscription, SubscriptionFilter, SubscriptionInput,
    SubscriptionView,
};

use super::truncate;

/// Fields given on the command line for `update`; `None` keeps the stored value
#[derive(Debug, Default)]
pub struct SubscriptionChanges {
    pub name: Option<String>,
    pub monthly_price: Option<Decimal>,
    pub yearly_price: Option<Decimal>,
    pub billing_cycle: Option<BillingCycle>,
    pub start_date: Option<NaiveDate>,
    pub category: Option<String>,
}

impl SubscriptionChanges {
    fn apply(self, existing: &Subscription) -> SubscriptionInput {
        SubscriptionInput {
            name: self.name.unwrap_or_else(|| existing.name.clone()),
            monthly_price: self.monthly_price.or(existing.monthly_price),
            yearly_price: self.yearly_price.or(existing.yearly_price),
            billing_cycle: self.billing_cycle.unwrap_or(existing.billing_cycle),
            start_date: self.start_date.unwrap_or(existing.start_date),
            category: self.category.or_else(|| existing.category.clone()),
        }
    }
}

fn find_active(db: &Database, id: i64) -> Result<Subscription> {
    db.get_subscription(id)?
        .filter(|s| s.is_active)
        .ok_or_else(|| anyhow::anyhow!("Subscription not found: {}", id))
}

fn format_equivalent(equivalent: &Equivalent) -> String {
    match equivalent {
        Equivalent::Exact(amount) => format!("${:.2}", amount),
        Equivalent::Approximated(amount) => format!("~${:.2}", amount),
    }
}

fn print_subscription(view: &SubscriptionView) {
    let sub = &view.subscription;
    let costs = &view.costs;

    println!();
    println!("📋 {} (ID: {})", sub.name, sub.id);
    println!("   ─────────────────────────────────────────────");
    println!(
        "   Billing:        ${:.2} {}",
        sub.cost, sub.billing_cycle
    );
    println!(
        "   Category:       {}",
        sub.category.as_deref().unwrap_or("-")
    );
    println!("   Started:        {}", sub.start_date);
    println!(
        "   Next renewal:   {} (in {} days){}",
        sub.renewal_date,
        view.days_until_renewal,
        if sub.renewal_overridden { " 📌 manual" } else { "" }
    );
    if !sub.is_active {
        println!("   Status:         ❌ removed");
    }

    println!();
    println!(
        "   Per month:      {}",
        format_equivalent(&costs.monthly_equivalent)
    );
    println!(
        "   Per year:       {}",
        format_equivalent(&costs.yearly_equivalent)
    );

    if let Some(savings) = &costs.savings_opportunity {
        println!();
        if savings.savings > Decimal::ZERO {
            println!(
                "   💰 Paying yearly saves ${:.2}/year ({}%)",
                savings.savings, savings.savings_percentage
            );
        } else if savings.savings < Decimal::ZERO {
            println!(
                "   ⚠️  Yearly costs ${:.2} more than monthly ({}%)",
                -savings.savings, -savings.savings_percentage
            );
        } else {
            println!("   Monthly and yearly cost the same");
        }
        if savings.recommendation != sub.billing_cycle {
            println!("   💡 Consider switching to {} billing", savings.recommendation);
        }
    }
}

pub fn cmd_add(db: &Database, input: &SubscriptionInput, today: NaiveDate) -> Result<()> {
    let sub = db
        .create_subscription(input, today)
        .context("Failed to add subscription")?;

    println!(
        "✅ Added {} (ID: {}) - ${:.2} {}",
        sub.name, sub.id, sub.cost, sub.billing_cycle
    );
    println!("   Next renewal: {}", sub.renewal_date);

    Ok(())
}

pub fn cmd_list(db: &Database, filter: &SubscriptionFilter, today: NaiveDate) -> Result<()> {
    db.refresh_renewal_dates(today)?;
    let subscriptions = db.list_subscriptions(filter)?;

    if subscriptions.is_empty() {
        println!("No subscriptions yet. Run:");
        println!("  subtrack add <name> --monthly <price>");
        return Ok(());
    }

    println!();
    println!("📋 Subscriptions");
    println!("   ─────────────────────────────────────────────────────────────");

    for sub in subscriptions {
        let status_icon = if sub.is_active { "✅" } else { "❌" };
        let monthly = sub.monthly_equivalent();

        println!(
            "   {} {:>4} {:20} │ {:>9}/{:<7} │ {:>9}/mo │ renews {} ({}d)",
            status_icon,
            sub.id,
            truncate(&sub.name, 20),
            format!("${:.2}", sub.cost),
            sub.billing_cycle.as_str(),
            format_equivalent(&monthly),
            sub.renewal_date,
            sub.days_until_renewal(today)
        );
    }

    Ok(())
}

pub fn cmd_show(db: &Database, id: i64, json: bool, today: NaiveDate) -> Result<()> {
    let sub = db
        .get_subscription(id)?
        .ok_or_else(|| anyhow::anyhow!("Subscription not found: {}", id))?;
    let view = SubscriptionView::new(sub, today);

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print_subscription(&view);
    }

    Ok(())
}

pub fn cmd_update(
    db: &Database,
    id: i64,
    changes: SubscriptionChanges,
    today: NaiveDate,
) -> Result<()> {
    let existing = find_active(db, id)?;
    let input = changes.apply(&existing);

    let sub = db
        .update_subscription(id, &input, today)
        .context("Failed to update subscription")?;

    println!("✅ Updated {} (ID: {})", sub.name, sub.id);
    if sub.renewal_date != existing.renewal_date {
        println!(
            "   Next renewal: {} (was {})",
            sub.renewal_date, existing.renewal_date
        );
    }
    if existing.renewal_overridden && !sub.renewal_overridden {
        println!("   Manual renewal date cleared");
    }

    Ok(())
}

/// Pin the renewal date when `date` is given, otherwise recompute it
pub fn cmd_renew(db: &Database, id: i64, date: Option<NaiveDate>, today: NaiveDate) -> Result<()> {
    match date {
        Some(date) => {
            let sub = db.set_manual_renewal(id, date, today)?;
            println!("📌 {} will renew on {}", sub.name, sub.renewal_date);
        }
        None => {
            let renewal = db.recompute_renewal(id, today)?;
            println!("🔄 Subscription {} renews on {}", id, renewal);
        }
    }

    Ok(())
}

pub fn cmd_remove(db: &Database, id: i64) -> Result<()> {
    let sub = find_active(db, id)?;
    db.soft_delete_subscription(id)?;

    println!("✅ Removed {} (ID: {})", sub.name, id);
    println!("   Its past payments still count toward total spent");

    Ok(())
}
