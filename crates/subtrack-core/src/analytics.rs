//! Portfolio statistics
//!
//! A single pass over every stored subscription. Active records feed the
//! spend totals, category breakdown and upcoming-renewal window; inactive
//! (soft-deleted) records still count toward lifetime spend.
//!
//! Per-record conversions work on prices inside the validated range; the
//! sums across records use checked arithmetic.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cost::round_cents;
use crate::error::{Error, Result};
use crate::models::{BillingCycle, Subscription};

/// Tunables for portfolio statistics
#[derive(Debug, Clone)]
pub struct StatsConfig {
    /// Inclusive look-ahead window for upcoming renewals
    pub upcoming_window_days: i64,
    /// Group label for subscriptions without a category
    pub uncategorized_label: String,
    /// Approximate month length for lifetime spend
    pub days_per_month: i64,
    /// Approximate year length for lifetime spend
    pub days_per_year: i64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            upcoming_window_days: 7,
            uncategorized_label: "Uncategorized".to_string(),
            days_per_month: 30,
            days_per_year: 365,
        }
    }
}

/// An active subscription renewing inside the look-ahead window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpcomingRenewal {
    pub id: i64,
    pub name: String,
    pub renewal_date: NaiveDate,
    pub cost: Decimal,
    pub billing_cycle: BillingCycle,
    pub days_until_renewal: i64,
}

/// Aggregate statistics over a portfolio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioStats {
    pub total_monthly_cost: Decimal,
    pub total_yearly_cost: Decimal,
    pub total_active_subscriptions: usize,
    /// Ordered by renewal date
    pub upcoming_renewals: Vec<UpcomingRenewal>,
    /// Category label -> monthly equivalent spend
    pub category_breakdown: BTreeMap<String, Decimal>,
    /// Estimated total paid since each start date, inactive included.
    /// Uses fixed 30/365-day cycles, so it is an estimate, not a ledger.
    pub total_spent: Decimal,
    /// Days since the earliest start date; None for an empty portfolio
    pub time_since_first_subscription: Option<i64>,
}

pub fn compute_stats(subscriptions: &[Subscription], today: NaiveDate) -> Result<PortfolioStats> {
    compute_stats_with_config(subscriptions, today, &StatsConfig::default())
}

/// Last day of the upcoming-renewal window
fn window_end(today: NaiveDate, window_days: i64) -> Result<NaiveDate> {
    if window_days < 0 {
        return Err(Error::validation("Upcoming window must not be negative"));
    }
    Duration::try_days(window_days)
        .and_then(|window| today.checked_add_signed(window))
        .ok_or_else(|| {
            Error::validation(format!("Upcoming window of {} days is out of range", window_days))
        })
}

fn add_amount(total: Decimal, amount: Decimal) -> Result<Decimal> {
    total
        .checked_add(amount)
        .ok_or_else(|| Error::AmountOutOfRange(format!("{} + {}", total, amount)))
}

pub fn compute_stats_with_config(
    subscriptions: &[Subscription],
    today: NaiveDate,
    config: &StatsConfig,
) -> Result<PortfolioStats> {
    let window_end = window_end(today, config.upcoming_window_days)?;

    let mut total_monthly = Decimal::ZERO;
    let mut total_yearly = Decimal::ZERO;
    let mut active_count = 0;
    let mut upcoming = Vec::new();
    let mut breakdown: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut total_spent = Decimal::ZERO;
    let mut earliest_start: Option<NaiveDate> = None;

    for sub in subscriptions {
        total_spent = add_amount(total_spent, lifetime_spend(sub, today, config)?)?;
        earliest_start = Some(match earliest_start {
            Some(d) => d.min(sub.start_date),
            None => sub.start_date,
        });

        if !sub.is_active {
            continue;
        }

        active_count += 1;
        let monthly = sub.monthly_equivalent().amount();
        total_monthly = add_amount(total_monthly, monthly)?;
        total_yearly = add_amount(total_yearly, sub.yearly_equivalent().amount())?;

        let label = sub
            .category
            .clone()
            .unwrap_or_else(|| config.uncategorized_label.clone());
        let category_total = breakdown.entry(label).or_insert(Decimal::ZERO);
        *category_total = add_amount(*category_total, monthly)?;

        if sub.renewal_date >= today && sub.renewal_date <= window_end {
            upcoming.push(UpcomingRenewal {
                id: sub.id,
                name: sub.name.clone(),
                renewal_date: sub.renewal_date,
                cost: sub.cost,
                billing_cycle: sub.billing_cycle,
                days_until_renewal: sub.days_until_renewal(today),
            });
        }
    }

    upcoming.sort_by(|a, b| a.renewal_date.cmp(&b.renewal_date).then(a.id.cmp(&b.id)));
    for amount in breakdown.values_mut() {
        *amount = round_cents(*amount);
    }

    Ok(PortfolioStats {
        total_monthly_cost: round_cents(total_monthly),
        total_yearly_cost: round_cents(total_yearly),
        total_active_subscriptions: active_count,
        upcoming_renewals: upcoming,
        category_breakdown: breakdown,
        total_spent: round_cents(total_spent),
        time_since_first_subscription: earliest_start.map(|d| (today - d).num_days()),
    })
}

/// Whole billing cycles elapsed since the start date, never negative
pub fn elapsed_cycles(sub: &Subscription, today: NaiveDate, config: &StatsConfig) -> i64 {
    let days_since_start = (today - sub.start_date).num_days().max(0);
    let cycle_days = match sub.billing_cycle {
        BillingCycle::Monthly => config.days_per_month,
        BillingCycle::Yearly => config.days_per_year,
    };
    days_since_start / cycle_days.max(1)
}

/// Estimated amount paid for one subscription up to `today`
pub fn lifetime_spend(sub: &Subscription, today: NaiveDate, config: &StatsConfig) -> Result<Decimal> {
    let cycles = elapsed_cycles(sub, today, config);
    sub.cost
        .checked_mul(Decimal::from(cycles))
        .ok_or_else(|| Error::AmountOutOfRange(format!("{} x {} cycles of {}", sub.cost, cycles, sub.name)))
}
