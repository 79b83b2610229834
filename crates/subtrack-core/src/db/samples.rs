//! Sample portfolio for demos and first runs

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};
use rust_decimal::Decimal;
use tracing::info;

use super::Database;
use crate::error::{Error, Result};
use crate::models::{BillingCycle, SubscriptionInput};

/// One entry of the sample portfolio; prices are in cents
pub struct SampleSubscription {
    pub name: &'static str,
    pub monthly_cents: i64,
    pub yearly_cents: i64,
    pub billing_cycle: BillingCycle,
    pub category: &'static str,
    pub start: (i32, u32, u32),
}

const fn sample(
    name: &'static str,
    monthly_cents: i64,
    yearly_cents: i64,
    billing_cycle: BillingCycle,
    category: &'static str,
    start: (i32, u32, u32),
) -> SampleSubscription {
    SampleSubscription {
        name,
        monthly_cents,
        yearly_cents,
        billing_cycle,
        category,
        start,
    }
}

pub const SAMPLE_SUBSCRIPTIONS: [SampleSubscription; 6] = [
    sample("Netflix", 1599, 15999, BillingCycle::Monthly, "Entertainment", (2024, 1, 1)),
    sample("Spotify Premium", 999, 9999, BillingCycle::Monthly, "Music", (2024, 1, 15)),
    sample("Adobe Creative Cloud", 5299, 59999, BillingCycle::Monthly, "Software", (2024, 1, 1)),
    sample("Microsoft 365", 999, 9999, BillingCycle::Yearly, "Productivity", (2024, 1, 1)),
    sample("Gym Membership", 4999, 49999, BillingCycle::Monthly, "Health", (2024, 1, 10)),
    sample("Dropbox Plus", 999, 9999, BillingCycle::Yearly, "Storage", (2024, 2, 1)),
];

impl SampleSubscription {
    pub(crate) fn to_input(&self) -> Result<SubscriptionInput> {
        let (y, m, d) = self.start;
        let start_date = NaiveDate::from_ymd_opt(y, m, d).ok_or_else(|| {
            Error::DateOutOfRange(format!("sample start date {}-{}-{} for {}", y, m, d, self.name))
        })?;

        Ok(SubscriptionInput {
            name: self.name.to_string(),
            monthly_price: Some(Decimal::new(self.monthly_cents, 2)),
            yearly_price: Some(Decimal::new(self.yearly_cents, 2)),
            billing_cycle: self.billing_cycle,
            start_date,
            category: Some(self.category.to_string()),
        })
    }
}

impl Database {
    /// Insert the sample portfolio, skipping names that already exist
    ///
    /// Returns the number of subscriptions created.
    pub fn seed_sample_subscriptions(&self, today: NaiveDate) -> Result<usize> {
        let mut created = 0;

        for entry in &SAMPLE_SUBSCRIPTIONS {
            let input = entry.to_input()?;
            let exists: bool = {
                let conn = self.conn()?;
                conn.query_row(
                    "SELECT 1 FROM subscriptions WHERE name = ? AND is_active = TRUE",
                    params![input.name],
                    |_| Ok(true),
                )
                .optional()?
                .unwrap_or(false)
            };

            if !exists {
                self.create_subscription(&input, today)?;
                created += 1;
            }
        }

        info!(created, "Seeded sample subscriptions");
        Ok(created)
    }
}
