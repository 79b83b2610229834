//! Domain models for subtrack

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cost::CostViews;
use crate::error::{Error, Result};

/// Prices are stored with at most 2 decimal places
pub const PRICE_DECIMAL_PLACES: u32 = 2;

/// Exclusive upper bound on a price (10 digits in total, 2 after the point)
pub const PRICE_LIMIT: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, 0);

/// Whether an amount fits the stored price range
pub fn price_in_range(price: Decimal) -> bool {
    price > Decimal::ZERO && price < PRICE_LIMIT && price.normalize().scale() <= PRICE_DECIMAL_PLACES
}

fn check_price(label: &str, price: Option<Decimal>) -> Result<()> {
    let Some(price) = price else {
        return Ok(());
    };
    if price <= Decimal::ZERO {
        return Err(Error::validation(format!("{} price must be greater than 0", label)));
    }
    if price >= PRICE_LIMIT {
        return Err(Error::validation(format!(
            "{} price must be less than {}",
            label, PRICE_LIMIT
        )));
    }
    if price.normalize().scale() > PRICE_DECIMAL_PLACES {
        return Err(Error::validation(format!(
            "{} price must have at most {} decimal places",
            label, PRICE_DECIMAL_PLACES
        )));
    }
    Ok(())
}

/// Recurring period at which a subscription charges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    Monthly,
    Yearly,
}

impl BillingCycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    /// Calendar months covered by one cycle
    pub fn months(&self) -> u32 {
        match self {
            Self::Monthly => 1,
            Self::Yearly => 12,
        }
    }
}

impl std::str::FromStr for BillingCycle {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "monthly" | "month" => Ok(Self::Monthly),
            "yearly" | "year" | "annual" | "annually" => Ok(Self::Yearly),
            _ => Err(format!("Unknown billing cycle: {}", s)),
        }
    }
}

impl std::fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A tracked subscription
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: i64,
    pub name: String,
    pub monthly_price: Option<Decimal>,
    pub yearly_price: Option<Decimal>,
    pub billing_cycle: BillingCycle,
    /// Price for `billing_cycle`; always > 0
    pub cost: Decimal,
    pub start_date: NaiveDate,
    /// Next renewal, strictly after the day it was computed
    pub renewal_date: NaiveDate,
    /// Set by a manual renewal override; suppresses recalculation on save
    /// until `start_date` or `billing_cycle` changes
    pub renewal_overridden: bool,
    /// False once soft-deleted
    pub is_active: bool,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// The populated price field for a cycle, if any
    pub fn price_for(&self, cycle: BillingCycle) -> Option<Decimal> {
        match cycle {
            BillingCycle::Monthly => self.monthly_price,
            BillingCycle::Yearly => self.yearly_price,
        }
    }

    /// Days from `today` until the stored renewal date (negative if stale)
    pub fn days_until_renewal(&self, today: NaiveDate) -> i64 {
        (self.renewal_date - today).num_days()
    }
}

/// User-supplied fields for creating or updating a subscription
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionInput {
    pub name: String,
    #[serde(default)]
    pub monthly_price: Option<Decimal>,
    #[serde(default)]
    pub yearly_price: Option<Decimal>,
    pub billing_cycle: BillingCycle,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub category: Option<String>,
}

/// Input that passed validation, with `cost` derived from the cycle's price
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSubscription {
    pub name: String,
    pub monthly_price: Option<Decimal>,
    pub yearly_price: Option<Decimal>,
    pub billing_cycle: BillingCycle,
    pub cost: Decimal,
    pub start_date: NaiveDate,
    pub category: Option<String>,
}

impl SubscriptionInput {
    /// Check pricing rules and normalize text fields
    pub fn validate(&self) -> Result<ValidatedSubscription> {
        check_price("Monthly", self.monthly_price)?;
        check_price("Yearly", self.yearly_price)?;
        if self.monthly_price.is_none() && self.yearly_price.is_none() {
            return Err(Error::validation(
                "At least one pricing option (monthly or yearly) must be provided",
            ));
        }

        let cost = match self.billing_cycle {
            BillingCycle::Monthly => self.monthly_price.ok_or_else(|| {
                Error::validation("Monthly price is required when billing cycle is monthly")
            })?,
            BillingCycle::Yearly => self.yearly_price.ok_or_else(|| {
                Error::validation("Yearly price is required when billing cycle is yearly")
            })?,
        };

        let name = self.name.trim();
        if name.is_empty() {
            return Err(Error::validation("Name must not be empty"));
        }

        let category = self
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        Ok(ValidatedSubscription {
            name: name.to_string(),
            monthly_price: self.monthly_price,
            yearly_price: self.yearly_price,
            billing_cycle: self.billing_cycle,
            cost,
            start_date: self.start_date,
            category,
        })
    }
}

/// A subscription as presented to callers, with its derived values
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionView {
    #[serde(flatten)]
    pub subscription: Subscription,
    pub days_until_renewal: i64,
    #[serde(flatten)]
    pub costs: CostViews,
}

impl SubscriptionView {
    pub fn new(subscription: Subscription, today: NaiveDate) -> Self {
        let days_until_renewal = subscription.days_until_renewal(today);
        let costs = subscription.cost_views();
        Self {
            subscription,
            days_until_renewal,
            costs,
        }
    }
}

/// Filter for listing subscriptions
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionFilter {
    pub category: Option<String>,
    pub billing_cycle: Option<BillingCycle>,
    /// Include soft-deleted records
    #[serde(default)]
    pub include_inactive: bool,
}
