//! Subtrack Core Library
//!
//! Shared functionality for the subtrack subscription tracker:
//! - Renewal date calculation from a start date and billing cycle
//! - Cost normalization between monthly and yearly pricing
//! - Portfolio statistics (totals, categories, upcoming renewals, lifetime spend)
//! - SQLite record store with connection pooling and migrations

pub mod analytics;
pub mod clock;
pub mod cost;
pub mod db;
pub mod error;
pub mod models;
pub mod renewal;

pub use analytics::{compute_stats, PortfolioStats, StatsConfig, UpcomingRenewal};
pub use clock::{Clock, FixedClock, SystemClock};
pub use cost::{round_cents, CostViews, Equivalent, PricingOption, SavingsOpportunity};
pub use db::{Database, SampleSubscription, SAMPLE_SUBSCRIPTIONS};
pub use error::{Error, Result};
pub use models::{
    BillingCycle, Subscription, SubscriptionFilter, SubscriptionInput, SubscriptionView,
};
pub use renewal::next_renewal;
