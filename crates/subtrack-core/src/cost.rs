//! Cost normalization across billing cycles
//!
//! All functions are pure over one subscription's pricing fields. Conversions
//! start from the price field of the billing cycle; when that field is
//! missing, `cost` is scaled instead and the result is marked
//! [`Equivalent::Approximated`].

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::models::{BillingCycle, Subscription};

const MONTHS_PER_YEAR: Decimal = Decimal::from_parts(12, 0, 0, false, 0);

/// A cost converted to another cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "basis", content = "amount", rename_all = "lowercase")]
pub enum Equivalent {
    /// Taken from the authoritative cost or an explicit price field
    Exact(Decimal),
    /// Derived by scaling `cost` because the explicit price was absent
    Approximated(Decimal),
}

impl Equivalent {
    pub fn amount(&self) -> Decimal {
        match self {
            Self::Exact(amount) | Self::Approximated(amount) => *amount,
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, Self::Exact(_))
    }
}

/// One populated price field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingOption {
    pub billing_cycle: BillingCycle,
    pub price: Decimal,
    /// Whether this is the cycle currently billed
    pub is_current: bool,
}

/// Benefit (or loss) of paying yearly instead of monthly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingsOpportunity {
    pub monthly_cost: Decimal,
    pub yearly_cost: Decimal,
    /// Twelve months at the monthly price
    pub monthly_yearly_equivalent: Decimal,
    /// Negative when yearly billing costs more
    pub savings: Decimal,
    /// Share of `monthly_yearly_equivalent`, rounded to 2 dp
    pub savings_percentage: Decimal,
    pub recommendation: BillingCycle,
}

/// Every derived cost view of one subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostViews {
    pub monthly_equivalent: Equivalent,
    pub yearly_equivalent: Equivalent,
    pub available_options: Vec<PricingOption>,
    pub savings_opportunity: Option<SavingsOpportunity>,
}

/// Round a money amount to cents, midpoint away from zero
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

impl Subscription {
    pub fn monthly_equivalent(&self) -> Equivalent {
        match self.billing_cycle {
            BillingCycle::Monthly => Equivalent::Exact(self.cost),
            BillingCycle::Yearly => match self.yearly_price {
                Some(price) => Equivalent::Exact(price / MONTHS_PER_YEAR),
                None => Equivalent::Approximated(self.cost / MONTHS_PER_YEAR),
            },
        }
    }

    pub fn yearly_equivalent(&self) -> Equivalent {
        match self.billing_cycle {
            BillingCycle::Yearly => Equivalent::Exact(self.cost),
            BillingCycle::Monthly => match self.monthly_price {
                Some(price) => Equivalent::Exact(price * MONTHS_PER_YEAR),
                None => Equivalent::Approximated(self.cost * MONTHS_PER_YEAR),
            },
        }
    }

    /// Populated price fields, monthly first
    pub fn available_pricing_options(&self) -> Vec<PricingOption> {
        [BillingCycle::Monthly, BillingCycle::Yearly]
            .into_iter()
            .filter_map(|cycle| {
                self.price_for(cycle).map(|price| PricingOption {
                    billing_cycle: cycle,
                    price,
                    is_current: self.billing_cycle == cycle,
                })
            })
            .collect()
    }

    /// Only defined when both prices are known
    pub fn savings_opportunity(&self) -> Option<SavingsOpportunity> {
        let monthly = self.monthly_price?;
        let yearly = self.yearly_price?;

        let monthly_yearly_equivalent = monthly * MONTHS_PER_YEAR;
        let savings = monthly_yearly_equivalent - yearly;
        let savings_percentage = if monthly_yearly_equivalent > Decimal::ZERO {
            round_cents(savings / monthly_yearly_equivalent * Decimal::ONE_HUNDRED)
        } else {
            Decimal::ZERO
        };

        Some(SavingsOpportunity {
            monthly_cost: monthly,
            yearly_cost: yearly,
            monthly_yearly_equivalent,
            savings,
            savings_percentage,
            recommendation: if savings > Decimal::ZERO {
                BillingCycle::Yearly
            } else {
                BillingCycle::Monthly
            },
        })
    }

    pub fn cost_views(&self) -> CostViews {
        CostViews {
            monthly_equivalent: self.monthly_equivalent(),
            yearly_equivalent: self.yearly_equivalent(),
            available_options: self.available_pricing_options(),
            savings_opportunity: self.savings_opportunity(),
        }
    }
}
