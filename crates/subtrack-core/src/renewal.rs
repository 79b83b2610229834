//! Renewal date calculation
//!
//! A subscription renews every `k` cycles after its start date (`k >= 1`).
//! The next renewal is the first of those occurrences strictly after today.
//!
//! Occurrences are always offset from the start date itself, never from the
//! previous occurrence. When the anchor day does not exist in the target
//! month it is clamped to that month's last day:
//!
//! - Jan 31 monthly: Feb 29 (leap) / Feb 28, Mar 31, Apr 30, ...
//! - Feb 29 yearly: Feb 28 in common years, Feb 29 again in leap years
//!
//! Because the offset is from the anchor, a clamp in one month never drags
//! later renewals earlier.

use chrono::{Datelike, Months, NaiveDate};

use crate::error::{Error, Result};
use crate::models::BillingCycle;

/// Next renewal date strictly after `today`
///
/// Computed in closed form: the whole number of cycles between the start
/// month and today's month gives the candidate, and at most one more cycle
/// is needed to pass today.
pub fn next_renewal(start_date: NaiveDate, cycle: BillingCycle, today: NaiveDate) -> Result<NaiveDate> {
    let step = i64::from(cycle.months());
    let elapsed_months = months_between(start_date, today).max(0);

    let mut cycles = (elapsed_months / step).max(1);
    let mut candidate = occurrence(start_date, cycle, cycles)?;
    if candidate <= today {
        cycles += 1;
        candidate = occurrence(start_date, cycle, cycles)?;
    }

    Ok(candidate)
}

/// The `n`th renewal after `start_date` (n = 0 is the start date itself)
pub fn occurrence(start_date: NaiveDate, cycle: BillingCycle, n: i64) -> Result<NaiveDate> {
    let months = n
        .checked_mul(i64::from(cycle.months()))
        .and_then(|m| u32::try_from(m).ok())
        .ok_or_else(|| out_of_range(start_date, cycle, n))?;

    start_date
        .checked_add_months(Months::new(months))
        .ok_or_else(|| out_of_range(start_date, cycle, n))
}

/// Signed difference in calendar months, ignoring the day of month
fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    let years = i64::from(to.year()) - i64::from(from.year());
    let months = i64::from(to.month()) - i64::from(from.month());
    years * 12 + months
}

fn out_of_range(start_date: NaiveDate, cycle: BillingCycle, n: i64) -> Error {
    Error::DateOutOfRange(format!(
        "{} {} cycle(s) after {}",
        n,
        cycle.as_str(),
        start_date
    ))
}
