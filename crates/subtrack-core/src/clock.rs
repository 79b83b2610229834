//! Source of "today" for the outer surfaces
//!
//! Core computations take `today` as a plain argument. Only the server and
//! CLI hold a clock, and read it once per request or command.

use chrono::{NaiveDate, Utc};

/// Provides the current calendar date
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Wall clock, UTC calendar date
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// Always returns the same date
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let clock: Box<dyn Clock> = Box::new(FixedClock(date));
        assert_eq!(clock.today(), date);
    }
}
