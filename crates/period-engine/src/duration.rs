//! Interval lengths expressed as a whole, positive amount of one unit.

use std::fmt;

use crate::error::{PeriodError, Result};
use crate::unit::TimeUnit;

/// An (amount, unit) pair such as "2 weeks".
///
/// No cross-unit conversion happens here: `24 hours` and `1 day` are
/// different values. Derived equality is therefore the exact comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Duration {
    amount: i64,
    unit: TimeUnit,
}

impl Duration {
    /// # Errors
    /// Returns `PeriodError::InvalidArgument` if `amount` is not positive.
    pub fn new(amount: i64, unit: TimeUnit) -> Result<Self> {
        if amount <= 0 {
            return Err(PeriodError::InvalidArgument(format!(
                "Amount must be positive non-zero, got {}",
                amount
            )));
        }
        Ok(Self { amount, unit })
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    /// ISO-8601-style rendering: `P1Y`, `P1M` (month), `PT1M` (minute),
    /// `P1H`, `P1D`, `P1W`, `P1S`, `P0.250S`.
    pub fn to_iso_string(&self) -> String {
        match self.unit {
            TimeUnit::Millisecond => format!(
                "P{}.{:03}S",
                self.amount / 1000,
                self.amount % 1000
            ),
            TimeUnit::Second => format!("P{}S", self.amount),
            TimeUnit::Minute => format!("PT{}M", self.amount),
            TimeUnit::Hour => format!("P{}H", self.amount),
            TimeUnit::Day => format!("P{}D", self.amount),
            TimeUnit::Week => format!("P{}W", self.amount),
            TimeUnit::Month => format!("P{}M", self.amount),
            TimeUnit::Year => format!("P{}Y", self.amount),
        }
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plural = if self.amount == 1 { "" } else { "s" };
        write!(f, "{} {}{}", self.amount, self.unit, plural)
    }
}
