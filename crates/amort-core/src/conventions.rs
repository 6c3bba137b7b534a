//! Fixed day-count conventions and period-length presets.
//!
//! The 30/360 convention (30 days per month, 360 days per year) drives all
//! unit conversions; it is not calendar-accurate. Callers pass these values
//! explicitly where needed; there is no global defaults registry.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Days per month under the 30/360 convention.
pub const DAYS_PER_MONTH: Decimal = dec!(30);
/// Days per year under the 30/360 convention.
pub const DAYS_PER_YEAR: Decimal = dec!(360);

/// Period length of one day.
pub const PERIOD_DAILY: Decimal = dec!(1);
/// Period length of one 30-day month.
pub const PERIOD_MONTHLY: Decimal = dec!(30);
/// Period length of one 360-day year.
pub const PERIOD_YEARLY: Decimal = dec!(360);

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_convention_ratios() {
        assert_eq!(DAYS_PER_YEAR / DAYS_PER_MONTH, dec!(12));
        assert_eq!(PERIOD_MONTHLY, DAYS_PER_MONTH);
        assert_eq!(PERIOD_YEARLY, DAYS_PER_YEAR);
        assert_eq!(PERIOD_DAILY, Decimal::ONE);
    }
}
