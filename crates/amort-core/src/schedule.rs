//! Level-payment amortization schedules.
//!
//! Derives the fixed periodic repayment from the annuity present-value
//! formula and simulates the schedule forward, splitting each payment
//! between interest and principal. All math uses `rust_decimal::Decimal`
//! for exact decimal precision; nothing is rounded inside the simulation
//! loop, only at the structured-export boundary.

use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::conventions::{
    DAYS_PER_MONTH, DAYS_PER_YEAR, PERIOD_DAILY, PERIOD_MONTHLY, PERIOD_YEARLY,
};
use crate::error::AmortError;
use crate::types::{Days, Money, Rate};
use crate::AmortResult;

// ---------------------------------------------------------------------------
// Repayment records
// ---------------------------------------------------------------------------

/// One period's repayment, split between principal and interest.
///
/// Records are created during schedule computation and never mutated; the
/// owning [`AmortizedDebt`] replaces its whole sequence on recomputation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepaymentRecord {
    /// Portion of the payment applied to the unpaid balance.
    pub principal_amount: Money,
    /// Interest on the balance as it stood at the start of the period.
    pub interest_amount: Money,
}

impl RepaymentRecord {
    /// Total paid this period. Equals the level payment for every period.
    pub fn total_amount(&self) -> Money {
        self.principal_amount + self.interest_amount
    }
}

// ---------------------------------------------------------------------------
// Formula phase
// ---------------------------------------------------------------------------

/// Discount factor `v = 1 / (1 + rate)`.
///
/// Assumes a validated positive rate.
pub fn discount_factor(rate: Rate) -> Decimal {
    Decimal::ONE / (Decimal::ONE + rate)
}

/// Level payment `K = principal / ((1 - v^n) / rate)` for an amortized
/// annuity repaid over `period_count` periods.
pub fn level_payment(principal: Money, rate: Rate, period_count: u32) -> Money {
    let v = discount_factor(rate);
    let annuity_factor = (Decimal::ONE - v.powi(i64::from(period_count))) / rate;
    principal / annuity_factor
}

// ---------------------------------------------------------------------------
// Simulation phase
// ---------------------------------------------------------------------------

/// Simulate the full repayment schedule in period order.
///
/// Carries the unpaid balance across periods at full decimal precision.
/// Interest accrues on the balance at the start of each period; the
/// remainder of the level payment reduces principal. After the final
/// period the balance is at (or within decimal precision of) zero; no
/// final-period reconciliation is applied.
pub fn repayment_schedule(principal: Money, rate: Rate, period_count: u32) -> Vec<RepaymentRecord> {
    let payment = level_payment(principal, rate, period_count);

    let mut schedule: Vec<RepaymentRecord> = Vec::with_capacity(period_count as usize);
    let mut unpaid_balance = principal;

    for _period in 1..=period_count {
        let interest_amount = rate * unpaid_balance;
        let principal_amount = payment - interest_amount;

        schedule.push(RepaymentRecord {
            principal_amount,
            interest_amount,
        });

        unpaid_balance -= principal_amount;
    }

    schedule
}

/// Round to conventional currency precision (2 dp, half away from zero).
///
/// Applied by consumers at the reporting boundary only, never inside the
/// schedule computation.
pub fn round_currency(value: Money) -> Money {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

// ---------------------------------------------------------------------------
// Aggregate
// ---------------------------------------------------------------------------

/// A fixed-rate amortized debt and its computed repayment schedule.
///
/// The four parameters are only reachable through validating constructors
/// and setters. Changing principal, period count, or interest rate replaces
/// the schedule wholesale; changing the period length does not, since period
/// length only drives unit conversions, never the interest/principal split.
#[derive(Debug, Clone, Serialize)]
pub struct AmortizedDebt {
    principal: Money,
    period_count: u32,
    period_length_days: Days,
    interest_rate: Rate,
    repayments: Vec<RepaymentRecord>,
}

impl AmortizedDebt {
    /// Build a debt and compute its schedule.
    ///
    /// `interest_rate` is the per-period rate as a decimal multiplier
    /// (0.12 = 12% per period); it is not normalized to an annual rate.
    pub fn new(
        principal: Money,
        period_count: u32,
        period_length_days: Days,
        interest_rate: Rate,
    ) -> AmortResult<Self> {
        ensure_positive("principal", principal)?;
        ensure_positive_count("period_count", period_count)?;
        ensure_positive("period_length_days", period_length_days)?;
        ensure_positive("interest_rate", interest_rate)?;

        Ok(Self {
            principal,
            period_count,
            period_length_days,
            interest_rate,
            repayments: repayment_schedule(principal, interest_rate, period_count),
        })
    }

    /// Debt repaid in 1-day periods.
    pub fn daily(principal: Money, period_count: u32, interest_rate: Rate) -> AmortResult<Self> {
        Self::new(principal, period_count, PERIOD_DAILY, interest_rate)
    }

    /// Debt repaid in 30-day monthly periods.
    pub fn monthly(principal: Money, period_count: u32, interest_rate: Rate) -> AmortResult<Self> {
        Self::new(principal, period_count, PERIOD_MONTHLY, interest_rate)
    }

    /// Debt repaid in 360-day yearly periods.
    pub fn yearly(principal: Money, period_count: u32, interest_rate: Rate) -> AmortResult<Self> {
        Self::new(principal, period_count, PERIOD_YEARLY, interest_rate)
    }

    // -- stored parameters --------------------------------------------------

    pub fn principal(&self) -> Money {
        self.principal
    }

    pub fn period_count(&self) -> u32 {
        self.period_count
    }

    pub fn period_length_days(&self) -> Days {
        self.period_length_days
    }

    pub fn interest_rate(&self) -> Rate {
        self.interest_rate
    }

    /// The full ordered repayment sequence, one record per period.
    pub fn repayments(&self) -> &[RepaymentRecord] {
        &self.repayments
    }

    // -- derived quantities (recomputed per call, never cached) -------------

    pub fn discount_factor(&self) -> Decimal {
        discount_factor(self.interest_rate)
    }

    pub fn level_payment(&self) -> Money {
        level_payment(self.principal, self.interest_rate, self.period_count)
    }

    pub fn period_length_months(&self) -> Decimal {
        self.period_length_days / DAYS_PER_MONTH
    }

    pub fn period_length_years(&self) -> Decimal {
        self.period_length_days / DAYS_PER_YEAR
    }

    pub fn duration_days(&self) -> Days {
        self.period_length_days * Decimal::from(self.period_count)
    }

    pub fn duration_months(&self) -> Decimal {
        self.duration_days() / DAYS_PER_MONTH
    }

    pub fn duration_years(&self) -> Decimal {
        self.duration_days() / DAYS_PER_YEAR
    }

    // -- setters -------------------------------------------------------------

    /// Replaces the schedule with one recomputed from scratch.
    pub fn set_principal(&mut self, principal: Money) -> AmortResult<()> {
        ensure_positive("principal", principal)?;
        self.principal = principal;
        self.recompute();
        Ok(())
    }

    /// Replaces the schedule with one recomputed from scratch.
    pub fn set_period_count(&mut self, period_count: u32) -> AmortResult<()> {
        ensure_positive_count("period_count", period_count)?;
        self.period_count = period_count;
        self.recompute();
        Ok(())
    }

    /// Replaces the schedule with one recomputed from scratch.
    pub fn set_interest_rate(&mut self, interest_rate: Rate) -> AmortResult<()> {
        ensure_positive("interest_rate", interest_rate)?;
        self.interest_rate = interest_rate;
        self.recompute();
        Ok(())
    }

    /// Does not recompute: period length only affects unit conversions,
    /// not the interest/principal split.
    pub fn set_period_length_days(&mut self, period_length_days: Days) -> AmortResult<()> {
        ensure_positive("period_length_days", period_length_days)?;
        self.period_length_days = period_length_days;
        Ok(())
    }

    fn recompute(&mut self) {
        self.repayments = repayment_schedule(self.principal, self.interest_rate, self.period_count);
    }

    // -- structured export ---------------------------------------------------

    /// Structured export of the same data: period length and duration each
    /// grouped into days/months/years, repayments as an indexed table of
    /// principal/interest/total. Monetary figures are rounded to currency
    /// precision here, at the boundary only.
    pub fn to_value(&self) -> Value {
        let repayments: Vec<Value> = self
            .repayments
            .iter()
            .enumerate()
            .map(|(i, record)| {
                json!({
                    "period": i + 1,
                    "principal": round_currency(record.principal_amount),
                    "interest": round_currency(record.interest_amount),
                    "total": round_currency(record.total_amount()),
                })
            })
            .collect();

        json!({
            "principal": self.principal,
            "interest_rate": self.interest_rate,
            "period_count": self.period_count,
            "discount_factor": self.discount_factor(),
            "level_payment": round_currency(self.level_payment()),
            "period_length": {
                "days": self.period_length_days,
                "months": self.period_length_months(),
                "years": self.period_length_years(),
            },
            "duration": {
                "days": self.duration_days(),
                "months": self.duration_months(),
                "years": self.duration_years(),
            },
            "repayments": repayments,
        })
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn ensure_positive(field: &str, value: Decimal) -> AmortResult<()> {
    if value <= Decimal::ZERO {
        return Err(AmortError::InvalidInput {
            field: field.into(),
            reason: "must be a positive number".into(),
        });
    }
    Ok(())
}

fn ensure_positive_count(field: &str, value: u32) -> AmortResult<()> {
    if value == 0 {
        return Err(AmortError::InvalidInput {
            field: field.into(),
            reason: "must be at least 1".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    /// Tolerance for accumulated decimal precision loss (not rounding).
    const EPS: Decimal = dec!(0.000000000001);

    /// Helper: 40000 repaid over 6 yearly periods at 12% per period.
    fn standard_debt() -> AmortizedDebt {
        AmortizedDebt::new(dec!(40000), 6, dec!(360), dec!(0.12)).unwrap()
    }

    // -----------------------------------------------------------------------
    // 1. Level payment for the standard scenario
    // -----------------------------------------------------------------------
    #[test]
    fn test_level_payment_standard_scenario() {
        let debt = standard_debt();
        assert_eq!(round_currency(debt.level_payment()), dec!(9729.03));
    }

    // -----------------------------------------------------------------------
    // 2. Full schedule, period by period, at reporting precision
    // -----------------------------------------------------------------------
    #[test]
    fn test_schedule_period_by_period() {
        let debt = standard_debt();
        let schedule = debt.repayments();
        assert_eq!(schedule.len(), 6);

        let expected = [
            (dec!(4929.03), dec!(4800.00)),
            (dec!(5520.51), dec!(4208.52)),
            (dec!(6182.97), dec!(3546.06)),
            (dec!(6924.93), dec!(2804.10)),
            (dec!(7755.92), dec!(1973.11)),
            (dec!(8686.63), dec!(1042.40)),
        ];

        for (i, (principal, interest)) in expected.iter().enumerate() {
            assert_eq!(
                round_currency(schedule[i].principal_amount),
                *principal,
                "period {} principal",
                i + 1
            );
            assert_eq!(
                round_currency(schedule[i].interest_amount),
                *interest,
                "period {} interest",
                i + 1
            );
            assert_eq!(
                round_currency(schedule[i].total_amount()),
                dec!(9729.03),
                "period {} total",
                i + 1
            );
        }
    }

    // -----------------------------------------------------------------------
    // 3. Balance convergence: principal portions sum back to the principal
    // -----------------------------------------------------------------------
    #[test]
    fn test_balance_convergence() {
        let debt = standard_debt();
        let repaid: Decimal = debt.repayments().iter().map(|r| r.principal_amount).sum();
        assert!(
            (repaid - debt.principal()).abs() < EPS,
            "principal repaid {} should converge to {}",
            repaid,
            debt.principal()
        );
    }

    // -----------------------------------------------------------------------
    // 4. Balance convergence over a long schedule (360 periods)
    // -----------------------------------------------------------------------
    #[test]
    fn test_balance_convergence_long_schedule() {
        let debt = AmortizedDebt::monthly(dec!(250000), 360, dec!(0.005)).unwrap();
        assert_eq!(debt.repayments().len(), 360);

        let repaid: Decimal = debt.repayments().iter().map(|r| r.principal_amount).sum();
        assert!(
            (repaid - dec!(250000)).abs() < EPS,
            "principal repaid {} should converge to 250000 over 360 periods",
            repaid
        );
    }

    // -----------------------------------------------------------------------
    // 5. Level-payment invariant: every period totals K
    // -----------------------------------------------------------------------
    #[test]
    fn test_level_payment_invariant() {
        let debt = standard_debt();
        let k = debt.level_payment();

        for (i, record) in debt.repayments().iter().enumerate() {
            assert!(
                (record.total_amount() - k).abs() < EPS,
                "period {}: total {} should equal level payment {}",
                i + 1,
                record.total_amount(),
                k
            );
        }
    }

    // -----------------------------------------------------------------------
    // 6. Monotonic split: principal strictly up, interest strictly down
    // -----------------------------------------------------------------------
    #[test]
    fn test_monotonic_split() {
        let debt = standard_debt();
        let schedule = debt.repayments();

        for i in 1..schedule.len() {
            assert!(
                schedule[i].principal_amount > schedule[i - 1].principal_amount,
                "period {}: principal portion should be strictly increasing",
                i + 1
            );
            assert!(
                schedule[i].interest_amount < schedule[i - 1].interest_amount,
                "period {}: interest portion should be strictly decreasing",
                i + 1
            );
        }
    }

    // -----------------------------------------------------------------------
    // 7. Discount factor
    // -----------------------------------------------------------------------
    #[test]
    fn test_discount_factor() {
        let debt = standard_debt();
        assert_eq!(debt.discount_factor(), Decimal::ONE / dec!(1.12));
    }

    // -----------------------------------------------------------------------
    // 8. Setter invalidation: principal change recomputes the schedule
    // -----------------------------------------------------------------------
    #[test]
    fn test_set_principal_recomputes() {
        let mut debt = standard_debt();
        let before = debt.repayments().to_vec();

        debt.set_principal(dec!(80000)).unwrap();

        assert_ne!(debt.repayments(), &before[..]);
        // First-period interest is rate * new principal
        assert_eq!(
            debt.repayments()[0].interest_amount,
            dec!(0.12) * dec!(80000)
        );
    }

    // -----------------------------------------------------------------------
    // 9. Setter invalidation: period count change recomputes the schedule
    // -----------------------------------------------------------------------
    #[test]
    fn test_set_period_count_recomputes() {
        let mut debt = standard_debt();
        debt.set_period_count(12).unwrap();

        assert_eq!(debt.repayments().len(), 12);
        let repaid: Decimal = debt.repayments().iter().map(|r| r.principal_amount).sum();
        assert!((repaid - dec!(40000)).abs() < EPS);
    }

    // -----------------------------------------------------------------------
    // 10. Setter invalidation: rate change recomputes the schedule
    // -----------------------------------------------------------------------
    #[test]
    fn test_set_interest_rate_recomputes() {
        let mut debt = standard_debt();
        debt.set_interest_rate(dec!(0.06)).unwrap();

        assert_eq!(
            debt.repayments()[0].interest_amount,
            dec!(0.06) * dec!(40000)
        );
    }

    // -----------------------------------------------------------------------
    // 11. Period length setter does NOT recompute the schedule
    // -----------------------------------------------------------------------
    #[test]
    fn test_set_period_length_does_not_recompute() {
        let mut debt = standard_debt();
        let before = debt.repayments().to_vec();

        debt.set_period_length_days(dec!(30)).unwrap();

        assert_eq!(
            debt.repayments(),
            &before[..],
            "interest/principal split must not change with period length"
        );
        assert_eq!(debt.period_length_days(), dec!(30));
        assert_eq!(debt.duration_days(), dec!(180));
    }

    // -----------------------------------------------------------------------
    // 12. Derived unit conversions under 30/360
    // -----------------------------------------------------------------------
    #[test]
    fn test_unit_conversions() {
        let debt = standard_debt();
        assert_eq!(debt.period_length_months(), dec!(12));
        assert_eq!(debt.period_length_years(), dec!(1));
        assert_eq!(debt.duration_days(), dec!(2160));
        assert_eq!(debt.duration_months(), dec!(72));
        assert_eq!(debt.duration_years(), dec!(6));
    }

    // -----------------------------------------------------------------------
    // 13. Preset constructors
    // -----------------------------------------------------------------------
    #[test]
    fn test_preset_constructors() {
        let daily = AmortizedDebt::daily(dec!(1000), 10, dec!(0.001)).unwrap();
        assert_eq!(daily.period_length_days(), dec!(1));

        let monthly = AmortizedDebt::monthly(dec!(1000), 12, dec!(0.01)).unwrap();
        assert_eq!(monthly.period_length_days(), dec!(30));
        assert_eq!(monthly.period_length_months(), dec!(1));
        assert_eq!(monthly.duration_years(), dec!(1));

        let yearly = AmortizedDebt::yearly(dec!(1000), 5, dec!(0.08)).unwrap();
        assert_eq!(yearly.period_length_years(), dec!(1));
    }

    // -----------------------------------------------------------------------
    // 14. Validation: construction rejects non-positive parameters
    // -----------------------------------------------------------------------
    #[test]
    fn test_validation_on_construction() {
        let cases: [(&str, AmortResult<AmortizedDebt>); 5] = [
            (
                "principal",
                AmortizedDebt::new(dec!(0), 6, dec!(360), dec!(0.12)),
            ),
            (
                "principal",
                AmortizedDebt::new(dec!(-40000), 6, dec!(360), dec!(0.12)),
            ),
            (
                "period_count",
                AmortizedDebt::new(dec!(40000), 0, dec!(360), dec!(0.12)),
            ),
            (
                "period_length_days",
                AmortizedDebt::new(dec!(40000), 6, dec!(-360), dec!(0.12)),
            ),
            (
                "interest_rate",
                AmortizedDebt::new(dec!(40000), 6, dec!(360), dec!(0)),
            ),
        ];

        for (expected_field, result) in cases {
            match result {
                Err(AmortError::InvalidInput { field, .. }) => {
                    assert_eq!(field, expected_field);
                }
                Ok(_) => panic!("expected InvalidInput for {}", expected_field),
            }
        }
    }

    // -----------------------------------------------------------------------
    // 15. Validation: failed setter leaves prior state untouched
    // -----------------------------------------------------------------------
    #[test]
    fn test_failed_setter_preserves_state() {
        let mut debt = standard_debt();
        let before = debt.clone();

        assert!(debt.set_principal(dec!(-1)).is_err());
        assert!(debt.set_period_count(0).is_err());
        assert!(debt.set_interest_rate(dec!(0)).is_err());
        assert!(debt.set_period_length_days(dec!(-30)).is_err());

        assert_eq!(debt.principal(), before.principal());
        assert_eq!(debt.period_count(), before.period_count());
        assert_eq!(debt.interest_rate(), before.interest_rate());
        assert_eq!(debt.period_length_days(), before.period_length_days());
        assert_eq!(debt.repayments(), before.repayments());
    }

    // -----------------------------------------------------------------------
    // 16. Structured export shape
    // -----------------------------------------------------------------------
    #[test]
    fn test_export_shape() {
        let debt = standard_debt();
        let value = debt.to_value();

        assert_eq!(value["period_count"], json!(6));
        assert_eq!(value["level_payment"], json!("9729.03"));
        assert_eq!(value["period_length"]["days"], json!("360"));
        assert_eq!(value["period_length"]["months"], json!("12"));
        assert_eq!(value["duration"]["years"], json!("6"));

        let repayments = value["repayments"].as_array().unwrap();
        assert_eq!(repayments.len(), 6);
        assert_eq!(repayments[0]["period"], json!(1));
        assert_eq!(repayments[0]["principal"], json!("4929.03"));
        assert_eq!(repayments[0]["interest"], json!("4800.00"));
        assert_eq!(repayments[0]["total"], json!("9729.03"));
        assert_eq!(repayments[5]["period"], json!(6));
        assert_eq!(repayments[5]["interest"], json!("1042.40"));
    }

    // -----------------------------------------------------------------------
    // 17. Export reflects a recomputed schedule after mutation
    // -----------------------------------------------------------------------
    #[test]
    fn test_export_tracks_mutation() {
        let mut debt = standard_debt();
        debt.set_interest_rate(dec!(0.06)).unwrap();

        let value = debt.to_value();
        assert_eq!(value["repayments"][0]["interest"], json!("2400.00"));
    }

    // -----------------------------------------------------------------------
    // 18. Single-period schedule repays everything at once
    // -----------------------------------------------------------------------
    #[test]
    fn test_single_period_schedule() {
        let debt = AmortizedDebt::yearly(dec!(1000), 1, dec!(0.10)).unwrap();
        let schedule = debt.repayments();

        assert_eq!(schedule.len(), 1);
        assert!((schedule[0].principal_amount - dec!(1000)).abs() < EPS);
        assert!((schedule[0].interest_amount - dec!(100)).abs() < EPS);
    }
}
