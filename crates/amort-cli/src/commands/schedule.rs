use std::time::Instant;

use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use amort_core::conventions::{PERIOD_DAILY, PERIOD_MONTHLY, PERIOD_YEARLY};
use amort_core::schedule::{round_currency, AmortizedDebt};
use amort_core::types::with_metadata;

use crate::input;

/// Period-length presets under the 30/360 day-count convention.
#[derive(Debug, Clone, ValueEnum)]
pub enum PeriodPreset {
    Daily,
    Monthly,
    Yearly,
}

impl PeriodPreset {
    fn days(&self) -> Decimal {
        match self {
            PeriodPreset::Daily => PERIOD_DAILY,
            PeriodPreset::Monthly => PERIOD_MONTHLY,
            PeriodPreset::Yearly => PERIOD_YEARLY,
        }
    }
}

/// Parameters accepted from a JSON file or piped stdin.
#[derive(Debug, Deserialize)]
struct ScheduleParams {
    principal: Decimal,
    periods: u32,
    rate: Decimal,
    #[serde(default)]
    period_days: Option<Decimal>,
}

/// Arguments for the full repayment schedule
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ScheduleArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Original amount owed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Number of compounding/repayment periods
    #[arg(long)]
    pub periods: Option<u32>,

    /// Interest rate per period as a decimal multiplier (0.12 = 12%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Length of one period in days (overrides --period)
    #[arg(long)]
    pub period_days: Option<Decimal>,

    /// Period-length preset
    #[arg(long, value_enum, default_value = "yearly")]
    pub period: PeriodPreset,
}

/// Arguments for the level payment calculation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct PaymentArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Original amount owed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Number of compounding/repayment periods
    #[arg(long)]
    pub periods: Option<u32>,

    /// Interest rate per period as a decimal multiplier (0.12 = 12%)
    #[arg(long)]
    pub rate: Option<Decimal>,
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let params: ScheduleParams = if let Some(ref path) = args.input {
        input::read_json(path)?
    } else if let Some(data) = input::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        ScheduleParams {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            periods: args
                .periods
                .ok_or("--periods is required (or provide --input)")?,
            rate: args.rate.ok_or("--rate is required (or provide --input)")?,
            period_days: args.period_days,
        }
    };

    let period_days = params.period_days.unwrap_or_else(|| args.period.days());

    let start = Instant::now();
    let debt = AmortizedDebt::new(params.principal, params.periods, period_days, params.rate)?;
    let elapsed = start.elapsed().as_micros() as u64;

    let output = with_metadata(
        "Level-payment amortization — annuity present value, 30/360 day count",
        &serde_json::json!({
            "principal": params.principal.to_string(),
            "periods": params.periods,
            "rate": params.rate.to_string(),
            "period_days": period_days.to_string(),
        }),
        elapsed,
        debt.to_value(),
    );

    Ok(serde_json::to_value(output)?)
}

pub fn run_payment(args: PaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let params: ScheduleParams = if let Some(ref path) = args.input {
        input::read_json(path)?
    } else if let Some(data) = input::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        ScheduleParams {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            periods: args
                .periods
                .ok_or("--periods is required (or provide --input)")?,
            rate: args.rate.ok_or("--rate is required (or provide --input)")?,
            period_days: None,
        }
    };

    let start = Instant::now();
    let debt = AmortizedDebt::yearly(params.principal, params.periods, params.rate)?;
    let elapsed = start.elapsed().as_micros() as u64;

    let output = with_metadata(
        "Level payment from the amortized-annuity formula",
        &serde_json::json!({
            "principal": params.principal.to_string(),
            "periods": params.periods,
            "rate": params.rate.to_string(),
        }),
        elapsed,
        serde_json::json!({
            "level_payment": round_currency(debt.level_payment()),
            "discount_factor": debt.discount_factor(),
        }),
    );

    Ok(serde_json::to_value(output)?)
}
