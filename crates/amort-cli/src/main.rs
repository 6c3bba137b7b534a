mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::schedule::{PaymentArgs, ScheduleArgs};

/// Debt amortization schedules with decimal precision
#[derive(Parser)]
#[command(
    name = "amort",
    version,
    about = "Debt amortization schedules with decimal precision",
    long_about = "Computes level-payment amortization schedules with exact \
                  decimal arithmetic: the fixed periodic repayment and the \
                  per-period split between principal and interest, under a \
                  30/360 day-count convention."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the full repayment schedule
    Schedule(ScheduleArgs),
    /// Compute just the level payment and discount factor
    Payment(PaymentArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Schedule(args) => commands::schedule::run_schedule(args),
        Commands::Payment(args) => commands::schedule::run_payment(args),
        Commands::Version => {
            println!("amort {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
