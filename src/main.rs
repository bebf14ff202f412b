use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use common_charges::{
    generate_charges, list_pending, mark_paid, register_unit, Period, SqliteStore,
    DEFAULT_BASE_AMOUNT, DEFAULT_DATABASE,
};

/// Common charges administration
#[derive(Parser, Debug)]
#[command(name = "common-charges", version, about = "Building common charges ledger")]
struct Cli {
    /// SQLite database file
    #[arg(long, env = "COMMON_CHARGES_DB", default_value = DEFAULT_DATABASE)]
    database: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a new unit
    Register {
        /// Unit number, e.g. 1305
        number: String,
    },

    /// Generate charges for every registered unit
    Generate {
        #[arg(long)]
        month: u32,
        #[arg(long)]
        year: i32,
        #[arg(long, default_value_t = DEFAULT_BASE_AMOUNT)]
        base_amount: f64,
    },

    /// Mark a unit's charge as paid
    Pay {
        #[arg(long)]
        unit: String,
        #[arg(long)]
        month: u32,
        #[arg(long)]
        year: i32,
        /// Payment date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
    },

    /// List unpaid charges up to a period
    Pending {
        #[arg(long)]
        month: u32,
        #[arg(long)]
        year: i32,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut store = SqliteStore::open(&cli.database)
        .with_context(|| format!("Failed to open database {}", cli.database.display()))?;

    match cli.command {
        Command::Register { number } => {
            let unit = register_unit(&mut store, &number)?;
            println!("✓ Unit {} registered", unit.number);
        }
        Command::Generate {
            month,
            year,
            base_amount,
        } => {
            let period = Period::new(month, year);
            let generated = generate_charges(&mut store, period, Some(base_amount))?;

            println!("✓ Generated {} charges for {}", generated.len(), period);
            for charge in &generated {
                println!("  {:<10} {:>12.2}", charge.unit_number, charge.amount);
            }
        }
        Command::Pay {
            unit,
            month,
            year,
            date,
        } => {
            let receipt = mark_paid(&mut store, &unit, Period::new(month, year), &date)?;
            println!(
                "✓ Unit {} {:02}/{} paid on {}: {}",
                receipt.unit_number, receipt.month, receipt.year, receipt.paid_date, receipt.message
            );
        }
        Command::Pending { month, year } => {
            let pending = list_pending(&store, Period::new(month, year))?;

            if pending.is_empty() {
                println!("No pending charges");
            } else {
                for charge in &pending {
                    println!(
                        "  {:<10} {:02}/{} {:>12.2}",
                        charge.unit_number, charge.month, charge.year, charge.amount
                    );
                }
            }
        }
    }

    Ok(())
}
