use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;

pub mod formatters;

#[derive(Parser)]
#[command(name = "tributec")]
#[command(version, about = "Brazilian import tax stack and drawback eligibility engine")]
#[command(
    long_about = "Estimate import taxes (II, IPI, IOF, ICMS por dentro) for real or simulated operations, classify the tax burden, and find imports eligible for drawback."
)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Disable colorized/ANSI output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Output results in JSON format
    #[arg(long = "json", global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute the tax stack for a single import
    Calculate {
        /// FOB value in foreign currency
        #[arg(long)]
        fob: Decimal,

        /// Exchange rate to BRL
        #[arg(long)]
        rate: Decimal,

        /// State VAT (ICMS) rate, defaults to the configured rate
        #[arg(long)]
        vat: Option<Decimal>,

        /// Import duty (II) rate
        #[arg(long)]
        duty: Option<Decimal>,

        /// Excise (IPI) rate
        #[arg(long)]
        excise: Option<Decimal>,

        /// Exchange tax (IOF) rate
        #[arg(long)]
        iof: Option<Decimal>,

        /// Customs fees in BRL
        #[arg(long, default_value = "0")]
        fees: Decimal,

        /// Tariff code used for the recommendation
        #[arg(long, default_value = "8471")]
        tariff: String,

        /// Also show drawback and reduced-ICMS savings scenarios
        #[arg(long)]
        what_if: bool,
    },

    /// Simulate a seeded batch of imports
    Simulate {
        /// Number of operations (defaults to the configured count)
        #[arg(short = 'n', long)]
        count: Option<usize>,

        /// Random seed (defaults to the configured seed, else a random one)
        #[arg(long)]
        seed: Option<u64>,

        /// Run on a single thread
        #[arg(long)]
        sequential: bool,

        /// Also simulate export legs and run drawback matching
        #[arg(long)]
        with_exports: bool,

        /// Directory for CSV/JSON output files
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Evaluate real operations from a CSV file
    Evaluate {
        /// CSV with id, direction, entity_id, tariff_code, fob_value, exchange_rate,
        /// state_vat_rate, customs_fees, operation_date, quantity
        file: PathBuf,

        /// Write evaluated operations to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Match imports to exports eligible for drawback
    Drawback {
        /// CSV of import operations
        imports: PathBuf,

        /// CSV of export operations
        exports: PathBuf,

        /// Restrict matching to one entity (taxpayer id)
        #[arg(long)]
        entity: Option<String>,

        /// Matching window in days (defaults to the configured window)
        #[arg(long)]
        window: Option<u32>,

        /// Write links to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Rank entities by import taxes and list their most taxed operations
    Entities {
        /// CSV of operations (raw inputs or evaluated rows)
        file: PathBuf,

        /// Operations listed per entity
        #[arg(long, default_value_t = 3)]
        top: usize,

        /// Show a single entity (taxpayer id)
        #[arg(long)]
        entity: Option<String>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,

    /// Write the default configuration to a file
    Init {
        /// Destination (defaults to the user config directory)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
