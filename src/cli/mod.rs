use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod formatters;
pub mod runner;

#[derive(Parser)]
#[command(name = "taxas")]
#[command(version, about = "Brazilian benchmark rates (Selic, IPCA, CDI) from Ipeadata")]
#[command(
    long_about = "Fetch the Selic, IPCA and CDI series from Ipeadata and show the latest annualized Selic and the IPCA/CDI accumulated over the last 12 months or the current year."
)]
pub struct Cli {
    /// Disable colorized/ANSI output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Output results in JSON format
    #[arg(long = "json", global = true)]
    pub json: bool,

    /// Reference date (YYYY-MM-DD); defaults to today
    #[arg(long, global = true)]
    pub date: Option<String>,

    /// Read series from CSV exports in this directory instead of Ipeadata
    #[arg(long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Config file (defaults to $XDG_CONFIG_HOME/taxas/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Show Selic, IPCA and CDI (default)
    Summary,

    /// Compute a single rate
    Rate {
        /// Rate to compute: selic, ipca or cdi
        kind: String,

        /// Accumulate the current year only (IPCA and CDI)
        #[arg(long)]
        ytd: bool,
    },

    /// List the rows a rate is computed from
    Series {
        /// Rate whose series to list: selic, ipca or cdi
        kind: String,
    },
}
