use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;
use tracing::info;

use taxas::config::Config;
use taxas::provider::{CsvDirProvider, IpeaProvider, TimeSeriesProvider};
use taxas::rates::{RateKind, RateQuery, RateService};

use crate::cli::{formatters, Cli, Commands};

/// Run a parsed command line. Query failures are reported on stdout and turn
/// into a failing exit code; plumbing failures (config, bad flags) propagate.
pub fn run(cli: Cli) -> Result<ExitCode> {
    let config = Config::load(cli.config.as_deref())?
        .with_env_overrides(|key| std::env::var(key).ok());
    let today = resolve_date(cli.date.as_deref())?;
    let provider = build_provider(&config, cli.data_dir.as_deref())?;
    let service = RateService::with_series(provider, config.series.clone());

    match cli.command.unwrap_or(Commands::Summary) {
        Commands::Summary => {
            info!("Computing rate summary as of {}", today);
            let summary = service.summary(today);
            if cli.json {
                println!("{}", formatters::format_summary_json(&summary));
            } else {
                println!("{}", formatters::format_summary_table(&summary));
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Rate { kind, ytd } => {
            let Some(kind) = parse_kind(&kind, cli.json) else {
                return Ok(ExitCode::FAILURE);
            };
            let query = RateQuery::new(kind, ytd);
            let result = service.query(query, today);
            println!(
                "{}",
                formatters::format_rate(&query, today, &result, cli.json)
            );
            Ok(exit_code(formatters::percent_outcome(&result).is_ok()))
        }

        Commands::Series { kind } => {
            let Some(kind) = parse_kind(&kind, cli.json) else {
                return Ok(ExitCode::FAILURE);
            };
            let table = service
                .series(kind, today)
                .with_context(|| format!("Failed to fetch {} series", kind))?;
            println!("{}", formatters::format_series(kind, &table, cli.json));
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Parse a rate name, printing the error when it is not one we know
fn parse_kind(raw: &str, json: bool) -> Option<RateKind> {
    raw.parse::<RateKind>()
        .inspect_err(|e| println!("{}", formatters::format_error(e, json)))
        .ok()
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// `--date` if given, otherwise today's local date
pub fn resolve_date(raw: Option<&str>) -> Result<NaiveDate> {
    match raw {
        Some(d) => NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d")
            .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", d)),
        None => Ok(Local::now().date_naive()),
    }
}

/// CSV exports when a data directory is configured, Ipeadata otherwise.
/// `--data-dir` wins over the config file and environment.
fn build_provider(config: &Config, data_dir: Option<&Path>) -> Result<Box<dyn TimeSeriesProvider>> {
    match data_dir.or(config.data_dir.as_deref()) {
        Some(dir) => {
            info!("Using series exports from {}", dir.display());
            Ok(Box::new(CsvDirProvider::new(dir)))
        }
        None => {
            info!("Using Ipeadata at {}", config.base_url);
            let provider =
                IpeaProvider::new(&config.base_url, Duration::from_secs(config.timeout_secs))?;
            Ok(Box::new(provider))
        }
    }
}
