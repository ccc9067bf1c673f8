//! Offline series source: one CSV export per series code.
//!
//! `<dir>/<CODE>.csv` must have a `DATE` column and exactly one
//! `VALUE (<unit>)` column, e.g.
//!
//! ```text
//! DATE,VALUE ((% a.m.))
//! 2024-01-01,0.42
//! ```
//!
//! Semicolon-separated exports with decimal commas are accepted too.
//! Rows are kept in file order.

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

use super::{Observation, TimeSeriesProvider, TimeSeriesTable, ValueColumn, YearFilter};

pub struct CsvDirProvider {
    dir: PathBuf,
}

impl CsvDirProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, code: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", code))
    }
}

impl TimeSeriesProvider for CsvDirProvider {
    fn fetch(&self, code: &str, filter: YearFilter) -> Result<TimeSeriesTable> {
        let path = self.path_for(code);
        info!("Reading series {} ({}) from {}", code, filter, path.display());

        let table = read_table(code, &path)?.filter_years(filter);
        debug!("Series {} has {} rows after filtering", code, table.len());
        Ok(table)
    }
}

fn read_table(code: &str, path: &Path) -> Result<TimeSeriesTable> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read series file {}", path.display()))?;
    parse_table(code, &content).with_context(|| format!("Invalid series file {}", path.display()))
}

pub fn parse_table(code: &str, content: &str) -> Result<TimeSeriesTable> {
    let first_line = content.lines().next().unwrap_or("");
    let semicolon = first_line.contains(';');

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(if semicolon { b';' } else { b',' })
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());
    let headers = reader.headers()?.clone();

    let date_idx = find_header(&headers, "DATE")?;
    let (value_idx, column) = find_value_column(&headers)?;

    let mut rows = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record = result?;
        let date = record.get(date_idx).unwrap_or("");
        let value = record.get(value_idx).unwrap_or("");

        if date.is_empty() {
            continue;
        }
        let date = parse_date(date).with_context(|| format!("row {}", line + 1))?;

        if value.is_empty() {
            debug!("Skipping empty value on {}", date);
            continue;
        }
        let value = parse_value(value, semicolon).with_context(|| format!("row {}", line + 1))?;

        rows.push(Observation::new(date, value));
    }

    Ok(TimeSeriesTable::new(code, column, rows))
}

fn find_header(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(name))
        .ok_or_else(|| anyhow!("Missing series CSV column: {}", name))
}

fn find_value_column(headers: &csv::StringRecord) -> Result<(usize, ValueColumn)> {
    let mut found = headers
        .iter()
        .enumerate()
        .filter_map(|(idx, h)| ValueColumn::from_header(h).map(|col| (idx, col)));

    let first = found
        .next()
        .ok_or_else(|| anyhow!("Missing series CSV column: VALUE (<unit>)"))?;
    if found.next().is_some() {
        return Err(anyhow!("Series CSV has more than one VALUE column"));
    }
    Ok(first)
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%d/%m/%Y"))
        .context(format!("Invalid date in series CSV: {}", value))
}

fn parse_value(value: &str, decimal_comma: bool) -> Result<Decimal> {
    let normalized = if decimal_comma {
        value.replace(',', ".")
    } else {
        value.to_string()
    };
    Decimal::from_str(&normalized)
        .map_err(|err| anyhow!("Invalid value in series CSV '{}': {}", value, err))
}
