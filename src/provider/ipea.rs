use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate};
use reqwest::blocking::Client;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use super::{Observation, TimeSeriesProvider, TimeSeriesTable, ValueColumn, YearFilter};

pub const DEFAULT_BASE_URL: &str = "http://www.ipeadata.gov.br/api/odata4";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// OData v4 envelope used by every Ipeadata endpoint
#[derive(Debug, Deserialize)]
struct ODataResponse<T> {
    value: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct SeriesMetadata {
    #[serde(rename = "SERNOME")]
    name: Option<String>,
    #[serde(rename = "SERUNIDADE")]
    unit: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SeriesValue {
    #[serde(rename = "VALDATA")]
    date: String,
    #[serde(rename = "VALVALOR")]
    value: Option<Decimal>,
}

/// Ipeadata OData client
pub struct IpeaProvider {
    client: Client,
    base_url: String,
}

impl IpeaProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (compatible; TaxasBot/1.0)")
            .timeout(timeout)
            .build()
            .context("Failed to build Ipeadata HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .context("Failed to send request to Ipeadata")?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Ipeadata returned error status: {}",
                response.status()
            ));
        }

        response
            .json()
            .context("Failed to parse Ipeadata response")
    }

    /// Unit of the series, from its metadata record
    fn fetch_column(&self, code: &str) -> Result<ValueColumn> {
        let url = format!("{}/Metadados('{}')", self.base_url, code);
        let data: ODataResponse<SeriesMetadata> = self.get_json(&url)?;
        column_from_metadata(code, data)
    }

    fn fetch_values(&self, code: &str) -> Result<Vec<Observation>> {
        let url = format!("{}/ValoresSerie(SERCODIGO='{}')", self.base_url, code);
        let data: ODataResponse<SeriesValue> = self.get_json(&url)?;
        observations_from_values(data)
    }
}

impl TimeSeriesProvider for IpeaProvider {
    fn fetch(&self, code: &str, filter: YearFilter) -> Result<TimeSeriesTable> {
        info!("Fetching series {} ({}) from Ipeadata", code, filter);

        let column = self
            .fetch_column(code)
            .with_context(|| format!("Failed to fetch metadata for {}", code))?;
        let rows = self
            .fetch_values(code)
            .with_context(|| format!("Failed to fetch values for {}", code))?;

        let table = TimeSeriesTable::new(code, column, rows).filter_years(filter);
        debug!("Series {} has {} rows after filtering", code, table.len());
        Ok(table)
    }
}

fn column_from_metadata(code: &str, data: ODataResponse<SeriesMetadata>) -> Result<ValueColumn> {
    let meta = data
        .value
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("Unknown Ipeadata series: {}", code))?;

    if let Some(name) = &meta.name {
        debug!("Series {}: {}", code, name);
    }

    let unit = meta
        .unit
        .ok_or_else(|| anyhow!("Ipeadata series {} has no unit", code))?;
    Ok(ValueColumn::from_unit(&unit))
}

/// Rows without a value are dropped; the rest are sorted by date.
fn observations_from_values(data: ODataResponse<SeriesValue>) -> Result<Vec<Observation>> {
    let mut rows = Vec::with_capacity(data.value.len());
    for entry in data.value {
        let date = parse_valdata(&entry.date)?;
        match entry.value {
            Some(value) => rows.push(Observation::new(date, value)),
            None => debug!("Skipping empty value on {}", date),
        }
    }
    rows.sort_by_key(|row| row.date);
    Ok(rows)
}

/// Parse Ipeadata `VALDATA` (RFC 3339 with offset, e.g. 2024-01-01T00:00:00-02:00)
fn parse_valdata(raw: &str) -> Result<NaiveDate> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .context(format!("Failed to parse Ipeadata date: {}", raw))
}
