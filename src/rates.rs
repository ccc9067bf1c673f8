//! Rate queries: Selic, IPCA and CDI
//!
//! [`RateService`] is the boundary between the time-series plumbing and the
//! callers. Whatever fails underneath (fetching, validation, arithmetic),
//! a query answers with a [`RateResult`] and never panics or propagates.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

use crate::accumulator;
use crate::error::{QueryError, Result};
use crate::provider::{TimeSeriesProvider, TimeSeriesTable, YearFilter};

/// Decimal fraction (0.105 for 10.5%) or the reason it could not be computed
pub type RateResult = std::result::Result<Decimal, QueryError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RateKind {
    /// Annualized overnight policy rate, used as published
    Selic,
    /// Consumer price index, monthly % change
    Ipca,
    /// Interbank deposit rate, monthly %
    Cdi,
}

impl RateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateKind::Selic => "selic",
            RateKind::Ipca => "ipca",
            RateKind::Cdi => "cdi",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RateKind::Selic => "Selic",
            RateKind::Ipca => "IPCA",
            RateKind::Cdi => "CDI",
        }
    }

    /// Whether the series is compounded (monthly) rather than read as-is (annual)
    pub fn is_accumulated(&self) -> bool {
        !matches!(self, RateKind::Selic)
    }

    /// Rows requested from the provider for a query made in `year`.
    ///
    /// Selic only needs the current year; monthly series need enough history
    /// to cover a trailing 12-month window.
    pub fn year_filter(&self, year: i32) -> YearFilter {
        match self {
            RateKind::Selic => YearFilter::Exact(year),
            RateKind::Ipca | RateKind::Cdi => YearFilter::GreaterThan(year - 2),
        }
    }
}

impl fmt::Display for RateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RateKind {
    type Err = QueryError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "selic" => Ok(RateKind::Selic),
            "ipca" => Ok(RateKind::Ipca),
            "cdi" => Ok(RateKind::Cdi),
            _ => Err(QueryError::InvalidKind(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateQuery {
    pub kind: RateKind,
    /// Accumulate the current year only instead of the trailing 12 months.
    /// Ignored for Selic.
    pub year_to_date: bool,
}

impl RateQuery {
    pub fn new(kind: RateKind, year_to_date: bool) -> Self {
        Self { kind, year_to_date }
    }

    /// Human-readable window, e.g. "12 months" or "2025"
    pub fn window_label(&self, year: i32) -> String {
        if !self.kind.is_accumulated() {
            "annualized".to_string()
        } else if self.year_to_date {
            year.to_string()
        } else {
            "12 months".to_string()
        }
    }
}

/// Ipeadata series codes backing each rate
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeriesCodes {
    pub selic: String,
    pub ipca: String,
    pub cdi: String,
}

impl Default for SeriesCodes {
    fn default() -> Self {
        Self {
            selic: "BM366_TJOVER366".to_string(),
            ipca: "PRECOS12_IPCAG12".to_string(),
            cdi: "BM12_TJCDI12".to_string(),
        }
    }
}

impl SeriesCodes {
    pub fn code_for(&self, kind: RateKind) -> &str {
        match kind {
            RateKind::Selic => &self.selic,
            RateKind::Ipca => &self.ipca,
            RateKind::Cdi => &self.cdi,
        }
    }
}

/// One line of the standard report
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryEntry {
    pub query: RateQuery,
    pub window: String,
    pub result: RateResult,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RateSummary {
    pub date: NaiveDate,
    pub entries: Vec<SummaryEntry>,
}

/// Queries in the order of the standard report
pub const SUMMARY_QUERIES: [RateQuery; 5] = [
    RateQuery {
        kind: RateKind::Selic,
        year_to_date: false,
    },
    RateQuery {
        kind: RateKind::Ipca,
        year_to_date: false,
    },
    RateQuery {
        kind: RateKind::Ipca,
        year_to_date: true,
    },
    RateQuery {
        kind: RateKind::Cdi,
        year_to_date: true,
    },
    RateQuery {
        kind: RateKind::Cdi,
        year_to_date: false,
    },
];

pub struct RateService<P> {
    provider: P,
    series: SeriesCodes,
}

impl<P: TimeSeriesProvider> RateService<P> {
    pub fn new(provider: P) -> Self {
        Self::with_series(provider, SeriesCodes::default())
    }

    pub fn with_series(provider: P, series: SeriesCodes) -> Self {
        Self { provider, series }
    }

    pub fn series_codes(&self) -> &SeriesCodes {
        &self.series
    }

    /// Compute one rate as of `today`.
    ///
    /// Selic is the latest annualized value of the current year. IPCA and CDI
    /// are compounded over the trailing 12 rows, or over the rows of
    /// `today`'s year when `year_to_date` is set.
    pub fn query(&self, query: RateQuery, today: NaiveDate) -> RateResult {
        let year = today.year();
        let code = self.series.code_for(query.kind);

        let table = self
            .provider
            .fetch(code, query.kind.year_filter(year))
            .map_err(|e| {
                warn!("Failed to fetch {} series {}: {:#}", query.kind, code, e);
                QueryError::Provider(format!("{:#}", e))
            })?;

        let result = match query.kind {
            RateKind::Selic => accumulator::latest_annual(&table),
            RateKind::Ipca | RateKind::Cdi => {
                accumulator::compound(&table, query.year_to_date, year)
            }
        };

        match &result {
            Ok(value) => info!(
                "{} ({}) = {}",
                query.kind,
                query.window_label(year),
                value
            ),
            Err(e) => warn!("{} query failed: {}", query.kind, e),
        }
        result
    }

    /// Same as [`RateService::query`] with the kind given by name
    pub fn query_named(&self, kind: &str, year_to_date: bool, today: NaiveDate) -> RateResult {
        let kind = kind.parse::<RateKind>().inspect_err(|e| warn!("{}", e))?;
        self.query(RateQuery::new(kind, year_to_date), today)
    }

    /// The five standard figures: Selic, IPCA 12 months, IPCA year-to-date,
    /// CDI year-to-date, CDI 12 months. Each keeps its own result.
    pub fn summary(&self, today: NaiveDate) -> RateSummary {
        let entries = SUMMARY_QUERIES
            .iter()
            .map(|&query| SummaryEntry {
                query,
                window: query.window_label(today.year()),
                result: self.query(query, today),
            })
            .collect();

        RateSummary {
            date: today,
            entries,
        }
    }

    /// Raw rows a query for `kind` would be computed from
    pub fn series(&self, kind: RateKind, today: NaiveDate) -> Result<TimeSeriesTable> {
        let code = self.series.code_for(kind);
        self.provider.fetch(code, kind.year_filter(today.year()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{Observation, ValueColumn};
    use anyhow::anyhow;
    use rust_decimal_macros::dec;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// In-memory provider recording the filters it was asked for
    #[derive(Default)]
    struct MockProvider {
        tables: HashMap<String, TimeSeriesTable>,
        calls: RefCell<Vec<(String, YearFilter)>>,
    }

    impl MockProvider {
        fn with(mut self, table: TimeSeriesTable) -> Self {
            self.tables.insert(table.code.clone(), table);
            self
        }
    }

    impl TimeSeriesProvider for MockProvider {
        fn fetch(&self, code: &str, filter: YearFilter) -> Result<TimeSeriesTable> {
            self.calls.borrow_mut().push((code.to_string(), filter));
            self.tables
                .get(code)
                .cloned()
                .map(|t| t.filter_years(filter))
                .ok_or_else(|| anyhow!("series {} unreachable", code))
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn monthly(code: &str, rows: &[(i32, u32, Decimal)]) -> TimeSeriesTable {
        TimeSeriesTable::new(
            code,
            ValueColumn::MonthlyPercent,
            rows.iter()
                .map(|&(y, m, v)| Observation::new(date(y, m, 1), v))
                .collect(),
        )
    }

    fn selic(rows: &[(i32, u32, u32, Decimal)]) -> TimeSeriesTable {
        TimeSeriesTable::new(
            "BM366_TJOVER366",
            ValueColumn::AnnualPercent,
            rows.iter()
                .map(|&(y, m, d, v)| Observation::new(date(y, m, d), v))
                .collect(),
        )
    }

    /// 13 monthly rows at 1% all dated 2024
    fn thirteen_ipca_rows() -> TimeSeriesTable {
        let mut rows: Vec<(i32, u32, Decimal)> = (1..=12).map(|m| (2024, m, dec!(1))).collect();
        rows.push((2024, 12, dec!(1)));
        monthly("PRECOS12_IPCAG12", &rows)
    }

    fn assert_close(actual: Decimal, expected: Decimal) {
        assert!(
            (actual - expected).abs() < dec!(0.00001),
            "expected {} to be close to {}",
            actual,
            expected
        );
    }

    #[test]
    fn test_rate_kind_from_str() {
        assert_eq!("selic".parse::<RateKind>(), Ok(RateKind::Selic));
        assert_eq!("IPCA".parse::<RateKind>(), Ok(RateKind::Ipca));
        assert_eq!(" cdi ".parse::<RateKind>(), Ok(RateKind::Cdi));
        assert_eq!(
            "igpm".parse::<RateKind>(),
            Err(QueryError::InvalidKind("igpm".to_string()))
        );
    }

    #[test]
    fn test_year_filters() {
        assert_eq!(RateKind::Selic.year_filter(2025), YearFilter::Exact(2025));
        assert_eq!(
            RateKind::Ipca.year_filter(2025),
            YearFilter::GreaterThan(2023)
        );
        assert_eq!(RateKind::Cdi.year_filter(2025), YearFilter::GreaterThan(2023));
    }

    #[test]
    fn test_window_labels() {
        assert_eq!(
            RateQuery::new(RateKind::Selic, true).window_label(2025),
            "annualized"
        );
        assert_eq!(
            RateQuery::new(RateKind::Ipca, false).window_label(2025),
            "12 months"
        );
        assert_eq!(RateQuery::new(RateKind::Cdi, true).window_label(2025), "2025");
    }

    #[test]
    fn test_ipca_trailing_and_year_to_date() {
        let service = RateService::new(MockProvider::default().with(thirteen_ipca_rows()));
        let today = date(2024, 12, 20);

        let trailing = service
            .query(RateQuery::new(RateKind::Ipca, false), today)
            .unwrap();
        assert_close(trailing, dec!(0.12683));

        let ytd = service
            .query(RateQuery::new(RateKind::Ipca, true), today)
            .unwrap();
        assert_close(ytd, dec!(0.13809));
    }

    #[test]
    fn test_selic_uses_latest_value_of_current_year() {
        let provider = MockProvider::default().with(selic(&[
            (2024, 12, 31, dec!(12.15)),
            (2025, 6, 12, dec!(14.90)),
            (2025, 6, 13, dec!(15.00)),
        ]));
        let service = RateService::new(provider);

        let value = service
            .query(RateQuery::new(RateKind::Selic, false), date(2025, 6, 15))
            .unwrap();
        assert_eq!(value, dec!(0.15));
    }

    #[test]
    fn test_selic_with_no_rows_this_year_is_validation_error() {
        let provider = MockProvider::default().with(selic(&[(2024, 12, 31, dec!(12.15))]));
        let service = RateService::new(provider);

        let result = service.query(RateQuery::new(RateKind::Selic, false), date(2025, 1, 1));
        assert!(matches!(result, Err(QueryError::Validation(_))));
    }

    #[test]
    fn test_query_requests_expected_filters() {
        let provider = MockProvider::default()
            .with(selic(&[(2025, 1, 2, dec!(12.15))]))
            .with(monthly("BM12_TJCDI12", &[(2025, 1, dec!(1))]));
        let service = RateService::new(&provider);
        let today = date(2025, 3, 1);

        service
            .query(RateQuery::new(RateKind::Selic, false), today)
            .unwrap();
        service
            .query(RateQuery::new(RateKind::Cdi, true), today)
            .unwrap();

        let calls = provider.calls.borrow();
        assert_eq!(
            *calls,
            vec![
                ("BM366_TJOVER366".to_string(), YearFilter::Exact(2025)),
                ("BM12_TJCDI12".to_string(), YearFilter::GreaterThan(2023)),
            ]
        );
    }

    #[test]
    fn test_query_named_rejects_unknown_kind() {
        let service = RateService::new(MockProvider::default());
        let result = service.query_named("bogus", false, date(2025, 1, 1));

        match result {
            Err(QueryError::InvalidKind(kind)) => assert_eq!(kind, "bogus"),
            other => panic!("expected invalid kind, got {:?}", other),
        }
        let message = service
            .query_named("bogus", false, date(2025, 1, 1))
            .unwrap_err()
            .to_string();
        assert!(message.contains("\"bogus\""));
    }

    #[test]
    fn test_query_named_dispatches() {
        let service = RateService::new(MockProvider::default().with(thirteen_ipca_rows()));
        let value = service
            .query_named("ipca", true, date(2024, 12, 20))
            .unwrap();
        assert_close(value, dec!(0.13809));
    }

    #[test]
    fn test_provider_failure_becomes_error_result() {
        let service = RateService::new(MockProvider::default());
        let result = service.query(RateQuery::new(RateKind::Cdi, false), date(2025, 1, 1));

        match result {
            Err(QueryError::Provider(msg)) => assert!(msg.contains("BM12_TJCDI12 unreachable")),
            other => panic!("expected provider error, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_column_becomes_validation_error() {
        // IPCA code pointing at an annual series
        let mut table = selic(&[(2025, 1, 2, dec!(12.15))]);
        table.code = "PRECOS12_IPCAG12".to_string();
        let service = RateService::new(MockProvider::default().with(table));

        let result = service.query(RateQuery::new(RateKind::Ipca, false), date(2025, 3, 1));
        assert!(matches!(result, Err(QueryError::Validation(_))));
    }

    #[test]
    fn test_custom_series_codes() {
        let series = SeriesCodes {
            cdi: "MY_CDI".to_string(),
            ..SeriesCodes::default()
        };
        let provider = MockProvider::default().with(monthly("MY_CDI", &[(2025, 1, dec!(2))]));
        let service = RateService::with_series(provider, series);

        assert_eq!(service.series_codes().code_for(RateKind::Cdi), "MY_CDI");
        assert_eq!(
            service.query(RateQuery::new(RateKind::Cdi, false), date(2025, 2, 1)),
            Ok(dec!(0.02))
        );
    }

    #[test]
    fn test_summary_keeps_each_result() {
        // No CDI table: CDI entries fail, the rest still compute
        let provider = MockProvider::default()
            .with(selic(&[(2024, 12, 20, dec!(12.25))]))
            .with(thirteen_ipca_rows());
        let service = RateService::new(provider);
        let summary = service.summary(date(2024, 12, 20));

        assert_eq!(summary.date, date(2024, 12, 20));
        assert_eq!(summary.entries.len(), 5);

        let kinds: Vec<(RateKind, bool)> = summary
            .entries
            .iter()
            .map(|e| (e.query.kind, e.query.year_to_date))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (RateKind::Selic, false),
                (RateKind::Ipca, false),
                (RateKind::Ipca, true),
                (RateKind::Cdi, true),
                (RateKind::Cdi, false),
            ]
        );

        assert_eq!(summary.entries[0].result, Ok(dec!(0.1225)));
        assert_eq!(summary.entries[2].window, "2024");
        assert!(summary.entries[1].result.is_ok());
        assert!(matches!(
            summary.entries[3].result,
            Err(QueryError::Provider(_))
        ));
        assert!(summary.entries[4].result.is_err());
    }

    #[test]
    fn test_series_returns_filtered_table() {
        let provider = MockProvider::default().with(monthly(
            "BM12_TJCDI12",
            &[(2022, 12, dec!(1.12)), (2023, 1, dec!(1.12)), (2024, 1, dec!(0.97))],
        ));
        let service = RateService::new(provider);

        let table = service.series(RateKind::Cdi, date(2024, 6, 1)).unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.rows.iter().all(|r| r.year() > 2022));
    }
}
