// Provider module - time-series sources (Ipeadata API, CSV exports)

pub mod csv_dir;
pub mod ipea;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

use crate::error::Result;

pub use csv_dir::CsvDirProvider;
pub use ipea::IpeaProvider;

/// Year restriction applied to a fetched series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearFilter {
    /// Only rows from this year
    Exact(i32),
    /// Only rows strictly after this year
    GreaterThan(i32),
}

impl YearFilter {
    pub fn matches(&self, year: i32) -> bool {
        match *self {
            YearFilter::Exact(y) => year == y,
            YearFilter::GreaterThan(y) => year > y,
        }
    }
}

impl fmt::Display for YearFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YearFilter::Exact(y) => write!(f, "year = {}", y),
            YearFilter::GreaterThan(y) => write!(f, "year > {}", y),
        }
    }
}

/// Value column of a series, named after the unit reported by the source.
///
/// Ipeadata labels monthly rates `(% a.m.)` and annual rates `(% a.a.)`;
/// the column header is `VALUE (<unit>)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueColumn {
    MonthlyPercent,
    AnnualPercent,
    Other(String),
}

impl ValueColumn {
    pub fn from_unit(unit: &str) -> Self {
        let compact: String = unit
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '(' && *c != ')')
            .collect::<String>()
            .to_lowercase();
        match compact.as_str() {
            "%a.m." => ValueColumn::MonthlyPercent,
            "%a.a." => ValueColumn::AnnualPercent,
            _ => ValueColumn::Other(unit.trim().to_string()),
        }
    }

    /// Parse a `VALUE (<unit>)` header; `None` if the header is not a value column
    pub fn from_header(header: &str) -> Option<Self> {
        let trimmed = header.trim();
        let prefix = trimmed.get(..5)?;
        if !prefix.eq_ignore_ascii_case("value") {
            return None;
        }
        let unit = trimmed[5..].trim();
        let unit = unit
            .strip_prefix('(')
            .and_then(|u| u.strip_suffix(')'))
            .unwrap_or(unit);
        Some(Self::from_unit(unit))
    }

    pub fn unit(&self) -> &str {
        match self {
            ValueColumn::MonthlyPercent => "(% a.m.)",
            ValueColumn::AnnualPercent => "(% a.a.)",
            ValueColumn::Other(unit) => unit,
        }
    }

    pub fn header(&self) -> String {
        format!("VALUE ({})", self.unit())
    }
}

impl fmt::Display for ValueColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.header())
    }
}

/// One row of a series
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Observation {
    pub date: NaiveDate,
    /// Percentage as published (1.5 means 1.5%)
    pub value: Decimal,
}

impl Observation {
    pub fn new(date: NaiveDate, value: Decimal) -> Self {
        Self { date, value }
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }
}

/// A fetched series. Rows keep the order the source delivered them in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSeriesTable {
    pub code: String,
    pub column: ValueColumn,
    pub rows: Vec<Observation>,
}

impl TimeSeriesTable {
    pub fn new(code: impl Into<String>, column: ValueColumn, rows: Vec<Observation>) -> Self {
        Self {
            code: code.into(),
            column,
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn last(&self) -> Option<&Observation> {
        self.rows.last()
    }

    /// Keep only the rows whose year passes `filter`, preserving order
    pub fn filter_years(mut self, filter: YearFilter) -> Self {
        self.rows.retain(|row| filter.matches(row.year()));
        self
    }
}

/// Source of time series, queried by series code
pub trait TimeSeriesProvider {
    fn fetch(&self, code: &str, filter: YearFilter) -> Result<TimeSeriesTable>;
}

impl<P: TimeSeriesProvider + ?Sized> TimeSeriesProvider for Box<P> {
    fn fetch(&self, code: &str, filter: YearFilter) -> Result<TimeSeriesTable> {
        (**self).fetch(code, filter)
    }
}

impl<P: TimeSeriesProvider + ?Sized> TimeSeriesProvider for &P {
    fn fetch(&self, code: &str, filter: YearFilter) -> Result<TimeSeriesTable> {
        (**self).fetch(code, filter)
    }
}
