//! Rate accumulation over monthly and annual series
//!
//! Monthly series (IPCA, CDI) are compounded over a window of rows:
//! either the trailing 12 rows of the table or every row of the current
//! year. Annual series (Selic) are already expressed per year, so only the
//! most recent value is used.
//!
//! All values arrive as percentages and leave as decimal fractions
//! (10.5% becomes 0.105).

use rust_decimal::Decimal;
use tracing::debug;

use crate::error::QueryError;
use crate::provider::{TimeSeriesTable, ValueColumn};

/// Rows compounded by the trailing (non year-to-date) window
pub const TRAILING_WINDOW: usize = 12;

/// Check that `table` has rows and carries the value column the rate needs.
pub fn validate_shape(table: &TimeSeriesTable, require_annual: bool) -> Result<(), QueryError> {
    let required = if require_annual {
        ValueColumn::AnnualPercent
    } else {
        ValueColumn::MonthlyPercent
    };

    if table.is_empty() {
        return Err(QueryError::Validation(format!(
            "series {} returned no rows",
            table.code
        )));
    }

    if table.column != required {
        return Err(QueryError::Validation(format!(
            "series {} has column {}, expected {}",
            table.code, table.column, required
        )));
    }

    Ok(())
}

/// Most recent annual rate of the table as a fraction
pub fn latest_annual(table: &TimeSeriesTable) -> Result<Decimal, QueryError> {
    validate_shape(table, true)?;

    let latest = table
        .last()
        .ok_or_else(|| QueryError::Validation(format!("series {} returned no rows", table.code)))?;

    debug!(
        "Latest {} value: {}% on {}",
        table.code, latest.value, latest.date
    );
    percent_to_fraction(latest.value)
}

/// Compound the monthly rates of `table` into a single accumulated fraction.
///
/// With `restrict_to_current_year` every row of `current_year` is used,
/// otherwise the last [`TRAILING_WINDOW`] rows regardless of year. An empty
/// selection accumulates to zero.
pub fn compound(
    table: &TimeSeriesTable,
    restrict_to_current_year: bool,
    current_year: i32,
) -> Result<Decimal, QueryError> {
    validate_shape(table, false)?;

    let window: Vec<Decimal> = if restrict_to_current_year {
        table
            .rows
            .iter()
            .filter(|row| row.year() == current_year)
            .map(|row| row.value)
            .collect()
    } else {
        let start = table.len().saturating_sub(TRAILING_WINDOW);
        table.rows[start..].iter().map(|row| row.value).collect()
    };

    if window.is_empty() {
        // Indistinguishable from a flat year; callers get 0 either way.
        debug!(
            "No {} rows for {}, accumulated rate is zero",
            table.code, current_year
        );
    } else {
        debug!("Compounding {} rows of {}", window.len(), table.code);
    }

    accumulate(&window)
}

/// ∏(1 + r/100) − 1 over monthly percentages, in order
pub fn accumulate(monthly_percents: &[Decimal]) -> Result<Decimal, QueryError> {
    let product = monthly_percents
        .iter()
        .try_fold(Decimal::ONE, |acc, &pct| {
            let factor = Decimal::ONE
                .checked_add(percent_to_fraction(pct)?)
                .ok_or_else(|| overflow(pct))?;
            acc.checked_mul(factor).ok_or_else(|| overflow(pct))
        })?;

    product
        .checked_sub(Decimal::ONE)
        .ok_or_else(|| QueryError::Arithmetic("accumulated product out of range".to_string()))
}

fn percent_to_fraction(pct: Decimal) -> Result<Decimal, QueryError> {
    pct.checked_div(Decimal::ONE_HUNDRED)
        .ok_or_else(|| QueryError::Arithmetic(format!("cannot convert {}% to a fraction", pct)))
}

fn overflow(pct: Decimal) -> QueryError {
    QueryError::Arithmetic(format!("overflow while compounding {}%", pct))
}
