//! Output formatting module for CLI display
//!
//! This module handles all terminal output formatting, separating
//! the concerns of rate calculation from presentation.

use chrono::{Datelike, NaiveDate};
use colored::Colorize;
use serde::Serialize;
use tabled::{
    builder::Builder,
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

use taxas::error::QueryError;
use taxas::provider::TimeSeriesTable;
use taxas::rates::{RateKind, RateQuery, RateResult, RateSummary};
use taxas::utils::{format_percent, format_percent_value};

/// JSON shape of a single rate: `{"value": ..., "percent": ...}` or `{"error": ...}`
#[derive(Serialize)]
#[serde(untagged)]
enum JsonOutcome {
    Value { value: String, percent: String },
    Error { error: String },
}

impl From<&RateResult> for JsonOutcome {
    fn from(result: &RateResult) -> Self {
        match (result, percent_outcome(result)) {
            (Ok(value), Ok(percent)) => JsonOutcome::Value {
                value: value.normalize().to_string(),
                percent,
            },
            (_, Err(e)) => JsonOutcome::Error {
                error: e.to_string(),
            },
            (Err(e), _) => JsonOutcome::Error {
                error: e.to_string(),
            },
        }
    }
}

#[derive(Serialize)]
struct JsonRate {
    rate: RateKind,
    window: String,
    year_to_date: bool,
    #[serde(flatten)]
    outcome: JsonOutcome,
}

fn json_rate(query: &RateQuery, window: String, result: &RateResult) -> JsonRate {
    JsonRate {
        rate: query.kind,
        window,
        year_to_date: query.year_to_date,
        outcome: result.into(),
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!(r#"{{"error": "JSON serialization failed: {}"}}"#, e))
}

/// Percentage text of a rate, or the error to show in its place.
/// A value too large to scale to percent is an arithmetic error.
pub fn percent_outcome(result: &RateResult) -> Result<String, QueryError> {
    let value = result.clone()?;
    format_percent(value).ok_or_else(|| {
        QueryError::Arithmetic(format!("{} is too large to show as a percentage", value))
    })
}

fn format_outcome(result: &RateResult) -> String {
    match percent_outcome(result) {
        Ok(percent) => percent,
        Err(e) => format!("{} {}", "error:".red(), e),
    }
}

/// Format the standard report for JSON output
pub fn format_summary_json(summary: &RateSummary) -> String {
    #[derive(Serialize)]
    struct JsonSummary {
        date: NaiveDate,
        rates: Vec<JsonRate>,
    }

    let rates = summary
        .entries
        .iter()
        .map(|e| json_rate(&e.query, e.window.clone(), &e.result))
        .collect();

    to_json(&JsonSummary {
        date: summary.date,
        rates,
    })
}

/// Format the standard report for terminal table output
pub fn format_summary_table(summary: &RateSummary) -> String {
    let mut output = format!(
        "\n{} Brazilian benchmark rates as of {}\n\n",
        "📊".cyan().bold(),
        summary.date.format("%d/%m/%Y")
    );

    #[derive(Tabled)]
    struct RateRow {
        #[tabled(rename = "Rate")]
        rate: String,
        #[tabled(rename = "Window")]
        window: String,
        #[tabled(rename = "Value")]
        value: String,
    }

    let rows: Vec<RateRow> = summary
        .entries
        .iter()
        .map(|e| RateRow {
            rate: e.query.kind.label().to_string(),
            window: e.window.clone(),
            value: format_outcome(&e.result),
        })
        .collect();

    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..3)).with(Alignment::right()))
        .to_string();
    output.push_str(&table);
    output.push('\n');
    output
}

/// Format a single rate query
pub fn format_rate(query: &RateQuery, today: NaiveDate, result: &RateResult, json: bool) -> String {
    let window = query.window_label(today.year());
    if json {
        return to_json(&json_rate(query, window, result));
    }

    match percent_outcome(result) {
        Ok(percent) => format!(
            "{} ({}): {}",
            query.kind.label().bold(),
            window,
            percent.green()
        ),
        Err(_) => format_outcome(result),
    }
}

/// Format an error that happened before any rate was queried
pub fn format_error(error: &QueryError, json: bool) -> String {
    if json {
        to_json(&JsonOutcome::Error {
            error: error.to_string(),
        })
    } else {
        format!("{} {}", "error:".red(), error)
    }
}

/// Format the rows of a series
pub fn format_series(kind: RateKind, table: &TimeSeriesTable, json: bool) -> String {
    if json {
        #[derive(Serialize)]
        struct JsonRow {
            date: NaiveDate,
            value: String,
        }

        #[derive(Serialize)]
        struct JsonSeries {
            rate: RateKind,
            code: String,
            column: String,
            rows: Vec<JsonRow>,
        }

        return to_json(&JsonSeries {
            rate: kind,
            code: table.code.clone(),
            column: table.column.header(),
            rows: table
                .rows
                .iter()
                .map(|r| JsonRow {
                    date: r.date,
                    value: r.value.normalize().to_string(),
                })
                .collect(),
        });
    }

    let mut output = format!(
        "\n{} {} - {} ({} rows)\n\n",
        "📈".cyan().bold(),
        kind.label(),
        table.code,
        table.len()
    );

    if table.is_empty() {
        output.push_str("No rows found.\n");
        return output;
    }

    // Header names the unit, e.g. VALUE ((% a.m.))
    let mut builder = Builder::default();
    builder.push_record(["Date".to_string(), table.column.header()]);
    for row in &table.rows {
        builder.push_record([
            row.date.format("%d/%m/%Y").to_string(),
            format_percent_value(row.value),
        ]);
    }

    let rendered = builder
        .build()
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..2)).with(Alignment::right()))
        .to_string();
    output.push_str(&rendered);
    output.push('\n');
    output
}
