//! Utility functions for formatting rates
//!
//! Rates are computed as decimal fractions and shown as percentages using
//! Brazilian locale conventions.

use rust_decimal::{Decimal, RoundingStrategy};

/// Core formatting function with full control over output.
///
/// Formats a Decimal value using Brazilian locale conventions, rounded to
/// `places` decimal places (half away from zero):
/// - Thousands separator: `.` (period)
/// - Decimal separator: `,` (comma)
///
/// # Examples
/// ```
/// use taxas::utils::format_decimal_br;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_decimal_br(dec!(1234.567), 2), "1.234,57");
/// assert_eq!(format_decimal_br(dec!(-0.5), 4), "-0,5000");
/// ```
pub fn format_decimal_br(value: Decimal, places: u32) -> String {
    let rounded = value.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
    let is_negative = rounded < Decimal::ZERO;

    let formatted = format!("{:.*}", places as usize, rounded.abs());
    let (integer_part, decimal_part) = match formatted.split_once('.') {
        Some((int, dec)) => (int, Some(dec)),
        None => (formatted.as_str(), None),
    };

    // Add thousands separators (.) to integer part
    let with_separators: String = integer_part
        .chars()
        .rev()
        .enumerate()
        .flat_map(|(i, c)| {
            if i > 0 && i % 3 == 0 {
                vec!['.', c]
            } else {
                vec![c]
            }
        })
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    let sign = if is_negative { "-" } else { "" };
    match decimal_part {
        Some(dec) => format!("{}{},{}", sign, with_separators, dec),
        None => format!("{}{}", sign, with_separators),
    }
}

/// Format a fraction as a percentage with two places: 0.1075 → "10,75%"
///
/// Returns `None` when the fraction times 100 does not fit in a Decimal.
///
/// # Examples
/// ```
/// use taxas::utils::format_percent;
/// use rust_decimal::Decimal;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_percent(dec!(0.1075)).as_deref(), Some("10,75%"));
/// assert_eq!(format_percent(dec!(0)).as_deref(), Some("0,00%"));
/// assert_eq!(format_percent(Decimal::MAX), None);
/// ```
pub fn format_percent(fraction: Decimal) -> Option<String> {
    let percent = fraction.checked_mul(Decimal::ONE_HUNDRED)?;
    Some(format_percent_value(percent))
}

/// Format a value already expressed in percent: 0.42 → "0,42%"
pub fn format_percent_value(percent: Decimal) -> String {
    format!("{}%", format_decimal_br(percent, 2))
}
