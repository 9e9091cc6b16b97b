//! Cell text normalisation.
//!
//! Spreadsheet editors type numbers in whatever shape they like: grouped
//! thousands (`1,234`), percentages (`45%`) and abbreviated magnitudes
//! (`2.3M`, `850K`). [`parse_numeric()`] folds all of those into an `i64`,
//! [`format_compact()`] goes the other way for display, and
//! [`parse_grouped_integer()`] is the stricter reader used when two players
//! are compared field by field.

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::error::ParseError;

const MILLION: i64 = 1_000_000;
const THOUSAND: i64 = 1_000;

/// Parses spreadsheet cell text into an integer.
///
/// Thousands separators are stripped first. A trailing `%` yields the integer
/// percentage, a trailing `M` or `K` scales a decimal mantissa and truncates
/// toward zero. Anything else must be a plain integer.
pub fn parse_numeric(text: &str) -> Result<i64, ParseError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ParseError::new(text));
    }
    let cleaned = trimmed.replace(',', "");

    if let Some(percent) = cleaned.strip_suffix('%') {
        return percent
            .trim()
            .parse::<i64>()
            .map_err(|_| ParseError::new(text));
    }
    if let Some(mantissa) = cleaned.strip_suffix('M') {
        return scale_mantissa(mantissa, MILLION).ok_or_else(|| ParseError::new(text));
    }
    if let Some(mantissa) = cleaned.strip_suffix('K') {
        return scale_mantissa(mantissa, THOUSAND).ok_or_else(|| ParseError::new(text));
    }
    cleaned.parse::<i64>().map_err(|_| ParseError::new(text))
}

/// Accepts only plain integers, optionally grouped with commas.
///
/// Suffixed values (`45%`, `2.3M`) are rejected so that a comparison never
/// subtracts a percentage from an absolute count.
pub fn parse_grouped_integer(text: &str) -> Result<i64, ParseError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ParseError::new(text));
    }
    trimmed
        .replace(',', "")
        .parse::<i64>()
        .map_err(|_| ParseError::new(text))
}

/// Renders an integer with a two-decimal `M`/`K` suffix once it reaches a
/// thousand; smaller (and negative) values are printed as-is.
pub fn format_compact(value: i64) -> String {
    if value >= MILLION {
        format!("{:.2}M", value as f64 / MILLION as f64)
    } else if value >= THOUSAND {
        format!("{:.2}K", value as f64 / THOUSAND as f64)
    } else {
        value.to_string()
    }
}

/// Formats a signed difference the way comparison lines show it.
pub fn format_delta(delta: i64) -> String {
    match delta.signum() {
        1 => format!("(+{})", format_compact(delta)),
        -1 => format!("({})", format_compact(delta)),
        _ => "(=)".to_string(),
    }
}

fn scale_mantissa(mantissa: &str, factor: i64) -> Option<i64> {
    let mantissa = mantissa.trim();
    if mantissa.is_empty() {
        return None;
    }
    let parsed = Decimal::from_str(mantissa).ok()?;
    parsed
        .checked_mul(Decimal::from(factor))?
        .trunc()
        .to_i64()
}
