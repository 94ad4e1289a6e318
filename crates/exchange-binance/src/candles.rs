//! Continuous-contract candle parsing.
//!
//! Rows arrive as `[openTime, open, high, low, close, volume, closeTime, ...]`.
//! Only the open time (index 0) and close (index 4) are read.

use crate::error::{ExchangeError, Result};
use crate::types::Candle;
use chrono::DateTime;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

const OPEN_TIME_INDEX: usize = 0;
const CLOSE_INDEX: usize = 4;

/// Candles parsed from one response, plus the rows that were skipped.
#[derive(Debug, Clone, Default)]
pub struct ParsedCandles {
    pub candles: Vec<Candle>,
    pub skipped: usize,
}

/// Parses a single candle row.
///
/// # Errors
/// Returns `CandleParse` if the row is not an array, has fewer than five
/// fields, or carries a non-numeric open time or close. The open time may be
/// an integer or an integer string.
pub fn parse_candle(row: &Value) -> Result<Candle> {
    let fields = row
        .as_array()
        .ok_or_else(|| ExchangeError::CandleParse(format!("expected array, got {row}")))?;

    if fields.len() <= CLOSE_INDEX {
        return Err(ExchangeError::CandleParse(format!(
            "expected at least {} fields, got {}",
            CLOSE_INDEX + 1,
            fields.len()
        )));
    }

    let open_time = millis_from_json(&fields[OPEN_TIME_INDEX])
        .and_then(DateTime::from_timestamp_millis)
        .ok_or_else(|| {
            ExchangeError::CandleParse(format!("invalid open time {}", fields[OPEN_TIME_INDEX]))
        })?;

    let close = decimal_from_json(&fields[CLOSE_INDEX]).ok_or_else(|| {
        ExchangeError::CandleParse(format!("invalid close {}", fields[CLOSE_INDEX]))
    })?;

    Ok(Candle { open_time, close })
}

/// Parses every row, skipping malformed ones with a warning.
#[must_use]
pub fn parse_candles(rows: &[Value]) -> ParsedCandles {
    let mut parsed = ParsedCandles::default();

    for row in rows {
        match parse_candle(row) {
            Ok(candle) => parsed.candles.push(candle),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping candle");
                parsed.skipped += 1;
            }
        }
    }

    parsed
}

/// Reads epoch milliseconds from a JSON integer or a numeric string.
fn millis_from_json(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Reads a decimal from a JSON string or number.
pub(crate) fn decimal_from_json(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => parse_decimal(s),
        Value::Number(n) => parse_decimal(&n.to_string()),
        _ => None,
    }
}

/// Locale-independent decimal parse; accepts plain and scientific notation.
pub(crate) fn parse_decimal(text: &str) -> Option<Decimal> {
    let text = text.trim();
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}
