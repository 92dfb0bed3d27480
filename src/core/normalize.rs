use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::core::Bar;

/// Numeric timestamps above this value are interpreted as millisecond epochs.
///
/// `1e12` seconds lies tens of thousands of years in the future, while
/// `1e12` milliseconds is 2001-09-09, so the cutoff cleanly separates the two
/// encodings for market data recorded after 2001. This is a heuristic for
/// mixed-provider feeds, not a format contract.
pub const MS_EPOCH_THRESHOLD: f64 = 1.0e12;

const TIME_KEYS: &[&str] = &[
    "time",
    "timestamp",
    "date",
    "datetime",
    "t",
    "Time",
    "Timestamp",
    "Date",
    "Datetime",
    "DateTime",
];
const OPEN_KEYS: &[&str] = &["open", "o", "Open", "OPEN"];
const HIGH_KEYS: &[&str] = &["high", "h", "High", "HIGH"];
const LOW_KEYS: &[&str] = &["low", "l", "Low", "LOW"];
const CLOSE_KEYS: &[&str] = &["close", "c", "Close", "CLOSE", "adj_close", "Adj Close"];
const VOLUME_KEYS: &[&str] = &["volume", "vol", "v", "Volume", "Vol", "VOLUME"];

/// Caller-supplied candidate key names, tried before the built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldKeyOverrides {
    pub time: Vec<String>,
    pub open: Vec<String>,
    pub high: Vec<String>,
    pub low: Vec<String>,
    pub close: Vec<String>,
    pub volume: Vec<String>,
}

/// Column positions used for positional (array-shaped) rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnIndexMap {
    pub time: usize,
    pub open: usize,
    pub high: usize,
    pub low: usize,
    pub close: usize,
    pub volume: Option<usize>,
}

impl Default for ColumnIndexMap {
    /// Default column order: time, open, high, low, close, volume.
    fn default() -> Self {
        Self {
            time: 0,
            open: 1,
            high: 2,
            low: 3,
            close: 4,
            volume: Some(5),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizerConfig {
    pub field_keys: FieldKeyOverrides,
    pub columns: ColumnIndexMap,
    /// Leading rows to drop before normalization (header rows in tabular sources).
    pub skip_rows: usize,
}

/// Normalizes a batch of heterogeneous rows into canonical bars.
///
/// Rows that are neither objects nor arrays, or whose open/high/low/close do
/// not all coerce to finite numbers, are silently dropped. Rows with an
/// unparseable time fall back to their ordinal position in the output so chart
/// ordering stays defined even for malformed timestamps.
#[must_use]
pub fn normalize_rows(rows: &[Value], config: &NormalizerConfig) -> Vec<Bar> {
    let mut bars = Vec::with_capacity(rows.len().saturating_sub(config.skip_rows));
    for row in rows.iter().skip(config.skip_rows) {
        let fallback_time = bars.len() as i64;
        match normalize_row(row, config, fallback_time) {
            Some(bar) => bars.push(bar),
            None => debug!("dropping row without finite ohlc fields"),
        }
    }
    bars
}

/// Normalizes one row, for the incremental update path.
///
/// `fallback_time` is used when the row's timestamp cannot be parsed.
#[must_use]
pub fn normalize_row(row: &Value, config: &NormalizerConfig, fallback_time: i64) -> Option<Bar> {
    let fields = match row {
        Value::Object(_) => extract_keyed(row, &config.field_keys),
        Value::Array(cells) => extract_positional(cells, config.columns),
        _ => return None,
    };

    let open = fields.open?;
    let high = fields.high?;
    let low = fields.low?;
    let close = fields.close?;

    Some(Bar {
        time: fields.time.unwrap_or(fallback_time),
        open,
        high,
        low,
        close,
        volume: fields.volume,
    })
}

#[derive(Debug, Default)]
struct RawFields {
    time: Option<i64>,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    volume: Option<f64>,
}

fn extract_keyed(row: &Value, overrides: &FieldKeyOverrides) -> RawFields {
    RawFields {
        time: lookup(row, &overrides.time, TIME_KEYS).and_then(parse_time),
        open: lookup(row, &overrides.open, OPEN_KEYS).and_then(coerce_numeric),
        high: lookup(row, &overrides.high, HIGH_KEYS).and_then(coerce_numeric),
        low: lookup(row, &overrides.low, LOW_KEYS).and_then(coerce_numeric),
        close: lookup(row, &overrides.close, CLOSE_KEYS).and_then(coerce_numeric),
        volume: lookup(row, &overrides.volume, VOLUME_KEYS).and_then(coerce_numeric),
    }
}

fn extract_positional(cells: &[Value], columns: ColumnIndexMap) -> RawFields {
    RawFields {
        time: cells.get(columns.time).and_then(parse_time),
        open: cells.get(columns.open).and_then(coerce_numeric),
        high: cells.get(columns.high).and_then(coerce_numeric),
        low: cells.get(columns.low).and_then(coerce_numeric),
        close: cells.get(columns.close).and_then(coerce_numeric),
        volume: columns
            .volume
            .and_then(|index| cells.get(index))
            .and_then(coerce_numeric),
    }
}

/// Returns the value under the first matching candidate key.
///
/// Caller-supplied keys are tried before the built-in defaults.
fn lookup<'a>(row: &'a Value, overrides: &[String], defaults: &[&str]) -> Option<&'a Value> {
    overrides
        .iter()
        .map(String::as_str)
        .chain(defaults.iter().copied())
        .find_map(|key| row.get(key))
}

/// Parses a timestamp value into whole unix seconds.
///
/// Numbers above [`MS_EPOCH_THRESHOLD`] are treated as millisecond epochs and
/// truncated to seconds. Strings are normalized to an RFC 3339 form with a
/// numeric offset before parsing.
fn parse_time(value: &Value) -> Option<i64> {
    match value {
        Value::Number(_) => parse_time_number(value.as_f64()?),
        Value::String(text) => parse_time_string(text),
        _ => None,
    }
}

fn parse_time_number(value: f64) -> Option<i64> {
    if !value.is_finite() {
        return None;
    }
    let seconds = if value > MS_EPOCH_THRESHOLD {
        value / 1000.0
    } else {
        value
    };
    Some(seconds.trunc() as i64)
}

fn parse_time_string(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    // Bare numeric strings take the epoch path.
    if let Ok(value) = trimmed.parse::<f64>() {
        return parse_time_number(value);
    }

    let normalized = to_rfc3339_with_offset(trimmed);
    DateTime::parse_from_rfc3339(&normalized)
        .ok()
        .map(|parsed| parsed.timestamp())
}

/// Rewrites common date-time spellings into RFC 3339 with a numeric offset.
///
/// Handles the space date/time separator, a trailing `Z`, date-only strings,
/// and strings that carry no offset at all (assumed UTC).
fn to_rfc3339_with_offset(text: &str) -> String {
    let mut normalized = text.replacen(' ', "T", 1);

    if normalized.ends_with('Z') || normalized.ends_with('z') {
        normalized.truncate(normalized.len() - 1);
        normalized.push_str("+00:00");
        return normalized;
    }

    match normalized.find('T') {
        None => {
            normalized.push_str("T00:00:00+00:00");
            normalized
        }
        Some(t_index) => {
            let time_part = &normalized[t_index + 1..];
            if time_part.contains('+') || time_part.contains('-') {
                normalized
            } else {
                normalized.push_str("+00:00");
                normalized
            }
        }
    }
}

/// Coerces a cell into a finite number.
///
/// String cells may carry thousands separators and one leading currency
/// symbol. Empty or non-finite results are absent, never zero.
fn coerce_numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(_) => value.as_f64().filter(|parsed| parsed.is_finite()),
        Value::String(text) => {
            let trimmed = text.trim();
            let without_currency = trimmed
                .strip_prefix(&['$', '€', '£'][..])
                .unwrap_or(trimmed)
                .trim_start();
            let cleaned = without_currency.replace(',', "");
            if cleaned.is_empty() {
                return None;
            }
            cleaned.parse::<f64>().ok().filter(|parsed| parsed.is_finite())
        }
        _ => None,
    }
}
