//! Temporal normalizer: one parsing rule set for every raw date shape.
//!
//! All date-bearing record values pass through [`normalize`] before any
//! rule touches them. The function is pure and safe to call from any
//! thread without synchronization.

use chrono::{DateTime, NaiveDate};
use shared_types::{CanonicalDate, FieldValue, UnparseableDate};

/// Numeric values at or above this magnitude are epoch milliseconds;
/// below it, epoch seconds. 10^11 seconds is year 5138, far outside any
/// roster's range, so the split is unambiguous.
const EPOCH_MILLIS_THRESHOLD: f64 = 1e11;

/// Convert a raw field value into a [`CanonicalDate`].
///
/// Recognized representations:
/// - native date and datetime values
/// - ISO-8601 strings (`2021-01-15`) and RFC 3339 timestamps
/// - roster-style `15-Jan-2021` strings (month abbreviation, any case)
/// - integral epoch seconds or milliseconds
pub fn normalize(raw: &FieldValue) -> Result<CanonicalDate, UnparseableDate> {
    match raw {
        FieldValue::Date { value } => Ok(CanonicalDate::new(*value)),
        FieldValue::Timestamp { value } => Ok(CanonicalDate::new(value.date())),
        FieldValue::Number { value } => normalize_epoch(*value),
        FieldValue::Text { value } => normalize_text(value),
        FieldValue::Flag { value } => Err(UnparseableDate {
            input: format!("flag({value})"),
        }),
    }
}

fn normalize_epoch(value: f64) -> Result<CanonicalDate, UnparseableDate> {
    if !value.is_finite() || value.fract() != 0.0 {
        return Err(UnparseableDate {
            input: value.to_string(),
        });
    }

    let seconds = if value.abs() >= EPOCH_MILLIS_THRESHOLD {
        (value / 1000.0).trunc() as i64
    } else {
        value as i64
    };

    DateTime::from_timestamp(seconds, 0)
        .map(|dt| CanonicalDate::new(dt.date_naive()))
        .ok_or_else(|| UnparseableDate {
            input: value.to_string(),
        })
}

fn normalize_text(value: &str) -> Result<CanonicalDate, UnparseableDate> {
    let trimmed = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(CanonicalDate::new(date));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(CanonicalDate::new(dt.date_naive()));
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%d-%b-%Y") {
        return Ok(CanonicalDate::new(date));
    }

    Err(UnparseableDate {
        input: trimmed.to_string(),
    })
}
