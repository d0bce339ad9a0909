//! Decoder for the structured API's wide hourly format.
//!
//! The API answers one record per day with one field per hour of that day:
//! `{"Items": [{"Date": "2024-01-01", "Hour01": 950.0, ..., "Hour24": ...}]}`.
//! `HourNN` covers the hour ending at NN local time, so its point lands at
//! `date + (NN - 1)` hours. Hours the provider has not reported yet are
//! simply absent and are skipped.

use crate::errors::SourceError;
use crate::model::{provider_offset, CanonicalPoint, SeriesKind};
use chrono::NaiveDate;
use serde_json::Value;

/// Decode a wide-format response body into canonical points.
///
/// Returns `Empty` when the body parses but `Items` holds no records, and
/// `Decode` when the shape is not the expected one.
pub fn decode_wide(body: &str, kind: SeriesKind) -> Result<Vec<CanonicalPoint>, SourceError> {
    let root: Value = serde_json::from_str(body)?;

    let items = root
        .get("Items")
        .and_then(Value::as_array)
        .ok_or_else(|| SourceError::Decode("missing 'Items' array".into()))?;

    if items.is_empty() {
        return Err(SourceError::Empty);
    }

    let mut points = Vec::new();
    for item in items {
        let date_str = item
            .get("Date")
            .and_then(Value::as_str)
            .ok_or_else(|| SourceError::Decode("record without 'Date' field".into()))?;
        // The API emits either a plain date or a date-time; only the day part matters.
        let day = date_str.split('T').next().unwrap_or(date_str);
        let date = NaiveDate::parse_from_str(day, "%Y-%m-%d")
            .map_err(|e| SourceError::Decode(format!("bad 'Date' value '{date_str}': {e}")))?;

        for hour in 1u32..=24 {
            let field = format!("Hour{hour:02}");
            let Some(raw) = item.get(&field) else {
                continue;
            };
            let Some(value) = numeric(raw) else {
                // Explicit null means the same as absent: not reported yet.
                if raw.is_null() {
                    continue;
                }
                return Err(SourceError::Decode(format!(
                    "non-numeric value in field '{field}': {raw}"
                )));
            };
            let timestamp = date
                .and_hms_opt(0, 0, 0)
                .and_then(|dt| dt.and_local_timezone(provider_offset()).single())
                .map(|dt| dt + chrono::Duration::hours(i64::from(hour - 1)))
                .ok_or_else(|| SourceError::Decode(format!("unrepresentable hour for {date}")))?;
            points.push(CanonicalPoint::new(timestamp, value, kind));
        }
    }

    if points.is_empty() {
        return Err(SourceError::Empty);
    }
    Ok(points)
}

/// The provider is inconsistent about numbers: sometimes JSON numbers,
/// sometimes numeric strings with comma thousand separators.
fn numeric(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    }
}
