//! Decoder for the legacy service's wrapped-date payloads.
//!
//! The legacy endpoint is a .NET-era service whose date fields come as text
//! of the form `/Date(1704067200000)/` — epoch milliseconds wrapped in a
//! literal marker. The same structure reappears verbatim inside the script
//! arrays embedded in the rendering page, so both the session adapter and
//! the scrape adapter decode through here.

use crate::errors::SourceError;
use crate::model::{CanonicalPoint, SeriesKind};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::OnceLock;

fn wrapped_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Tolerates whitespace and a trailing timezone suffix like "-0500".
    RE.get_or_init(|| Regex::new(r"/Date\(\s*(-?\d+)(?:[+-]\d{4})?\s*\)/").expect("valid regex"))
}

/// Extract the millisecond count from a `/Date(<n>)/` string.
///
/// Surrounding whitespace and trailing fields after the wrapper are ignored;
/// anything without the wrapper is `None`.
pub fn parse_wrapped_millis(s: &str) -> Option<i64> {
    wrapped_re()
        .captures(s)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// One entry of a legacy series array.
#[derive(Debug, Deserialize)]
struct LegacyEntry {
    #[serde(rename = "Fecha")]
    fecha: String,
    #[serde(rename = "Valor")]
    valor: Value,
}

/// Body shape of the legacy session service.
#[derive(Debug, Deserialize)]
struct LegacyBody {
    #[serde(rename = "GetDemandaRTResult")]
    result: LegacyResult,
}

#[derive(Debug, Deserialize)]
struct LegacyResult {
    #[serde(rename = "DemandaReal", default)]
    real: Vec<LegacyEntry>,
    #[serde(rename = "DemandaProgramada", default)]
    scheduled: Vec<LegacyEntry>,
}

/// Decode the legacy service's full response: both embedded arrays.
pub fn decode_legacy_body(body: &str) -> Result<Vec<CanonicalPoint>, SourceError> {
    let parsed: LegacyBody = serde_json::from_str(body)?;

    let mut points = Vec::new();
    decode_entries(&parsed.result.real, SeriesKind::Real, &mut points)?;
    decode_entries(&parsed.result.scheduled, SeriesKind::Scheduled, &mut points)?;

    if points.is_empty() {
        return Err(SourceError::Empty);
    }
    Ok(points)
}

/// Decode a bare array of `{Fecha, Valor}` entries, as found embedded in
/// the page's script blocks.
pub fn decode_wrapped_array(
    json_text: &str,
    kind: SeriesKind,
) -> Result<Vec<CanonicalPoint>, SourceError> {
    let entries: Vec<LegacyEntry> = serde_json::from_str(json_text)?;
    let mut points = Vec::new();
    decode_entries(&entries, kind, &mut points)?;
    if points.is_empty() {
        return Err(SourceError::Empty);
    }
    Ok(points)
}

fn decode_entries(
    entries: &[LegacyEntry],
    kind: SeriesKind,
    out: &mut Vec<CanonicalPoint>,
) -> Result<(), SourceError> {
    for entry in entries {
        let millis = parse_wrapped_millis(&entry.fecha).ok_or_else(|| {
            SourceError::Decode(format!("unrecognized 'Fecha' encoding: {}", entry.fecha))
        })?;
        let Some(value) = numeric(&entry.valor) else {
            // The service pads the tail of the day with null slots.
            if entry.valor.is_null() {
                continue;
            }
            return Err(SourceError::Decode(format!(
                "non-numeric 'Valor': {}",
                entry.valor
            )));
        };
        let point = CanonicalPoint::from_epoch_millis(millis, value, kind)
            .ok_or_else(|| SourceError::Decode(format!("out-of-range epoch millis {millis}")))?;
        out.push(point);
    }
    Ok(())
}

fn numeric(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    }
}
