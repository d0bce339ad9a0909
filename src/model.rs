//! Canonical data model for the acquisition engine.
//!
//! Every source adapter, whatever its wire format, decodes into these
//! types. Each poll cycle builds its own `FetchOutcome`/`ChainResult`
//! graph; nothing here is mutated after creation.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// The provider reports in Colombian legal time, a fixed UTC-05:00 with no
/// daylight saving.
pub const PROVIDER_UTC_OFFSET_HOURS: i32 = -5;

/// The provider's fixed UTC offset as a chrono offset.
pub fn provider_offset() -> FixedOffset {
    FixedOffset::east_opt(PROVIDER_UTC_OFFSET_HOURS * 3600)
        .expect("static offset is in range")
}

/// One queryable variable from the provider's catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricDescriptor {
    /// Technical identifier used in API requests (e.g. `DemaReal`).
    pub id: String,
    /// Human-readable name from the catalog (e.g. `Demanda Real`).
    pub display_name: String,
}

/// Measured vs. forecast series when a source returns both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SeriesKind {
    /// Measured actual demand.
    Real,
    /// Forecast/programmed demand for the same window.
    Scheduled,
}

impl std::fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeriesKind::Real => write!(f, "real"),
            SeriesKind::Scheduled => write!(f, "scheduled"),
        }
    }
}

/// A normalized (timestamp, value, kind) record, independent of which
/// source produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalPoint {
    /// Instant in the provider's fixed-offset local time.
    pub timestamp: DateTime<FixedOffset>,
    /// Demand in megawatts.
    pub value: f64,
    /// Which series this point belongs to.
    pub kind: SeriesKind,
}

impl CanonicalPoint {
    pub fn new(timestamp: DateTime<FixedOffset>, value: f64, kind: SeriesKind) -> Self {
        Self {
            timestamp,
            value,
            kind,
        }
    }

    /// Build a point from epoch milliseconds (the legacy service's wrapped
    /// `/Date(<millis>)/` encoding), shifted into provider-local time.
    pub fn from_epoch_millis(millis: i64, value: f64, kind: SeriesKind) -> Option<Self> {
        let utc = Utc.timestamp_millis_opt(millis).single()?;
        Some(Self {
            timestamp: utc.with_timezone(&provider_offset()),
            value,
            kind,
        })
    }
}

/// Identifies one acquisition channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    /// Structured metrics API (JSON, wide hourly format).
    StructuredApi,
    /// Legacy session-based demand service.
    LegacySession,
    /// Script-embedded array scraped out of the rendering page.
    ScriptScrape,
    /// In-page chart state read through a headless browser.
    BrowserRendered,
    /// The engine itself. Attributes failures that happen before any
    /// channel runs (metric resolution, misconfiguration); never a
    /// configurable channel.
    Engine,
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SourceId::StructuredApi => "structured_api",
            SourceId::LegacySession => "legacy_session",
            SourceId::ScriptScrape => "script_scrape",
            SourceId::BrowserRendered => "browser_rendered",
            SourceId::Engine => "engine",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for SourceId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "structured_api" | "api" => Ok(SourceId::StructuredApi),
            "legacy_session" | "legacy" => Ok(SourceId::LegacySession),
            "script_scrape" | "scrape" => Ok(SourceId::ScriptScrape),
            "browser_rendered" | "browser" => Ok(SourceId::BrowserRendered),
            // "engine" is deliberately not parseable: it is not a channel
            // an operator can put in the priority order.
            other => Err(format!("unknown source id: {other}")),
        }
    }
}

/// How one adapter attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    /// Non-empty decoded points.
    Success,
    /// Well-formed response, zero usable records.
    EmptyResult,
    /// Network failure or timeout. Retry next cycle.
    TransportError,
    /// Payload shape no longer matches the expected structure.
    DecodeError,
    /// Non-2xx status or an access-block signature.
    RemoteRejected,
}

impl std::fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FetchStatus::Success => "success",
            FetchStatus::EmptyResult => "empty_result",
            FetchStatus::TransportError => "transport_error",
            FetchStatus::DecodeError => "decode_error",
            FetchStatus::RemoteRejected => "remote_rejected",
        };
        write!(f, "{s}")
    }
}

/// Result of one source adapter attempt. Created once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchOutcome {
    /// Decoded points, ordered. Empty unless `status` is `Success`.
    pub points: Vec<CanonicalPoint>,
    /// Which channel produced this outcome.
    pub source_id: SourceId,
    /// Classification of the attempt.
    pub status: FetchStatus,
    /// Human-readable detail for the diagnostic trail.
    pub message: Option<String>,
}

impl FetchOutcome {
    pub fn success(source_id: SourceId, points: Vec<CanonicalPoint>) -> Self {
        Self {
            points,
            source_id,
            status: FetchStatus::Success,
            message: None,
        }
    }

    pub fn failure(source_id: SourceId, status: FetchStatus, message: impl Into<String>) -> Self {
        Self {
            points: Vec::new(),
            source_id,
            status,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == FetchStatus::Success && !self.points.is_empty()
    }
}

/// One line of the chain's diagnostic trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub source_id: SourceId,
    pub status: FetchStatus,
    pub message: String,
}

/// What the fallback chain hands back to the caller, once per poll cycle.
///
/// `outcome` is the first success, or the last attempt's outcome when every
/// adapter failed — the most specific failure reason available.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainResult {
    pub outcome: FetchOutcome,
    /// One entry per adapter consulted, in priority order.
    pub attempts: Vec<AttemptRecord>,
}

impl ChainResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

/// Inclusive date window for an acquisition, in provider-local days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FetchWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Today's single-day window at the provider offset.
    pub fn today() -> Self {
        let now = Utc::now().with_timezone(&provider_offset());
        let today = NaiveDate::from_ymd_opt(now.year(), now.month(), now.day())
            .expect("current date is valid");
        Self {
            start: today,
            end: today,
        }
    }

    /// Window ending today and starting `days - 1` days earlier.
    pub fn last_days(days: u32) -> Self {
        let today = Self::today().end;
        let start = today - chrono::Duration::days(i64::from(days.saturating_sub(1)));
        Self { start, end: today }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_millis_lands_in_provider_offset() {
        // 2024-01-01T12:00:00Z == 2024-01-01T07:00:00-05:00
        let p = CanonicalPoint::from_epoch_millis(1_704_110_400_000, 9_500.0, SeriesKind::Real)
            .unwrap();
        assert_eq!(p.timestamp.offset().local_minus_utc(), -5 * 3600);
        assert_eq!(p.timestamp.to_rfc3339(), "2024-01-01T07:00:00-05:00");
    }

    #[test]
    fn source_id_round_trips_through_str() {
        for id in [
            SourceId::StructuredApi,
            SourceId::LegacySession,
            SourceId::ScriptScrape,
            SourceId::BrowserRendered,
        ] {
            let parsed: SourceId = id.to_string().parse().unwrap();
            assert_eq!(parsed, id);
        }
        assert!("telepathy".parse::<SourceId>().is_err());
        // Not an orderable channel.
        assert!("engine".parse::<SourceId>().is_err());
    }

    #[test]
    fn window_last_days_is_inclusive() {
        let w = FetchWindow::last_days(3);
        assert_eq!((w.end - w.start).num_days(), 2);
    }
}
