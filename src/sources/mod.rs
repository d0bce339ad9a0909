//! Source adapters: one per acquisition channel.
//!
//! Each adapter owns its channel's request construction, headers, and raw
//! response retrieval, and delegates decoding to the pure functions in
//! [`crate::decode`]. The common trait is object-safe so the fallback chain
//! can hold an operator-configured ordered list of `Box<dyn SourceAdapter>`.

pub mod browser;
pub mod http;
pub mod legacy_session;
pub mod script_scrape;
pub mod structured_api;

use crate::config::EngineConfig;
use crate::model::{FetchOutcome, FetchWindow, MetricDescriptor, SeriesKind, SourceId};
use async_trait::async_trait;

/// One way of reaching the upstream data.
///
/// `fetch` is infallible by signature: every internal fault is classified
/// into the returned outcome's status, so no failure can escape an adapter
/// as an unhandled fault.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Channel identity, used in attempt logs and events.
    fn id(&self) -> SourceId;

    /// One attempt against this channel. Blocking from the chain's point of
    /// view; the call runs to its own timeout.
    async fn fetch(&self, metric: &MetricDescriptor, window: &FetchWindow) -> FetchOutcome;
}

/// Which series a single-series source is reporting for a given metric.
///
/// The structured API and the script scrape return one series per call; the
/// metric's identifiers tell measured and programmed apart.
pub fn series_kind_for(metric: &MetricDescriptor) -> SeriesKind {
    let id = metric.id.to_ascii_lowercase();
    let name = metric.display_name.to_ascii_lowercase();
    if id.contains("prog") || name.contains("program") {
        SeriesKind::Scheduled
    } else {
        SeriesKind::Real
    }
}

/// Build the adapter list in the configured priority order.
pub fn build_adapters(config: &EngineConfig) -> Vec<Box<dyn SourceAdapter>> {
    config
        .source_order
        .iter()
        .filter_map(|id| -> Option<Box<dyn SourceAdapter>> {
            Some(match id {
                SourceId::StructuredApi => {
                    Box::new(structured_api::StructuredApiAdapter::new(config))
                }
                SourceId::LegacySession => {
                    Box::new(legacy_session::LegacySessionAdapter::new(config))
                }
                SourceId::ScriptScrape => Box::new(script_scrape::ScriptScrapeAdapter::new(config)),
                SourceId::BrowserRendered => Box::new(browser::BrowserAdapter::new(config)),
                SourceId::Engine => {
                    tracing::warn!("'engine' is not an acquisition channel, ignoring");
                    return None;
                }
            })
        })
        .collect()
}
