//! Fallback chain controller.
//!
//! Tries the configured source adapters in priority order for one metric
//! and stops at the first success — at most one successful adapter
//! invocation per cycle, every later adapter skipped. Adapter failures are
//! appended to the attempt log and the chain moves on; when every adapter
//! is exhausted the caller gets the LAST attempt's outcome, the most
//! specific failure reason available, together with the full log.
//!
//! There is no caching in here: calling `acquire` twice performs
//! independent network work both times. Freshness matters more than cost.

use crate::catalog::CatalogResolver;
use crate::config::EngineConfig;
use crate::events::{EngineEvent, EventBus};
use crate::model::{
    provider_offset, AttemptRecord, ChainResult, FetchOutcome, FetchStatus, FetchWindow,
    MetricDescriptor, SourceId,
};
use crate::sources::{build_adapters, SourceAdapter};
use std::time::Instant;

pub struct FallbackChain {
    resolver: CatalogResolver,
    adapters: Vec<Box<dyn SourceAdapter>>,
    window_days: u32,
    events: EventBus,
}

impl FallbackChain {
    pub fn new(config: &EngineConfig, events: EventBus) -> Self {
        Self {
            resolver: CatalogResolver::new(config),
            adapters: build_adapters(config),
            window_days: config.window_days,
            events,
        }
    }

    /// Assemble a chain from pre-built parts. Lets tests wire in scripted
    /// adapters without any network.
    pub fn with_parts(
        resolver: CatalogResolver,
        adapters: Vec<Box<dyn SourceAdapter>>,
        window_days: u32,
        events: EventBus,
    ) -> Self {
        Self {
            resolver,
            adapters,
            window_days,
            events,
        }
    }

    /// One acquisition cycle for `requested_metric`. Infallible: every
    /// failure mode, including a metric that cannot be resolved against
    /// the catalog, comes back as a `ChainResult` the caller can render.
    /// A resolution failure carries a single engine-attributed attempt
    /// and no adapter runs that cycle.
    pub async fn acquire(&self, requested_metric: &str) -> ChainResult {
        let started = Instant::now();
        self.events.emit(EngineEvent::CycleStarted {
            metric: requested_metric.to_string(),
            timestamp: chrono::Utc::now()
                .with_timezone(&provider_offset())
                .to_rfc3339(),
        });

        let resolution = match self.resolver.resolve(requested_metric).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(metric = requested_metric, "metric resolution failed: {e}");
                let result = engine_failure(e.status(), e.to_string());
                self.events.emit(EngineEvent::CycleFailed {
                    attempts: result.attempts.clone(),
                    total_ms: started.elapsed().as_millis() as u64,
                });
                return result;
            }
        };
        if !resolution.alternatives.is_empty() {
            tracing::info!(
                metric = %resolution.metric.id,
                alternatives = ?resolution.alternatives,
                "metric resolved among multiple candidates"
            );
        }

        let window = FetchWindow::last_days(self.window_days.max(1));
        let result = self.run_adapters(&resolution.metric, &window).await;

        let total_ms = started.elapsed().as_millis() as u64;
        if result.is_success() {
            self.events.emit(EngineEvent::CycleComplete {
                source_id: result.outcome.source_id,
                point_count: result.outcome.points.len(),
                total_ms,
            });
        } else {
            self.events.emit(EngineEvent::CycleFailed {
                attempts: result.attempts.clone(),
                total_ms,
            });
        }
        result
    }

    async fn run_adapters(&self, metric: &MetricDescriptor, window: &FetchWindow) -> ChainResult {
        let mut attempts: Vec<AttemptRecord> = Vec::with_capacity(self.adapters.len());
        let mut last_outcome = None;

        // Strictly sequential: each attempt decides whether the next runs,
        // and some adapters hold session state unsafe to share.
        for adapter in &self.adapters {
            let attempt_started = Instant::now();
            let outcome = adapter.fetch(metric, window).await;
            let elapsed_ms = attempt_started.elapsed().as_millis() as u64;

            self.events.emit(EngineEvent::SourceAttempted {
                source_id: outcome.source_id,
                status: outcome.status,
                elapsed_ms,
            });
            attempts.push(AttemptRecord {
                source_id: outcome.source_id,
                status: outcome.status,
                message: outcome.message.clone().unwrap_or_default(),
            });

            if outcome.is_success() {
                tracing::info!(
                    source = %outcome.source_id,
                    points = outcome.points.len(),
                    elapsed_ms,
                    "acquisition succeeded"
                );
                return ChainResult { outcome, attempts };
            }

            tracing::warn!(
                source = %outcome.source_id,
                status = %outcome.status,
                message = outcome.message.as_deref().unwrap_or(""),
                "source failed, falling through"
            );
            last_outcome = Some(outcome);
        }

        // Exhausted. The last outcome carries the most specific reason.
        // `None` means the adapter list was empty, which a file-loaded
        // config cannot produce but a hand-built one can.
        match last_outcome {
            Some(outcome) => ChainResult { outcome, attempts },
            None => {
                tracing::error!("acquisition attempted with no source adapters configured");
                engine_failure(FetchStatus::EmptyResult, "no source adapters configured")
            }
        }
    }
}

/// A failed cycle attributed to the engine itself rather than a channel.
fn engine_failure(status: FetchStatus, message: impl Into<String>) -> ChainResult {
    let outcome = FetchOutcome::failure(SourceId::Engine, status, message);
    ChainResult {
        attempts: vec![AttemptRecord {
            source_id: SourceId::Engine,
            status: outcome.status,
            message: outcome.message.clone().unwrap_or_default(),
        }],
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CanonicalPoint, FetchOutcome, FetchStatus, SeriesKind, SourceId};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Scripted {
        id: SourceId,
        outcome: FetchOutcome,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SourceAdapter for Scripted {
        fn id(&self) -> SourceId {
            self.id
        }
        async fn fetch(&self, _m: &MetricDescriptor, _w: &FetchWindow) -> FetchOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }
    }

    fn point() -> CanonicalPoint {
        let ts = provider_offset().with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        CanonicalPoint::new(ts, 9_500.0, SeriesKind::Real)
    }

    fn scripted(id: SourceId, outcome: FetchOutcome) -> (Box<dyn SourceAdapter>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Box::new(Scripted {
                id,
                outcome,
                calls: Arc::clone(&calls),
            }),
            calls,
        )
    }

    fn chain_with(adapters: Vec<Box<dyn SourceAdapter>>) -> FallbackChain {
        let mut cfg = EngineConfig::default();
        // Keep catalog refreshes off the network: nothing listens here, so
        // a cache miss fails fast and falls back to the seeded cache.
        cfg.api_base_url = "http://127.0.0.1:9".into();
        cfg.api_timeout_ms = 200;
        let resolver = CatalogResolver::with_cache(
            &cfg,
            vec![MetricDescriptor {
                id: "DemaReal".into(),
                display_name: "Demanda Real".into(),
            }],
        );
        FallbackChain::with_parts(resolver, adapters, 1, EventBus::default())
    }

    #[tokio::test]
    async fn short_circuits_on_first_success() {
        let (a, a_calls) = scripted(
            SourceId::StructuredApi,
            FetchOutcome::failure(SourceId::StructuredApi, FetchStatus::TransportError, "down"),
        );
        let (b, b_calls) = scripted(
            SourceId::LegacySession,
            FetchOutcome::success(SourceId::LegacySession, vec![point()]),
        );
        let (c, c_calls) = scripted(
            SourceId::ScriptScrape,
            FetchOutcome::success(SourceId::ScriptScrape, vec![point()]),
        );

        let chain = chain_with(vec![a, b, c]);
        let result = chain.acquire("DemaReal").await;

        assert!(result.is_success());
        assert_eq!(result.outcome.source_id, SourceId::LegacySession);
        assert_eq!(result.attempts.len(), 2);
        assert_eq!(a_calls.load(Ordering::SeqCst), 1);
        assert_eq!(b_calls.load(Ordering::SeqCst), 1);
        // Never invoked once B succeeded.
        assert_eq!(c_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn exhaustion_returns_last_outcome_and_full_log() {
        let (a, _) = scripted(
            SourceId::StructuredApi,
            FetchOutcome::failure(SourceId::StructuredApi, FetchStatus::RemoteRejected, "403"),
        );
        let (b, _) = scripted(
            SourceId::LegacySession,
            FetchOutcome::failure(SourceId::LegacySession, FetchStatus::EmptyResult, "no rows"),
        );
        let (c, _) = scripted(
            SourceId::BrowserRendered,
            FetchOutcome::failure(
                SourceId::BrowserRendered,
                FetchStatus::DecodeError,
                "chart shape changed",
            ),
        );

        let chain = chain_with(vec![a, b, c]);
        let result = chain.acquire("DemaReal").await;

        assert!(!result.is_success());
        assert_eq!(result.outcome.source_id, SourceId::BrowserRendered);
        assert_eq!(result.outcome.status, FetchStatus::DecodeError);
        let order: Vec<SourceId> = result.attempts.iter().map(|a| a.source_id).collect();
        assert_eq!(
            order,
            vec![
                SourceId::StructuredApi,
                SourceId::LegacySession,
                SourceId::BrowserRendered
            ]
        );
    }

    #[tokio::test]
    async fn empty_success_is_not_a_success() {
        // Success status with zero points must fall through.
        let (a, _) = scripted(
            SourceId::StructuredApi,
            FetchOutcome {
                points: Vec::new(),
                source_id: SourceId::StructuredApi,
                status: FetchStatus::Success,
                message: None,
            },
        );
        let (b, b_calls) = scripted(
            SourceId::LegacySession,
            FetchOutcome::success(SourceId::LegacySession, vec![point()]),
        );
        let chain = chain_with(vec![a, b]);
        let result = chain.acquire("DemaReal").await;
        assert_eq!(result.outcome.source_id, SourceId::LegacySession);
        assert_eq!(b_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unresolvable_metric_is_a_failed_result_not_an_error() {
        let (a, a_calls) = scripted(
            SourceId::StructuredApi,
            FetchOutcome::success(SourceId::StructuredApi, vec![point()]),
        );
        let chain = chain_with(vec![a]);
        // Cache holds only DemaReal and the refresh endpoint is unreachable
        // in tests, so an unknown id cannot resolve. The caller still gets
        // a renderable result: one engine-attributed attempt, no adapter run.
        let result = chain.acquire("NoSuchMetric").await;
        assert!(!result.is_success());
        assert_eq!(result.outcome.source_id, SourceId::Engine);
        assert!(result
            .outcome
            .message
            .as_deref()
            .unwrap_or("")
            .contains("NoSuchMetric"));
        assert_eq!(result.attempts.len(), 1);
        assert_eq!(result.attempts[0].source_id, SourceId::Engine);
        assert_eq!(a_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_adapter_list_is_a_failed_result_not_a_panic() {
        let chain = chain_with(Vec::new());
        let result = chain.acquire("DemaReal").await;
        assert!(!result.is_success());
        assert_eq!(result.outcome.source_id, SourceId::Engine);
        assert_eq!(result.outcome.status, FetchStatus::EmptyResult);
        assert_eq!(result.attempts.len(), 1);
    }
}
