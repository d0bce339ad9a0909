//! Legacy session-service adapter.
//!
//! The old demand service is stateful: it rejects session-less requests, so
//! each attempt is a two-step interaction — GET the landing page to pick up
//! a session cookie, then POST an empty body against the service endpoint.
//! The cookie jar lives inside one `fetch` call and is discarded with it;
//! reusing a session across cycles is how stale-cookie failures used to
//! persist silently.

use crate::config::EngineConfig;
use crate::decode::wrapped::decode_legacy_body;
use crate::errors::SourceError;
use crate::model::{FetchOutcome, FetchWindow, MetricDescriptor, SourceId};
use crate::sources::http::{looks_like_html, HttpClient};
use crate::sources::SourceAdapter;
use async_trait::async_trait;

pub struct LegacySessionAdapter {
    landing_url: String,
    service_url: String,
    timeout_ms: u64,
}

impl LegacySessionAdapter {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            landing_url: config.legacy_landing_url.clone(),
            service_url: config.legacy_service_url.clone(),
            timeout_ms: config.legacy_timeout_ms,
        }
    }

    async fn attempt(&self) -> Result<FetchOutcome, SourceError> {
        // Fresh jar per attempt.
        let client = HttpClient::with_cookie_jar(self.timeout_ms);

        let landing = client.get(&self.landing_url).await?;
        if !landing.is_success() {
            return Err(SourceError::Rejected(format!(
                "session bootstrap answered HTTP {}",
                landing.status
            )));
        }

        let resp = client.post_empty(&self.service_url).await?;
        if !resp.is_success() {
            return Err(SourceError::Rejected(format!(
                "legacy service answered HTTP {}",
                resp.status
            )));
        }
        // An HTML body here is the provider's access block, not broken JSON.
        if looks_like_html(&resp.body) {
            return Err(SourceError::Rejected(
                "legacy service returned an HTML block page".into(),
            ));
        }

        let points = decode_legacy_body(&resp.body)?;
        Ok(FetchOutcome::success(SourceId::LegacySession, points))
    }
}

#[async_trait]
impl SourceAdapter for LegacySessionAdapter {
    fn id(&self) -> SourceId {
        SourceId::LegacySession
    }

    // The legacy service only ever serves "today"; the window and metric
    // selection are the structured API's vocabulary, ignored here.
    async fn fetch(&self, _metric: &MetricDescriptor, _window: &FetchWindow) -> FetchOutcome {
        match self.attempt().await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::debug!(source = %self.id(), status = %e.status(), "attempt failed: {e}");
                FetchOutcome::failure(SourceId::LegacySession, e.status(), e.to_string())
            }
        }
    }
}
