//! Structured metrics API adapter.
//!
//! One POST carrying the metric id and date window against the provider's
//! hourly endpoint; the answer is the wide one-record-per-day format
//! decoded by [`crate::decode::wide`].

use crate::config::EngineConfig;
use crate::decode::wide::decode_wide;
use crate::errors::SourceError;
use crate::model::{FetchOutcome, FetchWindow, MetricDescriptor, SourceId};
use crate::sources::http::HttpClient;
use crate::sources::{series_kind_for, SourceAdapter};
use async_trait::async_trait;
use serde_json::json;

pub struct StructuredApiAdapter {
    client: HttpClient,
    endpoint: String,
    entity: String,
}

impl StructuredApiAdapter {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            client: HttpClient::new(config.api_timeout_ms),
            endpoint: format!("{}/hourly", config.api_base_url.trim_end_matches('/')),
            entity: config.api_entity.clone(),
        }
    }

    async fn attempt(
        &self,
        metric: &MetricDescriptor,
        window: &FetchWindow,
    ) -> Result<FetchOutcome, SourceError> {
        let payload = json!({
            "MetricId": metric.id,
            "StartDate": window.start.format("%Y-%m-%d").to_string(),
            "EndDate": window.end.format("%Y-%m-%d").to_string(),
            "Entity": self.entity,
        });

        let resp = self.client.post_json(&self.endpoint, &payload).await?;
        if !resp.is_success() {
            return Err(SourceError::Rejected(format!(
                "metrics API answered HTTP {}",
                resp.status
            )));
        }

        let points = decode_wide(&resp.body, series_kind_for(metric))?;
        Ok(FetchOutcome::success(SourceId::StructuredApi, points))
    }
}

#[async_trait]
impl SourceAdapter for StructuredApiAdapter {
    fn id(&self) -> SourceId {
        SourceId::StructuredApi
    }

    async fn fetch(&self, metric: &MetricDescriptor, window: &FetchWindow) -> FetchOutcome {
        match self.attempt(metric, window).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::debug!(source = %self.id(), status = %e.status(), "attempt failed: {e}");
                FetchOutcome::failure(SourceId::StructuredApi, e.status(), e.to_string())
            }
        }
    }
}
