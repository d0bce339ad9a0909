//! Embedded-script scrape adapter.
//!
//! Fetches the rendering page's HTML and slices the data array out of the
//! inline script that feeds the chart. When the marker variable is gone the
//! provider has restructured the page — that is a decode failure, distinct
//! from transport trouble, so the chain knows an immediate retry is futile.

use crate::config::EngineConfig;
use crate::decode::script::extract_script_array;
use crate::decode::wrapped::decode_wrapped_array;
use crate::errors::SourceError;
use crate::model::{FetchOutcome, FetchWindow, MetricDescriptor, SourceId};
use crate::sources::http::HttpClient;
use crate::sources::{series_kind_for, SourceAdapter};
use async_trait::async_trait;

pub struct ScriptScrapeAdapter {
    client: HttpClient,
    page_url: String,
    marker: String,
}

impl ScriptScrapeAdapter {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            client: HttpClient::new(config.scrape_timeout_ms),
            page_url: config.page_url.clone(),
            marker: config.script_marker.clone(),
        }
    }

    async fn attempt(&self, metric: &MetricDescriptor) -> Result<FetchOutcome, SourceError> {
        let resp = self.client.get(&self.page_url).await?;
        if !resp.is_success() {
            return Err(SourceError::Rejected(format!(
                "page answered HTTP {}",
                resp.status
            )));
        }

        let array = extract_script_array(&resp.body, &self.marker).ok_or_else(|| {
            SourceError::Decode(format!(
                "marker '{}' not found in any script block",
                self.marker
            ))
        })?;

        let points = decode_wrapped_array(&array, series_kind_for(metric))?;
        Ok(FetchOutcome::success(SourceId::ScriptScrape, points))
    }
}

#[async_trait]
impl SourceAdapter for ScriptScrapeAdapter {
    fn id(&self) -> SourceId {
        SourceId::ScriptScrape
    }

    async fn fetch(&self, metric: &MetricDescriptor, _window: &FetchWindow) -> FetchOutcome {
        match self.attempt(metric).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::debug!(source = %self.id(), status = %e.status(), "attempt failed: {e}");
                FetchOutcome::failure(SourceId::ScriptScrape, e.status(), e.to_string())
            }
        }
    }
}
