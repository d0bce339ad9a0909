//! Metric catalog resolver.
//!
//! Turns a human-chosen (or default) metric identifier into validated
//! technical identifiers by querying the provider's catalog endpoint. The
//! cache lives for the process lifetime and is refreshed lazily: only when
//! there is no cached catalog yet or the requested id misses it. When the
//! catalog is unreachable but a stale copy exists, the stale copy serves —
//! availability beats freshness for a resolver the poll loop retries anyway.

use crate::config::EngineConfig;
use crate::errors::CatalogError;
use crate::model::MetricDescriptor;
use crate::sources::http::HttpClient;
use serde::Deserialize;
use std::sync::RwLock;

/// A successful resolution, with the candidates that lost the tie.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub metric: MetricDescriptor,
    /// Other matching metric ids when a substring match was ambiguous, for
    /// the diagnostic trail.
    pub alternatives: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CatalogBody {
    #[serde(rename = "Items", default)]
    items: Vec<CatalogItem>,
}

#[derive(Debug, Deserialize)]
struct CatalogItem {
    #[serde(rename = "MetricId")]
    metric_id: String,
    #[serde(rename = "MetricName", default)]
    metric_name: String,
}

pub struct CatalogResolver {
    client: HttpClient,
    endpoint: String,
    cache: RwLock<Vec<MetricDescriptor>>,
}

impl CatalogResolver {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            client: HttpClient::new(config.api_timeout_ms),
            endpoint: format!("{}/lists", config.api_base_url.trim_end_matches('/')),
            cache: RwLock::new(Vec::new()),
        }
    }

    /// Resolve `requested` to a catalog entry.
    ///
    /// Exact id match first, then a case-insensitive id match, then a
    /// case-insensitive substring match against display names; an ambiguous
    /// substring match picks the lexicographically first candidate and
    /// reports the rest.
    pub async fn resolve(&self, requested: &str) -> Result<Resolution, CatalogError> {
        if let Some(res) = self.lookup(requested) {
            return Ok(res);
        }

        // Cache miss: refresh once, then retry the match.
        match self.fetch_catalog().await {
            Ok(entries) => {
                let mut cache = self.cache.write().expect("catalog cache poisoned");
                *cache = entries;
            }
            Err(e) => {
                let stale = !self.cache.read().expect("catalog cache poisoned").is_empty();
                if stale {
                    tracing::warn!("catalog refresh failed, serving stale cache: {e}");
                } else {
                    tracing::warn!("catalog unreachable with empty cache: {e}");
                    return Err(CatalogError::Unreachable(e));
                }
            }
        }

        self.lookup(requested).ok_or_else(|| CatalogError::NotFound {
            requested: requested.to_string(),
        })
    }

    /// Number of cached catalog entries (zero until the first refresh).
    pub fn cached_len(&self) -> usize {
        self.cache.read().expect("catalog cache poisoned").len()
    }

    /// Snapshot of the cached catalog, refreshing it first if empty.
    pub async fn entries(&self) -> Result<Vec<MetricDescriptor>, CatalogError> {
        if self.cached_len() == 0 {
            let entries = self.fetch_catalog().await.map_err(CatalogError::Unreachable)?;
            let mut cache = self.cache.write().expect("catalog cache poisoned");
            *cache = entries;
        }
        Ok(self.cache.read().expect("catalog cache poisoned").clone())
    }

    fn lookup(&self, requested: &str) -> Option<Resolution> {
        let cache = self.cache.read().expect("catalog cache poisoned");

        // A verbatim id always wins, so ids differing only in case stay
        // individually addressable; the loose rungs are conveniences.
        let hit = cache
            .iter()
            .find(|m| m.id == requested)
            .or_else(|| cache.iter().find(|m| m.id.eq_ignore_ascii_case(requested)));
        if let Some(hit) = hit {
            return Some(Resolution {
                metric: hit.clone(),
                alternatives: Vec::new(),
            });
        }

        let needle = requested.to_lowercase();
        let mut candidates: Vec<&MetricDescriptor> = cache
            .iter()
            .filter(|m| m.display_name.to_lowercase().contains(&needle))
            .collect();
        candidates.sort_by(|a, b| a.id.cmp(&b.id));

        let (first, rest) = candidates.split_first()?;
        let alternatives: Vec<String> = rest.iter().map(|m| m.id.clone()).collect();
        if !alternatives.is_empty() {
            tracing::debug!(
                requested,
                chosen = %first.id,
                ?alternatives,
                "ambiguous metric name, picked lexicographically first"
            );
        }
        Some(Resolution {
            metric: (*first).clone(),
            alternatives,
        })
    }

    async fn fetch_catalog(&self) -> Result<Vec<MetricDescriptor>, String> {
        let payload = serde_json::json!({ "MetricId": "ListadoMetricas" });
        let resp = self
            .client
            .post_json(&self.endpoint, &payload)
            .await
            .map_err(|e| e.to_string())?;
        if !resp.is_success() {
            return Err(format!("catalog endpoint answered HTTP {}", resp.status));
        }
        let body: CatalogBody =
            serde_json::from_str(&resp.body).map_err(|e| format!("catalog decode: {e}"))?;
        Ok(body
            .items
            .into_iter()
            .map(|i| MetricDescriptor {
                id: i.metric_id,
                display_name: i.metric_name,
            })
            .collect())
    }

    #[cfg(test)]
    pub(crate) fn with_cache(config: &EngineConfig, entries: Vec<MetricDescriptor>) -> Self {
        let resolver = Self::new(config);
        *resolver.cache.write().unwrap() = entries;
        resolver
    }
}
