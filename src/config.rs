//! Engine configuration: endpoints, timeouts, and adapter priority order.
//!
//! Defaults are compiled in and every field can be overridden from a JSON
//! file at `~/.demanda/config.json` (or an explicit `--config` path). The
//! adapter order is configuration, not code, so operators can reorder
//! cheap-vs-expensive sources without touching the adapters.

use crate::model::SourceId;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Full engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Base URL of the structured metrics API.
    pub api_base_url: String,
    /// Grouping entity for API queries (`Sistema` = national total).
    pub api_entity: String,
    /// Landing page whose GET hands out the legacy session cookie.
    pub legacy_landing_url: String,
    /// Stateful legacy service endpoint (empty-body POST).
    pub legacy_service_url: String,
    /// Public rendering page used by the scrape and browser adapters.
    pub page_url: String,
    /// Assignment that precedes the embedded data array in the page scripts.
    pub script_marker: String,
    /// CSS selector of the chart container the browser adapter waits for.
    pub chart_selector: String,

    /// Timeout for structured API and catalog calls, in milliseconds.
    pub api_timeout_ms: u64,
    /// Timeout for the legacy two-step interaction, per call.
    pub legacy_timeout_ms: u64,
    /// Timeout for the full-page scrape fetch.
    pub scrape_timeout_ms: u64,
    /// Overall budget for the browser-rendered path (navigate + wait + read).
    pub browser_timeout_ms: u64,

    /// Adapter priority order; first success wins the cycle.
    pub source_order: Vec<SourceId>,
    /// Metric requested when the caller does not name one.
    pub default_metric: String,
    /// Seconds between poll ticks in watch mode.
    pub poll_interval_secs: u64,
    /// Days of data requested per acquisition (ending today).
    pub window_days: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://servapibi.xm.com.co".into(),
            api_entity: "Sistema".into(),
            legacy_landing_url: "https://www.xm.com.co/consumo/demanda-en-tiempo-real".into(),
            legacy_service_url:
                "https://serviciosweb.xm.com.co/SerconWeb/SerconService.svc/GetDemandaRT".into(),
            page_url: "https://www.xm.com.co/consumo/demanda-en-tiempo-real".into(),
            script_marker: "var demandaReal =".into(),
            chart_selector: "#grafica-demanda".into(),
            api_timeout_ms: 10_000,
            legacy_timeout_ms: 10_000,
            scrape_timeout_ms: 20_000,
            browser_timeout_ms: 45_000,
            source_order: vec![
                SourceId::StructuredApi,
                SourceId::LegacySession,
                SourceId::ScriptScrape,
                SourceId::BrowserRendered,
            ],
            default_metric: "DemaReal".into(),
            poll_interval_secs: 300,
            window_days: 1,
        }
    }
}

impl EngineConfig {
    /// Default on-disk location: `~/.demanda/config.json`.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".demanda/config.json")
    }

    /// Load from `path` when given, else from the default location, else
    /// compiled-in defaults. A present-but-broken file is an error; a
    /// missing default file is not.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p)
                .with_context(|| format!("failed to load config from {}", p.display())),
            None => {
                let p = Self::default_path();
                if p.exists() {
                    Self::from_file(&p)
                        .with_context(|| format!("failed to load config from {}", p.display()))
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let cfg: Self = serde_json::from_str(&raw)?;
        if cfg.source_order.is_empty() {
            anyhow::bail!("source_order must name at least one adapter");
        }
        if cfg.source_order.contains(&SourceId::Engine) {
            anyhow::bail!("source_order may only name acquisition channels");
        }
        Ok(cfg)
    }
}
