//! Browser-rendered adapter: read the chart's in-memory series directly.
//!
//! Drives headless Chromium to the rendering page, waits (bounded) for the
//! charting widget's container to exist, then evaluates a script inside the
//! page that dumps the chart library's series arrays. No network capture is
//! involved — whatever the page managed to load is what we read. This is
//! the most expensive channel and sits last in the default priority order.

use crate::config::EngineConfig;
use crate::errors::SourceError;
use crate::model::{CanonicalPoint, FetchOutcome, FetchWindow, MetricDescriptor, SeriesKind, SourceId};
use crate::sources::SourceAdapter;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Find the Chromium binary path.
pub fn find_chromium() -> Option<PathBuf> {
    // 1. DEMANDA_CHROMIUM_PATH env
    if let Ok(p) = std::env::var("DEMANDA_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. ~/.demanda/chromium/
    if let Some(home) = dirs::home_dir() {
        let candidates = if cfg!(target_os = "macos") {
            vec![
                home.join(".demanda/chromium/chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".demanda/chromium/chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".demanda/chromium/chrome"),
            ]
        } else {
            vec![
                home.join(".demanda/chromium/chrome-linux64/chrome"),
                home.join(".demanda/chromium/chrome"),
            ]
        };
        for c in candidates {
            if c.exists() {
                return Some(c);
            }
        }
    }

    // 3. System PATH
    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 4. Common macOS location
    if cfg!(target_os = "macos") {
        let common = PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Shape the in-page readout script returns: `[epoch_millis, value]` pairs
/// per series, value null where the chart has a gap.
#[derive(Debug, Deserialize)]
struct ChartDump {
    #[serde(default)]
    real: Vec<(i64, Option<f64>)>,
    #[serde(default)]
    scheduled: Vec<(i64, Option<f64>)>,
}

/// Reads the charting library's series data out of the live page. Covers
/// Highcharts (what the provider renders with today) and falls back to the
/// raw `window.demandaReal`/`window.demandaProgramada` globals.
const CHART_READ_JS: &str = r#"
(() => {
    const out = { real: [], scheduled: [] };
    const dump = (points) => points
        .filter((p) => p && typeof p.x === 'number')
        .map((p) => [p.x, (typeof p.y === 'number') ? p.y : null]);
    const hc = window.Highcharts;
    if (hc && Array.isArray(hc.charts)) {
        for (const chart of hc.charts) {
            if (!chart) continue;
            for (const s of (chart.series || [])) {
                const name = (s.name || '').toLowerCase();
                const key = name.includes('program') ? 'scheduled' : 'real';
                out[key] = dump(s.data || []);
            }
        }
    }
    const wrapped = (arr) => (Array.isArray(arr) ? arr : [])
        .map((e) => {
            const m = /\/Date\((-?\d+)\)\//.exec(e.Fecha || '');
            return m ? [Number(m[1]), (typeof e.Valor === 'number') ? e.Valor : null] : null;
        })
        .filter((e) => e !== null);
    if (out.real.length === 0) out.real = wrapped(window.demandaReal);
    if (out.scheduled.length === 0) out.scheduled = wrapped(window.demandaProgramada);
    return out;
})()
"#;

pub struct BrowserAdapter {
    page_url: String,
    chart_selector: String,
    budget_ms: u64,
}

impl BrowserAdapter {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            page_url: config.page_url.clone(),
            chart_selector: config.chart_selector.clone(),
            budget_ms: config.browser_timeout_ms,
        }
    }

    async fn attempt(&self) -> Result<FetchOutcome, SourceError> {
        let started = Instant::now();
        let chrome_path = find_chromium().ok_or_else(|| {
            SourceError::Transport("Chromium not found (set DEMANDA_CHROMIUM_PATH)".into())
        })?;

        let config = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .build()
            .map_err(|e| SourceError::Transport(format!("browser config: {e}")))?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| SourceError::Transport(format!("failed to launch Chromium: {e}")))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        let result = self.drive(&browser, started).await;

        let _ = browser.close().await;
        handler_task.abort();
        result
    }

    async fn drive(
        &self,
        browser: &Browser,
        started: Instant,
    ) -> Result<FetchOutcome, SourceError> {
        let budget = Duration::from_millis(self.budget_ms);

        let page = tokio::time::timeout(
            budget.saturating_sub(started.elapsed()),
            browser.new_page(self.page_url.as_str()),
        )
        .await
        .map_err(|_| SourceError::Transport(format!("navigation timed out after {budget:?}")))?
        .map_err(|e| SourceError::Transport(format!("navigation failed: {e}")))?;

        // Bounded wait for the chart container. The widget builds its DOM
        // after load, so poll instead of trusting the navigation event.
        let probe = format!(
            "document.querySelector({:?}) !== null",
            self.chart_selector
        );
        loop {
            if started.elapsed() >= budget {
                return Err(SourceError::Transport(format!(
                    "chart container '{}' did not appear within {budget:?}",
                    self.chart_selector
                )));
            }
            let present: bool = page
                .evaluate(probe.as_str())
                .await
                .ok()
                .and_then(|r| r.into_value().ok())
                .unwrap_or(false);
            if present {
                break;
            }
            tokio::time::sleep(Duration::from_millis(250)).await;
        }

        let evaluated = page
            .evaluate(CHART_READ_JS)
            .await
            .map_err(|e| SourceError::Transport(format!("in-page evaluation failed: {e}")))?;
        let dump: ChartDump = evaluated
            .into_value()
            .map_err(|e| SourceError::Decode(format!("chart readout had unexpected shape: {e:?}")))?;

        let _ = page.close().await;

        let mut points = Vec::new();
        collect(&dump.real, SeriesKind::Real, &mut points);
        collect(&dump.scheduled, SeriesKind::Scheduled, &mut points);
        if points.is_empty() {
            return Err(SourceError::Empty);
        }
        Ok(FetchOutcome::success(SourceId::BrowserRendered, points))
    }
}

fn collect(pairs: &[(i64, Option<f64>)], kind: SeriesKind, out: &mut Vec<CanonicalPoint>) {
    for &(millis, value) in pairs {
        let Some(value) = value else { continue };
        if let Some(p) = CanonicalPoint::from_epoch_millis(millis, value, kind) {
            out.push(p);
        }
    }
}

#[async_trait]
impl SourceAdapter for BrowserAdapter {
    fn id(&self) -> SourceId {
        SourceId::BrowserRendered
    }

    async fn fetch(&self, _metric: &MetricDescriptor, _window: &FetchWindow) -> FetchOutcome {
        match self.attempt().await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::debug!(source = %self.id(), status = %e.status(), "attempt failed: {e}");
                FetchOutcome::failure(SourceId::BrowserRendered, e.status(), e.to_string())
            }
        }
    }
}
