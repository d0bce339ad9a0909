//! Continuous watch mode: poll the chain on an interval and render each
//! cycle's result, keeping the last known values on screen when a cycle
//! fails — marked stale, never passed off as fresh.

use crate::chain::FallbackChain;
use crate::cli::{init_tracing, output};
use crate::config::EngineConfig;
use crate::events::EventBus;
use crate::model::{CanonicalPoint, ChainResult, SeriesKind};
use crate::poll::Poller;
use crate::series::{deviation, latest, normalize};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

pub async fn run(
    config: EngineConfig,
    metric: Option<&str>,
    interval_secs: Option<u64>,
    verbose: bool,
) -> Result<()> {
    init_tracing(verbose);

    let metric = metric.unwrap_or(&config.default_metric).to_string();
    let interval = Duration::from_secs(interval_secs.unwrap_or(config.poll_interval_secs).max(1));

    let chain = Arc::new(FallbackChain::new(&config, EventBus::default()));
    let poller = Poller::new(chain, metric.clone(), interval);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutdown requested, finishing current cycle");
        let _ = shutdown_tx.send(true);
    });

    if !output::is_quiet() && !output::is_json() {
        println!("Watching '{metric}' every {}s. Ctrl-C to stop.", interval.as_secs());
    }

    // Last successful series, shown unchanged (and labelled stale) while
    // the provider is unreachable.
    let mut last_known: Vec<CanonicalPoint> = Vec::new();
    poller
        .run(
            |result: ChainResult| render_cycle(result, &mut last_known),
            shutdown_rx,
        )
        .await;
    Ok(())
}

fn render_cycle(result: ChainResult, last_known: &mut Vec<CanonicalPoint>) {
    let now = chrono::Utc::now()
        .with_timezone(&crate::model::provider_offset())
        .format("%H:%M:%S");

    if result.is_success() {
        *last_known = normalize(result.outcome.points.clone());
        if output::is_json() {
            output::print_json(&serde_json::json!({
                "at": now.to_string(),
                "fresh": true,
                "source": result.outcome.source_id,
                "points": last_known,
                "deviation": deviation(last_known),
            }));
            return;
        }
        if output::is_quiet() {
            return;
        }
        let real = latest(last_known, SeriesKind::Real).map(|p| p.value);
        let sched = latest(last_known, SeriesKind::Scheduled).map(|p| p.value);
        println!(
            "[{now}] {} | real {} MW | scheduled {} MW | deviation {}",
            result.outcome.source_id,
            real.map_or("-".into(), |v| format!("{v:.1}")),
            sched.map_or("-".into(), |v| format!("{v:.1}")),
            output::format_deviation(deviation(last_known)),
        );
        return;
    }

    // Failed cycle, adapter or resolution alike: the attempt log says which.
    let reason = result
        .outcome
        .message
        .clone()
        .unwrap_or_else(|| result.outcome.status.to_string());
    if output::is_json() {
        output::print_json(&serde_json::json!({
            "at": now.to_string(),
            "fresh": false,
            "reason": reason,
            "attempts": result.attempts,
            "last_known": last_known,
        }));
        return;
    }
    if output::is_quiet() {
        return;
    }
    if last_known.is_empty() {
        println!("[{now}] no data — {reason}");
    } else {
        let real = latest(last_known, SeriesKind::Real).map(|p| p.value);
        println!(
            "[{now}] STALE (last known real {} MW) — {reason}",
            real.map_or("-".into(), |v| format!("{v:.1}")),
        );
    }
    output::print_attempts(&result.attempts);
}
