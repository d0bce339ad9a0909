//! One-shot acquisition: run the chain once and print the result.

use crate::chain::FallbackChain;
use crate::cli::output;
use crate::config::EngineConfig;
use crate::events::EventBus;
use crate::model::SeriesKind;
use crate::series::{deviation, latest, normalize};
use anyhow::Result;

pub async fn run(config: EngineConfig, metric: Option<&str>, window_days: Option<u32>) -> Result<()> {
    let mut config = config;
    if let Some(days) = window_days {
        config.window_days = days;
    }
    let metric = metric.unwrap_or(&config.default_metric).to_string();

    let chain = FallbackChain::new(&config, EventBus::default());
    let result = chain.acquire(&metric).await;

    if output::is_json() {
        let points = normalize(result.outcome.points.clone());
        output::print_json(&serde_json::json!({
            "metric": metric,
            "success": result.is_success(),
            "source": result.outcome.source_id,
            "status": result.outcome.status,
            "points": points,
            "deviation": deviation(&points),
            "attempts": result.attempts,
        }));
        return if result.is_success() {
            Ok(())
        } else {
            anyhow::bail!("all sources failed")
        };
    }

    if !result.is_success() {
        println!("No data for '{metric}'.");
        println!();
        println!("Attempts:");
        output::print_attempts(&result.attempts);
        anyhow::bail!(
            "{} reported: {}",
            result.outcome.source_id,
            result.outcome.message.as_deref().unwrap_or("no detail")
        );
    }

    let points = normalize(result.outcome.points.clone());
    if !output::is_quiet() {
        println!(
            "Metric '{metric}' via {} — {} points",
            result.outcome.source_id,
            points.len()
        );
        println!();
        output::print_series_tail(&points, 12);
        println!();
        if let Some(real) = latest(&points, SeriesKind::Real) {
            println!(
                "Latest real:      {:>10.1} MW at {}",
                real.value,
                real.timestamp.format("%H:%M")
            );
        }
        if let Some(sched) = latest(&points, SeriesKind::Scheduled) {
            println!(
                "Latest scheduled: {:>10.1} MW at {}",
                sched.value,
                sched.timestamp.format("%H:%M")
            );
            println!(
                "Deviation:        {:>10}",
                output::format_deviation(deviation(&points))
            );
        }
    }
    Ok(())
}
