//! Poll scheduler: the timer-driven caller of the fallback chain.
//!
//! One acquisition in flight at a time. The interval uses skip semantics,
//! so a tick that fires while a cycle is still running is dropped, not
//! queued — the rate-limited provider must never see a pile-up of
//! concurrent sessions. Shutdown is honored between cycles only; a running
//! cycle always completes to its own timeouts.

use crate::chain::FallbackChain;
use crate::model::ChainResult;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

pub struct Poller {
    chain: Arc<FallbackChain>,
    metric: String,
    interval: Duration,
}

impl Poller {
    pub fn new(chain: Arc<FallbackChain>, metric: impl Into<String>, interval: Duration) -> Self {
        Self {
            chain,
            metric: metric.into(),
            interval,
        }
    }

    /// Run until `shutdown` flips to `true`. The first cycle fires
    /// immediately; each subsequent tick waits out the interval. Every
    /// cycle's result is forwarded to `on_cycle` — the engine never
    /// decides what to render, it only reports.
    pub async fn run<F>(&self, mut on_cycle: F, mut shutdown: watch::Receiver<bool>)
    where
        F: FnMut(ChainResult),
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => break,
            }
            if *shutdown.borrow() {
                break;
            }

            // Awaited to completion: no cancellation point mid-cycle.
            let result = self.chain.acquire(&self.metric).await;
            on_cycle(result);

            if *shutdown.borrow() {
                break;
            }
        }
        tracing::info!("poll loop stopped");
    }
}
