// Copyright 2026 Demanda RT Contributors
// SPDX-License-Identifier: Apache-2.0

//! Engine event bus — typed lifecycle events from the acquisition engine.
//!
//! A `tokio::sync::broadcast` channel carrying [`EngineEvent`] values. Any
//! consumer — the CLI watcher, a log sink, a future dashboard — can
//! subscribe independently. When no subscribers exist, events are silently
//! dropped (zero overhead).

use crate::model::{AttemptRecord, FetchStatus, SourceId};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Every event the engine emits. Serialized to JSON for machine consumers.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EngineEvent {
    /// A poll cycle has started.
    CycleStarted { metric: String, timestamp: String },
    /// One source adapter attempt finished.
    SourceAttempted {
        source_id: SourceId,
        status: FetchStatus,
        elapsed_ms: u64,
    },
    /// A cycle produced a usable series.
    CycleComplete {
        source_id: SourceId,
        point_count: usize,
        total_ms: u64,
    },
    /// Every adapter failed this cycle.
    CycleFailed {
        attempts: Vec<AttemptRecord>,
        total_ms: u64,
    },
}

/// Shared broadcast bus for engine events.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EngineEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit an event. Dropped silently when nobody listens.
    pub fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
