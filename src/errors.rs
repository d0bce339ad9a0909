//! Internal fault types and their classification into the public taxonomy.
//!
//! Adapters never let a fault escape: every `SourceError` is converted into
//! a `FetchOutcome` with the matching [`FetchStatus`] before it leaves the
//! adapter. The chain controller therefore never returns `Err`.

use crate::model::FetchStatus;
use thiserror::Error;

/// A fault inside one source adapter attempt.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Network-level failure: connect, TLS, timeout.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The remote answered with a non-success status or an access block.
    #[error("remote rejected the request: {0}")]
    Rejected(String),

    /// The payload no longer matches the expected shape.
    #[error("payload decode failed: {0}")]
    Decode(String),

    /// Well-formed response with nothing usable in it.
    #[error("response contained no records")]
    Empty,
}

impl SourceError {
    /// Map the fault onto the public failure taxonomy.
    pub fn status(&self) -> FetchStatus {
        match self {
            SourceError::Transport(_) => FetchStatus::TransportError,
            SourceError::Rejected(_) => FetchStatus::RemoteRejected,
            SourceError::Decode(_) => FetchStatus::DecodeError,
            SourceError::Empty => FetchStatus::EmptyResult,
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        // A status() error means we saw a response; everything else is wire
        // trouble, including timeouts.
        if e.is_status() {
            SourceError::Rejected(e.to_string())
        } else {
            SourceError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(e: serde_json::Error) -> Self {
        SourceError::Decode(e.to_string())
    }
}

/// Catalog resolution failure. Surfaces as an engine-attributed failed
/// attempt in that cycle's `ChainResult`; no adapter runs for the cycle.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("metric '{requested}' not found in provider catalog")]
    NotFound { requested: String },

    #[error("catalog unreachable and no cached copy exists: {0}")]
    Unreachable(String),
}

impl CatalogError {
    /// Map the resolution failure onto the public failure taxonomy.
    pub fn status(&self) -> FetchStatus {
        match self {
            // The catalog answered; it just holds no such metric.
            CatalogError::NotFound { .. } => FetchStatus::EmptyResult,
            CatalogError::Unreachable(_) => FetchStatus::TransportError,
        }
    }
}
