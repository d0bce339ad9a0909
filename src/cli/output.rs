//! Output helpers shared by the commands.
//!
//! Global flags are carried through environment variables set once in
//! `main`, so every module can check them without plumbing.

use crate::model::{AttemptRecord, CanonicalPoint};

pub fn is_json() -> bool {
    std::env::var("DEMANDA_JSON").is_ok()
}

pub fn is_quiet() -> bool {
    std::env::var("DEMANDA_QUIET").is_ok()
}

pub fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

/// Render the tail of a normalized series as aligned rows.
pub fn print_series_tail(points: &[CanonicalPoint], tail: usize) {
    let start = points.len().saturating_sub(tail);
    for p in &points[start..] {
        println!(
            "  {}  {:>10.1} MW  [{}]",
            p.timestamp.format("%Y-%m-%d %H:%M"),
            p.value,
            p.kind
        );
    }
}

/// Render the diagnostic trail, one line per adapter consulted.
pub fn print_attempts(attempts: &[AttemptRecord]) {
    for a in attempts {
        println!("  {:<17} {:<16} {}", a.source_id.to_string(), a.status.to_string(), a.message);
    }
}

/// Percent formatting for the real-vs-scheduled deviation.
pub fn format_deviation(deviation: f64) -> String {
    format!("{:+.2}%", deviation * 100.0)
}
