//! Time-series normalization: merge, sort, deduplicate, and derived views.

use crate::model::{CanonicalPoint, SeriesKind};

/// Sort by `(timestamp, kind)` and collapse duplicates.
///
/// Later-arriving entries win on a `(timestamp, kind)` collision, because
/// later decoder output reflects more complete provider corrections. The
/// operation is idempotent.
pub fn normalize(points: Vec<CanonicalPoint>) -> Vec<CanonicalPoint> {
    let mut indexed: Vec<(usize, CanonicalPoint)> = points.into_iter().enumerate().collect();
    // Arrival order breaks ties so the stable sort keeps last-write-wins
    // deterministic even across equal keys.
    indexed.sort_by(|(ia, a), (ib, b)| {
        (a.timestamp, a.kind, ia).cmp(&(b.timestamp, b.kind, ib))
    });

    let mut out: Vec<CanonicalPoint> = Vec::with_capacity(indexed.len());
    for (_, p) in indexed {
        match out.last_mut() {
            Some(last) if last.timestamp == p.timestamp && last.kind == p.kind => *last = p,
            _ => out.push(p),
        }
    }
    out
}

/// The maximum-timestamp point of one kind, if any.
pub fn latest(points: &[CanonicalPoint], kind: SeriesKind) -> Option<&CanonicalPoint> {
    points
        .iter()
        .filter(|p| p.kind == kind)
        .max_by_key(|p| p.timestamp)
}

/// Relative deviation of the latest real reading against the latest
/// scheduled one: `(real - scheduled) / scheduled`.
///
/// A zero or absent scheduled value yields `0.0` — there is nothing
/// meaningful to deviate from, and division must not fault.
pub fn deviation(points: &[CanonicalPoint]) -> f64 {
    let real = latest(points, SeriesKind::Real).map(|p| p.value);
    let scheduled = latest(points, SeriesKind::Scheduled).map(|p| p.value);
    match (real, scheduled) {
        (Some(r), Some(s)) if s != 0.0 => (r - s) / s,
        _ => 0.0,
    }
}
