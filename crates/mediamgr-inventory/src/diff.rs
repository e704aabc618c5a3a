//! Pure set difference between inventories.

use crate::types::{DiffOutcome, MissingSet, Snapshot};

/// Paths in `baseline` that are absent from `current`, in sorted order.
///
/// Comparison is exact on the path text: no case folding and no
/// separator normalization.
pub fn missing_between(baseline: &Snapshot, current: &Snapshot) -> MissingSet {
    MissingSet {
        baseline_id: baseline.id,
        current_id: current.id,
        paths: baseline
            .entries
            .difference(&current.entries)
            .cloned()
            .collect(),
    }
}

/// Compare the two most recent snapshots in `snapshots`.
///
/// Recency is decided by artifact id, not by slice position.
pub fn compute_missing(snapshots: &[Snapshot]) -> DiffOutcome {
    let mut ordered: Vec<&Snapshot> = snapshots.iter().collect();
    ordered.sort_by_key(|s| s.id);
    match ordered.as_slice() {
        [.., baseline, current] => DiffOutcome::Compared(missing_between(baseline, current)),
        _ => DiffOutcome::InsufficientHistory {
            available: snapshots.len(),
        },
    }
}
