use std::io;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{InventoryError, Result};
use crate::store::ArtifactStore;
use crate::types::{ArtifactKind, ArtifactRef};

/// Keep at most `max_count` artifacts per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    max_count: NonZeroUsize,
}

impl RetentionPolicy {
    pub fn new(max_count: i64) -> Result<Self> {
        usize::try_from(max_count)
            .ok()
            .and_then(NonZeroUsize::new)
            .map(|max_count| Self { max_count })
            .ok_or(InventoryError::InvalidRetention(max_count))
    }

    pub fn max_count(&self) -> usize {
        self.max_count.get()
    }

    /// The oldest artifacts beyond the cap. `artifacts` must be oldest first.
    pub fn excess<'a>(&self, artifacts: &'a [ArtifactRef]) -> &'a [ArtifactRef] {
        let over = artifacts.len().saturating_sub(self.max_count());
        &artifacts[..over]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of pruning one artifact kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionReport {
    pub kind: ArtifactKind,
    pub kept: usize,
    pub deleted: Vec<PathBuf>,
    pub failures: Vec<RetentionFailure>,
}

impl RetentionReport {
    pub fn is_partial_failure(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Delete the oldest artifacts of `kind` beyond the policy cap.
///
/// Deletion is best effort: a file that cannot be removed is recorded in
/// [`RetentionReport::failures`] and the rest are still attempted. Only a
/// failure to list the directory is returned as an error.
pub fn enforce(store: &ArtifactStore, kind: ArtifactKind, policy: RetentionPolicy) -> Result<RetentionReport> {
    let artifacts = store.list(kind)?;
    Ok(enforce_with(kind, &artifacts, policy, |p| std::fs::remove_file(p)))
}

pub(crate) fn enforce_with<F>(
    kind: ArtifactKind,
    artifacts: &[ArtifactRef],
    policy: RetentionPolicy,
    mut remove: F,
) -> RetentionReport
where
    F: FnMut(&Path) -> io::Result<()>,
{
    let excess = policy.excess(artifacts);
    let mut report = RetentionReport {
        kind,
        kept: artifacts.len() - excess.len(),
        deleted: Vec::new(),
        failures: Vec::new(),
    };

    for artifact in excess {
        match remove(&artifact.path) {
            Ok(()) => report.deleted.push(artifact.path.clone()),
            // Already gone counts as removed.
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                report.deleted.push(artifact.path.clone())
            }
            Err(e) => {
                warn!(path = %artifact.path.display(), error = %e, "Failed to delete artifact");
                report.failures.push(RetentionFailure {
                    path: artifact.path.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    if !excess.is_empty() {
        info!(
            kind = %kind,
            deleted = report.deleted.len(),
            failed = report.failures.len(),
            kept = report.kept,
            "Retention applied"
        );
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RunStamp;
    use chrono::NaiveDate;

    fn fill(store: &ArtifactStore, n: usize) -> Vec<ArtifactRef> {
        let stamp = RunStamp::at(
            NaiveDate::from_ymd_opt(2026, 1, 1)
                .unwrap()
                .and_hms_opt(5, 0, 0)
                .unwrap(),
        );
        (0..n)
            .map(|i| {
                store
                    .write_lines(ArtifactKind::MediaList, stamp, [format!("/m/{i}")])
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn rejects_non_positive_counts() {
        assert!(matches!(
            RetentionPolicy::new(0),
            Err(InventoryError::InvalidRetention(0))
        ));
        assert!(RetentionPolicy::new(-3).is_err());
        assert_eq!(RetentionPolicy::new(5).unwrap().max_count(), 5);
    }

    #[test]
    fn deletes_oldest_beyond_cap() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path());
        let written = fill(&store, 5);

        let report = enforce(&store, ArtifactKind::MediaList, RetentionPolicy::new(3).unwrap()).unwrap();
        assert_eq!(report.kept, 3);
        assert_eq!(report.deleted, vec![written[0].path.clone(), written[1].path.clone()]);
        assert!(!report.is_partial_failure());

        let remaining = store.list(ArtifactKind::MediaList).unwrap();
        assert_eq!(remaining, written[2..].to_vec());
    }

    #[test]
    fn under_cap_is_a_no_op() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path());
        fill(&store, 2);
        let report = enforce(&store, ArtifactKind::MediaList, RetentionPolicy::new(3).unwrap()).unwrap();
        assert_eq!(report.kept, 2);
        assert!(report.deleted.is_empty());
    }

    #[test]
    fn one_failed_delete_does_not_stop_the_rest() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path());
        let written = fill(&store, 5);
        let stuck = written[0].path.clone();

        let report = enforce_with(
            ArtifactKind::MediaList,
            &written,
            RetentionPolicy::new(2).unwrap(),
            |p| {
                if p == stuck {
                    Err(io::Error::new(io::ErrorKind::PermissionDenied, "locked"))
                } else {
                    std::fs::remove_file(p)
                }
            },
        );

        assert!(report.is_partial_failure());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, stuck);
        assert_eq!(report.deleted.len(), 2);
        assert!(stuck.exists());
        assert!(!written[1].path.exists());
        assert!(written[4].path.exists());
    }

    #[test]
    fn vanished_file_counts_as_deleted() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path());
        let written = fill(&store, 2);
        std::fs::remove_file(&written[0].path).unwrap();

        let report = enforce_with(
            ArtifactKind::MediaList,
            &written,
            RetentionPolicy::new(1).unwrap(),
            |p| std::fs::remove_file(p),
        );
        assert_eq!(report.deleted, vec![written[0].path.clone()]);
        assert!(report.failures.is_empty());
    }
}
