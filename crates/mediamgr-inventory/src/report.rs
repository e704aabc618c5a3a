use tracing::info;

use crate::error::Result;
use crate::store::ArtifactStore;
use crate::types::{ArtifactKind, ArtifactRef, MissingSet, RunStamp};

/// Persist a non-empty missing set as a `missing_media` artifact.
///
/// An empty set writes nothing and returns `None`.
pub fn write_missing_report(
    store: &ArtifactStore,
    stamp: RunStamp,
    missing: &MissingSet,
) -> Result<Option<ArtifactRef>> {
    if missing.is_empty() {
        return Ok(None);
    }
    let artifact = store.write_lines(ArtifactKind::MissingMedia, stamp, &missing.paths)?;
    info!(
        count = missing.len(),
        baseline = %missing.baseline_id,
        current = %missing.current_id,
        path = %artifact.path.display(),
        "Missing media report written"
    );
    Ok(Some(artifact))
}
