//! `mediamgr-inventory`: timestamped media inventories and what they imply.
//!
//! # Overview
//!
//! Every scan is persisted as an immutable *snapshot* artifact: one absolute
//! path per line under `<output>/media_lists/`. The [`diff`] module compares
//! the two most recent snapshots and yields the paths that disappeared; the
//! [`retention`] module prunes old artifacts once a run has consumed them.
//!
//! | Artifact kind    | Directory          | File name                                   |
//! |------------------|--------------------|---------------------------------------------|
//! | `MediaList`      | `media_lists/`     | `media_list_YYYYMMDD_HHMMSS_NNNNNN.txt`     |
//! | `MissingMedia`   | `missing_media/`   | `missing_media_YYYYMMDD_HHMMSS_NNNNNN.txt`  |
//! | `FilenameIssues` | `filename_issues/` | `windows_filename_issues_..._NNNNNN.txt`    |
//!
//! `NNNNNN` is a per-directory sequence number that strictly increases with
//! every write, so two scans in the same second stay ordered.

pub mod diff;
pub mod error;
pub mod report;
pub mod retention;
pub mod store;
pub mod types;

pub use diff::{compute_missing, missing_between};
pub use error::{InventoryError, Result};
pub use retention::{enforce, RetentionPolicy, RetentionReport};
pub use store::ArtifactStore;
pub use types::{ArtifactId, ArtifactKind, ArtifactRef, DiffOutcome, MissingSet, RunStamp, Snapshot};
