use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{InventoryError, Result};
use crate::types::{ArtifactId, ArtifactKind, ArtifactRef, RunStamp, Snapshot};

/// Writers racing for the same sequence number retry this many times.
const MAX_NAME_ATTEMPTS: u32 = 16;

/// Timestamped artifacts under one output directory.
///
/// Artifacts are immutable once written: each write lands in a temporary file
/// in the target directory and is renamed into place only if no artifact with
/// that name exists yet, so readers never observe partial content.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir(&self, kind: ArtifactKind) -> PathBuf {
        self.root.join(kind.dir_name())
    }

    /// All artifacts of `kind`, oldest first. A missing directory is empty.
    pub fn list(&self, kind: ArtifactKind) -> Result<Vec<ArtifactRef>> {
        let dir = self.dir(kind);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(InventoryError::io(&dir)(e)),
        };

        let mut artifacts = Vec::new();
        for entry in entries {
            let entry = entry.map_err(InventoryError::io(&dir))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            let Some(id) = kind.parse_file_name(name) else {
                continue;
            };
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            artifacts.push(ArtifactRef {
                kind,
                id,
                path: entry.path(),
            });
        }
        artifacts.sort_by_key(|a| a.id);
        Ok(artifacts)
    }

    pub fn latest(&self, kind: ArtifactKind) -> Result<Option<ArtifactRef>> {
        Ok(self.list(kind)?.pop())
    }

    /// Persist one entry per line.
    pub fn write_lines<I, S>(&self, kind: ArtifactKind, stamp: RunStamp, lines: I) -> Result<ArtifactRef>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut content = String::new();
        for line in lines {
            content.push_str(line.as_ref());
            content.push('\n');
        }
        self.write_text(kind, stamp, &content)
    }

    /// Persist `content` as a new artifact whose sequence number is greater
    /// than every existing artifact of the same kind.
    pub fn write_text(&self, kind: ArtifactKind, stamp: RunStamp, content: &str) -> Result<ArtifactRef> {
        let dir = self.dir(kind);
        fs::create_dir_all(&dir).map_err(InventoryError::io(&dir))?;

        let exhausted = |dir: PathBuf| InventoryError::NameExhausted {
            dir,
            attempts: MAX_NAME_ATTEMPTS,
        };
        let mut sequence = match self.list(kind)?.last() {
            Some(a) => a.id.sequence.checked_add(1).ok_or_else(|| exhausted(dir.clone()))?,
            None => 1,
        };

        let mut tmp = NamedTempFile::new_in(&dir).map_err(InventoryError::io(&dir))?;
        tmp.write_all(content.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(InventoryError::io(tmp.path()))?;

        for _ in 0..MAX_NAME_ATTEMPTS {
            let id = ArtifactId {
                sequence,
                timestamp: stamp.timestamp(),
            };
            let path = dir.join(kind.file_name(&id));
            match tmp.persist_noclobber(&path) {
                Ok(_) => {
                    debug!(kind = %kind, path = %path.display(), "Artifact written");
                    return Ok(ArtifactRef { kind, id, path });
                }
                Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                    warn!(path = %path.display(), "Artifact name taken, retrying with next sequence");
                    tmp = e.file;
                    sequence = sequence.checked_add(1).ok_or_else(|| exhausted(dir.clone()))?;
                }
                Err(e) => return Err(InventoryError::io(path)(e.error)),
            }
        }

        Err(exhausted(dir))
    }

    /// Read a media list. Blank lines are ignored and CRLF endings tolerated.
    pub fn load_snapshot(&self, artifact: &ArtifactRef) -> Result<Snapshot> {
        let text = fs::read_to_string(&artifact.path).map_err(InventoryError::io(&artifact.path))?;
        let entries: BTreeSet<String> = text
            .lines()
            .map(|l| l.trim_end_matches('\r'))
            .filter(|l| !l.trim().is_empty())
            .map(str::to_string)
            .collect();
        Ok(Snapshot {
            id: artifact.id,
            entries,
        })
    }

    /// The `count` most recent snapshots, oldest first.
    pub fn recent_snapshots(&self, count: usize) -> Result<Vec<Snapshot>> {
        let all = self.list(ArtifactKind::MediaList)?;
        let skip = all.len().saturating_sub(count);
        all[skip..].iter().map(|a| self.load_snapshot(a)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn stamp(h: u32, m: u32, s: u32) -> RunStamp {
        RunStamp::at(
            NaiveDate::from_ymd_opt(2026, 1, 1)
                .unwrap()
                .and_hms_opt(h, m, s)
                .unwrap(),
        )
    }

    #[test]
    fn missing_directory_lists_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path().join("nowhere"));
        assert!(store.list(ArtifactKind::MediaList).unwrap().is_empty());
        assert!(store.latest(ArtifactKind::MediaList).unwrap().is_none());
    }

    #[test]
    fn write_then_load_snapshot() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path());
        let written = store
            .write_lines(ArtifactKind::MediaList, stamp(5, 0, 0), ["/m/b.mkv", "/m/a.mp4"])
            .unwrap();

        assert_eq!(written.id.sequence, 1);
        assert_eq!(
            written.path,
            tmp.path()
                .join("media_lists")
                .join("media_list_20260101_050000_000001.txt")
        );
        let snap = store.load_snapshot(&written).unwrap();
        let entries: Vec<_> = snap.entries.iter().map(String::as_str).collect();
        assert_eq!(entries, ["/m/a.mp4", "/m/b.mkv"]);
    }

    #[test]
    fn same_second_writes_get_increasing_sequences() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path());
        let first = store
            .write_lines(ArtifactKind::MediaList, stamp(5, 0, 0), ["/a"])
            .unwrap();
        let second = store
            .write_lines(ArtifactKind::MediaList, stamp(5, 0, 0), ["/b"])
            .unwrap();

        assert!(second.id > first.id);
        assert_ne!(first.path, second.path);
        assert_eq!(store.latest(ArtifactKind::MediaList).unwrap(), Some(second));
    }

    #[test]
    fn sequence_survives_clock_moving_backwards() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path());
        store
            .write_lines(ArtifactKind::MediaList, stamp(6, 0, 0), ["/a"])
            .unwrap();
        let later = store
            .write_lines(ArtifactKind::MediaList, stamp(4, 0, 0), ["/b"])
            .unwrap();
        assert_eq!(store.latest(ArtifactKind::MediaList).unwrap(), Some(later));
    }

    #[test]
    fn taken_name_retries_with_next_sequence() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path());
        let dir = store.dir(ArtifactKind::MediaList);
        // Not a file, so `list` ignores it, but the name is occupied as if a
        // concurrent writer had just claimed it.
        let claimed = dir.join("media_list_20260101_050000_000001.txt");
        fs::create_dir_all(&claimed).unwrap();

        let written = store
            .write_lines(ArtifactKind::MediaList, stamp(5, 0, 0), ["/new"])
            .unwrap();
        assert_eq!(written.id.sequence, 2);
        assert!(claimed.is_dir());
        assert_eq!(fs::read_to_string(&written.path).unwrap(), "/new\n");
    }

    #[test]
    fn maximal_sequence_is_exhausted_not_wrapped() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path());
        let dir = store.dir(ArtifactKind::MediaList);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(format!("media_list_20260101_050000_{}.txt", u64::MAX)),
            "/x\n",
        )
        .unwrap();

        let err = store
            .write_lines(ArtifactKind::MediaList, stamp(6, 0, 0), ["/new"])
            .unwrap_err();
        assert!(matches!(err, InventoryError::NameExhausted { .. }));
        assert_eq!(store.list(ArtifactKind::MediaList).unwrap().len(), 1);
    }

    #[test]
    fn legacy_and_sequenced_names_order_together() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path());
        let dir = store.dir(ArtifactKind::MediaList);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("media_list_20250101_000000.txt"), "/old\n").unwrap();
        fs::write(dir.join("media_list_20250102_000000.txt"), "/older-but-later\n").unwrap();
        fs::write(dir.join("readme.txt"), "ignored").unwrap();

        let new = store
            .write_lines(ArtifactKind::MediaList, stamp(1, 0, 0), ["/new"])
            .unwrap();
        let names: Vec<_> = store
            .list(ArtifactKind::MediaList)
            .unwrap()
            .into_iter()
            .map(|a| a.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            [
                "media_list_20250101_000000.txt",
                "media_list_20250102_000000.txt",
                "media_list_20260101_010000_000001.txt",
            ]
        );
        assert_eq!(new.id.sequence, 1);
    }

    #[test]
    fn load_tolerates_crlf_and_blank_lines() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path());
        let dir = store.dir(ArtifactKind::MediaList);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("media_list_20250101_000000.txt"), "C:\\a.mkv\r\n\r\nC:\\b.mkv\r\n").unwrap();

        let snaps = store.recent_snapshots(2).unwrap();
        assert_eq!(snaps.len(), 1);
        assert!(snaps[0].entries.contains("C:\\a.mkv"));
        assert!(snaps[0].entries.contains("C:\\b.mkv"));
        assert_eq!(snaps[0].entries.len(), 2);
    }

    #[test]
    fn recent_snapshots_returns_tail_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path());
        for (i, p) in ["/1", "/2", "/3"].iter().enumerate() {
            store
                .write_lines(ArtifactKind::MediaList, stamp(5, 0, i as u32), [*p])
                .unwrap();
        }
        let snaps = store.recent_snapshots(2).unwrap();
        assert_eq!(snaps.len(), 2);
        assert!(snaps[0].entries.contains("/2"));
        assert!(snaps[1].entries.contains("/3"));
    }
}
