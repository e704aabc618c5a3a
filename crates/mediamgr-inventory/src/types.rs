use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use chrono::{Local, NaiveDateTime, Timelike};

/// Text format of the timestamp embedded in artifact file names.
pub const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// The three artifact families written under the output directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    MediaList,
    MissingMedia,
    FilenameIssues,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 3] = [
        ArtifactKind::MediaList,
        ArtifactKind::MissingMedia,
        ArtifactKind::FilenameIssues,
    ];

    /// Subdirectory of the output directory holding this kind.
    pub fn dir_name(&self) -> &'static str {
        match self {
            ArtifactKind::MediaList => "media_lists",
            ArtifactKind::MissingMedia => "missing_media",
            ArtifactKind::FilenameIssues => "filename_issues",
        }
    }

    /// File name prefix, joined to the stamp with `_`.
    pub fn prefix(&self) -> &'static str {
        match self {
            ArtifactKind::MediaList => "media_list",
            ArtifactKind::MissingMedia => "missing_media",
            ArtifactKind::FilenameIssues => "windows_filename_issues",
        }
    }

    pub fn file_name(&self, id: &ArtifactId) -> String {
        format!("{}_{}.txt", self.prefix(), id)
    }

    /// Parse `<prefix>_YYYYMMDD_HHMMSS[_NNNNNN].txt`.
    ///
    /// Names without the sequence suffix predate it and sort as sequence 0.
    pub fn parse_file_name(&self, name: &str) -> Option<ArtifactId> {
        let rest = name
            .strip_prefix(self.prefix())?
            .strip_prefix('_')?
            .strip_suffix(".txt")?;
        let mut parts = rest.split('_');
        let date = parts.next()?;
        let time = parts.next()?;
        let sequence = match parts.next() {
            Some(seq) if !seq.is_empty() && seq.chars().all(|c| c.is_ascii_digit()) => {
                seq.parse().ok()?
            }
            Some(_) => return None,
            None => 0,
        };
        if parts.next().is_some() || date.len() != 8 || time.len() != 6 {
            return None;
        }
        let timestamp =
            NaiveDateTime::parse_from_str(&format!("{date}_{time}"), STAMP_FORMAT).ok()?;
        Some(ArtifactId {
            sequence,
            timestamp,
        })
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Identity and ordering key of one artifact.
///
/// Ordering is by `sequence` first; the timestamp only breaks ties between
/// legacy files that all carry sequence 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArtifactId {
    pub sequence: u64,
    pub timestamp: NaiveDateTime,
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{:06}",
            self.timestamp.format(STAMP_FORMAT),
            self.sequence
        )
    }
}

/// Wall-clock instant shared by every artifact one run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStamp(NaiveDateTime);

impl RunStamp {
    pub fn now() -> Self {
        Self::at(Local::now().naive_local())
    }

    /// Sub-second precision is dropped; file names only carry seconds.
    pub fn at(instant: NaiveDateTime) -> Self {
        Self(instant.with_nanosecond(0).unwrap_or(instant))
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.0
    }
}

/// A persisted artifact on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    pub kind: ArtifactKind,
    pub id: ArtifactId,
    pub path: PathBuf,
}

/// One inventory: the set of media paths seen by a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub id: ArtifactId,
    pub entries: BTreeSet<String>,
}

/// Paths present in `baseline_id` and absent from `current_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingSet {
    pub baseline_id: ArtifactId,
    pub current_id: ArtifactId,
    pub paths: BTreeSet<String>,
}

impl MissingSet {
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffOutcome {
    /// Fewer than two snapshots exist; nothing to compare.
    InsufficientHistory { available: usize },
    Compared(MissingSet),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn file_name_carries_stamp_and_sequence() {
        let id = ArtifactId {
            sequence: 3,
            timestamp: ts(5, 0, 0),
        };
        assert_eq!(
            ArtifactKind::MediaList.file_name(&id),
            "media_list_20260101_050000_000003.txt"
        );
        assert_eq!(
            ArtifactKind::MediaList.parse_file_name("media_list_20260101_050000_000003.txt"),
            Some(id)
        );
    }

    #[test]
    fn legacy_names_parse_as_sequence_zero() {
        let id = ArtifactKind::MissingMedia
            .parse_file_name("missing_media_20250301_120000.txt")
            .unwrap();
        assert_eq!(id.sequence, 0);
    }

    #[test]
    fn foreign_names_are_ignored() {
        let kind = ArtifactKind::MediaList;
        for name in [
            "notes.txt",
            "media_list_20260101.txt",
            "media_list_20260101_050000_abc.txt",
            "media_list_20260101_050000_000001.txt.tmp",
            "media_list_20261301_050000.txt",
            "missing_media_20260101_050000.txt",
        ] {
            assert_eq!(kind.parse_file_name(name), None, "{name}");
        }
    }

    #[test]
    fn sequence_dominates_timestamp() {
        let older_clock_newer_seq = ArtifactId {
            sequence: 2,
            timestamp: ts(4, 0, 0),
        };
        let newer_clock_older_seq = ArtifactId {
            sequence: 1,
            timestamp: ts(6, 0, 0),
        };
        assert!(older_clock_newer_seq > newer_clock_older_seq);
    }

    #[test]
    fn run_stamp_truncates_to_seconds() {
        let instant = ts(5, 0, 1).with_nanosecond(750_000_000).unwrap();
        assert_eq!(RunStamp::at(instant).timestamp(), ts(5, 0, 1));
    }
}
