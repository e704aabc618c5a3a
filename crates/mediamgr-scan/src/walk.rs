use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::ScanError;

/// Result of walking every scan root.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Absolute paths of matching files.
    pub paths: BTreeSet<String>,
    /// Roots or subdirectories that could not be read.
    pub skipped: Vec<ScanError>,
}

impl ScanOutcome {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Recursively collect files under `roots` whose names end with one of
/// `extensions` (lowercase, leading dot).
///
/// Hidden directories below a root are not descended into. Symlinked
/// directories are not followed; symlinks to files count as present. A root that is missing or unreadable is recorded in
/// [`ScanOutcome::skipped`] and the remaining roots are still scanned.
pub fn scan<P: AsRef<Path>>(roots: &[P], extensions: &[String]) -> ScanOutcome {
    let mut outcome = ScanOutcome::default();

    for root in roots {
        let root = absolute(root.as_ref());
        if !root.exists() {
            warn!(path = %root.display(), "Scan directory does not exist");
            outcome.skipped.push(ScanError::NotFound(root));
            continue;
        }
        if !root.is_dir() {
            warn!(path = %root.display(), "Scan path is not a directory");
            outcome.skipped.push(ScanError::NotADirectory(root));
            continue;
        }

        let before = outcome.paths.len();
        let walker = WalkDir::new(&root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden_dir(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
                    warn!(path = %path.display(), error = %e, "Skipping unreadable entry");
                    outcome.skipped.push(ScanError::Unreadable {
                        path,
                        message: e.to_string(),
                    });
                    continue;
                }
            };
            if !is_media_file(&entry) || !has_extension(&entry, extensions) {
                continue;
            }
            match entry.path().to_str() {
                Some(p) => {
                    outcome.paths.insert(p.to_string());
                }
                None => warn!(path = %entry.path().display(), "Skipping non-UTF-8 path"),
            }
        }
        debug!(path = %root.display(), count = outcome.paths.len() - before, "Root scanned");
    }

    info!(
        count = outcome.paths.len(),
        skipped = outcome.skipped.len(),
        "Scan complete"
    );
    outcome
}

fn is_hidden_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|n| n.starts_with('.'))
            .unwrap_or(false)
}

/// Regular files, and symlinks whose target is a regular file. Symlinked
/// directories are listed but never descended into.
fn is_media_file(entry: &DirEntry) -> bool {
    if entry.file_type().is_file() {
        return true;
    }
    entry.path_is_symlink()
        && std::fs::metadata(entry.path())
            .map(|m| m.is_file())
            .unwrap_or(false)
}

fn has_extension(entry: &DirEntry, extensions: &[String]) -> bool {
    let name = entry.file_name().to_string_lossy().to_lowercase();
    extensions.iter().any(|ext| name.ends_with(ext.as_str()))
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn exts() -> Vec<String> {
        vec![".mp4".into(), ".mkv".into(), ".avi".into()]
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn finds_matching_files_recursively() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        touch(&root.join("a.mp4"));
        touch(&root.join("shows/s01/e01.MKV"));
        touch(&root.join("notes.txt"));

        let outcome = scan(&[root], &exts());
        assert!(outcome.is_complete());
        assert_eq!(outcome.paths.len(), 2);
        assert!(outcome
            .paths
            .contains(root.join("shows/s01/e01.MKV").to_str().unwrap()));
    }

    #[test]
    fn prunes_hidden_directories_but_not_hidden_files() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        touch(&root.join(".trash/old.mp4"));
        touch(&root.join(".hidden.mp4"));

        let outcome = scan(&[root], &exts());
        let found: Vec<_> = outcome.paths.iter().cloned().collect();
        assert_eq!(found, vec![root.join(".hidden.mp4").to_string_lossy().into_owned()]);
    }

    #[test]
    fn hidden_root_is_still_scanned() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join(".media");
        touch(&root.join("a.avi"));

        assert_eq!(scan(&[&root], &exts()).paths.len(), 1);
    }

    #[test]
    fn missing_root_is_skipped_and_others_continue() {
        let tmp = tempfile::tempdir().unwrap();
        let good = tmp.path().join("good");
        touch(&good.join("a.mp4"));
        let gone = tmp.path().join("gone");

        let outcome = scan(&[&gone, &good], &exts());
        assert_eq!(outcome.paths.len(), 1);
        assert_eq!(outcome.skipped.len(), 1);
        assert!(matches!(&outcome.skipped[0], ScanError::NotFound(p) if p == &gone));
    }

    #[test]
    fn file_root_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("a.mp4");
        touch(&file);
        let outcome = scan(&[&file], &exts());
        assert!(outcome.paths.is_empty());
        assert_eq!(outcome.skipped[0].code(), "SCAN_NOT_A_DIRECTORY");
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_files_are_listed_but_linked_dirs_are_not_walked() {
        use std::os::unix::fs::symlink;

        let tmp = tempfile::tempdir().unwrap();
        let store = tmp.path().join("store");
        let lib = tmp.path().join("lib");
        touch(&store.join("real.mkv"));
        touch(&store.join("nested/deep.mkv"));
        touch(&lib.join("plain.mkv"));
        symlink(store.join("real.mkv"), lib.join("Movie.mkv")).unwrap();
        symlink(store.join("nested"), lib.join("linked")).unwrap();
        symlink(tmp.path().join("nowhere.mkv"), lib.join("dangling.mkv")).unwrap();

        let outcome = scan(&[&lib], &exts());
        let found: Vec<_> = outcome.paths.iter().cloned().collect();
        assert_eq!(
            found,
            vec![
                lib.join("Movie.mkv").to_string_lossy().into_owned(),
                lib.join("plain.mkv").to_string_lossy().into_owned(),
            ]
        );
    }
}
