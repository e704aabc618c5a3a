use std::path::PathBuf;

use thiserror::Error;

/// A directory that could not be scanned. Recorded in
/// [`ScanOutcome::skipped`](crate::ScanOutcome); never aborts a scan.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Scan directory does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Unreadable: {}: {message}", path.display())]
    Unreadable { path: PathBuf, message: String },
}

impl ScanError {
    pub fn code(&self) -> &'static str {
        match self {
            ScanError::NotFound(_) => "SCAN_NOT_FOUND",
            ScanError::NotADirectory(_) => "SCAN_NOT_A_DIRECTORY",
            ScanError::Unreadable { .. } => "SCAN_IO_ERROR",
        }
    }
}
