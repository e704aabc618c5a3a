//! Filesystem collaborators: the media scanner and the Windows filename
//! compatibility checker.

pub mod error;
pub mod filenames;
pub mod walk;

pub use error::ScanError;
pub use filenames::{check, FilenameIssue, FilenameReport};
pub use walk::{scan, ScanOutcome};
