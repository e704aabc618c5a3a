use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the snapshot store and the retention manager.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Reading or writing an artifact failed.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A retention count of zero or less would delete every snapshot.
    #[error("Invalid retention count {0}: must be at least 1")]
    InvalidRetention(i64),

    /// Concurrent writers kept taking the next sequence number.
    #[error("No free artifact name in {} after {attempts} attempts", dir.display())]
    NameExhausted { dir: PathBuf, attempts: u32 },
}

impl InventoryError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| InventoryError::Io { path, source }
    }

    pub fn code(&self) -> &'static str {
        match self {
            InventoryError::Io { .. } => "IO_ERROR",
            InventoryError::InvalidRetention(_) => "CONFIG_ERROR",
            InventoryError::NameExhausted { .. } => "IO_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, InventoryError>;
