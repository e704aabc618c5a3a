use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaManagerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid time of day '{value}': expected HH:MM (24-hour)")]
    InvalidTime { value: String },

    #[error("Invalid job name '{name}': {reason}")]
    InvalidJobName { name: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaManagerError {
    /// Short, stable error code used in logs and CLI output.
    pub fn code(&self) -> &'static str {
        match self {
            MediaManagerError::Config(_) => "CONFIG_ERROR",
            MediaManagerError::InvalidTime { .. } => "INVALID_TIME",
            MediaManagerError::InvalidJobName { .. } => "INVALID_JOB_NAME",
            MediaManagerError::Serialization(_) => "SERIALIZATION_ERROR",
            MediaManagerError::Io(_) => "IO_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, MediaManagerError>;
