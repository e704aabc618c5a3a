use thiserror::Error;

/// Errors that can occur while preparing or delivering a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Email settings are missing, malformed or still hold placeholders.
    #[error("Email configuration is incomplete or invalid: {0}")]
    InvalidConfig(String),

    /// The message could not be assembled.
    #[error("Failed to build message: {0}")]
    Build(String),

    /// The SMTP server refused the connection, the login or the message.
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// The send exceeded its time budget.
    #[error("Send timed out after {ms}ms")]
    Timeout { ms: u64 },
}

impl NotifyError {
    pub fn code(&self) -> &'static str {
        match self {
            NotifyError::InvalidConfig(_) => "NOTIFY_CONFIG_ERROR",
            NotifyError::Build(_) => "NOTIFY_BUILD_ERROR",
            NotifyError::SendFailed(_) => "NOTIFY_SEND_FAILED",
            NotifyError::Timeout { .. } => "NOTIFY_TIMEOUT",
        }
    }
}

pub type Result<T> = std::result::Result<T, NotifyError>;
