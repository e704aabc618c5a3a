use mediamgr_core::MediaManagerError;
use thiserror::Error;

/// Errors that can occur while talking to an OS scheduler.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The OS refused the change without elevated rights.
    #[error("Elevated privileges required to modify {job}: {detail}")]
    Privilege { job: String, detail: String },

    /// An external scheduler command did not finish in time. The child was killed.
    #[error("{program} timed out after {ms}ms")]
    Timeout { program: String, ms: u64 },

    /// An external scheduler command exited unsuccessfully.
    #[error("{program} failed ({status}): {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },

    /// No usable scheduler on this host.
    #[error("Scheduler unavailable: {0}")]
    Unavailable(String),

    /// The external command could not be started.
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The job definition cannot be expressed by the backend.
    #[error("Invalid job: {0}")]
    InvalidSpec(String),
}

impl SchedulerError {
    pub fn code(&self) -> &'static str {
        match self {
            SchedulerError::Privilege { .. } => "SCHEDULER_PRIVILEGE",
            SchedulerError::Timeout { .. } => "SCHEDULER_TIMEOUT",
            SchedulerError::CommandFailed { .. } => "SCHEDULER_COMMAND_FAILED",
            SchedulerError::Unavailable(_) => "SCHEDULER_UNAVAILABLE",
            SchedulerError::Spawn { .. } => "SCHEDULER_SPAWN",
            SchedulerError::InvalidSpec(_) => "SCHEDULER_INVALID_SPEC",
        }
    }
}

impl From<MediaManagerError> for SchedulerError {
    fn from(e: MediaManagerError) -> Self {
        SchedulerError::InvalidSpec(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
