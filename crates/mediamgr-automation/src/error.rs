use mediamgr_core::MediaManagerError;
use mediamgr_inventory::InventoryError;
use mediamgr_scheduler::SchedulerError;
use thiserror::Error;

/// Process exit codes for each failure kind.
pub mod exit {
    pub const OK: i32 = 0;
    pub const FAILURE: i32 = 1;
    pub const IO: i32 = 3;
    pub const SCHEDULER: i32 = 4;
    pub const INSUFFICIENT_HISTORY: i32 = 5;
    pub const CONFIG: i32 = 6;
}

#[derive(Debug, Error)]
pub enum AutomationError {
    #[error(transparent)]
    Config(#[from] MediaManagerError),

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    /// A batch sync finished with failed jobs.
    #[error("{failed} of {total} scheduler operations failed")]
    SchedulePartial { failed: usize, total: usize },

    /// A blocking worker panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Task(String),
}

impl AutomationError {
    pub fn code(&self) -> &'static str {
        match self {
            AutomationError::Config(e) => e.code(),
            AutomationError::Inventory(e) => e.code(),
            AutomationError::Scheduler(e) => e.code(),
            AutomationError::SchedulePartial { .. } => "SCHEDULER_PARTIAL",
            AutomationError::Task(_) => "TASK_FAILED",
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            AutomationError::Config(MediaManagerError::Io(_)) => exit::IO,
            AutomationError::Config(_) => exit::CONFIG,
            AutomationError::Inventory(InventoryError::InvalidRetention(_)) => exit::CONFIG,
            AutomationError::Inventory(_) => exit::IO,
            AutomationError::Scheduler(_) | AutomationError::SchedulePartial { .. } => {
                exit::SCHEDULER
            }
            AutomationError::Task(_) => exit::FAILURE,
        }
    }
}

pub type Result<T> = std::result::Result<T, AutomationError>;
