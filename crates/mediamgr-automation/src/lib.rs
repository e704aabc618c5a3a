//! `mediamgr-automation`: runs the watchdog tasks and keeps the OS schedule
//! in line with the task configuration.
//!
//! The complete check runs, in order and under one run stamp:
//! scan → snapshot write → diff → notify if missing → retention →
//! filename report.

pub mod error;
pub mod orchestrator;
pub mod plan;
pub mod schedule;

pub use error::{AutomationError, Result};
pub use orchestrator::{
    CheckMissingReport, CompleteReport, FilenameCheckReport, GenerateReport, NotificationStatus,
    Orchestrator,
};
pub use plan::{plan, Launcher};
pub use schedule::{apply_schedule, remove_schedule, test_task_creation, AppliedSchedule};
