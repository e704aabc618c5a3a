//! `mediamgr-scheduler`: keeps OS-level recurring jobs in line with the
//! desired task configuration.
//!
//! # Backends
//!
//! | Backend    | Host            | Job identity                              |
//! |------------|-----------------|-------------------------------------------|
//! | `cron`     | Linux, macOS    | trailing `# MediaManager:<name>` comment  |
//! | `schtasks` | Windows         | task name `MediaManager_<suffix>`         |
//! | `memory`   | any (dry runs)  | in-process map                            |
//!
//! All external commands go through a [`CommandRunner`] with a bounded
//! timeout; a timeout surfaces as [`SchedulerError::Timeout`].

pub mod backend;
pub mod command;
pub mod cron;
pub mod error;
pub mod memory;
pub mod platform;
pub mod schedule;
pub mod schtasks;
pub mod sync;

pub use backend::{JobListing, ManagedJob, ParseIssue, SchedulerBackend};
pub use command::{CommandOutput, CommandRunner, SystemRunner};
pub use cron::CronBackend;
pub use error::{Result, SchedulerError};
pub use memory::MemoryBackend;
pub use platform::detect_backend;
pub use schedule::next_fire;
pub use schtasks::SchtasksBackend;
pub use sync::{self_test, sync, JobAction, JobOutcome, SelfTestReport, SyncReport, SELF_TEST_JOB};
