//! `mediamgr-core`: configuration, shared domain types and errors used by
//! every other `mediamgr` crate.

pub mod config;
pub mod error;
pub mod secret;
pub mod types;
pub mod update;

pub use config::MediaManagerConfig;
pub use error::{MediaManagerError, Result};
pub use secret::Secret;
pub use types::{Frequency, ScheduledTaskSpec, TaskKind, TimeOfDay, JOB_PREFIX};
