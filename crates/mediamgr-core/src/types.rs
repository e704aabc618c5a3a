use std::fmt;
use std::str::FromStr;

use chrono::Weekday;
use serde::Deserialize;

use crate::error::{MediaManagerError, Result};

/// Name prefix carried by every OS-level job this system owns.
pub const JOB_PREFIX: &str = "MediaManager_";

// ---------------------------------------------------------------------------
// TimeOfDay
// ---------------------------------------------------------------------------

/// Wall-clock trigger time in 24-hour `HH:MM`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Result<Self> {
        if hour > 23 || minute > 59 {
            return Err(MediaManagerError::InvalidTime {
                value: format!("{hour}:{minute}"),
            });
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }
}

impl FromStr for TimeOfDay {
    type Err = MediaManagerError;

    /// Accepts `H:MM` or `HH:MM`; the minute is always two digits.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || MediaManagerError::InvalidTime {
            value: s.to_string(),
        };
        let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;
        let digits = |p: &str| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit());
        if !digits(h) || h.len() > 2 || !digits(m) || m.len() != 2 {
            return Err(invalid());
        }
        let hour: u8 = h.parse().map_err(|_| invalid())?;
        let minute: u8 = m.parse().map_err(|_| invalid())?;
        Self::new(hour, minute).map_err(|_| invalid())
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = MediaManagerError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

// ---------------------------------------------------------------------------
// Frequency
// ---------------------------------------------------------------------------

/// How often a scheduled job fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    Weekly(Weekday),
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::Daily => write!(f, "daily"),
            Frequency::Weekly(day) => write!(f, "weekly ({day})"),
        }
    }
}

// ---------------------------------------------------------------------------
// TaskKind
// ---------------------------------------------------------------------------

/// The operations the orchestrator can run, scheduled or on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskKind {
    GenerateList,
    CheckMissing,
    ManageRetention,
    CheckFilenames,
    CompleteCheck,
}

impl TaskKind {
    /// Individually schedulable steps, in pipeline order.
    pub const INDIVIDUAL: [TaskKind; 4] = [
        TaskKind::GenerateList,
        TaskKind::CheckMissing,
        TaskKind::ManageRetention,
        TaskKind::CheckFilenames,
    ];

    /// Key used in the `automation.tasks` configuration table.
    pub fn task_id(&self) -> &'static str {
        match self {
            TaskKind::GenerateList => "generate_media_list",
            TaskKind::CheckMissing => "check_missing_media",
            TaskKind::ManageRetention => "manage_file_retention",
            TaskKind::CheckFilenames => "check_windows_filenames",
            TaskKind::CompleteCheck => "complete_check",
        }
    }

    /// CLI subcommand that runs this task.
    pub fn subcommand(&self) -> &'static str {
        match self {
            TaskKind::GenerateList => "generate-list",
            TaskKind::CheckMissing => "check-missing",
            TaskKind::ManageRetention => "manage-retention",
            TaskKind::CheckFilenames => "check-filenames",
            TaskKind::CompleteCheck => "complete-check",
        }
    }

    /// Stable job name used as the scheduler identity key.
    pub fn job_name(&self) -> String {
        match self {
            TaskKind::CompleteCheck => format!("{JOB_PREFIX}CompleteCheck"),
            other => format!("{JOB_PREFIX}{}", other.task_id()),
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.task_id())
    }
}

// ---------------------------------------------------------------------------
// ScheduledTaskSpec
// ---------------------------------------------------------------------------

/// Desired state of one recurring OS-level job. `name` is the identity key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTaskSpec {
    pub name: String,
    /// Full command line the OS scheduler executes.
    pub command: String,
    pub frequency: Frequency,
    pub time: TimeOfDay,
    pub enabled: bool,
}

impl ScheduledTaskSpec {
    /// Check the name is a managed, marker-safe identifier.
    pub fn validate(&self) -> Result<()> {
        validate_job_name(&self.name)
    }
}

/// Managed job names carry [`JOB_PREFIX`] and must survive being embedded in
/// a crontab comment or a task-store identifier unchanged.
pub fn validate_job_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| MediaManagerError::InvalidJobName {
        name: name.to_string(),
        reason: reason.to_string(),
    };
    if !name.starts_with(JOB_PREFIX) {
        return Err(invalid("must start with MediaManager_"));
    }
    if name.len() == JOB_PREFIX.len() {
        return Err(invalid("missing suffix after prefix"));
    }
    if name
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '#' | '\\' | '/' | '"'))
    {
        return Err(invalid("contains whitespace or reserved characters"));
    }
    Ok(())
}
