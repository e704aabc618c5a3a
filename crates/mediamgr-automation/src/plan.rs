use std::path::{Path, PathBuf};

use mediamgr_core::config::AutomationConfig;
use mediamgr_core::{MediaManagerError, ScheduledTaskSpec, TaskKind};

/// How scheduled jobs invoke this program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launcher {
    pub executable: PathBuf,
    pub config_path: PathBuf,
}

impl Launcher {
    pub fn new(executable: impl Into<PathBuf>, config_path: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            config_path: config_path.into(),
        }
    }

    /// The running binary, pointed at `config_path`.
    pub fn current(config_path: &Path) -> Result<Self, MediaManagerError> {
        let exe = std::env::current_exe()?;
        let config = std::path::absolute(config_path)?;
        Ok(Self::new(exe, config))
    }

    /// `"<exe>" --config "<config>" <subcommand>`
    pub fn command(&self, subcommand: &str) -> String {
        format!(
            "\"{}\" --config \"{}\" {}",
            self.executable.display(),
            self.config_path.display(),
            subcommand
        )
    }

    pub fn task_command(&self, kind: TaskKind) -> String {
        self.command(kind.subcommand())
    }
}

/// Desired OS jobs for `automation`.
///
/// A disabled automation section plans nothing, so a sync removes every
/// managed job. An enabled complete check plans only itself: the individual
/// tasks it subsumes are never scheduled alongside it.
pub fn plan(automation: &AutomationConfig, launcher: &Launcher) -> Vec<ScheduledTaskSpec> {
    if !automation.enabled {
        return Vec::new();
    }

    let spec = |kind: TaskKind| {
        let task = automation.tasks.get(kind);
        ScheduledTaskSpec {
            name: kind.job_name(),
            command: launcher.task_command(kind),
            frequency: task.frequency(),
            time: task.time,
            enabled: true,
        }
    };

    if automation.tasks.get(TaskKind::CompleteCheck).enabled {
        return vec![spec(TaskKind::CompleteCheck)];
    }

    TaskKind::INDIVIDUAL
        .into_iter()
        .filter(|kind| automation.tasks.get(*kind).enabled)
        .map(spec)
        .collect()
}
