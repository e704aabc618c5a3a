use mediamgr_core::config::AutomationConfig;
use mediamgr_core::ScheduledTaskSpec;
use mediamgr_scheduler::{self_test, sync, SchedulerBackend, SelfTestReport, SyncReport};
use tracing::info;

use crate::error::{AutomationError, Result};
use crate::plan::{plan, Launcher};

#[derive(Debug)]
pub struct AppliedSchedule {
    pub planned: Vec<ScheduledTaskSpec>,
    pub report: SyncReport,
}

impl AppliedSchedule {
    /// `Err` when any job operation failed or existing jobs could not be listed.
    pub fn into_result(self) -> Result<Self> {
        if self.report.is_success() {
            return Ok(self);
        }
        let failed = self.report.failures().count()
            + usize::from(self.report.list_error.is_some());
        Err(AutomationError::SchedulePartial {
            failed,
            total: self.report.outcomes.len() + usize::from(self.report.list_error.is_some()),
        })
    }
}

/// Bring the OS schedule in line with `automation`.
pub async fn apply_schedule(
    backend: &dyn SchedulerBackend,
    automation: &AutomationConfig,
    launcher: &Launcher,
) -> AppliedSchedule {
    let planned = plan(automation, launcher);
    info!(
        backend = backend.name(),
        jobs = planned.len(),
        "Applying schedule"
    );
    let report = sync(backend, &planned).await;
    AppliedSchedule { planned, report }
}

/// Delete every managed job.
pub async fn remove_schedule(backend: &dyn SchedulerBackend) -> Result<SyncReport> {
    Ok(backend.remove_all_managed().await?)
}

/// Install and immediately remove a throwaway job to prove the backend works
/// here, leaving no job behind.
pub async fn test_task_creation(backend: &dyn SchedulerBackend, launcher: &Launcher) -> SelfTestReport {
    self_test(backend, &launcher.command("test")).await
}
