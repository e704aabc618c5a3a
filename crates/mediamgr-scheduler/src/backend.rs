use std::collections::BTreeSet;

use async_trait::async_trait;
use mediamgr_core::ScheduledTaskSpec;

use crate::error::{Result, SchedulerError};
use crate::sync::{JobAction, JobOutcome, SyncReport};

/// A job found in the OS scheduler carrying our marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedJob {
    pub name: String,
    /// Backend-specific trigger description (cron fields, next run time).
    pub schedule: String,
}

/// Existing job text that carries our marker but could not be understood.
/// Such entries are reported and never modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIssue {
    pub entry: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobListing {
    pub jobs: Vec<ManagedJob>,
    pub issues: Vec<ParseIssue>,
}

impl JobListing {
    pub fn names(&self) -> BTreeSet<String> {
        self.jobs.iter().map(|j| j.name.clone()).collect()
    }
}

/// One OS-level scheduler. Selected once at startup; see
/// [`detect_backend`](crate::platform::detect_backend).
///
/// Only jobs whose name carries the `MediaManager_` marker are ever listed,
/// replaced or removed.
#[async_trait]
pub trait SchedulerBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn list_managed_jobs(&self) -> Result<JobListing>;

    /// Create or replace the job named `spec.name`.
    async fn install(&self, spec: &ScheduledTaskSpec) -> Result<()>;

    /// Delete the job named `name`. Absent jobs are not an error.
    async fn remove(&self, name: &str) -> Result<()>;

    /// Delete every managed job, attempting each even if one fails.
    async fn remove_all_managed(&self) -> Result<SyncReport> {
        let listing = self.list_managed_jobs().await?;
        let mut report = SyncReport {
            issues: listing.issues,
            ..SyncReport::default()
        };
        for job in listing.jobs {
            let result = self.remove(&job.name).await;
            report.outcomes.push(JobOutcome::new(job.name, JobAction::Removed, result));
        }
        Ok(report)
    }
}

pub(crate) fn ensure_single_line(spec: &ScheduledTaskSpec) -> Result<()> {
    if spec.command.contains(['\n', '\r']) {
        return Err(SchedulerError::InvalidSpec(format!(
            "command for {} spans multiple lines",
            spec.name
        )));
    }
    if spec.command.trim().is_empty() {
        return Err(SchedulerError::InvalidSpec(format!(
            "command for {} is empty",
            spec.name
        )));
    }
    Ok(())
}
