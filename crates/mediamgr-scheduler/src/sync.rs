use std::collections::BTreeSet;
use std::fmt;

use mediamgr_core::{Frequency, ScheduledTaskSpec, TimeOfDay};
use tracing::{info, warn};

use crate::backend::{ParseIssue, SchedulerBackend};
use crate::error::{Result, SchedulerError};

/// Throwaway job used by [`self_test`].
pub const SELF_TEST_JOB: &str = "MediaManager_SelfTest";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobAction {
    Installed,
    Removed,
}

impl fmt::Display for JobAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobAction::Installed => write!(f, "install"),
            JobAction::Removed => write!(f, "remove"),
        }
    }
}

/// What happened to one job during a batch.
#[derive(Debug)]
pub struct JobOutcome {
    pub name: String,
    pub action: JobAction,
    pub result: Result<()>,
}

impl JobOutcome {
    pub fn new(name: impl Into<String>, action: JobAction, result: Result<()>) -> Self {
        Self {
            name: name.into(),
            action,
            result,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Aggregate result of a batch: every job attempted, every outcome listed.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub outcomes: Vec<JobOutcome>,
    /// Marker-bearing entries that were left untouched.
    pub issues: Vec<ParseIssue>,
    /// Set when existing jobs could not be enumerated, so orphans were not removed.
    pub list_error: Option<SchedulerError>,
}

impl SyncReport {
    pub fn is_success(&self) -> bool {
        self.list_error.is_none() && self.outcomes.iter().all(JobOutcome::is_ok)
    }

    pub fn failures(&self) -> impl Iterator<Item = &JobOutcome> {
        self.outcomes.iter().filter(|o| !o.is_ok())
    }
}

/// Make the managed jobs match `specs`.
///
/// Every enabled spec is installed and every managed job not named by an
/// enabled spec is removed. Jobs without the marker are never touched, and a
/// failure on one job does not stop the others.
pub async fn sync(backend: &dyn SchedulerBackend, specs: &[ScheduledTaskSpec]) -> SyncReport {
    let mut report = SyncReport::default();

    let existing = match backend.list_managed_jobs().await {
        Ok(listing) => {
            report.issues = listing.issues.clone();
            Some(listing.names())
        }
        Err(e) => {
            warn!(backend = backend.name(), error = %e, "Could not list managed jobs");
            report.list_error = Some(e);
            None
        }
    };

    let desired: BTreeSet<&str> = specs
        .iter()
        .filter(|s| s.enabled)
        .map(|s| s.name.as_str())
        .collect();

    for spec in specs.iter().filter(|s| s.enabled) {
        let result = backend.install(spec).await;
        if let Err(e) = &result {
            warn!(job = %spec.name, error = %e, "Install failed");
        }
        report
            .outcomes
            .push(JobOutcome::new(&spec.name, JobAction::Installed, result));
    }

    for name in existing.iter().flatten() {
        if desired.contains(name.as_str()) {
            continue;
        }
        let result = backend.remove(name).await;
        if let Err(e) = &result {
            warn!(job = %name, error = %e, "Remove failed");
        }
        report
            .outcomes
            .push(JobOutcome::new(name, JobAction::Removed, result));
    }

    info!(
        backend = backend.name(),
        jobs = report.outcomes.len(),
        failed = report.failures().count(),
        "Schedule sync finished"
    );
    report
}

/// Result of [`self_test`]; both steps are always attempted.
#[derive(Debug)]
pub struct SelfTestReport {
    pub backend: &'static str,
    pub install: Result<()>,
    pub remove: Result<()>,
}

impl SelfTestReport {
    pub fn is_success(&self) -> bool {
        self.install.is_ok() && self.remove.is_ok()
    }
}

/// Install then remove [`SELF_TEST_JOB`] running `command`.
///
/// Removal is attempted even when the install failed, so a partially
/// created job is not left behind.
pub async fn self_test(backend: &dyn SchedulerBackend, command: &str) -> SelfTestReport {
    let spec = ScheduledTaskSpec {
        name: SELF_TEST_JOB.to_string(),
        command: command.to_string(),
        frequency: Frequency::Daily,
        time: TimeOfDay::default(),
        enabled: true,
    };
    let install = backend.install(&spec).await;
    let remove = backend.remove(SELF_TEST_JOB).await;
    info!(
        backend = backend.name(),
        install_ok = install.is_ok(),
        remove_ok = remove.is_ok(),
        "Scheduler self-test finished"
    );
    SelfTestReport {
        backend: backend.name(),
        install,
        remove,
    }
}
