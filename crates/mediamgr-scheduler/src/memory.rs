use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use async_trait::async_trait;
use mediamgr_core::types::validate_job_name;
use mediamgr_core::ScheduledTaskSpec;

use crate::backend::{JobListing, ManagedJob, SchedulerBackend};
use crate::error::{Result, SchedulerError};

/// In-process scheduler. Backs `schedule apply --dry-run` and tests.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    jobs: Mutex<BTreeMap<String, ScheduledTaskSpec>>,
    denied: Mutex<BTreeSet<String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with jobs already present, as if read from a real scheduler.
    pub fn with_jobs(jobs: impl IntoIterator<Item = ScheduledTaskSpec>) -> Self {
        let backend = Self::default();
        backend
            .lock_jobs()
            .extend(jobs.into_iter().map(|j| (j.name.clone(), j)));
        backend
    }

    /// Make every change to `name` fail with a privilege error.
    pub fn deny(&self, name: &str) {
        self.denied
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.to_string());
    }

    pub fn get(&self, name: &str) -> Option<ScheduledTaskSpec> {
        self.lock_jobs().get(name).cloned()
    }

    fn lock_jobs(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, ScheduledTaskSpec>> {
        self.jobs.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_allowed(&self, name: &str) -> Result<()> {
        if self.denied.lock().unwrap_or_else(|e| e.into_inner()).contains(name) {
            return Err(SchedulerError::Privilege {
                job: name.to_string(),
                detail: "denied by test fixture".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SchedulerBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn list_managed_jobs(&self) -> Result<JobListing> {
        let jobs = self
            .lock_jobs()
            .values()
            .filter(|j| validate_job_name(&j.name).is_ok())
            .map(|j| ManagedJob {
                name: j.name.clone(),
                schedule: format!("{} at {}", j.frequency, j.time),
            })
            .collect();
        Ok(JobListing {
            jobs,
            issues: Vec::new(),
        })
    }

    async fn install(&self, spec: &ScheduledTaskSpec) -> Result<()> {
        spec.validate()?;
        self.check_allowed(&spec.name)?;
        self.lock_jobs().insert(spec.name.clone(), spec.clone());
        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<()> {
        validate_job_name(name)?;
        self.check_allowed(name)?;
        self.lock_jobs().remove(name);
        Ok(())
    }
}
