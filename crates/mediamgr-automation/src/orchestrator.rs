use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use mediamgr_core::MediaManagerConfig;
use mediamgr_inventory::report::write_missing_report;
use mediamgr_inventory::{
    compute_missing, enforce, ArtifactKind, ArtifactRef, ArtifactStore, DiffOutcome, MissingSet,
    RetentionPolicy, RetentionReport, RunStamp,
};
use mediamgr_notify::{missing_media_notification, EmailSettings, Notifier, SmtpNotifier};
use mediamgr_scan::{scan, ScanOutcome};
use tracing::{error, info, warn};

use crate::error::{AutomationError, Result};

/// A new snapshot and what the scan could not reach.
#[derive(Debug, Clone)]
pub struct GenerateReport {
    pub artifact: ArtifactRef,
    pub count: usize,
    /// Human-readable reasons for each skipped directory.
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationStatus {
    /// Nothing was missing.
    NotNeeded,
    /// Email is disabled or its settings are invalid.
    Skipped(String),
    Sent,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct CheckMissingReport {
    pub outcome: DiffOutcome,
    pub report: Option<ArtifactRef>,
    pub notification: NotificationStatus,
}

impl CheckMissingReport {
    pub fn missing_count(&self) -> usize {
        match &self.outcome {
            DiffOutcome::Compared(m) => m.len(),
            DiffOutcome::InsufficientHistory { .. } => 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilenameCheckReport {
    pub checked: usize,
    pub with_issues: usize,
    /// Written only when at least one path has issues.
    pub report: Option<ArtifactRef>,
}

/// Every step of a complete check. Only the snapshot step aborts the run;
/// later steps record their failure and the pipeline moves on.
#[derive(Debug)]
pub struct CompleteReport {
    pub stamp: RunStamp,
    pub snapshot: GenerateReport,
    pub missing: Result<CheckMissingReport>,
    pub retention: Result<Vec<RetentionReport>>,
    pub filenames: Result<FilenameCheckReport>,
}

impl CompleteReport {
    pub fn is_success(&self) -> bool {
        self.first_error().is_none()
    }

    pub fn first_error(&self) -> Option<&AutomationError> {
        [
            self.missing.as_ref().err(),
            self.retention.as_ref().err(),
            self.filenames.as_ref().err(),
        ]
        .into_iter()
        .flatten()
        .next()
    }
}

/// Runs watchdog tasks against one explicit configuration.
pub struct Orchestrator {
    config: MediaManagerConfig,
    store: ArtifactStore,
    retention: RetentionPolicy,
    notifier: Option<Arc<dyn Notifier>>,
    notifier_skip_reason: String,
}

impl Orchestrator {
    /// Validate `config` and set up the SMTP notifier when email is enabled.
    ///
    /// Invalid email settings do not fail construction: detection still
    /// works, alerts are skipped and the reason is logged.
    pub fn new(config: MediaManagerConfig) -> Result<Self> {
        config.validate()?;
        let retention = RetentionPolicy::new(config.file_retention_count)?;
        let store = ArtifactStore::new(config.output_directory.clone());

        let (notifier, notifier_skip_reason): (Option<Arc<dyn Notifier>>, String) =
            if !config.email.enabled {
                (None, "email notifications are disabled".to_string())
            } else {
                match EmailSettings::from_config(&config.email) {
                    Ok(settings) => {
                        let smtp: Arc<dyn Notifier> = Arc::new(SmtpNotifier::new(settings));
                        (Some(smtp), String::new())
                    }
                    Err(e) => {
                        warn!(error = %e, "Email notifications unavailable");
                        (None, e.to_string())
                    }
                }
            };

        Ok(Self {
            config,
            store,
            retention,
            notifier,
            notifier_skip_reason,
        })
    }

    /// Replace the notifier, e.g. with a recording one in tests.
    pub fn with_notifier(mut self, notifier: Option<Arc<dyn Notifier>>) -> Self {
        if notifier.is_none() {
            self.notifier_skip_reason = "no notifier configured".to_string();
        }
        self.notifier = notifier;
        self
    }

    pub fn config(&self) -> &MediaManagerConfig {
        &self.config
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    async fn scan(&self) -> Result<ScanOutcome> {
        self.config.ensure_scan_directories()?;
        let roots: Vec<PathBuf> = self.config.scan_directories.clone();
        let extensions = self.config.extensions();
        tokio::task::spawn_blocking(move || scan(&roots, &extensions))
            .await
            .map_err(|e| AutomationError::Task(e.to_string()))
    }

    /// Scan the library and persist a new snapshot.
    pub async fn generate_list(&self, stamp: RunStamp) -> Result<GenerateReport> {
        Ok(self.generate_with_entries(stamp).await?.0)
    }

    async fn generate_with_entries(&self, stamp: RunStamp) -> Result<(GenerateReport, BTreeSet<String>)> {
        let outcome = self.scan().await?;
        if outcome.paths.is_empty() && !outcome.skipped.is_empty() {
            warn!("No scan directory was readable; writing an empty snapshot");
        }
        let store = self.store.clone();
        let paths = outcome.paths;
        let (artifact, paths) = tokio::task::spawn_blocking(move || {
            store
                .write_lines(ArtifactKind::MediaList, stamp, &paths)
                .map(|a| (a, paths))
        })
        .await
        .map_err(|e| AutomationError::Task(e.to_string()))??;

        info!(count = paths.len(), path = %artifact.path.display(), "Media list written");
        let report = GenerateReport {
            artifact,
            count: paths.len(),
            skipped: outcome.skipped.iter().map(ToString::to_string).collect(),
        };
        Ok((report, paths))
    }

    /// Compare the two newest snapshots, write the missing report and alert.
    ///
    /// Fewer than two snapshots is reported as
    /// [`DiffOutcome::InsufficientHistory`], not as an error.
    pub async fn check_missing(&self, stamp: RunStamp) -> Result<CheckMissingReport> {
        let snapshots = self.store.recent_snapshots(2)?;
        let outcome = compute_missing(&snapshots);

        let missing = match &outcome {
            DiffOutcome::InsufficientHistory { available } => {
                info!(available, "Not enough media lists to compare");
                return Ok(CheckMissingReport {
                    outcome,
                    report: None,
                    notification: NotificationStatus::NotNeeded,
                });
            }
            DiffOutcome::Compared(missing) => missing,
        };

        if missing.is_empty() {
            info!("No missing media");
            return Ok(CheckMissingReport {
                outcome,
                report: None,
                notification: NotificationStatus::NotNeeded,
            });
        }

        warn!(count = missing.len(), "Missing media detected");
        let report = write_missing_report(&self.store, stamp, missing)?;
        let notification = self.notify(missing).await;
        Ok(CheckMissingReport {
            outcome,
            report,
            notification,
        })
    }

    async fn notify(&self, missing: &MissingSet) -> NotificationStatus {
        let Some(notifier) = &self.notifier else {
            info!(reason = %self.notifier_skip_reason, "Skipping missing-media email");
            return NotificationStatus::Skipped(self.notifier_skip_reason.clone());
        };
        match notifier.send(&missing_media_notification(missing)).await {
            Ok(()) => NotificationStatus::Sent,
            Err(e) => {
                // Detection succeeded; a failed alert does not fail the run.
                error!(notifier = notifier.name(), error = %e, "Missing-media notification failed");
                NotificationStatus::Failed(e.to_string())
            }
        }
    }

    /// Apply the retention cap to every artifact kind independently.
    pub fn manage_retention(&self) -> Result<Vec<RetentionReport>> {
        let mut reports = Vec::with_capacity(ArtifactKind::ALL.len());
        for kind in ArtifactKind::ALL {
            let report = enforce(&self.store, kind, self.retention)?;
            if report.is_partial_failure() {
                warn!(kind = %kind, failed = report.failures.len(), "Some artifacts could not be deleted");
            }
            reports.push(report);
        }
        Ok(reports)
    }

    /// Check the newest snapshot for Windows naming problems. Without a
    /// snapshot the library is scanned directly.
    pub async fn check_filenames(&self, stamp: RunStamp) -> Result<FilenameCheckReport> {
        let paths = match self.store.latest(ArtifactKind::MediaList)? {
            Some(latest) => self.store.load_snapshot(&latest)?.entries,
            None => {
                info!("No media list yet; scanning directly");
                self.scan().await?.paths
            }
        };
        self.check_filenames_in(stamp, &paths)
    }

    fn check_filenames_in(&self, stamp: RunStamp, paths: &BTreeSet<String>) -> Result<FilenameCheckReport> {
        let report = mediamgr_scan::check(paths);
        let artifact = if report.is_clean() {
            info!(checked = report.checked, "No Windows filename issues");
            None
        } else {
            let artifact = self
                .store
                .write_text(ArtifactKind::FilenameIssues, stamp, &report.render())?;
            warn!(
                count = report.issues.len(),
                path = %artifact.path.display(),
                "Windows filename issues found"
            );
            Some(artifact)
        };
        Ok(FilenameCheckReport {
            checked: report.checked,
            with_issues: report.issues.len(),
            report: artifact,
        })
    }

    /// The full pipeline under one run stamp.
    pub async fn complete_check(&self, stamp: RunStamp) -> Result<CompleteReport> {
        info!("Complete check started");
        let (snapshot, entries) = self.generate_with_entries(stamp).await?;

        let missing = self.check_missing(stamp).await;
        if let Err(e) = &missing {
            error!(error = %e, "Missing-media check failed");
        }

        let retention = self.manage_retention();
        if let Err(e) = &retention {
            error!(error = %e, "Retention failed");
        }

        let filenames = self.check_filenames_in(stamp, &entries);
        if let Err(e) = &filenames {
            error!(error = %e, "Filename check failed");
        }

        let report = CompleteReport {
            stamp,
            snapshot,
            missing,
            retention,
            filenames,
        };
        info!(success = report.is_success(), "Complete check finished");
        Ok(report)
    }
}
