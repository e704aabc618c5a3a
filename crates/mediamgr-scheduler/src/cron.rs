//! Crontab backend.
//!
//! Each managed job is one crontab line ending in `# MediaManager:<job-name>`:
//!
//! ```text
//! 0 5 * * * "/usr/local/bin/mediamgr" --config "/home/me/.mediamgr/mediamgr.toml" complete-check # MediaManager:MediaManager_CompleteCheck
//! ```
//!
//! Lines written by older releases used `# MediaManager: <job-name>` and are
//! recognised too. Every other line is preserved verbatim.

use std::sync::Arc;

use async_trait::async_trait;
use mediamgr_core::types::validate_job_name;
use mediamgr_core::{Frequency, ScheduledTaskSpec};
use tracing::{debug, info, warn};

use crate::backend::{ensure_single_line, JobListing, ManagedJob, ParseIssue, SchedulerBackend};
use crate::command::CommandRunner;
use crate::error::{Result, SchedulerError};
use crate::sync::{JobAction, JobOutcome, SyncReport};

pub const CRON_MARKER: &str = "# MediaManager:";

const CRONTAB: &str = "crontab";

/// How one crontab line relates to us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CronLine {
    Managed { name: String, schedule: String },
    Malformed(ParseIssue),
    Foreign,
}

pub fn classify(line: &str) -> CronLine {
    let Some(idx) = line.rfind(CRON_MARKER) else {
        return CronLine::Foreign;
    };
    let malformed = |reason: &str| {
        CronLine::Malformed(ParseIssue {
            entry: line.to_string(),
            reason: reason.to_string(),
        })
    };

    let name = line[idx + CRON_MARKER.len()..].trim();
    if let Err(e) = validate_job_name(name) {
        return malformed(&e.to_string());
    }

    let head = line[..idx].trim();
    let tokens: Vec<&str> = head.split_whitespace().collect();
    let schedule = match tokens.first() {
        Some(first) if first.starts_with('@') && tokens.len() >= 2 => first.to_string(),
        Some(_) if tokens.len() >= 6 && tokens[..5].iter().all(|t| is_cron_field(t)) => {
            tokens[..5].join(" ")
        }
        _ => return malformed("schedule fields are missing or malformed"),
    };
    CronLine::Managed {
        name: name.to_string(),
        schedule,
    }
}

fn is_cron_field(token: &str) -> bool {
    token
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '*' | '/' | ',' | '-'))
}

/// Render the crontab line for `spec`. `%` in the command is escaped since
/// cron treats a bare `%` as a newline.
pub fn render_line(spec: &ScheduledTaskSpec) -> Result<String> {
    spec.validate()?;
    ensure_single_line(spec)?;
    let dow = match spec.frequency {
        Frequency::Daily => "*".to_string(),
        Frequency::Weekly(day) => day.num_days_from_sunday().to_string(),
    };
    Ok(format!(
        "{} {} * * {} {} {}{}",
        spec.time.minute(),
        spec.time.hour(),
        dow,
        spec.command.replace('%', "\\%"),
        CRON_MARKER,
        spec.name
    ))
}

/// Rewrite crontab text: managed lines for which `drop` holds are removed,
/// except that the first line named `replace.0` is swapped for `replace.1`
/// in place. If no such line existed the replacement is appended.
fn rewrite(text: &str, drop: impl Fn(&str) -> bool, replace: Option<(&str, &str)>) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut placed = false;
    for line in text.lines() {
        if let CronLine::Managed { name, .. } = classify(line) {
            if let Some((target, new_line)) = replace {
                if name == target {
                    if !placed {
                        out.push(new_line);
                        placed = true;
                    }
                    continue;
                }
            }
            if drop(&name) {
                continue;
            }
        }
        out.push(line);
    }
    if let (Some((_, new_line)), false) = (replace, placed) {
        out.push(new_line);
    }
    if out.is_empty() {
        String::new()
    } else {
        let mut joined = out.join("\n");
        joined.push('\n');
        joined
    }
}

pub struct CronBackend {
    runner: Arc<dyn CommandRunner>,
}

impl CronBackend {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Current crontab. A user without a crontab has an empty one.
    async fn read(&self) -> Result<String> {
        let out = self.runner.run(CRONTAB, &["-l"], None).await?;
        if out.success() {
            return Ok(out.stdout);
        }
        if out.stderr.to_lowercase().contains("no crontab") {
            debug!("No crontab for current user");
            return Ok(String::new());
        }
        Err(SchedulerError::CommandFailed {
            program: "crontab -l".to_string(),
            status: out.status_text(),
            stderr: out.stderr.trim().to_string(),
        })
    }

    /// Replace the crontab in one `crontab -` call, skipped when unchanged.
    async fn write_if_changed(&self, job: &str, before: &str, after: &str) -> Result<bool> {
        if before == after {
            debug!(job, "Crontab unchanged");
            return Ok(false);
        }
        let out = self.runner.run(CRONTAB, &["-"], Some(after)).await?;
        if out.success() {
            return Ok(true);
        }
        let stderr = out.stderr.trim().to_string();
        let lower = stderr.to_lowercase();
        if lower.contains("not allowed") || lower.contains("permission denied") {
            return Err(SchedulerError::Privilege {
                job: job.to_string(),
                detail: stderr,
            });
        }
        Err(SchedulerError::CommandFailed {
            program: "crontab -".to_string(),
            status: out.status_text(),
            stderr,
        })
    }
}

#[async_trait]
impl SchedulerBackend for CronBackend {
    fn name(&self) -> &'static str {
        "cron"
    }

    async fn list_managed_jobs(&self) -> Result<JobListing> {
        let text = self.read().await?;
        let mut listing = JobListing::default();
        for line in text.lines() {
            match classify(line) {
                CronLine::Managed { name, schedule } => {
                    listing.jobs.push(ManagedJob { name, schedule })
                }
                CronLine::Malformed(issue) => {
                    warn!(line = %issue.entry, reason = %issue.reason, "Leaving unrecognised MediaManager crontab line untouched");
                    listing.issues.push(issue);
                }
                CronLine::Foreign => {}
            }
        }
        Ok(listing)
    }

    async fn install(&self, spec: &ScheduledTaskSpec) -> Result<()> {
        let line = render_line(spec)?;
        let before = self.read().await?;
        let after = rewrite(&before, |_| false, Some((spec.name.as_str(), line.as_str())));
        if self.write_if_changed(&spec.name, &before, &after).await? {
            info!(job = %spec.name, frequency = %spec.frequency, time = %spec.time, "Cron job installed");
        }
        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<()> {
        validate_job_name(name)?;
        let before = self.read().await?;
        let after = rewrite(&before, |n| n == name, None);
        if self.write_if_changed(name, &before, &after).await? {
            info!(job = %name, "Cron job removed");
        }
        Ok(())
    }

    /// One crontab write removes every managed line, so the jobs succeed or
    /// fail together.
    async fn remove_all_managed(&self) -> Result<SyncReport> {
        let before = self.read().await?;
        let mut report = SyncReport::default();
        let mut names = Vec::new();
        for line in before.lines() {
            match classify(line) {
                CronLine::Managed { name, .. } => names.push(name),
                CronLine::Malformed(issue) => report.issues.push(issue),
                CronLine::Foreign => {}
            }
        }

        let after = rewrite(&before, |_| true, None);
        if self.write_if_changed("all managed jobs", &before, &after).await? {
            info!(count = names.len(), "All managed cron jobs removed");
        }
        for name in names {
            report.outcomes.push(JobOutcome::new(name, JobAction::Removed, Ok(())));
        }
        Ok(report)
    }
}
