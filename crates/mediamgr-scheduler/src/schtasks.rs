//! Windows Task Scheduler backend driven through `schtasks.exe`.
//!
//! The job name is the task name, so the task store itself guarantees at
//! most one task per job, and `/Create ... /F` replaces in place.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use mediamgr_core::types::validate_job_name;
use mediamgr_core::{Frequency, ScheduledTaskSpec, JOB_PREFIX};
use tracing::{debug, info};

use crate::backend::{ensure_single_line, JobListing, ManagedJob, ParseIssue, SchedulerBackend};
use crate::command::{CommandOutput, CommandRunner};
use crate::error::{Result, SchedulerError};

const SCHTASKS: &str = "schtasks";

/// Upper bound `schtasks /TR` accepts for the task command.
pub const MAX_TASK_RUN_LENGTH: usize = 261;

pub struct SchtasksBackend {
    runner: Arc<dyn CommandRunner>,
}

impl SchtasksBackend {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

/// Arguments for `schtasks /Create`.
pub fn create_args(spec: &ScheduledTaskSpec) -> Result<Vec<String>> {
    spec.validate()?;
    ensure_single_line(spec)?;
    if spec.command.chars().count() > MAX_TASK_RUN_LENGTH {
        return Err(SchedulerError::InvalidSpec(format!(
            "command for {} exceeds {MAX_TASK_RUN_LENGTH} characters",
            spec.name
        )));
    }

    let mut args: Vec<String> = vec![
        "/Create".into(),
        "/TN".into(),
        spec.name.clone(),
        "/TR".into(),
        spec.command.clone(),
    ];
    match spec.frequency {
        Frequency::Daily => args.extend(["/SC".into(), "DAILY".into()]),
        Frequency::Weekly(day) => args.extend([
            "/SC".into(),
            "WEEKLY".into(),
            "/D".into(),
            day.to_string().to_uppercase(),
        ]),
    }
    args.extend(["/ST".into(), spec.time.to_string(), "/F".into()]);
    Ok(args)
}

/// Split one CSV record as printed by `schtasks /FO CSV`.
fn parse_csv_row(line: &str) -> Option<Vec<String>> {
    let mut fields = Vec::new();
    let mut chars = line.trim().chars().peekable();
    loop {
        if chars.peek() != Some(&'"') {
            return None;
        }
        chars.next();
        let mut field = String::new();
        loop {
            match chars.next()? {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => break,
                c => field.push(c),
            }
        }
        fields.push(field);
        match chars.next() {
            None => return Some(fields),
            Some(',') => continue,
            Some(_) => return None,
        }
    }
}

/// Managed tasks in `/Query /FO CSV /NH` output.
pub fn parse_query(stdout: &str) -> JobListing {
    let mut jobs: BTreeMap<String, String> = BTreeMap::new();
    let mut issues = Vec::new();
    for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
        let Some(row) = parse_csv_row(line) else {
            if line.contains(JOB_PREFIX) {
                issues.push(ParseIssue {
                    entry: line.to_string(),
                    reason: "not a CSV record".to_string(),
                });
            }
            continue;
        };
        let Some(path) = row.first() else {
            continue;
        };
        let name = path.rsplit('\\').next().unwrap_or(path);
        if !name.starts_with(JOB_PREFIX) {
            continue;
        }
        if let Err(e) = validate_job_name(name) {
            issues.push(ParseIssue {
                entry: line.to_string(),
                reason: e.to_string(),
            });
            continue;
        }
        let next_run = row.get(1).cloned().unwrap_or_default();
        // Tasks with several triggers are listed once per trigger.
        jobs.entry(name.to_string()).or_insert(next_run);
    }
    JobListing {
        jobs: jobs
            .into_iter()
            .map(|(name, next)| ManagedJob {
                name,
                schedule: format!("next run {next}"),
            })
            .collect(),
        issues,
    }
}

fn failure(job: &str, action: &str, out: CommandOutput) -> SchedulerError {
    let detail = if out.stderr.trim().is_empty() {
        out.stdout.trim().to_string()
    } else {
        out.stderr.trim().to_string()
    };
    if detail.to_lowercase().contains("access is denied") {
        return SchedulerError::Privilege {
            job: job.to_string(),
            detail,
        };
    }
    SchedulerError::CommandFailed {
        program: format!("schtasks {action}"),
        status: out.status_text(),
        stderr: detail,
    }
}

#[async_trait]
impl SchedulerBackend for SchtasksBackend {
    fn name(&self) -> &'static str {
        "schtasks"
    }

    async fn list_managed_jobs(&self) -> Result<JobListing> {
        let out = self
            .runner
            .run(SCHTASKS, &["/Query", "/FO", "CSV", "/NH"], None)
            .await?;
        if !out.success() {
            return Err(failure("*", "/Query", out));
        }
        Ok(parse_query(&out.stdout))
    }

    async fn install(&self, spec: &ScheduledTaskSpec) -> Result<()> {
        let args = create_args(spec)?;
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let out = self.runner.run(SCHTASKS, &args, None).await?;
        if !out.success() {
            return Err(failure(&spec.name, "/Create", out));
        }
        info!(job = %spec.name, frequency = %spec.frequency, time = %spec.time, "Scheduled task installed");
        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<()> {
        validate_job_name(name)?;
        let out = self
            .runner
            .run(SCHTASKS, &["/Delete", "/TN", name, "/F"], None)
            .await?;
        if out.success() {
            info!(job = %name, "Scheduled task removed");
            return Ok(());
        }
        let text = format!("{}{}", out.stderr, out.stdout).to_lowercase();
        if text.contains("cannot find") {
            debug!(job = %name, "Scheduled task already absent");
            return Ok(());
        }
        Err(failure(name, "/Delete", out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;
    use mediamgr_core::TimeOfDay;

    fn spec(frequency: Frequency) -> ScheduledTaskSpec {
        ScheduledTaskSpec {
            name: "MediaManager_CompleteCheck".into(),
            command: r#""C:\mm\mediamgr.exe" complete-check"#.into(),
            frequency,
            time: TimeOfDay::new(5, 0).unwrap(),
            enabled: true,
        }
    }

    #[test]
    fn daily_create_args() {
        assert_eq!(
            create_args(&spec(Frequency::Daily)).unwrap(),
            [
                "/Create",
                "/TN",
                "MediaManager_CompleteCheck",
                "/TR",
                r#""C:\mm\mediamgr.exe" complete-check"#,
                "/SC",
                "DAILY",
                "/ST",
                "05:00",
                "/F"
            ]
        );
    }

    #[test]
    fn weekly_create_args_name_the_day() {
        let args = create_args(&spec(Frequency::Weekly(Weekday::Wed))).unwrap();
        let joined = args.join(" ");
        assert!(joined.contains("/SC WEEKLY /D WED /ST 05:00"));
    }

    #[test]
    fn overlong_command_is_rejected() {
        let mut s = spec(Frequency::Daily);
        s.command = "x".repeat(MAX_TASK_RUN_LENGTH + 1);
        assert_eq!(create_args(&s).unwrap_err().code(), "SCHEDULER_INVALID_SPEC");
    }

    #[test]
    fn query_output_keeps_only_managed_tasks() {
        let stdout = "\
\"\\MediaManager_CompleteCheck\",\"10/19/2026 5:00:00 AM\",\"Ready\"\r
\"\\MediaManager_CompleteCheck\",\"10/25/2026 5:00:00 AM\",\"Ready\"\r
\"\\Microsoft\\Windows\\Defrag\\ScheduledDefrag\",\"N/A\",\"Ready\"\r
\"\\OneDrive Standalone Update Task\",\"10/19/2026 1:00:00 PM\",\"Ready\"\r
";
        let listing = parse_query(stdout);
        assert_eq!(listing.jobs.len(), 1);
        assert_eq!(listing.jobs[0].name, "MediaManager_CompleteCheck");
        assert!(listing.issues.is_empty());
    }

    #[test]
    fn csv_rows_with_escaped_quotes() {
        assert_eq!(
            parse_csv_row(r#""a ""b""","c""#).unwrap(),
            vec![r#"a "b""#.to_string(), "c".to_string()]
        );
        assert_eq!(parse_csv_row("INFO: no tasks"), None);
    }

    #[test]
    fn access_denied_maps_to_privilege() {
        let out = CommandOutput {
            status: Some(1),
            stdout: String::new(),
            stderr: "ERROR: Access is denied.\r\n".into(),
        };
        assert!(matches!(
            failure("MediaManager_x", "/Create", out),
            SchedulerError::Privilege { job, .. } if job == "MediaManager_x"
        ));
    }
}
