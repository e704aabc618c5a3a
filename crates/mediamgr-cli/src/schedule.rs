use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use mediamgr_automation::error::exit;
use mediamgr_automation::{
    apply_schedule, plan, remove_schedule, test_task_creation, AutomationError, Launcher,
};
use mediamgr_core::{Frequency, MediaManagerConfig, ScheduledTaskSpec, TimeOfDay};
use mediamgr_scheduler::{
    detect_backend, next_fire, MemoryBackend, SchedulerBackend, SyncReport, SystemRunner,
};
use tracing::warn;

use crate::ScheduleCommand;

type Result<T> = std::result::Result<T, AutomationError>;

fn system_backend(config: &MediaManagerConfig) -> Result<Box<dyn SchedulerBackend>> {
    let timeout = Duration::from_secs(config.scheduler.command_timeout_secs);
    Ok(detect_backend(Arc::new(SystemRunner::new(timeout)))?)
}

pub async fn run(cmd: ScheduleCommand, config: &MediaManagerConfig, config_path: &Path) -> Result<i32> {
    let launcher = Launcher::current(config_path)?;
    match cmd {
        ScheduleCommand::Apply { dry_run: true } => dry_run(config, &launcher).await,
        ScheduleCommand::Apply { dry_run: false } => {
            let backend = system_backend(config)?;
            let applied = apply_schedule(backend.as_ref(), &config.automation, &launcher).await;
            print_sync(backend.name(), &applied.report);
            applied.into_result()?;
            Ok(exit::OK)
        }
        ScheduleCommand::Remove => {
            let backend = system_backend(config)?;
            let report = remove_schedule(backend.as_ref()).await?;
            print_sync(backend.name(), &report);
            Ok(if report.is_success() { exit::OK } else { exit::SCHEDULER })
        }
        ScheduleCommand::List => list(config, &launcher).await,
        ScheduleCommand::Test => {
            let backend = system_backend(config)?;
            let report = test_task_creation(backend.as_ref(), &launcher).await;
            println!("Scheduler self-test ({})", report.backend);
            println!("  create: {}", step(&report.install));
            println!("  delete: {}", step(&report.remove));
            Ok(if report.is_success() { exit::OK } else { exit::SCHEDULER })
        }
    }
}

/// Apply the plan to an in-memory copy of the installed jobs, touching nothing.
async fn dry_run(config: &MediaManagerConfig, launcher: &Launcher) -> Result<i32> {
    let installed = match system_backend(config) {
        Ok(backend) => match backend.list_managed_jobs().await {
            Ok(listing) => listing.jobs,
            Err(e) => {
                warn!(error = %e, "Could not list installed jobs; dry run starts empty");
                Vec::new()
            }
        },
        Err(e) => {
            warn!(error = %e, "No scheduler backend; dry run starts empty");
            Vec::new()
        }
    };
    let memory = MemoryBackend::with_jobs(installed.into_iter().map(|job| ScheduledTaskSpec {
        name: job.name,
        command: job.schedule,
        frequency: Frequency::Daily,
        time: TimeOfDay::default(),
        enabled: true,
    }));

    let applied = apply_schedule(&memory, &config.automation, launcher).await;
    println!("Dry run: no scheduler changes were made");
    print_sync(memory.name(), &applied.report);
    Ok(exit::OK)
}

async fn list(config: &MediaManagerConfig, launcher: &Launcher) -> Result<i32> {
    let now = Local::now().naive_local();
    let planned = plan(&config.automation, launcher);

    println!("Planned jobs ({})", planned.len());
    for spec in &planned {
        println!(
            "  {:<40} {} at {}  next {}",
            spec.name,
            spec.frequency,
            spec.time,
            next_fire(spec.frequency, spec.time, now).format("%Y-%m-%d %H:%M")
        );
    }

    let backend = system_backend(config)?;
    let listing = backend.list_managed_jobs().await?;
    println!("Installed jobs ({}, {})", listing.jobs.len(), backend.name());
    for job in &listing.jobs {
        println!("  {:<40} {}", job.name, job.schedule);
    }
    for issue in &listing.issues {
        println!("  unreadable entry left untouched: {} ({})", issue.entry, issue.reason);
    }
    Ok(exit::OK)
}

fn print_sync(backend: &str, report: &SyncReport) {
    println!("Scheduler: {backend}");
    for outcome in &report.outcomes {
        println!(
            "  {:<7} {:<40} {}",
            outcome.action.to_string(),
            outcome.name,
            step(&outcome.result)
        );
    }
    for issue in &report.issues {
        println!("  left untouched: {} ({})", issue.entry, issue.reason);
    }
    if let Some(e) = &report.list_error {
        println!("  could not list existing jobs: {e}");
    }
}

fn step<E: std::fmt::Display>(result: &std::result::Result<(), E>) -> String {
    match result {
        Ok(()) => "ok".to_string(),
        Err(e) => format!("FAILED: {e}"),
    }
}
