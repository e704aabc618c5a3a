//! Watchdog task subcommands and their console output.

use mediamgr_automation::error::exit;
use mediamgr_automation::{
    AutomationError, CheckMissingReport, FilenameCheckReport, GenerateReport, NotificationStatus,
    Orchestrator,
};
use mediamgr_core::MediaManagerConfig;
use mediamgr_inventory::{ArtifactKind, ArtifactStore, DiffOutcome, RetentionReport, RunStamp};

type Result<T> = std::result::Result<T, AutomationError>;

pub async fn generate_list(config: MediaManagerConfig) -> Result<i32> {
    let orchestrator = Orchestrator::new(config)?;
    let report = orchestrator.generate_list(RunStamp::now()).await?;
    print_generate(&report);
    Ok(exit::OK)
}

/// Exits with [`exit::INSUFFICIENT_HISTORY`] when fewer than two media lists exist.
pub async fn check_missing(config: MediaManagerConfig) -> Result<i32> {
    let orchestrator = Orchestrator::new(config)?;
    let report = orchestrator.check_missing(RunStamp::now()).await?;
    print_missing(&report);
    Ok(match report.outcome {
        DiffOutcome::InsufficientHistory { .. } => exit::INSUFFICIENT_HISTORY,
        DiffOutcome::Compared(_) => exit::OK,
    })
}

pub fn manage_retention(config: MediaManagerConfig) -> Result<i32> {
    let orchestrator = Orchestrator::new(config)?;
    for report in orchestrator.manage_retention()? {
        print_retention(&report);
    }
    Ok(exit::OK)
}

pub async fn check_filenames(config: MediaManagerConfig) -> Result<i32> {
    let orchestrator = Orchestrator::new(config)?;
    let report = orchestrator.check_filenames(RunStamp::now()).await?;
    print_filenames(&report);
    Ok(exit::OK)
}

/// Every step is reported; the exit code follows the first failed step.
pub async fn complete_check(config: MediaManagerConfig) -> Result<i32> {
    let orchestrator = Orchestrator::new(config)?;
    let report = orchestrator.complete_check(RunStamp::now()).await?;

    println!("Complete check {}", report.stamp.timestamp().format("%Y-%m-%d %H:%M:%S"));
    print_generate(&report.snapshot);
    match &report.missing {
        Ok(missing) => print_missing(missing),
        Err(e) => println!("Missing-media check failed: {e}"),
    }
    match &report.retention {
        Ok(reports) => reports.iter().for_each(print_retention),
        Err(e) => println!("Retention failed: {e}"),
    }
    match &report.filenames {
        Ok(filenames) => print_filenames(filenames),
        Err(e) => println!("Filename check failed: {e}"),
    }

    Ok(report.first_error().map_or(exit::OK, AutomationError::exit_code))
}

pub fn list_artifacts(config: &MediaManagerConfig, kind: Option<ArtifactKind>) -> Result<i32> {
    let store = ArtifactStore::new(config.output_directory.clone());
    let kinds = match kind {
        Some(kind) => vec![kind],
        None => ArtifactKind::ALL.to_vec(),
    };
    for kind in kinds {
        let artifacts = store.list(kind)?;
        println!("{kind} ({})", artifacts.len());
        for artifact in artifacts.iter().rev() {
            println!("  {}  {}", artifact.id, artifact.path.display());
        }
    }
    Ok(exit::OK)
}

fn print_generate(report: &GenerateReport) {
    println!(
        "Media list: {} files -> {}",
        report.count,
        report.artifact.path.display()
    );
    for skipped in &report.skipped {
        println!("  skipped: {skipped}");
    }
}

fn print_missing(report: &CheckMissingReport) {
    match &report.outcome {
        DiffOutcome::InsufficientHistory { available } => {
            println!("Missing media: need two media lists to compare, found {available}");
        }
        DiffOutcome::Compared(missing) if missing.is_empty() => {
            println!("Missing media: none");
        }
        DiffOutcome::Compared(missing) => {
            println!(
                "Missing media: {} files gone since {}",
                missing.len(),
                missing.baseline_id
            );
            for path in &missing.paths {
                println!("  {path}");
            }
            if let Some(artifact) = &report.report {
                println!("  report: {}", artifact.path.display());
            }
        }
    }
    match &report.notification {
        NotificationStatus::NotNeeded => {}
        NotificationStatus::Sent => println!("  alert email sent"),
        NotificationStatus::Skipped(reason) => println!("  alert email skipped: {reason}"),
        NotificationStatus::Failed(reason) => println!("  alert email failed: {reason}"),
    }
}

fn print_retention(report: &RetentionReport) {
    println!(
        "Retention {}: kept {}, deleted {}",
        report.kind,
        report.kept,
        report.deleted.len()
    );
    for failure in &report.failures {
        println!("  could not delete {}: {}", failure.path.display(), failure.error);
    }
}

fn print_filenames(report: &FilenameCheckReport) {
    match &report.report {
        Some(artifact) => println!(
            "Filenames: {} of {} paths have issues -> {}",
            report.with_issues,
            report.checked,
            artifact.path.display()
        ),
        None => println!("Filenames: {} paths checked, no issues", report.checked),
    }
}
