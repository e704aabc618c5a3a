use std::sync::Arc;

use tracing::info;

use crate::backend::SchedulerBackend;
use crate::command::CommandRunner;
use crate::cron::CronBackend;
use crate::error::{Result, SchedulerError};
use crate::schtasks::SchtasksBackend;

/// Pick the scheduler for this host: the Windows task store on Windows, cron
/// wherever a `crontab` binary is on `PATH`.
pub fn detect_backend(runner: Arc<dyn CommandRunner>) -> Result<Box<dyn SchedulerBackend>> {
    if cfg!(windows) {
        which::which("schtasks").map_err(|_| {
            SchedulerError::Unavailable("schtasks.exe not found on PATH".to_string())
        })?;
        info!(backend = "schtasks", "Scheduler backend selected");
        return Ok(Box::new(SchtasksBackend::new(runner)));
    }

    match which::which("crontab") {
        Ok(path) => {
            info!(backend = "cron", path = %path.display(), "Scheduler backend selected");
            Ok(Box::new(CronBackend::new(runner)))
        }
        Err(_) => Err(SchedulerError::Unavailable(format!(
            "no crontab binary on PATH ({} is not supported without cron)",
            std::env::consts::OS
        ))),
    }
}
