use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use mediamgr_automation::error::exit;
use mediamgr_automation::AutomationError;
use mediamgr_core::config::{default_data_dir, resolve_config_path};
use mediamgr_core::MediaManagerConfig;
use mediamgr_inventory::ArtifactKind;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod schedule;
mod tasks;
mod update;

/// Media library watchdog: snapshots, missing-file alerts, retention and
/// OS-level scheduling.
#[derive(Parser)]
#[command(name = "mediamgr", version, about)]
struct Cli {
    /// Path to the configuration file (TOML, or legacy JSON).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Skip the release check before interactive commands.
    #[arg(long, global = true)]
    no_update_check: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan the library and write a new media list.
    GenerateList,
    /// Compare the two newest media lists and alert on missing files.
    CheckMissing,
    /// Prune stored artifacts down to the retention count.
    ManageRetention,
    /// Report paths that are not valid Windows file names.
    CheckFilenames,
    /// Snapshot, diff, alert, prune and check file names in one run.
    CompleteCheck,
    /// Print a liveness line and exit.
    Test,
    /// Manage OS-level scheduled jobs.
    #[command(subcommand)]
    Schedule(ScheduleCommand),
    /// List stored artifacts, newest first.
    Artifacts {
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
    },
    /// Check for a newer release now.
    UpdateCheck,
}

impl Command {
    /// Scheduled runs never reach out to the network.
    fn wants_update_check(&self) -> bool {
        matches!(self, Command::Schedule(_) | Command::Artifacts { .. })
    }
}

#[derive(Subcommand)]
enum ScheduleCommand {
    /// Install enabled jobs and remove stale ones.
    Apply {
        /// Plan against an in-memory scheduler instead of the OS.
        #[arg(long)]
        dry_run: bool,
    },
    /// Remove every managed job.
    Remove,
    /// Show planned and installed jobs.
    List,
    /// Create and delete a throwaway job to prove scheduling works.
    Test,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    MediaList,
    MissingMedia,
    FilenameIssues,
}

impl From<KindArg> for ArtifactKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::MediaList => ArtifactKind::MediaList,
            KindArg::MissingMedia => ArtifactKind::MissingMedia,
            KindArg::FilenameIssues => ArtifactKind::FilenameIssues,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!(code = e.code(), "{e}");
            eprintln!("Error: {e}");
            e.exit_code()
        }
    };
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

async fn run(cli: Cli) -> Result<i32, AutomationError> {
    if let Command::Test = cli.command {
        println!("Automation test - script is working correctly");
        return Ok(exit::OK);
    }

    let config_path = resolve_config_path(cli.config.as_deref());
    let config = MediaManagerConfig::load(Some(&config_path))?;
    config.validate()?;

    if cli.command.wants_update_check() && !cli.no_update_check && config.update.check_on_start {
        if let Some(repo) = config.update.repository.as_deref() {
            update::check_update_on_startup(&default_data_dir(), repo).await;
        }
    }

    match cli.command {
        Command::GenerateList => tasks::generate_list(config).await,
        Command::CheckMissing => tasks::check_missing(config).await,
        Command::ManageRetention => tasks::manage_retention(config),
        Command::CheckFilenames => tasks::check_filenames(config).await,
        Command::CompleteCheck => tasks::complete_check(config).await,
        Command::Schedule(cmd) => schedule::run(cmd, &config, &config_path).await,
        Command::Artifacts { kind } => tasks::list_artifacts(&config, kind.map(Into::into)),
        Command::UpdateCheck => Ok(update::run(&config.update).await),
        Command::Test => Ok(exit::OK),
    }
}
