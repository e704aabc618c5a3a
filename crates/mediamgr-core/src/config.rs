use std::path::{Path, PathBuf};

use chrono::Weekday;
use figment::{
    providers::{Env, Format, Json, Toml},
    Figment,
};
use serde::Deserialize;

use crate::error::{MediaManagerError, Result};
use crate::secret::Secret;
use crate::types::{Frequency, TaskKind, TimeOfDay};

pub const DEFAULT_EXTENSIONS: [&str; 3] = [".mp4", ".mkv", ".avi"];
pub const DEFAULT_RETENTION_COUNT: i64 = 100;
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 30;
pub const ENV_PREFIX: &str = "MEDIAMGR_";

/// Top-level config (mediamgr.toml + MEDIAMGR_* env overrides).
///
/// Key names match the legacy `media_manager_config.json` layout so an
/// existing JSON settings file loads unchanged.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaManagerConfig {
    #[serde(default)]
    pub scan_directories: Vec<PathBuf>,
    #[serde(default = "default_output_directory")]
    pub output_directory: PathBuf,
    #[serde(default)]
    pub file_extensions: FileExtensions,
    /// Signed so that a negative value reaches `validate` and is reported
    /// instead of failing deserialization with a confusing message.
    #[serde(default = "default_retention_count")]
    pub file_retention_count: i64,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub automation: AutomationConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub update: UpdateConfig,
}

impl Default for MediaManagerConfig {
    fn default() -> Self {
        Self {
            scan_directories: Vec::new(),
            output_directory: default_output_directory(),
            file_extensions: FileExtensions::default(),
            file_retention_count: DEFAULT_RETENTION_COUNT,
            email: EmailConfig::default(),
            automation: AutomationConfig::default(),
            scheduler: SchedulerConfig::default(),
            update: UpdateConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileExtensions {
    #[serde(default = "default_media_extensions")]
    pub media: Vec<String>,
    #[serde(default)]
    pub additional: Vec<String>,
}

impl Default for FileExtensions {
    fn default() -> Self {
        Self {
            media: default_media_extensions(),
            additional: Vec::new(),
        }
    }
}

/// SMTP settings for missing-media alerts.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub sender_name: String,
    #[serde(default)]
    pub sender_email: String,
    #[serde(default)]
    pub receiver_email: String,
    #[serde(default)]
    pub password: Secret,
    #[serde(default = "default_smtp_server")]
    pub smtp_server: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default = "default_email_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            sender_name: String::new(),
            sender_email: String::new(),
            receiver_email: String::new(),
            password: Secret::default(),
            smtp_server: default_smtp_server(),
            smtp_port: default_smtp_port(),
            timeout_secs: default_email_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AutomationConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub tasks: TasksConfig,
}

/// Per-task schedule settings, one entry per [`TaskKind`].
#[derive(Debug, Clone, Deserialize)]
pub struct TasksConfig {
    #[serde(default = "default_generate_task")]
    pub generate_media_list: TaskConfig,
    #[serde(default = "default_check_missing_task")]
    pub check_missing_media: TaskConfig,
    #[serde(default = "default_retention_task")]
    pub manage_file_retention: TaskConfig,
    #[serde(default = "default_filenames_task")]
    pub check_windows_filenames: TaskConfig,
    #[serde(default = "default_complete_task")]
    pub complete_check: TaskConfig,
}

impl TasksConfig {
    pub fn get(&self, kind: TaskKind) -> &TaskConfig {
        match kind {
            TaskKind::GenerateList => &self.generate_media_list,
            TaskKind::CheckMissing => &self.check_missing_media,
            TaskKind::ManageRetention => &self.manage_file_retention,
            TaskKind::CheckFilenames => &self.check_windows_filenames,
            TaskKind::CompleteCheck => &self.complete_check,
        }
    }

    pub fn get_mut(&mut self, kind: TaskKind) -> &mut TaskConfig {
        match kind {
            TaskKind::GenerateList => &mut self.generate_media_list,
            TaskKind::CheckMissing => &mut self.check_missing_media,
            TaskKind::ManageRetention => &mut self.manage_file_retention,
            TaskKind::CheckFilenames => &mut self.check_windows_filenames,
            TaskKind::CompleteCheck => &mut self.complete_check,
        }
    }
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            generate_media_list: default_generate_task(),
            check_missing_media: default_check_missing_task(),
            manage_file_retention: default_retention_task(),
            check_windows_filenames: default_filenames_task(),
            complete_check: default_complete_task(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrequencyKind {
    Daily,
    Weekly,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    #[serde(default)]
    pub enabled: bool,
    pub time: TimeOfDay,
    #[serde(default = "default_frequency")]
    pub frequency: FrequencyKind,
    /// Weekday for weekly tasks; ignored for daily ones.
    #[serde(default = "default_weekday")]
    pub day: Weekday,
}

impl TaskConfig {
    fn at(hour: u8, minute: u8) -> Self {
        Self {
            enabled: false,
            time: TimeOfDay::new(hour, minute).unwrap_or_default(),
            frequency: FrequencyKind::Daily,
            day: Weekday::Sun,
        }
    }

    pub fn frequency(&self) -> Frequency {
        match self.frequency {
            FrequencyKind::Daily => Frequency::Daily,
            FrequencyKind::Weekly => Frequency::Weekly(self.day),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Upper bound for every crontab / schtasks invocation.
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
        }
    }
}

/// Update check configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateConfig {
    /// Check for a newer release before interactive runs (default: true).
    /// Override with env var: MEDIAMGR_UPDATE__CHECK_ON_START=false
    #[serde(default = "bool_true")]
    pub check_on_start: bool,
    /// GitHub `owner/repo` to query. No check runs when unset.
    #[serde(default)]
    pub repository: Option<String>,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            check_on_start: true,
            repository: None,
        }
    }
}

impl MediaManagerConfig {
    /// Load config from a TOML (or legacy JSON) file with MEDIAMGR_* env overrides.
    ///
    /// Path resolution: explicit argument, then `MEDIAMGR_CONFIG`, then
    /// `~/.mediamgr/mediamgr.toml`. A missing file is not an error; defaults
    /// and env overrides still apply.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let path = resolve_config_path(config_path);

        let figment = if is_json(&path) {
            Figment::new().merge(Json::file(&path))
        } else {
            Figment::new().merge(Toml::file(&path))
        };

        let config: MediaManagerConfig = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| MediaManagerError::Config(e.to_string()))?;

        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Checks that make any run meaningless; fatal before work begins.
    pub fn validate(&self) -> Result<()> {
        if self.file_retention_count <= 0 {
            return Err(MediaManagerError::Config(format!(
                "file_retention_count must be at least 1 (got {})",
                self.file_retention_count
            )));
        }
        if self.output_directory.as_os_str().is_empty() {
            return Err(MediaManagerError::Config(
                "output_directory must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Additional check for operations that walk the media library.
    pub fn ensure_scan_directories(&self) -> Result<()> {
        if self.scan_directories.is_empty() {
            return Err(MediaManagerError::Config(
                "no scan_directories configured".to_string(),
            ));
        }
        Ok(())
    }

    /// Media and additional extensions, lowercased with a leading dot and
    /// de-duplicated. Falls back to the defaults when both lists are empty.
    pub fn extensions(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for raw in self
            .file_extensions
            .media
            .iter()
            .chain(&self.file_extensions.additional)
        {
            let trimmed = raw.trim().to_lowercase();
            if trimmed.is_empty() || trimmed == "." {
                continue;
            }
            let ext = if trimmed.starts_with('.') {
                trimmed
            } else {
                format!(".{trimmed}")
            };
            if !out.contains(&ext) {
                out.push(ext);
            }
        }
        if out.is_empty() {
            out = default_media_extensions();
        }
        out
    }
}

/// Resolve the config path: explicit > MEDIAMGR_CONFIG > ~/.mediamgr/mediamgr.toml.
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os("MEDIAMGR_CONFIG").map(PathBuf::from))
        .unwrap_or_else(|| default_data_dir().join("mediamgr.toml"))
}

/// `~/.mediamgr`, falling back to the working directory without a home.
pub fn default_data_dir() -> PathBuf {
    let home = std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .unwrap_or_else(|| ".".into());
    PathBuf::from(home).join(".mediamgr")
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn bool_true() -> bool {
    true
}
fn default_output_directory() -> PathBuf {
    default_data_dir().join("lists")
}
fn default_media_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect()
}
fn default_retention_count() -> i64 {
    DEFAULT_RETENTION_COUNT
}
fn default_smtp_server() -> String {
    "smtp.gmail.com".to_string()
}
fn default_smtp_port() -> u16 {
    587
}
fn default_email_timeout_secs() -> u64 {
    30
}
fn default_command_timeout_secs() -> u64 {
    DEFAULT_COMMAND_TIMEOUT_SECS
}
fn default_frequency() -> FrequencyKind {
    FrequencyKind::Daily
}
fn default_weekday() -> Weekday {
    Weekday::Sun
}
fn default_generate_task() -> TaskConfig {
    TaskConfig::at(5, 0)
}
fn default_check_missing_task() -> TaskConfig {
    TaskConfig::at(5, 30)
}
fn default_retention_task() -> TaskConfig {
    TaskConfig::at(6, 0)
}
fn default_filenames_task() -> TaskConfig {
    TaskConfig::at(6, 30)
}
fn default_complete_task() -> TaskConfig {
    TaskConfig::at(5, 0)
}
