use std::cmp::Ordering;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use mediamgr_automation::error::exit;
use mediamgr_core::config::UpdateConfig;
use mediamgr_core::update::{compare_versions, ReleaseInfo, UpdateCheckState};
use serde::Deserialize;
use tracing::{info, warn};

const USER_AGENT: &str = concat!("mediamgr/", env!("CARGO_PKG_VERSION"));

/// Current version from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Deserialize)]
struct GithubRelease {
    tag_name: String,
    html_url: String,
    #[serde(default)]
    body: Option<String>,
}

impl From<GithubRelease> for ReleaseInfo {
    fn from(release: GithubRelease) -> Self {
        let version = release
            .tag_name
            .strip_prefix('v')
            .unwrap_or(&release.tag_name)
            .to_string();
        ReleaseInfo {
            tag_name: release.tag_name,
            version,
            html_url: release.html_url,
            notes: release.body.unwrap_or_default(),
        }
    }
}

// ─── GitHub API ──────────────────────────────────────────────────────────────

/// Latest published release of `repository` (`owner/repo`), or `None` when
/// the repository has no releases yet.
pub async fn check_latest_release(repository: &str) -> Result<Option<ReleaseInfo>> {
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(10))
        .build()?;

    let url = format!("https://api.github.com/repos/{repository}/releases/latest");
    let resp = client
        .get(&url)
        .header("Accept", "application/vnd.github+json")
        .send()
        .await
        .context("failed to reach GitHub API")?;

    if resp.status() == reqwest::StatusCode::NOT_FOUND {
        return Ok(None);
    }

    let release: GithubRelease = resp
        .error_for_status()
        .context("GitHub API returned error status")?
        .json()
        .await
        .context("failed to parse GitHub API response")?;

    Ok(Some(release.into()))
}

// ─── Version Check (CLI) ────────────────────────────────────────────────────

/// `update-check` subcommand. Network failures are reported, never fatal to
/// anything else, so they map to a plain failure exit.
pub async fn run(config: &UpdateConfig) -> i32 {
    let Some(repository) = config.repository.as_deref() else {
        println!("No update repository configured (set update.repository).");
        return exit::OK;
    };
    match check_and_print(repository).await {
        Ok(_) => exit::OK,
        Err(e) => {
            eprintln!("Update check failed: {e:#}");
            exit::FAILURE
        }
    }
}

/// Check for updates and print the result. Returns true if an update is available.
pub async fn check_and_print(repository: &str) -> Result<bool> {
    println!("Checking for updates...");

    let Some(release) = check_latest_release(repository).await? else {
        println!("  No releases published yet.");
        return Ok(false);
    };

    if is_newer(&release) {
        println!();
        println!("  Update available: v{} -> v{}", VERSION, release.version);
        println!("  Release: {}", release.html_url);
        Ok(true)
    } else {
        println!("  You are up to date (v{}).", VERSION);
        Ok(false)
    }
}

fn is_newer(release: &ReleaseInfo) -> bool {
    compare_versions(VERSION, &release.version) == Ordering::Less
}

// ─── Startup Check ──────────────────────────────────────────────────────────

/// Update check before interactive commands. At most once per 24h; any
/// failure is logged and ignored.
pub async fn check_update_on_startup(data_dir: &Path, repository: &str) {
    let state = UpdateCheckState::load(data_dir);
    if !state.should_check() {
        return;
    }

    match check_latest_release(repository).await {
        Ok(release) => {
            let new_state = UpdateCheckState {
                last_checked_at: Some(chrono::Utc::now().to_rfc3339()),
                latest_version: release.as_ref().map(|r| r.version.clone()),
            };
            if let Some(release) = release.filter(is_newer) {
                info!(
                    current = VERSION,
                    latest = %release.version,
                    url = %release.html_url,
                    "Update available: v{} (current: v{})",
                    release.version, VERSION
                );
            }
            if let Err(e) = new_state.save(data_dir) {
                warn!(error = %e, "could not record update check state");
            }
        }
        Err(e) => {
            warn!(error = %e, "startup update check failed (non-fatal)");
        }
    }
}
