use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::Path;

/// Metadata about a GitHub release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseInfo {
    pub tag_name: String,
    pub version: String,
    pub html_url: String,
    #[serde(default)]
    pub notes: String,
}

/// Persistent state for the throttled update check.
///
/// Stored at `<data_dir>/update-check.json` so scheduled and interactive runs
/// hit GitHub at most once per 24 hours.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateCheckState {
    pub last_checked_at: Option<String>,
    pub latest_version: Option<String>,
}

impl UpdateCheckState {
    /// Load state from `<data_dir>/update-check.json`. Returns defaults on any error.
    pub fn load(data_dir: &Path) -> Self {
        let path = data_dir.join("update-check.json");
        std::fs::read_to_string(&path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Persist state to `<data_dir>/update-check.json`.
    pub fn save(&self, data_dir: &Path) -> std::io::Result<()> {
        std::fs::create_dir_all(data_dir)?;
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(data_dir.join("update-check.json"), json)
    }

    /// Returns true when enough time has elapsed since the last check (24 hours).
    pub fn should_check(&self) -> bool {
        let Some(ref ts) = self.last_checked_at else {
            return true;
        };
        let Ok(last) = chrono::DateTime::parse_from_rfc3339(ts) else {
            return true;
        };
        let elapsed = chrono::Utc::now().signed_duration_since(last);
        elapsed.num_hours() >= 24
    }
}

/// Compare dotted numeric versions, e.g. "1.2" vs "1.2.1".
///
/// A leading `v` is ignored and missing components count as zero. Any
/// non-numeric suffix on a component ("3-rc.1") is dropped.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let parse = |s: &str| -> Vec<u64> {
        let s = s.trim();
        let s = s.strip_prefix('v').unwrap_or(s);
        s.split('.')
            .map(|p| {
                let numeric: String = p.chars().take_while(|c| c.is_ascii_digit()).collect();
                numeric.parse().unwrap_or(0)
            })
            .collect()
    };
    let (a, b) = (parse(a), parse(b));
    let len = a.len().max(b.len());
    for i in 0..len {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        match x.cmp(&y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_compare_basic() {
        assert_eq!(compare_versions("0.2.0", "0.3.0"), Ordering::Less);
        assert_eq!(compare_versions("0.3.0", "0.2.0"), Ordering::Greater);
        assert_eq!(compare_versions("0.2.0", "0.2.0"), Ordering::Equal);
    }

    #[test]
    fn version_compare_with_v_prefix_and_short_forms() {
        assert_eq!(compare_versions("v1.2", "1.2.0"), Ordering::Equal);
        assert_eq!(compare_versions("1.2", "v1.2.1"), Ordering::Less);
        assert_eq!(compare_versions("2", "1.99.99"), Ordering::Greater);
    }

    #[test]
    fn state_should_check_no_previous() {
        assert!(UpdateCheckState::default().should_check());
    }

    #[test]
    fn state_should_check_recent_and_old() {
        let recent = UpdateCheckState {
            last_checked_at: Some(chrono::Utc::now().to_rfc3339()),
            latest_version: Some("0.2.0".to_string()),
        };
        assert!(!recent.should_check());

        let old = chrono::Utc::now() - chrono::Duration::hours(25);
        let stale = UpdateCheckState {
            last_checked_at: Some(old.to_rfc3339()),
            latest_version: None,
        };
        assert!(stale.should_check());
    }
}
