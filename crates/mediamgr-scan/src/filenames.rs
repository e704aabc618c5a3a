//! Windows naming rules, applied to paths collected on any platform.
//!
//! Detection only: nothing is renamed.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path};

const INVALID_CHARS: &[char] = &['<', '>', ':', '"', '|', '?', '*', '\\', '/'];

const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

pub const MAX_FILENAME_LENGTH: usize = 255;
pub const MAX_PATH_LENGTH: usize = 260;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilenameIssue {
    InvalidCharacters(Vec<char>),
    ControlCharacters,
    TrailingPeriodOrSpace,
    ReservedName(String),
    FilenameTooLong(usize),
    PathTooLong(usize),
    PaddedComponent(String),
}

impl fmt::Display for FilenameIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilenameIssue::InvalidCharacters(chars) => {
                let list: Vec<String> = chars.iter().map(char::to_string).collect();
                write!(f, "Contains invalid characters: {}", list.join(", "))
            }
            FilenameIssue::ControlCharacters => write!(f, "Contains control characters (ASCII 0-31)"),
            FilenameIssue::TrailingPeriodOrSpace => write!(f, "Filename ends with period or space"),
            FilenameIssue::ReservedName(name) => write!(f, "Uses reserved Windows name: {name}"),
            FilenameIssue::FilenameTooLong(len) => write!(
                f,
                "Filename too long ({len} > {MAX_FILENAME_LENGTH} characters)"
            ),
            FilenameIssue::PathTooLong(len) => {
                write!(f, "Full path too long ({len} > {MAX_PATH_LENGTH} characters)")
            }
            FilenameIssue::PaddedComponent(part) => {
                write!(f, "Path component has leading/trailing spaces: '{part}'")
            }
        }
    }
}

/// Every Windows naming problem in one path.
pub fn issues_for(path: &str) -> Vec<FilenameIssue> {
    let mut issues = Vec::new();
    let p = Path::new(path);
    let name = p
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut invalid: Vec<char> = name.chars().filter(|c| INVALID_CHARS.contains(c)).collect();
    if !invalid.is_empty() {
        invalid.sort_unstable();
        invalid.dedup();
        issues.push(FilenameIssue::InvalidCharacters(invalid));
    }
    if name.chars().any(|c| (c as u32) < 32) {
        issues.push(FilenameIssue::ControlCharacters);
    }
    if name.ends_with('.') || name.ends_with(' ') {
        issues.push(FilenameIssue::TrailingPeriodOrSpace);
    }

    let stem = p
        .file_stem()
        .map(|s| s.to_string_lossy().to_uppercase())
        .unwrap_or_default();
    if RESERVED_NAMES.contains(&stem.as_str()) {
        issues.push(FilenameIssue::ReservedName(stem));
    }

    let name_len = name.chars().count();
    if name_len > MAX_FILENAME_LENGTH {
        issues.push(FilenameIssue::FilenameTooLong(name_len));
    }
    let path_len = path.chars().count();
    if path_len > MAX_PATH_LENGTH {
        issues.push(FilenameIssue::PathTooLong(path_len));
    }

    for component in p.components() {
        if let Component::Normal(part) = component {
            let part = part.to_string_lossy();
            if part.trim() != part {
                issues.push(FilenameIssue::PaddedComponent(part.into_owned()));
            }
        }
    }
    issues
}

/// Paths with at least one issue, in path order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FilenameReport {
    pub checked: usize,
    pub issues: BTreeMap<String, Vec<FilenameIssue>>,
}

impl FilenameReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Human-readable report, ending in a list of common fixes when any
    /// issue was found.
    pub fn render(&self) -> String {
        if self.is_clean() {
            return "No Windows filename compatibility issues found.\n".to_string();
        }

        let mut out = format!(
            "Found {} files with Windows naming issues:\n\n",
            self.issues.len()
        );
        for (path, issues) in &self.issues {
            out.push_str(path);
            out.push('\n');
            for issue in issues {
                out.push_str(&format!("   - {issue}\n"));
            }
            out.push('\n');
        }
        out.push_str("\nCommon fixes:\n");
        out.push_str("- Remove or replace invalid characters: < > : \" | ? * \\ /\n");
        out.push_str("- Rename files that use reserved Windows names (CON, PRN, AUX, etc.)\n");
        out.push_str("- Remove trailing periods and spaces from filenames\n");
        out.push_str("- Shorten very long filenames or paths\n");
        out.push_str("- Remove leading/trailing spaces from directory names\n");
        out
    }
}

pub fn check<I, S>(paths: I) -> FilenameReport
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut report = FilenameReport::default();
    for path in paths {
        let path = path.as_ref();
        report.checked += 1;
        let issues = issues_for(path);
        if !issues.is_empty() {
            report.issues.insert(path.to_string(), issues);
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_path_has_no_issues() {
        assert!(issues_for("/media/movies/Heat (1995).mkv").is_empty());
    }

    #[test]
    fn invalid_characters_are_listed_once() {
        let issues = issues_for("/media/What? Why?.mkv");
        assert_eq!(issues, vec![FilenameIssue::InvalidCharacters(vec!['?'])]);
        assert_eq!(issues[0].to_string(), "Contains invalid characters: ?");
    }

    #[test]
    fn reserved_stem_is_case_insensitive() {
        let issues = issues_for("/media/con.mp4");
        assert_eq!(issues, vec![FilenameIssue::ReservedName("CON".into())]);
        assert!(issues_for("/media/console.mp4").is_empty());
    }

    #[test]
    fn trailing_period_and_control_chars() {
        let issues = issues_for("/media/clip\u{7}.");
        assert!(issues.contains(&FilenameIssue::ControlCharacters));
        assert!(issues.contains(&FilenameIssue::TrailingPeriodOrSpace));
    }

    #[test]
    fn lengths_are_counted_in_characters() {
        let long_name = format!("/m/{}.mkv", "a".repeat(252));
        assert_eq!(
            issues_for(&long_name),
            vec![FilenameIssue::FilenameTooLong(256)]
        );

        let deep = format!("{}/a.mkv", "/dir".repeat(64));
        assert_eq!(issues_for(&deep), vec![FilenameIssue::PathTooLong(262)]);

        let accented = format!("/m/{}.mkv", "é".repeat(240));
        assert!(issues_for(&accented).is_empty());
    }

    #[test]
    fn padded_directory_is_flagged() {
        let issues = issues_for("/media/ Movies /a.mkv");
        assert_eq!(
            issues,
            vec![FilenameIssue::PaddedComponent(" Movies ".into())]
        );
    }

    #[test]
    fn report_lists_only_problem_paths() {
        let report = check(["/m/ok.mkv", "/m/aux.avi", "/m/b|c.mp4"]);
        assert_eq!(report.checked, 3);
        assert_eq!(report.issues.len(), 2);
        let text = report.render();
        assert!(text.starts_with("Found 2 files with Windows naming issues:"));
        assert!(text.contains("/m/aux.avi\n   - Uses reserved Windows name: AUX\n"));
        assert!(text.contains("Common fixes:"));
        assert!(!text.contains("/m/ok.mkv"));
    }

    #[test]
    fn clean_report_renders_single_line() {
        let report = check(Vec::<String>::new());
        assert!(report.is_clean());
        assert_eq!(report.render(), "No Windows filename compatibility issues found.\n");
    }
}
