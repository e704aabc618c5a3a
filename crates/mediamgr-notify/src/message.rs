use mediamgr_inventory::MissingSet;

pub const MISSING_MEDIA_SUBJECT: &str = "Missing Media Files Detected";

/// A plain-text alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub body: String,
}

/// Alert listing every missing path, sorted.
pub fn missing_media_notification(missing: &MissingSet) -> Notification {
    let mut body = format!(
        "The following {} media files are missing:\n\n",
        missing.len()
    );
    for path in &missing.paths {
        body.push_str(path);
        body.push('\n');
    }
    Notification {
        subject: MISSING_MEDIA_SUBJECT.to_string(),
        body,
    }
}
