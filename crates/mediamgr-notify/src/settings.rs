use std::time::Duration;

use lettre::message::Mailbox;
use lettre::Address;
use mediamgr_core::config::EmailConfig;
use mediamgr_core::Secret;

use crate::error::{NotifyError, Result};

/// Values shipped in sample configs that must be replaced before use.
const PLACEHOLDERS: &[&str] = &[
    "SENDER_NAME_HERE",
    "SENDER_EMAIL_HERE",
    "RECEIVER_EMAIL_HERE",
    "PASSWORD_HERE",
    "smtp.server.com",
];

/// SMTP settings that passed validation.
#[derive(Debug, Clone)]
pub struct EmailSettings {
    pub from: Mailbox,
    pub to: Mailbox,
    pub password: Secret,
    pub smtp_server: String,
    pub smtp_port: u16,
    pub timeout: Duration,
}

impl EmailSettings {
    /// Validate `config`. Does not look at `config.enabled`.
    pub fn from_config(config: &EmailConfig) -> Result<Self> {
        let invalid = |msg: &str| NotifyError::InvalidConfig(msg.to_string());

        if config.sender_email.is_empty()
            || config.receiver_email.is_empty()
            || config.password.is_empty()
            || config.smtp_server.is_empty()
        {
            return Err(invalid("sender, receiver, password and SMTP server are required"));
        }
        let values = [
            config.sender_name.as_str(),
            config.sender_email.as_str(),
            config.receiver_email.as_str(),
            config.password.expose(),
            config.smtp_server.as_str(),
        ];
        if values.iter().any(|v| PLACEHOLDERS.contains(v)) {
            return Err(invalid("placeholder values have not been replaced"));
        }
        if config.smtp_port == 0 {
            return Err(invalid("SMTP port must be between 1 and 65535"));
        }

        let sender = parse_address(&config.sender_email)?;
        let receiver = parse_address(&config.receiver_email)?;
        let name = Some(config.sender_name.trim())
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        Ok(Self {
            from: Mailbox::new(name, sender),
            to: Mailbox::new(None, receiver),
            password: config.password.clone(),
            smtp_server: config.smtp_server.clone(),
            smtp_port: config.smtp_port,
            timeout: Duration::from_secs(config.timeout_secs.max(1)),
        })
    }
}

fn parse_address(value: &str) -> Result<Address> {
    if !looks_like_email(value) {
        return Err(NotifyError::InvalidConfig(format!(
            "malformed email address: {value}"
        )));
    }
    value
        .parse()
        .map_err(|e| NotifyError::InvalidConfig(format!("malformed email address {value}: {e}")))
}

/// `local@domain.tld` with a conservative character set and an alphabetic
/// TLD of at least two letters.
fn looks_like_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    let local_ok = !local.is_empty()
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "._%+-".contains(c));
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    let host_ok = !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || ".-".contains(c));
    let tld_ok = tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic());
    local_ok && host_ok && tld_ok
}
