use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{info, warn};

use crate::error::{NotifyError, Result};
use crate::message::Notification;
use crate::notifier::Notifier;
use crate::settings::EmailSettings;

/// Sends alerts through an SMTP relay using STARTTLS.
pub struct SmtpNotifier {
    settings: EmailSettings,
}

impl SmtpNotifier {
    pub fn new(settings: EmailSettings) -> Self {
        Self { settings }
    }

    fn build(&self, notification: &Notification) -> Result<Message> {
        Message::builder()
            .from(self.settings.from.clone())
            .to(self.settings.to.clone())
            .subject(notification.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(notification.body.clone())
            .map_err(|e| NotifyError::Build(e.to_string()))
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
        let credentials = Credentials::new(
            self.settings.from.email.to_string(),
            self.settings.password.expose().to_string(),
        );
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.settings.smtp_server)
            .map_err(|e| NotifyError::SendFailed(e.to_string()))?
            .port(self.settings.smtp_port)
            .credentials(credentials)
            .timeout(Some(self.settings.timeout))
            .build();
        Ok(transport)
    }

    /// The transport timeout bounds each socket operation; this bounds the
    /// whole exchange.
    fn overall_timeout(&self) -> Duration {
        self.settings.timeout.saturating_mul(2)
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    fn name(&self) -> &str {
        "smtp"
    }

    async fn send(&self, notification: &Notification) -> Result<()> {
        let message = self.build(notification)?;
        let transport = self.transport()?;
        let overall = self.overall_timeout();

        match tokio::time::timeout(overall, transport.send(message)).await {
            Ok(Ok(_)) => {
                info!(
                    server = %self.settings.smtp_server,
                    to = %self.settings.to.email,
                    subject = %notification.subject,
                    "Notification email sent"
                );
                Ok(())
            }
            Ok(Err(e)) => {
                warn!(server = %self.settings.smtp_server, error = %e, "SMTP send failed");
                Err(NotifyError::SendFailed(e.to_string()))
            }
            Err(_) => Err(NotifyError::Timeout {
                ms: u64::try_from(overall.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }
}
