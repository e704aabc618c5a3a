use async_trait::async_trait;

use crate::error::Result;
use crate::message::Notification;

/// Delivery capability for alerts.
///
/// Implementations must be `Send + Sync` so the orchestrator can hold one
/// behind an `Arc` and call it from any Tokio task.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Stable lowercase identifier used in logs (e.g. `"smtp"`).
    fn name(&self) -> &str;

    /// Deliver exactly one message. No retries.
    async fn send(&self, notification: &Notification) -> Result<()>;
}
