pub mod error;
pub mod message;
pub mod notifier;
pub mod settings;
pub mod smtp;

pub use error::NotifyError;
pub use message::{missing_media_notification, Notification};
pub use notifier::Notifier;
pub use settings::EmailSettings;
pub use smtp::SmtpNotifier;
