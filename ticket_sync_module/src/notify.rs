//! User-facing failure notification.

use tracing::error;

use crate::sync::SyncError;

/// Receives terminal sync failures, once per failed message.
pub trait FailureNotifier: Send + Sync {
    fn notify_failure(&self, error: &SyncError, subject: &str);
}

/// Text shown to the user for a terminal failure.
pub fn failure_notice(error: &SyncError, subject: &str) -> String {
    format!(
        "An error occurred while saving the email with subject '{}' to the tracker.\n\nError Details:\n{}\n\nPlease check the system logs for more information.",
        subject, error
    )
}

/// Default notifier: writes the notice to the log at error level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl FailureNotifier for LogNotifier {
    fn notify_failure(&self, error: &SyncError, subject: &str) {
        error!("{}", failure_notice(error, subject));
    }
}
