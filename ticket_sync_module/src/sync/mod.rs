mod backoff;
mod core;
mod types;

pub use backoff::{Backoff, RetryPolicy, ThreadSleepBackoff};
pub use core::SyncOrchestrator;
pub use types::{SyncError, SyncOutcome};
