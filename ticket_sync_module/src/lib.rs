pub mod config;
pub mod logging;
pub mod message;
pub mod new_issue;
pub mod note;
pub mod notify;
pub mod quote_trim;
pub mod ticket_id;
pub mod tracker;

mod sync;

pub use sync::{
    Backoff, RetryPolicy, SyncError, SyncOrchestrator, SyncOutcome, ThreadSleepBackoff,
};
