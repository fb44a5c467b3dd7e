use send_notes_module::TransportError;

/// How a sync invocation ended when it did not fail terminally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The note was written on the `attempts`-th try.
    Recorded { ticket_id: String, attempts: u32 },
    /// The subject carries no ticket reference.
    SkippedNoTicketId,
    /// The ticket history already holds this message's marker.
    SkippedDuplicate { ticket_id: String },
    /// The ticket history could not be read, so nothing was written.
    SkippedRemoteUnavailable { ticket_id: String, reason: String },
}

impl SyncOutcome {
    pub fn ticket_id(&self) -> Option<&str> {
        match self {
            SyncOutcome::Recorded { ticket_id, .. }
            | SyncOutcome::SkippedDuplicate { ticket_id }
            | SyncOutcome::SkippedRemoteUnavailable { ticket_id, .. } => Some(ticket_id),
            SyncOutcome::SkippedNoTicketId => None,
        }
    }

    pub fn is_recorded(&self) -> bool {
        matches!(self, SyncOutcome::Recorded { .. })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("failed to record note on ticket #{ticket_id} after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        ticket_id: String,
        attempts: u32,
        #[source]
        last_error: TransportError,
    },
}

impl SyncError {
    pub fn ticket_id(&self) -> &str {
        match self {
            SyncError::RetriesExhausted { ticket_id, .. } => ticket_id,
        }
    }
}
