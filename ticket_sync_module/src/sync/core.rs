use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};

use tracing::{error, info, warn};

use send_notes_module::{build_transport, NoteRequest, NoteTransport};

use crate::config::{ConfigError, SyncConfig};
use crate::message::{AddressResolver, MailboxAddressResolver, MessageDirection, MessageRecord};
use crate::note::{compose_note, sent_on_marker, NO_SUBJECT};
use crate::notify::{FailureNotifier, LogNotifier};
use crate::quote_trim::QuoteTrimmer;
use crate::ticket_id::TicketIdExtractor;
use crate::tracker::TrackerClient;

use super::backoff::{Backoff, ThreadSleepBackoff};
use super::types::{SyncError, SyncOutcome};

/// Everything derived from one `SyncConfig`. Invocations hold an `Arc` to
/// the snapshot they started with.
#[derive(Clone)]
struct SyncState {
    config: SyncConfig,
    extractor: TicketIdExtractor,
    trimmer: QuoteTrimmer,
    tracker: TrackerClient,
    transport: Arc<dyn NoteTransport>,
}

impl SyncState {
    fn build(
        config: SyncConfig,
        transport_override: Option<&Arc<dyn NoteTransport>>,
    ) -> Result<Self, ConfigError> {
        let extractor = config.ticket_id_extractor()?;
        let trimmer = config.quote_trimmer()?;
        let tracker = TrackerClient::new(
            &config.tracker_url,
            &config.api_key,
            config.use_proxy,
            config.request_timeout,
        )?;
        let transport = match transport_override {
            Some(transport) => Arc::clone(transport),
            None => build_transport(config.transport, &config.transport_options())?,
        };
        Ok(Self {
            config,
            extractor,
            trimmer,
            tracker,
            transport,
        })
    }
}

/// Drives one message through extract, duplicate check, compose and send,
/// retrying failed sends with linear backoff.
pub struct SyncOrchestrator {
    state: RwLock<Arc<SyncState>>,
    transport_override: Option<Arc<dyn NoteTransport>>,
    notifier: Arc<dyn FailureNotifier>,
    backoff: Arc<dyn Backoff>,
    resolver: Arc<dyn AddressResolver>,
}

impl SyncOrchestrator {
    pub fn new(config: SyncConfig) -> Result<Self, ConfigError> {
        info!(
            "ticket sync configured: tracker={} api_key=*** transport={} max_attempts={}",
            config.tracker_url, config.transport, config.retry.max_attempts
        );
        let state = SyncState::build(config, None)?;
        Ok(Self {
            state: RwLock::new(Arc::new(state)),
            transport_override: None,
            notifier: Arc::new(LogNotifier),
            backoff: Arc::new(ThreadSleepBackoff),
            resolver: Arc::new(MailboxAddressResolver),
        })
    }

    /// Uses `transport` instead of the configured one, including after
    /// later `refresh_config` calls.
    pub fn with_transport(mut self, transport: Arc<dyn NoteTransport>) -> Self {
        let mut state = SyncState::clone(&self.snapshot());
        state.transport = Arc::clone(&transport);
        self.state = RwLock::new(Arc::new(state));
        self.transport_override = Some(transport);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn FailureNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_backoff(mut self, backoff: Arc<dyn Backoff>) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_address_resolver(mut self, resolver: Arc<dyn AddressResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Replaces the configuration for invocations started after this call.
    /// On error the previous configuration stays active.
    pub fn refresh_config(&self, config: SyncConfig) -> Result<(), ConfigError> {
        let state = Arc::new(SyncState::build(config, self.transport_override.as_ref())?);
        let mut guard = match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = state;
        info!("ticket sync configuration refreshed");
        Ok(())
    }

    /// The configuration new invocations will use.
    pub fn config(&self) -> SyncConfig {
        self.snapshot().config.clone()
    }

    fn snapshot(&self) -> Arc<SyncState> {
        match self.state.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Fire-and-forget entry point for the mail-event adapter. Each message
    /// syncs on its own thread; the handle may be joined or dropped.
    pub fn on_new_message(
        self: &Arc<Self>,
        record: MessageRecord,
        direction: MessageDirection,
    ) -> JoinHandle<Result<SyncOutcome, SyncError>> {
        let orchestrator = Arc::clone(self);
        thread::spawn(move || orchestrator.sync_message(&record, direction))
    }

    /// Runs one sync invocation to completion on the calling thread.
    pub fn sync_message(
        &self,
        record: &MessageRecord,
        direction: MessageDirection,
    ) -> Result<SyncOutcome, SyncError> {
        let state = self.snapshot();
        let subject = record.subject.as_deref().unwrap_or(NO_SUBJECT);

        let Some(ticket_id) = state.extractor.extract(record.subject.as_deref()) else {
            info!(
                "{} message '{}' has no ticket id; skipping",
                direction, subject
            );
            return Ok(SyncOutcome::SkippedNoTicketId);
        };

        let marker = sent_on_marker(&record.sent_on);
        let note = compose_note(record, &marker, &state.trimmer, self.resolver.as_ref());
        let request = NoteRequest::new(
            state.tracker.issue_url(&ticket_id),
            state.tracker.api_key(),
            note.to_payload(),
        );
        let policy = state.config.retry;

        let mut attempt: u32 = 1;
        let last_error = loop {
            match state.tracker.already_recorded(&ticket_id, &marker) {
                Ok(true) => {
                    info!(
                        "{} message '{}' already recorded on ticket #{} (SentOn {}); skipping",
                        direction, subject, ticket_id, marker
                    );
                    return Ok(SyncOutcome::SkippedDuplicate { ticket_id });
                }
                Ok(false) => {}
                Err(err) => {
                    warn!(
                        "could not read history of ticket #{}; skipping {} message '{}': {}",
                        ticket_id, direction, subject, err
                    );
                    return Ok(SyncOutcome::SkippedRemoteUnavailable {
                        ticket_id,
                        reason: err.to_string(),
                    });
                }
            }

            match state.transport.send(&request) {
                Ok(()) => {
                    info!(
                        "recorded {} message '{}' on ticket #{} via {} (attempt {})",
                        direction,
                        subject,
                        ticket_id,
                        state.transport.name(),
                        attempt
                    );
                    return Ok(SyncOutcome::Recorded {
                        ticket_id,
                        attempts: attempt,
                    });
                }
                Err(err) if attempt < policy.max_attempts => {
                    let delay = policy.delay_for(attempt);
                    warn!(
                        "attempt {}/{} to record note on ticket #{} failed: {}; retrying in {:?}",
                        attempt, policy.max_attempts, ticket_id, err, delay
                    );
                    self.backoff.pause(delay);
                    attempt += 1;
                }
                Err(err) => break err,
            }
        };

        let error = SyncError::RetriesExhausted {
            ticket_id,
            attempts: attempt,
            last_error,
        };
        error!("{}", error);
        self.notifier.notify_failure(&error, subject);
        Err(error)
    }
}
