//! Message records handed over by the mail-event collaborator.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One inbound or outbound mail message, read-only for the duration of a sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    /// Local wall-clock time the message was sent.
    pub sent_on: NaiveDateTime,
    /// Raw sender entry, e.g. `Jane Doe <jane@example.com>`.
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub recipients: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageDirection {
    #[default]
    Received,
    Sent,
}

impl MessageDirection {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "received" | "inbox" | "inbound" => Some(MessageDirection::Received),
            "sent" | "outbox" | "outbound" => Some(MessageDirection::Sent),
            _ => None,
        }
    }
}

impl fmt::Display for MessageDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageDirection::Received => write!(f, "Received"),
            MessageDirection::Sent => write!(f, "Sent"),
        }
    }
}

/// Resolves a raw address entry to a concrete email address.
///
/// Returning `None` is not an error; the note shows `Unknown` instead.
pub trait AddressResolver: Send + Sync {
    fn resolve(&self, entry: &str) -> Option<String>;
}

/// Accepts bare addresses and `Display Name <address>` entries.
#[derive(Debug, Default, Clone, Copy)]
pub struct MailboxAddressResolver;

impl AddressResolver for MailboxAddressResolver {
    fn resolve(&self, entry: &str) -> Option<String> {
        let trimmed = entry.trim();
        let candidate = match (trimmed.rfind('<'), trimmed.rfind('>')) {
            (Some(start), Some(end)) if start < end => &trimmed[start + 1..end],
            _ => trimmed,
        };
        let candidate = candidate.trim().trim_start_matches("mailto:");
        let (local, domain) = candidate.split_once('@')?;
        if local.is_empty() || domain.is_empty() || candidate.contains(char::is_whitespace) {
            return None;
        }
        Some(candidate.to_string())
    }
}
