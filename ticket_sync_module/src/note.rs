//! Composition of the note text written to the tracker.
//!
//! The first line of every note is the `SentOn:` marker. The duplicate check
//! searches tracker history for exactly the line produced by [`marker_line`],
//! so both sides must go through this module.

use chrono::NaiveDateTime;

use crate::message::{AddressResolver, MessageRecord};
use crate::quote_trim::QuoteTrimmer;

pub const SENT_ON_LABEL: &str = "SentOn: ";
/// Minute granularity; two messages sent in the same minute share a marker.
pub const SENT_ON_FORMAT: &str = "%Y-%m-%d %H:%M";
pub const NOTE_BODY_MAX_CHARS: usize = 1000;

pub const NO_SUBJECT: &str = "No Subject";
pub const NO_BODY: &str = "No Body";
pub const UNKNOWN_ADDRESS: &str = "Unknown";

pub fn sent_on_marker(sent_on: &NaiveDateTime) -> String {
    sent_on.format(SENT_ON_FORMAT).to_string()
}

pub fn marker_line(marker: &str) -> String {
    format!("{}{}", SENT_ON_LABEL, marker)
}

/// Longest prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteContent {
    pub marker: String,
    pub text: String,
}

impl NoteContent {
    /// `{"issue":{"notes":"..."}}`
    pub fn to_payload(&self) -> serde_json::Value {
        serde_json::json!({ "issue": { "notes": self.text } })
    }
}

pub fn compose_note(
    record: &MessageRecord,
    marker: &str,
    trimmer: &QuoteTrimmer,
    resolver: &dyn AddressResolver,
) -> NoteContent {
    let subject = record.subject.as_deref().unwrap_or(NO_SUBJECT);
    let sender = resolve_or_unknown(resolver, record.sender.as_deref());
    let recipients = record
        .recipients
        .iter()
        .map(|entry| resolve_or_unknown(resolver, Some(entry)))
        .collect::<Vec<_>>()
        .join(";");
    let body = record
        .body
        .as_deref()
        .map(|body| truncate_chars(trimmer.trim(body), NOTE_BODY_MAX_CHARS))
        .filter(|body| !body.is_empty())
        .unwrap_or(NO_BODY);

    let text = format!(
        "{}\nSubject: {}\nSender: {}\nRecipients: {}\n\n{}",
        marker_line(marker),
        subject,
        sender,
        recipients,
        body
    );
    NoteContent {
        marker: marker.to_string(),
        text,
    }
}

fn resolve_or_unknown(resolver: &dyn AddressResolver, entry: Option<&str>) -> String {
    entry
        .and_then(|entry| resolver.resolve(entry))
        .unwrap_or_else(|| UNKNOWN_ADDRESS.to_string())
}
