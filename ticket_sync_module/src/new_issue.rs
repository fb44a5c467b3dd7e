//! Browser URL for creating a new ticket prefilled from a message.

use crate::message::MessageRecord;
use crate::note::{truncate_chars, NOTE_BODY_MAX_CHARS, NO_BODY, NO_SUBJECT};

/// `{base}/issues/new?issue[subject]=..&issue[description]=..`
///
/// The description is the raw body cut to the note length limit before
/// escaping. Nothing is sent to the tracker.
pub fn new_issue_url(base_url: &str, record: &MessageRecord) -> String {
    let subject = record.subject.as_deref().unwrap_or(NO_SUBJECT);
    let body = record.body.as_deref().unwrap_or(NO_BODY);
    let description = truncate_chars(body, NOTE_BODY_MAX_CHARS);
    format!(
        "{}/issues/new?issue[subject]={}&issue[description]={}",
        base_url.trim().trim_end_matches('/'),
        urlencoding::encode(subject),
        urlencoding::encode(description)
    )
}
