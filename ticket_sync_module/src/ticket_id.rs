//! Ticket identifier extraction from mail subjects.

use regex::{Regex, RegexBuilder};

/// Finds `<prefix><digits>` in a subject, case-insensitively.
///
/// The prefix is a regular expression fragment, so `id[:-]` matches both
/// `id:42` and `ID-42`.
#[derive(Debug, Clone)]
pub struct TicketIdExtractor {
    pattern: Regex,
}

impl TicketIdExtractor {
    pub fn new(prefix: &str) -> Result<Self, regex::Error> {
        let pattern = RegexBuilder::new(&format!("{}(\\d+)", prefix))
            .case_insensitive(true)
            .build()?;
        Ok(Self { pattern })
    }

    /// Returns the digit run of the first match, or `None` when the subject
    /// is absent, empty, or carries no reference.
    pub fn extract(&self, subject: Option<&str>) -> Option<String> {
        let subject = subject.filter(|value| !value.is_empty())?;
        let captures = self.pattern.captures(subject)?;
        captures
            .get(captures.len() - 1)
            .map(|digits| digits.as_str().to_string())
    }
}

pub fn extract_ticket_id(subject: Option<&str>, prefix: &str) -> Result<Option<String>, regex::Error> {
    Ok(TicketIdExtractor::new(prefix)?.extract(subject))
}
