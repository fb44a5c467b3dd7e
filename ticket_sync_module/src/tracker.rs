//! Read side of the tracker API: fetching a ticket's journals and deciding
//! whether a message was already recorded there.

use reqwest::blocking::Client;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::debug;

use send_notes_module::API_KEY_HEADER;

use crate::note::marker_line;

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("http error: {0}")]
    Http(String),
    #[error("tracker returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid issue document: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for TrackerError {
    fn from(err: reqwest::Error) -> Self {
        TrackerError::Http(err.to_string())
    }
}

/// One comment entry of a ticket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Journal {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct IssueDocument {
    #[serde(default)]
    issue: Option<IssueJournals>,
}

#[derive(Debug, Default, Deserialize)]
struct IssueJournals {
    #[serde(default)]
    journals: Option<Vec<Journal>>,
}

/// True when any journal's notes contain the `SentOn:` line for `marker`.
pub fn history_contains_marker(journals: &[Journal], marker: &str) -> bool {
    let needle = marker_line(marker);
    journals
        .iter()
        .filter_map(|journal| journal.notes.as_deref())
        .any(|notes| notes.contains(&needle))
}

/// Parses the `GET /issues/{id}.json?include=journals` response body.
pub fn parse_journals(document: &str) -> Result<Vec<Journal>, TrackerError> {
    let document: IssueDocument = serde_json::from_str(document)?;
    Ok(document
        .issue
        .and_then(|issue| issue.journals)
        .unwrap_or_default())
}

#[derive(Clone)]
pub struct TrackerClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl fmt::Debug for TrackerClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackerClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"***")
            .finish()
    }
}

impl TrackerClient {
    pub fn new(
        base_url: &str,
        api_key: &str,
        use_proxy: bool,
        timeout: Duration,
    ) -> Result<Self, TrackerError> {
        let mut builder = Client::builder().timeout(timeout);
        if !use_proxy {
            builder = builder.no_proxy();
        }
        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// `{base}/issues/{id}.json`, the write endpoint.
    pub fn issue_url(&self, ticket_id: &str) -> String {
        format!("{}/issues/{}.json", self.base_url, ticket_id)
    }

    pub fn fetch_journals(&self, ticket_id: &str) -> Result<Vec<Journal>, TrackerError> {
        let url = self.issue_url(ticket_id);
        debug!("GET {}?include=journals", url);
        let response = self
            .client
            .get(&url)
            .query(&[("include", "journals")])
            .header(API_KEY_HEADER, &self.api_key)
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(TrackerError::Status {
                status: status.as_u16(),
                body,
            });
        }
        parse_journals(&body)
    }

    pub fn already_recorded(&self, ticket_id: &str, marker: &str) -> Result<bool, TrackerError> {
        let journals = self.fetch_journals(ticket_id)?;
        Ok(history_contains_marker(&journals, marker))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn journal(notes: Option<&str>) -> Journal {
        Journal {
            id: None,
            notes: notes.map(str::to_string),
        }
    }

    #[test]
    fn marker_match_requires_exact_minute() {
        let journals = vec![
            journal(None),
            journal(Some("")),
            journal(Some("SentOn: 2024-01-01 10:00\nSubject: hello")),
        ];
        assert!(history_contains_marker(&journals, "2024-01-01 10:00"));
        assert!(!history_contains_marker(&journals, "2024-01-01 10:01"));
        assert!(!history_contains_marker(&journals, "2024-01-01 11:00"));
        assert!(!history_contains_marker(&[], "2024-01-01 10:00"));
    }

    #[test]
    fn marker_without_label_does_not_count() {
        let journals = vec![journal(Some("sent 2024-01-01 10:00 by bob"))];
        assert!(!history_contains_marker(&journals, "2024-01-01 10:00"));
    }

    #[test]
    fn parse_journals_tolerates_missing_sections() {
        assert!(parse_journals(r#"{}"#).unwrap().is_empty());
        assert!(parse_journals(r#"{"issue":{"id":1}}"#).unwrap().is_empty());
        assert!(parse_journals(r#"{"issue":{"journals":null}}"#).unwrap().is_empty());
        let journals =
            parse_journals(r#"{"issue":{"journals":[{"id":3,"notes":null},{"id":4,"notes":"hi"}]}}"#)
                .unwrap();
        assert_eq!(journals.len(), 2);
        assert_eq!(journals[1].notes.as_deref(), Some("hi"));
    }

    #[test]
    fn parse_journals_rejects_non_json() {
        assert!(matches!(parse_journals("<html>"), Err(TrackerError::Json(_))));
    }

    #[test]
    fn issue_url_strips_trailing_slash() {
        let client =
            TrackerClient::new("https://tracker.example.com/ ", "k", true, Duration::from_secs(5))
                .unwrap();
        assert_eq!(
            client.issue_url("42"),
            "https://tracker.example.com/issues/42.json"
        );
        assert!(!format!("{:?}", client).contains("\"k\""));
    }
}
