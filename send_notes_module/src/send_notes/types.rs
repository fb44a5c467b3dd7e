use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::errors::TransportError;
use super::shell::ShellFlavor;

/// Authentication header understood by the tracker API.
pub const API_KEY_HEADER: &str = "X-Redmine-API-Key";

pub(super) const JSON_CONTENT_TYPE: &str = "application/json";

/// A single note write: `PUT {url}` with `payload` as the JSON body.
#[derive(Debug, Clone)]
pub struct NoteRequest {
    pub url: String,
    pub api_key: String,
    pub payload: serde_json::Value,
}

impl NoteRequest {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            payload,
        }
    }
}

/// Delivers a note write to the tracker.
pub trait NoteTransport: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &'static str;

    fn send(&self, request: &NoteRequest) -> Result<(), TransportError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportKind {
    /// Direct call through the in-process HTTP client.
    #[default]
    Native,
    /// Shell out to a curl-compatible command-line tool.
    Curl,
}

impl FromStr for TransportKind {
    type Err = TransportError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "native" | "http" => Ok(TransportKind::Native),
            "curl" | "process" | "external" => Ok(TransportKind::Curl),
            other => Err(TransportError::UnknownKind(other.to_string())),
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Native => write!(f, "native"),
            TransportKind::Curl => write!(f, "curl"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransportOptions {
    /// When false, bypass any system/environment proxy.
    pub use_proxy: bool,
    pub timeout: Duration,
    /// Program invoked by the curl transport.
    pub curl_program: String,
    pub shell: ShellFlavor,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            use_proxy: true,
            timeout: Duration::from_secs(30),
            curl_program: "curl".to_string(),
            shell: ShellFlavor::native(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_kind_parses_aliases() {
        assert_eq!("native".parse::<TransportKind>().unwrap(), TransportKind::Native);
        assert_eq!(" CURL ".parse::<TransportKind>().unwrap(), TransportKind::Curl);
        assert_eq!("external".parse::<TransportKind>().unwrap(), TransportKind::Curl);
        assert_eq!("".parse::<TransportKind>().unwrap(), TransportKind::Native);
    }

    #[test]
    fn transport_kind_rejects_unknown_values() {
        let err = "smtp".parse::<TransportKind>().unwrap_err();
        assert!(matches!(err, TransportError::UnknownKind(value) if value == "smtp"));
    }
}
