use serde::Deserialize;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use send_notes_module::{TransportError, TransportKind, TransportOptions};

use crate::quote_trim::QuoteTrimmer;
use crate::sync::RetryPolicy;
use crate::ticket_id::TicketIdExtractor;
use crate::tracker::TrackerError;

pub const DEFAULT_ID_PREFIX: &str = "id:";
pub const MAX_REPLY_DELIMITERS: usize = 4;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const CONFIG_PATH_ENV: &str = "TICKET_SYNC_CONFIG_PATH";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required setting: {key}")]
    Missing { key: &'static str },
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("invalid pattern in {key}: {source}")]
    Pattern {
        key: String,
        #[source]
        source: regex::Error,
    },
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to build tracker client: {0}")]
    Tracker(#[from] TrackerError),
    #[error("failed to build note transport: {0}")]
    Transport(#[from] TransportError),
}

/// Optional settings file; every key can also come from the environment,
/// which takes precedence.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SyncConfigFile {
    pub tracker_url: Option<String>,
    pub api_key: Option<String>,
    pub id_prefix: Option<String>,
    #[serde(default)]
    pub reply_delimiters: Vec<String>,
    pub transport: Option<String>,
    pub max_attempts: Option<u32>,
    pub retry_base_delay_ms: Option<u64>,
    pub use_proxy: Option<bool>,
    pub timeout_secs: Option<u64>,
    pub curl_program: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl SyncConfigFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Everything the sync core reads. Built once, then passed by value; a new
/// value goes in through `SyncOrchestrator::refresh_config`.
#[derive(Clone)]
pub struct SyncConfig {
    pub tracker_url: String,
    pub api_key: String,
    pub id_prefix: String,
    /// Ordered, blank entries already removed.
    pub reply_delimiters: Vec<String>,
    pub transport: TransportKind,
    pub retry: RetryPolicy,
    pub use_proxy: bool,
    pub request_timeout: Duration,
    pub curl_program: String,
    pub log_file: Option<PathBuf>,
}

impl fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncConfig")
            .field("tracker_url", &self.tracker_url)
            .field("api_key", &"***")
            .field("id_prefix", &self.id_prefix)
            .field("reply_delimiters", &self.reply_delimiters)
            .field("transport", &self.transport)
            .field("retry", &self.retry)
            .field("use_proxy", &self.use_proxy)
            .field("request_timeout", &self.request_timeout)
            .field("curl_program", &self.curl_program)
            .field("log_file", &self.log_file)
            .finish()
    }
}

impl SyncConfig {
    /// Minimal configuration with defaults for everything but the tracker.
    pub fn new(tracker_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            tracker_url: tracker_url.into(),
            api_key: api_key.into(),
            id_prefix: DEFAULT_ID_PREFIX.to_string(),
            reply_delimiters: Vec::new(),
            transport: TransportKind::Native,
            retry: RetryPolicy::default(),
            use_proxy: true,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            curl_program: "curl".to_string(),
            log_file: None,
        }
    }

    /// Loads `.env`, then the TOML file named by `path` (or by
    /// `TICKET_SYNC_CONFIG_PATH`), then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| read_env_trimmed(CONFIG_PATH_ENV).map(PathBuf::from));
        let file = match path {
            Some(path) => SyncConfigFile::load(&path)?,
            None => SyncConfigFile::default(),
        };
        Self::from_lookup(file, read_env_trimmed)
    }

    pub fn from_lookup<F>(file: SyncConfigFile, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let tracker_url = read("TRACKER_URL")
            .or(file.tracker_url)
            .map(|value| value.trim().trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::Missing { key: "TRACKER_URL" })?;
        if !(tracker_url.starts_with("http://") || tracker_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                key: "TRACKER_URL",
                value: tracker_url,
                reason: "expected an http:// or https:// URL".to_string(),
            });
        }

        let api_key = read("TRACKER_API_KEY")
            .or(file.api_key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::Missing {
                key: "TRACKER_API_KEY",
            })?;

        let id_prefix = read("TICKET_ID_PREFIX")
            .or(file.id_prefix)
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_ID_PREFIX.to_string());

        if file.reply_delimiters.len() > MAX_REPLY_DELIMITERS {
            return Err(ConfigError::Invalid {
                key: "reply_delimiters",
                value: file.reply_delimiters.len().to_string(),
                reason: format!("at most {} delimiters are supported", MAX_REPLY_DELIMITERS),
            });
        }
        let mut reply_delimiters = Vec::new();
        for index in 0..MAX_REPLY_DELIMITERS {
            let slot = format!("REPLY_DELIMITER_{}", index + 1);
            let Some(pattern) = read(&slot).or_else(|| file.reply_delimiters.get(index).cloned())
            else {
                continue;
            };
            if pattern.trim().is_empty() {
                continue;
            }
            QuoteTrimmer::new(std::slice::from_ref(&pattern))
                .map_err(|source| ConfigError::Pattern { key: slot, source })?;
            reply_delimiters.push(pattern);
        }

        let transport = match read("NOTE_TRANSPORT").or(file.transport) {
            Some(raw) => raw.parse::<TransportKind>().map_err(|err| ConfigError::Invalid {
                key: "NOTE_TRANSPORT",
                value: raw.clone(),
                reason: err.to_string(),
            })?,
            None => TransportKind::Native,
        };

        let max_attempts = match read("SYNC_MAX_ATTEMPTS") {
            Some(raw) => parse_number::<u32>("SYNC_MAX_ATTEMPTS", &raw)?,
            None => file.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
        };
        if max_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "SYNC_MAX_ATTEMPTS",
                value: "0".to_string(),
                reason: "at least one attempt is required".to_string(),
            });
        }
        let base_delay_ms = match read("SYNC_RETRY_BASE_DELAY_MS") {
            Some(raw) => parse_number::<u64>("SYNC_RETRY_BASE_DELAY_MS", &raw)?,
            None => file
                .retry_base_delay_ms
                .unwrap_or(DEFAULT_RETRY_BASE_DELAY_MS),
        };
        let timeout_secs = match read("TRACKER_TIMEOUT_SECS") {
            Some(raw) => parse_number::<u64>("TRACKER_TIMEOUT_SECS", &raw)?,
            None => file.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "TRACKER_TIMEOUT_SECS",
                value: "0".to_string(),
                reason: "timeout must be positive".to_string(),
            });
        }

        let use_proxy = match read("TRACKER_USE_PROXY") {
            Some(raw) => flag_enabled(&raw),
            None => file.use_proxy.unwrap_or(true),
        };
        let curl_program = read("CURL_PROGRAM")
            .or(file.curl_program)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| "curl".to_string());
        let log_file = read("TICKET_SYNC_LOG_FILE")
            .map(PathBuf::from)
            .or(file.log_file);

        let config = Self {
            tracker_url,
            api_key,
            id_prefix,
            reply_delimiters,
            transport,
            retry: RetryPolicy::new(max_attempts, Duration::from_millis(base_delay_ms)),
            use_proxy,
            request_timeout: Duration::from_secs(timeout_secs),
            curl_program,
            log_file,
        };
        config.ticket_id_extractor()?;
        Ok(config)
    }

    pub fn ticket_id_extractor(&self) -> Result<TicketIdExtractor, ConfigError> {
        TicketIdExtractor::new(&self.id_prefix).map_err(|source| ConfigError::Pattern {
            key: "TICKET_ID_PREFIX".to_string(),
            source,
        })
    }

    pub fn quote_trimmer(&self) -> Result<QuoteTrimmer, ConfigError> {
        QuoteTrimmer::new(&self.reply_delimiters).map_err(|source| ConfigError::Pattern {
            key: "REPLY_DELIMITER".to_string(),
            source,
        })
    }

    pub fn transport_options(&self) -> TransportOptions {
        TransportOptions {
            use_proxy: self.use_proxy,
            timeout: self.request_timeout,
            curl_program: self.curl_program.clone(),
            ..TransportOptions::default()
        }
    }
}

fn read_env_trimmed(key: &str) -> Option<String> {
    let value = env::var(key).ok()?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: fmt::Display,
{
    raw.trim().parse::<T>().map_err(|err| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason: err.to_string(),
    })
}

fn flag_enabled(raw: &str) -> bool {
    let normalized = raw.trim().to_ascii_lowercase();
    !matches!(normalized.as_str(), "" | "0" | "false" | "no" | "off")
}
