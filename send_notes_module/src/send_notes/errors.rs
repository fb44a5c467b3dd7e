#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("http error: {0}")]
    Http(String),
    #[error("tracker rejected note (status {status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("payload serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("command not found on PATH: {program}")]
    CommandNotFound { program: String },
    #[error("command failed (status: {status:?}). stderr tail:\n{stderr}")]
    CommandFailed { status: Option<i32>, stderr: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unknown note transport: {0} (expected native or curl)")]
    UnknownKind(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Http(err.to_string())
    }
}
