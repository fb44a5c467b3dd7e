use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use super::errors::TransportError;
use super::types::{NoteRequest, NoteTransport, TransportOptions, API_KEY_HEADER, JSON_CONTENT_TYPE};
use super::utils::tail_string;

/// Sends notes through the in-process blocking HTTP client.
#[derive(Debug, Clone)]
pub struct NativeTransport {
    client: Client,
}

impl NativeTransport {
    pub fn new(options: &TransportOptions) -> Result<Self, TransportError> {
        let mut builder = Client::builder().timeout(options.timeout);
        if !options.use_proxy {
            builder = builder.no_proxy();
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

impl NoteTransport for NativeTransport {
    fn name(&self) -> &'static str {
        "native"
    }

    fn send(&self, request: &NoteRequest) -> Result<(), TransportError> {
        debug!("PUT {} via native http", request.url);
        let body = serde_json::to_vec(&request.payload)?;
        let response = self
            .client
            .put(&request.url)
            .header(API_KEY_HEADER, &request.api_key)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(body)
            .send()?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().unwrap_or_default();
        Err(TransportError::Rejected {
            status: status.as_u16(),
            body: tail_string(&body, 2000),
        })
    }
}
