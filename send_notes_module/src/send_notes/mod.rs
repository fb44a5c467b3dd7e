mod curl;
mod errors;
mod native;
mod shell;
mod types;
mod utils;

use std::sync::Arc;

use tracing::debug;

pub use curl::CurlTransport;
pub use errors::TransportError;
pub use native::NativeTransport;
pub use shell::ShellFlavor;
pub use types::{NoteRequest, NoteTransport, TransportKind, TransportOptions, API_KEY_HEADER};

/// Builds the sender selected by `kind`.
///
/// Both variants issue the same authenticated `PUT`, so callers hold the
/// result as a plain `dyn NoteTransport` and never branch on the kind again.
pub fn build_transport(
    kind: TransportKind,
    options: &TransportOptions,
) -> Result<Arc<dyn NoteTransport>, TransportError> {
    debug!(
        "building {} note transport (proxy={}, timeout={}s)",
        kind,
        options.use_proxy,
        options.timeout.as_secs()
    );
    match kind {
        TransportKind::Native => Ok(Arc::new(NativeTransport::new(options)?)),
        TransportKind::Curl => Ok(Arc::new(CurlTransport::new(options))),
    }
}
